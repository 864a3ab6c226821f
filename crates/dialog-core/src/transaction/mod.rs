//! Transaction layer seam
//!
//! The dialog layer does not run transactions itself. It hands requests and
//! responses to a [`TransactionLayer`] and is told about transaction state
//! changes through [`crate::manager::UserAgent::on_tsx_state`]. Every method
//! here must return without blocking; the dialog lock may be held while
//! they run.

use std::fmt;

use serde::{Deserialize, Serialize};
use sipneg_sip_core::{HeaderAccess, Method, Request, Response};

use crate::errors::{DialogError, DialogResult};

/// Which side of a transaction we are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionRole {
    Client,
    Server,
}

/// Identifies one transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionKey {
    pub call_id: String,
    pub cseq: u32,
    pub method: Method,
    pub role: TransactionRole,
}

impl TransactionKey {
    /// Key of the transaction `request` belongs to
    pub fn from_request(request: &Request, role: TransactionRole) -> DialogResult<Self> {
        let call_id = request
            .call_id()
            .ok_or_else(|| DialogError::protocol_error("request has no Call-ID"))?;
        let cseq = request
            .cseq()
            .ok_or_else(|| DialogError::protocol_error("request has no CSeq"))?;
        Ok(Self {
            call_id: call_id.as_str().to_string(),
            cseq: cseq.seq,
            method: request.method.clone(),
            role,
        })
    }

    /// Key of the client transaction `response` answers
    pub fn from_response(response: &Response) -> DialogResult<Self> {
        let call_id = response
            .call_id()
            .ok_or_else(|| DialogError::protocol_error("response has no Call-ID"))?;
        let cseq = response
            .cseq()
            .ok_or_else(|| DialogError::protocol_error("response has no CSeq"))?;
        Ok(Self {
            call_id: call_id.as_str().to_string(),
            cseq: cseq.seq,
            method: cseq.method.clone(),
            role: TransactionRole::Client,
        })
    }
}

impl fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self.role {
            TransactionRole::Client => "uac",
            TransactionRole::Server => "uas",
        };
        write!(f, "{}/{} {}/{}", role, self.method, self.cseq, self.call_id)
    }
}

/// Transaction states reported to dialogs (RFC 3261 Section 17)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionState {
    Calling,
    Trying,
    Proceeding,
    Completed,
    Confirmed,
    Terminated,
}

/// Transaction and transport services used by dialogs
pub trait TransactionLayer: Send + Sync {
    /// Create a client transaction for `request` and send it
    fn send_request_stateful(&self, key: &TransactionKey, request: Request) -> DialogResult<()>;

    /// Send a request outside any transaction (ACK for 2xx)
    fn send_request_stateless(&self, request: Request) -> DialogResult<()>;

    /// Create the server transaction for a received request
    fn create_server_transaction(&self, key: &TransactionKey, request: &Request) -> DialogResult<()>;

    /// Send a response through an existing server transaction
    fn send_response(&self, key: &TransactionKey, response: Response) -> DialogResult<()>;

    /// Answer a request without creating a transaction
    fn respond_stateless(&self, request: &Request, response: Response) -> DialogResult<()>;
}

/// Client authentication attached to outgoing in-dialog requests
pub trait ClientAuth: Send + Sync {
    /// Add cached credentials to `request` before it is sent
    fn init_request(&self, request: &mut Request) -> DialogResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sipneg_sip_core::{CSeq, CallId, TypedHeader};

    #[test]
    fn test_key_from_request_and_response() {
        let request = Request::new(Method::Invite, "sip:bob@example.com".parse().unwrap())
            .with_header(TypedHeader::CallId(CallId::new("abc@host")))
            .with_header(TypedHeader::CSeq(CSeq::new(7, Method::Invite)));

        let client = TransactionKey::from_request(&request, TransactionRole::Client).unwrap();
        assert_eq!(client.cseq, 7);
        assert_eq!(client.to_string(), "uac/INVITE 7/abc@host");

        let response = Response::from_request(&request, sipneg_sip_core::StatusCode::OK);
        assert_eq!(TransactionKey::from_response(&response).unwrap(), client);

        let server = TransactionKey::from_request(&request, TransactionRole::Server).unwrap();
        assert_ne!(server, client);
    }

    #[test]
    fn test_key_requires_cseq() {
        let request = Request::new(Method::Bye, "sip:bob@example.com".parse().unwrap())
            .with_header(TypedHeader::CallId(CallId::new("abc@host")));
        assert!(TransactionKey::from_request(&request, TransactionRole::Server).is_err());
    }
}
