//! Shared fixtures: a transaction layer that records what dialogs send

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;

use sipneg_dialog_core::prelude::*;
use sipneg_sip_core::sdp_prelude::SdpSession;
use sipneg_sip_core::{Address, CSeq, CallId, HeaderAccess, Method, Request, Response, StatusCode, TypedHeader};

/// Everything handed to the transaction layer, in order
#[derive(Debug, Clone)]
pub enum Sent {
    Request(TransactionKey, Request),
    StatelessRequest(Request),
    ServerTransaction(TransactionKey),
    Response(TransactionKey, Response),
    StatelessResponse(Response),
}

#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    pub fn requests(&self) -> Vec<Request> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Request(_, r) | Sent::StatelessRequest(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Responses sent through server transactions
    pub fn responses(&self) -> Vec<Response> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Response(_, r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn stateless_responses(&self) -> Vec<Response> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::StatelessResponse(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn last_response(&self) -> Option<Response> {
        self.responses().pop()
    }
}

impl TransactionLayer for RecordingTransport {
    fn send_request_stateful(&self, key: &TransactionKey, request: Request) -> DialogResult<()> {
        self.sent.lock().push(Sent::Request(key.clone(), request));
        Ok(())
    }

    fn send_request_stateless(&self, request: Request) -> DialogResult<()> {
        self.sent.lock().push(Sent::StatelessRequest(request));
        Ok(())
    }

    fn create_server_transaction(&self, key: &TransactionKey, _request: &Request) -> DialogResult<()> {
        self.sent.lock().push(Sent::ServerTransaction(key.clone()));
        Ok(())
    }

    fn send_response(&self, key: &TransactionKey, response: Response) -> DialogResult<()> {
        self.sent.lock().push(Sent::Response(key.clone(), response));
        Ok(())
    }

    fn respond_stateless(&self, _request: &Request, response: Response) -> DialogResult<()> {
        self.sent.lock().push(Sent::StatelessResponse(response));
        Ok(())
    }
}

pub fn user_agent(config: DialogConfig) -> (Arc<UserAgent>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let ua = UserAgent::new(config, transport.clone()).unwrap();
    (Arc::new(ua), transport)
}

pub fn addr(text: &str) -> Address {
    text.parse().unwrap()
}

pub fn alice() -> Address {
    addr("\"Alice\" <sip:alice@atlanta.example.com>")
}

pub fn bob() -> Address {
    addr("<sip:bob@biloxi.example.com>")
}

/// INVITE from Bob to Alice as it arrives at Alice's user agent
pub fn incoming_invite(call_id: &str, from_tag: &str, cseq: u32) -> Request {
    Request::new(Method::Invite, "sip:alice@atlanta.example.com".parse().unwrap())
        .with_header(TypedHeader::Via("SIP/2.0/UDP 192.0.2.4;branch=z9hG4bK776asdhds".into()))
        .with_header(TypedHeader::MaxForwards(70))
        .with_header(TypedHeader::From(bob().with_tag(from_tag)))
        .with_header(TypedHeader::To(alice()))
        .with_header(TypedHeader::CallId(CallId::new(call_id)))
        .with_header(TypedHeader::CSeq(CSeq::new(cseq, Method::Invite)))
        .with_header(TypedHeader::Contact(addr("<sip:bob@192.0.2.4>")))
        .with_header(TypedHeader::RecordRoute(addr("<sip:p1.example.com;lr>")))
        .with_header(TypedHeader::RecordRoute(addr("<sip:p2.example.com;lr>")))
}

/// Request the remote party of `dialog` sends within it
pub fn remote_request(dialog: &Dialog, method: Method, cseq: u32) -> Request {
    let local = dialog.local();
    let remote = dialog.remote();
    Request::new(method.clone(), local.info.uri.clone())
        .with_header(TypedHeader::Via("SIP/2.0/UDP 192.0.2.4;branch=z9hG4bKnashds7".into()))
        .with_header(TypedHeader::From(remote.info))
        .with_header(TypedHeader::To(local.info))
        .with_header(TypedHeader::CallId(CallId::new(dialog.call_id())))
        .with_header(TypedHeader::CSeq(CSeq::new(cseq, method)))
}

/// Response the peer sends to `request`, tagged with `to_tag`
pub fn peer_response(request: &Request, status: u16, to_tag: &str) -> Response {
    let mut response = Response::from_request(request, StatusCode::from_u16(status).unwrap());
    if let Some(to) = response.to_mut() {
        to.set_tag(to_tag);
    }
    response
}

pub fn sdp(text: &str) -> SdpSession {
    SdpSession::from_str(&text.replace('\n', "\r\n")).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
