//! Fixtures for driving INVITE sessions over a recording transaction layer

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use sipneg_dialog_core::prelude::*;
use sipneg_session_core::prelude::*;
use sipneg_sip_core::sdp_prelude::{SdpSession, CONTENT_TYPE_SDP};
use sipneg_sip_core::{Address, CSeq, CallId, HeaderAccess, Method, Request, Response, StatusCode, TypedHeader};

#[derive(Debug, Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<Request>>,
    responses: Mutex<Vec<Response>>,
}

impl RecordingTransport {
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    pub fn responses(&self) -> Vec<Response> {
        self.responses.lock().clone()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.requests.lock().last().cloned()
    }

    pub fn last_response(&self) -> Option<Response> {
        self.responses.lock().last().cloned()
    }
}

impl TransactionLayer for RecordingTransport {
    fn send_request_stateful(&self, _key: &TransactionKey, request: Request) -> DialogResult<()> {
        self.requests.lock().push(request);
        Ok(())
    }

    fn send_request_stateless(&self, request: Request) -> DialogResult<()> {
        self.requests.lock().push(request);
        Ok(())
    }

    fn create_server_transaction(&self, _key: &TransactionKey, _request: &Request) -> DialogResult<()> {
        Ok(())
    }

    fn send_response(&self, _key: &TransactionKey, response: Response) -> DialogResult<()> {
        self.responses.lock().push(response);
        Ok(())
    }

    fn respond_stateless(&self, _request: &Request, response: Response) -> DialogResult<()> {
        self.responses.lock().push(response);
        Ok(())
    }
}

pub fn user_agent() -> (Arc<UserAgent>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let ua = UserAgent::new(DialogConfig::default(), transport.clone()).unwrap();
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

pub fn sdp(text: &str) -> SdpSession {
    text.replace('\n', "\r\n").parse().unwrap()
}

/// SDP body of a message, if it has one
pub fn body_sdp(body: &[u8]) -> Option<SdpSession> {
    if body.is_empty() {
        return None;
    }
    Some(std::str::from_utf8(body).unwrap().parse().unwrap())
}

/// INVITE from Bob arriving at Alice, optionally carrying an offer
pub fn incoming_invite(call_id: &str, offer: Option<&SdpSession>) -> Request {
    let mut invite = Request::new(Method::Invite, "sip:alice@atlanta.example.com".parse().unwrap())
        .with_header(TypedHeader::Via("SIP/2.0/UDP 192.0.2.4;branch=z9hG4bK776asdhds".into()))
        .with_header(TypedHeader::MaxForwards(70))
        .with_header(TypedHeader::From(bob().with_tag("bob-tag")))
        .with_header(TypedHeader::To(alice()))
        .with_header(TypedHeader::CallId(CallId::new(call_id)))
        .with_header(TypedHeader::CSeq(CSeq::new(1, Method::Invite)))
        .with_header(TypedHeader::Contact(addr("<sip:bob@192.0.2.4>")));
    if let Some(offer) = offer {
        invite.set_body(CONTENT_TYPE_SDP, offer.to_bytes());
    }
    invite
}

/// Request the remote party of `dialog` sends within it
pub fn remote_request(dialog: &Dialog, method: Method, cseq: u32, body: Option<&SdpSession>) -> Request {
    let local = dialog.local();
    let remote = dialog.remote();
    let mut request = Request::new(method.clone(), local.info.uri.clone())
        .with_header(TypedHeader::Via("SIP/2.0/UDP 192.0.2.4;branch=z9hG4bKnashds7".into()))
        .with_header(TypedHeader::From(remote.info))
        .with_header(TypedHeader::To(local.info))
        .with_header(TypedHeader::CallId(CallId::new(dialog.call_id())))
        .with_header(TypedHeader::CSeq(CSeq::new(cseq, method)));
    if let Some(body) = body {
        request.set_body(CONTENT_TYPE_SDP, body.to_bytes());
    }
    request
}

/// Response the peer sends to `request`, tagged with `to_tag`
pub fn peer_response(request: &Request, status: u16, to_tag: &str, body: Option<&SdpSession>) -> Response {
    let mut response = Response::from_request(request, StatusCode::from_u16(status).unwrap())
        .with_header(TypedHeader::Contact(addr("<sip:bob@192.0.2.4>")));
    if let Some(to) = response.to_mut() {
        to.set_tag(to_tag);
    }
    if let Some(body) = body {
        response.set_body(CONTENT_TYPE_SDP, body.to_bytes());
    }
    response
}

/// Record every SDP pair the session hands to its media channel
pub fn record_media(session: &InviteSession) -> Arc<Mutex<Vec<(SdpSession, SdpSession)>>> {
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    session.set_media_channel(Arc::new(move |local: &SdpSession, remote: &SdpSession| {
        sink.lock().push((local.clone(), remote.clone()));
    }));
    updates
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
