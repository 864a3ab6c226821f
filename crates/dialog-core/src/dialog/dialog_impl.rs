//! Dialog implementation for RFC 3261 SIP dialogs
//!
//! A [`Dialog`] is always shared as `Arc<Dialog>`. All of its mutable state
//! sits behind one reentrant lock so that usage callbacks, which run while
//! the lock is held, can call straight back into the dialog to build and
//! send messages.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use parking_lot::ReentrantMutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use sipneg_sip_core::{
    Address, CSeq, CallId, HeaderAccess, Method, Request, Response, StatusCode, TypedHeader, Uri,
};

use super::dialog_id::DialogId;
use super::dialog_state::{DialogCounters, DialogRole, DialogState};
use crate::config::DialogConfig;
use crate::errors::{DialogError, DialogResult};
use crate::events::DialogEvent;
use crate::manager::UserAgent;
use crate::transaction::{TransactionKey, TransactionRole, TransactionState};
use crate::usage::Usage;

/// Local or remote side of a dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogParty {
    /// From or To value; carries the tag
    pub info: Address,
    /// Contact of this party, when known
    pub contact: Option<Address>,
    /// CSeq of the request that created the dialog
    pub first_cseq: Option<u32>,
    /// Last CSeq sent (local) or received (remote)
    pub cseq: Option<u32>,
}

impl DialogParty {
    pub fn tag(&self) -> Option<&str> {
        self.info.tag()
    }
}

struct UsageEntry {
    name: String,
    priority: i32,
    usage: Weak<dyn Usage>,
}

struct DialogInner {
    local: DialogParty,
    remote: DialogParty,
    target: Uri,
    route_set: Vec<Address>,
    role: DialogRole,
    state: DialogState,
    established: bool,
    usages: Vec<UsageEntry>,
    counters: DialogCounters,
}

/// A SIP dialog as defined in RFC 3261
pub struct Dialog {
    me: Weak<Dialog>,
    ua: Weak<UserAgent>,
    config: DialogConfig,
    call_id: String,
    local_tag: String,
    destroyed: AtomicBool,
    inner: ReentrantMutex<RefCell<DialogInner>>,
}

fn generate_tag() -> String {
    format!("{:016x}", rand::random::<u64>())
}

fn initial_cseq() -> u32 {
    rand::thread_rng().gen_range(0..0x8000_0000u32)
}

fn is_early_or_success(code: u16) -> bool {
    (101..300).contains(&code)
}

impl Dialog {
    fn build(ua: &Arc<UserAgent>, call_id: String, inner: DialogInner) -> Arc<Dialog> {
        let local_tag = inner.local.tag().unwrap_or_default().to_string();
        Arc::new_cyclic(|me| Dialog {
            me: me.clone(),
            ua: Arc::downgrade(ua),
            config: ua.config().clone(),
            call_id,
            local_tag,
            destroyed: AtomicBool::new(false),
            inner: ReentrantMutex::new(RefCell::new(inner)),
        })
    }

    fn register(self: &Arc<Self>, ua: &UserAgent) {
        ua.register_dialog(self);
        let role = self.role();
        info!(dialog = %self.id(), ?role, "Dialog created");
        ua.emit(DialogEvent::Created { dialog_id: self.id(), role });
    }

    /// Create a dialog for an outgoing dialog-creating request
    ///
    /// `target` defaults to the remote URI. The Call-ID, local tag and
    /// initial CSeq are generated here.
    pub fn create_uac(
        ua: &Arc<UserAgent>,
        local_uri: Address,
        local_contact: Option<Address>,
        remote_uri: Address,
        target: Option<Uri>,
    ) -> DialogResult<Arc<Dialog>> {
        let call_id = format!("{}@{}", Uuid::new_v4().simple(), local_uri.uri.host);
        let contact = local_contact.unwrap_or_else(|| Address::new(local_uri.uri.clone()));

        let mut remote_info = remote_uri;
        remote_info.clear_tag();
        let target = target.unwrap_or_else(|| remote_info.uri.clone());

        let inner = DialogInner {
            local: DialogParty {
                info: local_uri.with_tag(generate_tag()),
                contact: Some(contact),
                first_cseq: None,
                cseq: Some(initial_cseq()),
            },
            remote: DialogParty {
                info: remote_info,
                contact: None,
                first_cseq: None,
                cseq: None,
            },
            target,
            route_set: Vec::new(),
            role: DialogRole::Uac,
            state: DialogState::Null,
            established: false,
            usages: Vec::new(),
            counters: DialogCounters::default(),
        };

        let dialog = Dialog::build(ua, call_id, inner);
        dialog.register(ua);
        Ok(dialog)
    }

    /// Create a dialog from an incoming dialog-creating request
    ///
    /// The request must not carry a To tag and must have a Contact. The
    /// server transaction for the request is created and bound to the new
    /// dialog.
    pub fn create_uas(
        ua: &Arc<UserAgent>,
        request: &Request,
        local_contact: Option<Address>,
    ) -> DialogResult<Arc<Dialog>> {
        if !request.method.creates_dialog() {
            return Err(DialogError::invalid_request(format!(
                "{} does not create a dialog",
                request.method
            )));
        }
        let to = request
            .to()
            .ok_or_else(|| DialogError::protocol_error("request has no To header"))?;
        if to.tag().is_some() {
            return Err(DialogError::invalid_request("To header already has a tag"));
        }
        let from = request
            .from()
            .ok_or_else(|| DialogError::protocol_error("request has no From header"))?;
        let call_id = request
            .call_id()
            .ok_or_else(|| DialogError::protocol_error("request has no Call-ID"))?;
        let cseq = request
            .cseq()
            .ok_or_else(|| DialogError::protocol_error("request has no CSeq"))?;
        let remote_contact = request
            .contacts()
            .first()
            .map(|c| (*c).clone())
            .ok_or(DialogError::MissingContact)?;

        let contact = local_contact.unwrap_or_else(|| Address::new(to.uri.clone()));
        let inner = DialogInner {
            local: DialogParty {
                info: to.clone().with_tag(generate_tag()),
                contact: Some(contact),
                first_cseq: None,
                cseq: Some(initial_cseq()),
            },
            remote: DialogParty {
                info: from.clone(),
                contact: Some(remote_contact.clone()),
                first_cseq: Some(cseq.seq),
                cseq: Some(cseq.seq),
            },
            target: remote_contact.uri,
            route_set: request.record_routes().into_iter().cloned().collect(),
            role: DialogRole::Uas,
            state: DialogState::Null,
            established: false,
            usages: Vec::new(),
            counters: DialogCounters::default(),
        };

        let key = TransactionKey::from_request(request, TransactionRole::Server)?;
        ua.transport().create_server_transaction(&key, request)?;

        let dialog = Dialog::build(ua, call_id.as_str().to_string(), inner);
        ua.bind_transaction(key, Arc::downgrade(&dialog));
        {
            let guard = dialog.inner.lock();
            guard.borrow_mut().counters.transactions = 1;
        }
        dialog.register(ua);
        Ok(dialog)
    }

    /// Create a sibling of `first` for a response carrying a new To tag
    ///
    /// The fork counts the client transaction that produced `response` and
    /// is destroyed once that transaction terminates with nothing else
    /// holding it open.
    pub fn fork(first: &Arc<Dialog>, response: &Response) -> DialogResult<Arc<Dialog>> {
        let ua = first.user_agent()?;
        let tag = response
            .to()
            .and_then(|to| to.tag())
            .ok_or_else(|| DialogError::protocol_error("forked response has no To tag"))?;
        let tsx_key = TransactionKey::from_response(response)?;

        let inner = {
            let guard = first.inner.lock();
            let parent = guard.borrow();
            let mut remote_info = parent.remote.info.clone();
            remote_info.set_tag(tag.to_string());
            DialogInner {
                local: parent.local.clone(),
                remote: DialogParty {
                    info: remote_info,
                    contact: None,
                    first_cseq: None,
                    cseq: None,
                },
                target: parent.target.clone(),
                route_set: parent.route_set.clone(),
                role: DialogRole::Uac,
                state: DialogState::Null,
                established: false,
                usages: Vec::new(),
                counters: DialogCounters {
                    sessions: 0,
                    transactions: 1,
                },
            }
        };

        let dialog = Dialog::build(&ua, first.call_id.clone(), inner);
        ua.register_dialog(&dialog);
        ua.bind_fork(tsx_key, Arc::downgrade(&dialog));
        info!(original = %first.id(), forked = %dialog.id(), "Dialog forked");
        ua.emit(DialogEvent::Forked {
            original: first.id(),
            forked: dialog.id(),
        });
        Ok(dialog)
    }

    fn user_agent(&self) -> DialogResult<Arc<UserAgent>> {
        self.ua.upgrade().ok_or(DialogError::UserAgentGone)
    }

    /// Run `f` while holding the dialog lock
    ///
    /// Everything `f` does to this dialog is serialized against incoming
    /// messages and other threads.
    pub fn with_lock<R>(&self, f: impl FnOnce(&Dialog) -> R) -> R {
        let _guard = self.inner.lock();
        f(self)
    }

    pub fn id(&self) -> DialogId {
        DialogId::new(self.call_id.clone(), self.local_tag.clone(), self.remote_tag())
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn local_tag(&self) -> &str {
        &self.local_tag
    }

    pub fn remote_tag(&self) -> Option<String> {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.remote.tag().map(str::to_string)
    }

    pub fn local(&self) -> DialogParty {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.local.clone()
    }

    pub fn remote(&self) -> DialogParty {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.remote.clone()
    }

    /// Last CSeq used for a local request
    pub fn local_cseq(&self) -> u32 {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.local.cseq.unwrap_or_default()
    }

    pub fn remote_cseq(&self) -> Option<u32> {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.remote.cseq
    }

    pub fn route_set(&self) -> Vec<Address> {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.route_set.clone()
    }

    /// Replace the route set
    pub fn set_route_set(&self, routes: Vec<Address>) {
        let guard = self.inner.lock();
        guard.borrow_mut().route_set = routes;
    }

    /// Request-URI for requests sent in this dialog
    pub fn target(&self) -> Uri {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.target.clone()
    }

    pub fn role(&self) -> DialogRole {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.role
    }

    pub fn state(&self) -> DialogState {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.state
    }

    pub fn is_established(&self) -> bool {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.established
    }

    pub fn counters(&self) -> DialogCounters {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.counters
    }

    pub fn usage_count(&self) -> usize {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner.usages.len()
    }

    /// Attach a usage; usages are kept in ascending priority order and
    /// equal priorities keep insertion order
    pub fn add_usage(&self, usage: &Arc<dyn Usage>) -> DialogResult<()> {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        let name = usage.name().to_string();
        if inner.usages.iter().any(|entry| entry.name == name) {
            return Err(DialogError::UsageExists { name });
        }
        let priority = usage.priority();
        let pos = inner
            .usages
            .iter()
            .position(|entry| entry.priority > priority)
            .unwrap_or(inner.usages.len());
        debug!(dialog = %self.call_id, usage = %name, priority, "Usage added");
        inner.usages.insert(
            pos,
            UsageEntry {
                name,
                priority,
                usage: Arc::downgrade(usage),
            },
        );
        Ok(())
    }

    /// Detach a usage by name; returns whether it was attached
    pub fn remove_usage(&self, name: &str) -> bool {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        let before = inner.usages.len();
        inner.usages.retain(|entry| entry.name != name);
        inner.usages.len() != before
    }

    fn live_usages(&self) -> Vec<Arc<dyn Usage>> {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        inner
            .usages
            .iter()
            .filter_map(|entry| entry.usage.upgrade())
            .collect()
    }

    pub fn inc_session(&self) {
        let guard = self.inner.lock();
        guard.borrow_mut().counters.sessions += 1;
    }

    /// Release a session hold; the dialog is destroyed once nothing holds it
    pub fn dec_session(&self) {
        let guard = self.inner.lock();
        {
            let mut inner = guard.borrow_mut();
            inner.counters.sessions = inner.counters.sessions.saturating_sub(1);
        }
        self.maybe_destroy();
    }

    /// Destroy the dialog when no session or transaction holds it
    pub fn maybe_destroy(&self) {
        let guard = self.inner.lock();
        let idle = guard.borrow().counters.is_idle();
        if idle {
            self.destroy();
        }
    }

    fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        let guard = self.inner.lock();
        guard.borrow_mut().state = DialogState::Terminated;
        let dialog_id = self.id();
        info!(dialog = %dialog_id, "Dialog destroyed");
        if let Some(ua) = self.ua.upgrade() {
            ua.unregister_dialog(self);
            ua.emit(DialogEvent::Terminated { dialog_id });
        }
    }

    /// Build an in-dialog request
    ///
    /// The CSeq is `cseq` when given (ACK and CANCEL reuse the INVITE's),
    /// otherwise one past the last local CSeq. The local CSeq itself only
    /// advances when the request is sent.
    pub fn create_request(&self, method: Method, cseq: Option<u32>) -> DialogResult<Request> {
        let guard = self.inner.lock();
        let ua = self.user_agent()?;
        let mut request = {
            let inner = guard.borrow();
            let seq = cseq.unwrap_or_else(|| inner.local.cseq.unwrap_or_default().wrapping_add(1));

            let mut request = Request::new(method.clone(), inner.target.clone())
                .with_header(TypedHeader::MaxForwards(self.config.max_forwards))
                .with_header(TypedHeader::From(inner.local.info.clone()))
                .with_header(TypedHeader::To(inner.remote.info.clone()))
                .with_header(TypedHeader::CallId(CallId::new(self.call_id.clone())))
                .with_header(TypedHeader::CSeq(CSeq::new(seq, method.clone())));
            if method.creates_dialog() {
                if let Some(contact) = &inner.local.contact {
                    request.push_header(TypedHeader::Contact(contact.clone()));
                }
            }
            for route in &inner.route_set {
                request.push_header(TypedHeader::Route(route.clone()));
            }
            if let Some(user_agent) = &self.config.user_agent {
                request.push_header(TypedHeader::UserAgent(user_agent.clone()));
            }
            request
        };

        if !matches!(method, Method::Ack | Method::Cancel) {
            if let Some(auth) = ua.client_auth() {
                auth.init_request(&mut request)?;
            }
        }
        trace!(dialog = %self.call_id, request = %request.info(), "Request created");
        Ok(request)
    }

    /// Send a request built by [`Dialog::create_request`]
    ///
    /// ACK goes out without a transaction and returns `None`. Every other
    /// method gets a client transaction bound to this dialog.
    pub fn send_request(&self, request: Request) -> DialogResult<Option<TransactionKey>> {
        let guard = self.inner.lock();
        let ua = self.user_agent()?;
        let cseq = request
            .cseq()
            .ok_or_else(|| DialogError::protocol_error("request has no CSeq"))?
            .seq;

        if request.method == Method::Ack {
            debug!(dialog = %self.call_id, request = %request.info(), "Sending ACK");
            ua.transport().send_request_stateless(request)?;
            return Ok(None);
        }

        if request.method != Method::Cancel {
            let mut inner = guard.borrow_mut();
            inner.local.cseq = Some(cseq);
            if inner.local.first_cseq.is_none() {
                inner.local.first_cseq = Some(cseq);
            }
        }

        let key = TransactionKey::from_request(&request, TransactionRole::Client)?;
        ua.bind_transaction(key.clone(), self.me.clone());
        guard.borrow_mut().counters.transactions += 1;

        debug!(dialog = %self.call_id, request = %request.info(), "Sending request");
        if let Err(e) = ua.transport().send_request_stateful(&key, request) {
            warn!(dialog = %self.call_id, error = %e, "Failed to send request");
            {
                let mut inner = guard.borrow_mut();
                inner.counters.transactions = inner.counters.transactions.saturating_sub(1);
            }
            ua.unbind_transaction(&key);
            return Err(e);
        }
        Ok(Some(key))
    }

    /// Build a response to a request received in this dialog
    pub fn create_response(
        &self,
        request: &Request,
        status: StatusCode,
        reason: Option<&str>,
    ) -> DialogResult<Response> {
        let guard = self.inner.lock();
        let inner = guard.borrow();

        let mut response = Response::from_request(request, status);
        if let Some(reason) = reason {
            response.reason = reason.to_string();
        }

        let code = status.as_u16();
        if code != 100 {
            if let Some(to) = response.to_mut() {
                if to.tag().is_none() {
                    to.set_tag(self.local_tag.clone());
                }
            }
        }

        let creates_dialog = request.method.creates_dialog();
        let seq = request.cseq().map(|c| c.seq);
        if creates_dialog && is_early_or_success(code) && seq.is_some() && seq == inner.remote.first_cseq {
            for record_route in request.record_routes() {
                response.push_header(TypedHeader::RecordRoute(record_route.clone()));
            }
        }

        if creates_dialog && ((101..400).contains(&code) || status == StatusCode::AMBIGUOUS) {
            if let Some(contact) = &inner.local.contact {
                response.push_header(TypedHeader::Contact(contact.clone()));
            }
        }

        Ok(response)
    }

    /// Send a response through the request's server transaction
    ///
    /// A 101-299 response to the initial request establishes a UAS dialog.
    pub fn send_response(&self, request: &Request, response: Response) -> DialogResult<()> {
        let guard = self.inner.lock();
        let ua = self.user_agent()?;
        let key = TransactionKey::from_request(request, TransactionRole::Server)?;
        let code = response.status().as_u16();

        debug!(dialog = %self.call_id, status = code, request = %request.info(), "Sending response");
        ua.transport().send_response(&key, response)?;

        let established = {
            let mut inner = guard.borrow_mut();
            let seq = request.cseq().map(|c| c.seq);
            let initial = request.method.creates_dialog() && seq.is_some() && seq == inner.remote.first_cseq;
            if inner.role == DialogRole::Uas && !inner.established && initial && is_early_or_success(code) {
                inner.established = true;
                inner.state = DialogState::Established;
                true
            } else {
                false
            }
        };
        if established {
            info!(dialog = %self.id(), "Dialog established");
            ua.emit(DialogEvent::Established { dialog_id: self.id() });
        }
        Ok(())
    }

    /// Create and send a response, optionally with a body
    pub fn respond(
        &self,
        request: &Request,
        status: StatusCode,
        body: Option<(&str, Bytes)>,
    ) -> DialogResult<()> {
        let _guard = self.inner.lock();
        let mut response = self.create_response(request, status, None)?;
        if let Some((content_type, body)) = body {
            response.set_body(content_type, body);
        }
        self.send_response(request, response)
    }

    /// Handle a request routed to this dialog
    ///
    /// Returns whether a usage consumed the request.
    pub fn on_rx_request(&self, request: &Request) -> DialogResult<bool> {
        let guard = self.inner.lock();
        let ua = self.user_agent()?;
        let cseq = request
            .cseq()
            .ok_or_else(|| DialogError::protocol_error("request has no CSeq"))?
            .seq;
        let exempt = matches!(request.method, Method::Ack | Method::Cancel);

        {
            let mut inner = guard.borrow_mut();
            if !exempt {
                if inner.remote.cseq.is_some_and(|seen| cseq <= seen) {
                    drop(inner);
                    warn!(dialog = %self.call_id, request = %request.info(), "Stale CSeq, answering 500");
                    let response = Response::from_request(request, StatusCode::SERVER_INTERNAL_ERROR)
                        .with_reason("Invalid CSeq");
                    ua.transport().respond_stateless(request, response)?;
                    return Ok(true);
                }
                inner.remote.cseq = Some(cseq);
            }
            if request.method.creates_dialog() {
                if let Some(contact) = request.contacts().first() {
                    inner.target = contact.uri.clone();
                    inner.remote.contact = Some((*contact).clone());
                }
            }
        }

        if request.method != Method::Ack {
            let key = TransactionKey::from_request(request, TransactionRole::Server)?;
            ua.transport().create_server_transaction(&key, request)?;
            ua.bind_transaction(key, self.me.clone());
            guard.borrow_mut().counters.transactions += 1;
        }

        let handled = self
            .live_usages()
            .iter()
            .any(|usage| usage.on_rx_request(self, request));

        if !handled {
            debug!(dialog = %self.call_id, request = %request.info(), "Request not handled by any usage");
            if request.method != Method::Ack && self.config.auto_respond_500 {
                let response = self.create_response(
                    request,
                    StatusCode::SERVER_INTERNAL_ERROR,
                    Some("Unhandled by dialog usages"),
                )?;
                self.send_response(request, response)?;
            }
        }
        Ok(handled)
    }

    /// Handle a response to a request sent in this dialog
    ///
    /// Returns whether a usage consumed the response.
    pub fn on_rx_response(&self, response: &Response) -> DialogResult<bool> {
        let guard = self.inner.lock();
        let ua = self.user_agent()?;
        let cseq = response
            .cseq()
            .ok_or_else(|| DialogError::protocol_error("response has no CSeq"))?
            .clone();
        let code = response.status().as_u16();
        let creates_dialog = cseq.method.creates_dialog();
        let to_tag = response.to().and_then(|to| to.tag());
        let contact = response.contacts().first().map(|c| (*c).clone());

        let established = {
            let mut inner = guard.borrow_mut();
            let mut established = false;
            if creates_dialog && is_early_or_success(code) && !inner.established {
                if let Some(tag) = to_tag {
                    if inner.remote.tag() != Some(tag) {
                        inner.remote.info.set_tag(tag.to_string());
                    }
                    if inner.role == DialogRole::Uac {
                        inner.route_set = response.record_routes().into_iter().rev().cloned().collect();
                        if let Some(contact) = &contact {
                            inner.target = contact.uri.clone();
                            inner.remote.contact = Some(contact.clone());
                        }
                        inner.established = true;
                        inner.state = DialogState::Established;
                        established = true;
                    }
                }
            }
            if creates_dialog && response.status().is_success() {
                if let Some(contact) = &contact {
                    inner.target = contact.uri.clone();
                    inner.remote.contact = Some(contact.clone());
                }
            }
            established
        };
        if established {
            info!(dialog = %self.id(), status = code, "Dialog established");
            ua.emit(DialogEvent::Established { dialog_id: self.id() });
        }

        let handled = self
            .live_usages()
            .iter()
            .any(|usage| usage.on_rx_response(self, response));
        if !handled {
            debug!(dialog = %self.call_id, status = code, cseq = %cseq, "Response not handled by any usage");
        }
        drop(guard);
        Ok(handled)
    }

    /// Observe a state change of a transaction bound to this dialog
    pub fn on_tsx_state(&self, key: &TransactionKey, state: TransactionState) {
        let guard = self.inner.lock();
        trace!(dialog = %self.call_id, transaction = %key, ?state, "Transaction state changed");
        if state == TransactionState::Terminated {
            let mut inner = guard.borrow_mut();
            inner.counters.transactions = inner.counters.transactions.saturating_sub(1);
        }
        for usage in self.live_usages() {
            usage.on_tsx_state(self, key, state);
        }
        if state == TransactionState::Terminated {
            self.maybe_destroy();
        }
    }
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialog")
            .field("call_id", &self.call_id)
            .field("local_tag", &self.local_tag)
            .field("destroyed", &self.destroyed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
