//! Dialog registry and message routing
//!
//! Dialogs that share a Call-ID and local tag form a dialog set: the
//! original dialog plus any forks created by responses with new To tags.
//! Sets are keyed by `(Call-ID, local tag)`; within a set dialogs are told
//! apart by remote tag.
//!
//! Registry guards are never held while a dialog runs, since dialogs call
//! back into the registry to bind transactions and to unregister.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use sipneg_sip_core::{HeaderAccess, Method, Request, Response, StatusCode};

use crate::config::DialogConfig;
use crate::dialog::{Dialog, DialogId};
use crate::errors::{DialogError, DialogResult};
use crate::events::DialogEvent;
use crate::transaction::{ClientAuth, TransactionKey, TransactionLayer, TransactionState};

type DialogSetKey = (String, String);

/// Registry of dialogs for one SIP endpoint
pub struct UserAgent {
    config: DialogConfig,
    transport: Arc<dyn TransactionLayer>,
    client_auth: Option<Arc<dyn ClientAuth>>,
    event_tx: Option<mpsc::UnboundedSender<DialogEvent>>,
    dialog_sets: DashMap<DialogSetKey, Vec<Arc<Dialog>>>,
    transactions: DashMap<TransactionKey, Weak<Dialog>>,
    /// Forks created by responses to a client transaction, keyed by it
    forks: DashMap<TransactionKey, Vec<Weak<Dialog>>>,
}

impl UserAgent {
    pub fn new(config: DialogConfig, transport: Arc<dyn TransactionLayer>) -> DialogResult<Self> {
        config.validate().map_err(DialogError::config_error)?;
        Ok(Self {
            config,
            transport,
            client_auth: None,
            event_tx: None,
            dialog_sets: DashMap::new(),
            transactions: DashMap::new(),
            forks: DashMap::new(),
        })
    }

    /// Deliver [`DialogEvent`]s to `tx`
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<DialogEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Authenticate requests created by dialogs
    pub fn with_client_auth(mut self, auth: Arc<dyn ClientAuth>) -> Self {
        self.client_auth = Some(auth);
        self
    }

    pub fn config(&self) -> &DialogConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<dyn TransactionLayer> {
        &self.transport
    }

    pub(crate) fn client_auth(&self) -> Option<&Arc<dyn ClientAuth>> {
        self.client_auth.as_ref()
    }

    pub(crate) fn emit(&self, event: DialogEvent) {
        if let Some(tx) = &self.event_tx {
            if tx.send(event).is_err() {
                trace!("Dialog event receiver dropped");
            }
        }
    }

    pub(crate) fn register_dialog(&self, dialog: &Arc<Dialog>) {
        let key = (dialog.call_id().to_string(), dialog.local_tag().to_string());
        self.dialog_sets.entry(key).or_default().push(dialog.clone());
    }

    /// Remove `dialog` and every transaction binding that points at it
    pub(crate) fn unregister_dialog(&self, dialog: &Dialog) {
        let key = (dialog.call_id().to_string(), dialog.local_tag().to_string());
        let target: *const Dialog = dialog;

        let now_empty = match self.dialog_sets.get_mut(&key) {
            Some(mut set) => {
                set.retain(|d| !std::ptr::eq(Arc::as_ptr(d), target));
                set.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.dialog_sets.remove_if(&key, |_, set| set.is_empty());
        }
        self.transactions.retain(|_, bound| !std::ptr::eq(bound.as_ptr(), target));
        self.forks.retain(|_, forks| {
            forks.retain(|fork| !std::ptr::eq(fork.as_ptr(), target));
            !forks.is_empty()
        });
    }

    pub(crate) fn bind_transaction(&self, key: TransactionKey, dialog: Weak<Dialog>) {
        trace!(transaction = %key, "Transaction bound to dialog");
        self.transactions.insert(key, dialog);
    }

    pub(crate) fn unbind_transaction(&self, key: &TransactionKey) {
        self.transactions.remove(key);
    }

    pub(crate) fn bind_fork(&self, key: TransactionKey, fork: Weak<Dialog>) {
        trace!(transaction = %key, "Fork bound to client transaction");
        self.forks.entry(key).or_default().push(fork);
    }

    fn dialog_set(&self, call_id: &str, local_tag: &str) -> Vec<Arc<Dialog>> {
        self.dialog_sets
            .get(&(call_id.to_string(), local_tag.to_string()))
            .map(|set| set.clone())
            .unwrap_or_default()
    }

    /// Number of registered dialogs, forks included
    pub fn dialog_count(&self) -> usize {
        self.dialog_sets.iter().map(|set| set.len()).sum()
    }

    pub fn find_dialog(&self, id: &DialogId) -> Option<Arc<Dialog>> {
        self.dialog_set(&id.call_id, &id.local_tag)
            .into_iter()
            .find(|d| d.remote_tag() == id.remote_tag)
    }

    /// Route an incoming in-dialog request
    ///
    /// Returns `false` for requests without a To tag, which belong to no
    /// dialog yet. Requests for unknown dialogs are answered with a stateless
    /// 481 (ACK is dropped) and reported as consumed.
    pub fn on_rx_request(&self, request: &Request) -> DialogResult<bool> {
        let Some(local_tag) = request.to().and_then(|to| to.tag()) else {
            return Ok(false);
        };
        let call_id = request
            .call_id()
            .ok_or_else(|| DialogError::protocol_error("request has no Call-ID"))?;
        let remote_tag = request.from().and_then(|from| from.tag()).map(str::to_string);

        let dialog = self
            .dialog_set(call_id.as_str(), local_tag)
            .into_iter()
            .find(|d| d.remote_tag() == remote_tag);

        match dialog {
            Some(dialog) => {
                dialog.on_rx_request(request)?;
                Ok(true)
            }
            None if request.method == Method::Ack => {
                debug!(request = %request.info(), "ACK for unknown dialog dropped");
                Ok(false)
            }
            None => {
                warn!(request = %request.info(), call_id = %call_id, "Request for unknown dialog, answering 481");
                let response =
                    Response::from_request(request, StatusCode::CALL_OR_TRANSACTION_DOES_NOT_EXIST);
                self.transport.respond_stateless(request, response)?;
                Ok(true)
            }
        }
    }

    /// Route a response to the dialog that sent the request
    ///
    /// A 101-299 response to a dialog-creating request whose To tag matches
    /// no dialog in the set forks the first dialog. Returns `false` when no
    /// dialog set matches.
    pub fn on_rx_response(&self, response: &Response) -> DialogResult<bool> {
        let Some(local_tag) = response.from().and_then(|from| from.tag()) else {
            return Ok(false);
        };
        let call_id = response
            .call_id()
            .ok_or_else(|| DialogError::protocol_error("response has no Call-ID"))?;
        let set = self.dialog_set(call_id.as_str(), local_tag);
        let Some(first) = set.first().cloned() else {
            debug!(status = %response.status(), call_id = %call_id, "Response for unknown dialog set");
            return Ok(false);
        };

        let remote_tag = response.to().and_then(|to| to.tag()).map(str::to_string);
        let dialog = match set.iter().find(|d| remote_tag.is_some() && d.remote_tag() == remote_tag) {
            Some(dialog) => dialog.clone(),
            None => match set.iter().find(|d| d.remote_tag().is_none()) {
                Some(unbound) => unbound.clone(),
                None => {
                    let code = response.status().as_u16();
                    let creates_dialog = response
                        .cseq()
                        .is_some_and(|cseq| cseq.method.creates_dialog());
                    if remote_tag.is_some() && creates_dialog && (101..300).contains(&code) {
                        Dialog::fork(&first, response)?
                    } else {
                        first
                    }
                }
            },
        };

        dialog.on_rx_response(response)?;
        Ok(true)
    }

    /// Forward a transaction state change to the dialog bound to `key`
    /// and to every fork its responses created
    ///
    /// Returns `false` when no live dialog is bound.
    pub fn on_tsx_state(&self, key: &TransactionKey, state: TransactionState) -> bool {
        let dialog = self.transactions.get(key).and_then(|bound| bound.upgrade());
        let forks: Vec<Arc<Dialog>> = if state == TransactionState::Terminated {
            self.unbind_transaction(key);
            self.forks.remove(key).map(|(_, forks)| forks).unwrap_or_default()
        } else {
            self.forks.get(key).map(|forks| forks.clone()).unwrap_or_default()
        }
        .iter()
        .filter_map(Weak::upgrade)
        .collect();

        let delivered = dialog.is_some() || !forks.is_empty();
        if let Some(dialog) = dialog {
            dialog.on_tsx_state(key, state);
        }
        for fork in forks {
            fork.on_tsx_state(key, state);
        }
        delivered
    }

    /// Drop every dialog and transaction binding
    pub fn shutdown(&self) {
        debug!(dialogs = self.dialog_count(), "User agent shutting down");
        self.dialog_sets.clear();
        self.transactions.clear();
        self.forks.clear();
    }
}

impl std::fmt::Debug for UserAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAgent")
            .field("dialogs", &self.dialog_count())
            .field("transactions", &self.transactions.len())
            .finish_non_exhaustive()
    }
}
