//! Dialog usages
//!
//! A usage is a module that lives on top of a dialog, such as an INVITE
//! session or a subscription. Usages are attached with
//! [`Dialog::add_usage`](crate::dialog::Dialog::add_usage) and are called in
//! ascending priority order. Requests and responses stop at the first usage
//! that returns `true`; transaction state changes go to every usage.
//!
//! Callbacks run with the dialog lock held and may call back into the dialog.

use sipneg_sip_core::{Request, Response};

use crate::dialog::Dialog;
use crate::transaction::{TransactionKey, TransactionState};

pub trait Usage: Send + Sync {
    /// Unique name within a dialog
    fn name(&self) -> &str;

    /// Lower values are called first
    fn priority(&self) -> i32;

    /// Handle an in-dialog request; return `true` when consumed
    fn on_rx_request(&self, _dialog: &Dialog, _request: &Request) -> bool {
        false
    }

    /// Handle a response to a dialog request; return `true` when consumed
    fn on_rx_response(&self, _dialog: &Dialog, _response: &Response) -> bool {
        false
    }

    /// Observe a transaction state change
    fn on_tsx_state(&self, _dialog: &Dialog, _key: &TransactionKey, _state: TransactionState) {}
}
