//! Dialog events

pub mod dialog_events;

pub use dialog_events::DialogEvent;
