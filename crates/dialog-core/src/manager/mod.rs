//! User agent: the dialog registry
//!
//! ```text
//! transport / transaction layer
//!      ↓ Request, Response, transaction state
//! UserAgent  ← routes by (Call-ID, local tag) and remote tag
//!      ↓
//! Dialog → usages (INVITE session, ...)
//! ```

pub mod user_agent;

pub use user_agent::UserAgent;
