//! Memory subsystem: process-local conversation histories.
//!
//! Nothing here touches disk: every session lives in the [`SessionStore`]
//! owned by the chat service and is discarded when the process exits.

mod session_store;

pub use session_store::{SessionGuard, SessionStore};
