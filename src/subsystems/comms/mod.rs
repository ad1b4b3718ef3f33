//! Comms subsystem: the relay's external channels.
//!
//! Only the axum HTTP channel exists today; it owns no state of its own and
//! forwards every request to the shared [`ChatService`](crate::subsystems::chat::ChatService).

pub mod axum_channel;

pub use axum_channel::{AxumChannel, AxumState, build_router};
