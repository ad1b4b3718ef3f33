//! Subsystem modules for the chat relay.

pub mod chat;
pub mod comms;
pub mod memory;
