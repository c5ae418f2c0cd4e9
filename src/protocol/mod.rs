//! Relay protocol
//!
//! The reply rule applied to every inbound message.

pub mod transform;

pub use transform::{CANNED_REPLY, TRIGGER, transform};
