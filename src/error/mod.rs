//! Error handling
//!
//! Defines error types and logging helpers for the relay.

pub mod handlers;
pub mod types;

pub use types::*;
