//! Server core functionality
//!
//! Listener, accept loop and WebSocket upgrade.

pub mod core;
pub mod handshake;

pub use core::Server;
