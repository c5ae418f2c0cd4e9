//! Connection management
//!
//! Tracks which users hold a live connection and runs the per-connection
//! receive/reply loop.

pub mod handler;
pub mod registry;
pub mod results;
pub mod transport;
pub mod websocket;

pub use handler::handle_connection;
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry};
pub use results::CloseReason;
pub use transport::{Connection, Inbound};
pub use websocket::WsConnection;
