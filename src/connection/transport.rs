//! Transport boundary
//!
//! The loop in [`handler`](super::handler) only needs a way to receive the
//! next text message, send one back, and close. Anything that frames text
//! messages over an ordered duplex stream can implement [`Connection`].

use std::future::Future;

use crate::error::ConnectionError;

/// Outcome of waiting for the next inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete text message
    Text(String),
    /// The peer closed the connection cleanly
    Disconnected,
}

/// One open, message-framed duplex session
pub trait Connection: Send {
    /// Waits for the next message. A clean close is `Ok(Inbound::Disconnected)`.
    fn receive(&mut self) -> impl Future<Output = Result<Inbound, ConnectionError>> + Send;

    /// Sends one text message.
    fn send(&mut self, text: String) -> impl Future<Output = Result<(), ConnectionError>> + Send;

    /// Closes the session. Failures are ignored, the connection is gone either way.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
