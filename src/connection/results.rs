//! Connection result types
//!
//! Defines how a connection loop ended.

use crate::error::ConnectionError;

/// Why a connection loop reached the Closed state
#[derive(Debug)]
pub enum CloseReason {
    /// The peer closed the connection cleanly
    PeerClosed,
    /// Reading the next message failed
    ReceiveFailed(ConnectionError),
    /// Writing a reply failed
    SendFailed(ConnectionError),
}

impl CloseReason {
    /// Returns true for a clean, peer-initiated close
    pub fn is_clean(&self) -> bool {
        matches!(self, CloseReason::PeerClosed)
    }
}
