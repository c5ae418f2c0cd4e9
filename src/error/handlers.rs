//! Error handlers
//!
//! Central place deciding how failures are reported.

use log::{error, info, warn};

use crate::connection::{CloseReason, ConnectionId};
use crate::error::types::{HandshakeError, RelayError};

/// Handle a process-level relay error
pub fn handle_error(err: &RelayError) {
    error!("Relay error: {}", err);
}

/// Log a refused or failed upgrade
pub fn log_handshake_failure(peer: &str, err: &HandshakeError) {
    match err {
        HandshakeError::Protocol(e) => warn!("Handshake with {} failed: {}", peer, e),
        rejected => warn!(
            "Rejected connection from {} ({}): {}",
            peer,
            rejected.status(),
            rejected
        ),
    }
}

/// Log how a connection loop ended
pub fn log_close(user_id: &str, id: ConnectionId, reason: &CloseReason) {
    match reason {
        CloseReason::PeerClosed => info!("User {} disconnected ({})", user_id, id),
        CloseReason::ReceiveFailed(e) => {
            warn!("User {} dropped ({}): receive failed: {}", user_id, id, e)
        }
        CloseReason::SendFailed(e) => {
            warn!("User {} dropped ({}): send failed: {}", user_id, id, e)
        }
    }
}
