//! Reply computation

/// Substring that swaps the echo for the canned reply. Case-sensitive.
pub const TRIGGER: &str = "JJ";

/// Reply sent for any message containing [`TRIGGER`].
pub const CANNED_REPLY: &str = "Abbe kiska naam ledia bhai";

/// Computes the reply for one inbound message.
///
/// Messages containing [`TRIGGER`] anywhere get [`CANNED_REPLY`]; everything
/// else is echoed back unchanged.
pub fn transform(message: &str) -> String {
    if message.contains(TRIGGER) {
        CANNED_REPLY.to_string()
    } else {
        message.to_string()
    }
}
