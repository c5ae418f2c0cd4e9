use log::{debug, info};

use crate::connection::registry::{ConnectionHandle, ConnectionRegistry};
use crate::connection::results::CloseReason;
use crate::connection::transport::{Connection, Inbound};
use crate::error::handlers::log_close;
use crate::protocol::transform;

/// Serves one connection until it closes.
///
/// - Registers `user_id` with `handle`, replacing any earlier entry.
/// - Answers each text message with `transform(message)`, strictly in order.
/// - On a clean close or any receive/send failure, releases the registry
///   entry (if still ours) and closes the transport.
pub async fn handle_connection<C: Connection>(
    mut conn: C,
    user_id: String,
    handle: ConnectionHandle,
    registry: ConnectionRegistry,
) -> CloseReason {
    let connection_id = handle.id();
    let peer_addr = handle.peer_addr();

    registry.register(&user_id, handle).await;
    info!(
        "User {} connected as {} from {} ({} active)",
        user_id,
        connection_id,
        peer_addr,
        registry.len().await
    );

    let reason = loop {
        let message = match conn.receive().await {
            Ok(Inbound::Text(message)) => message,
            Ok(Inbound::Disconnected) => break CloseReason::PeerClosed,
            Err(e) => break CloseReason::ReceiveFailed(e),
        };
        debug!("Received from {}: {:?}", user_id, message);

        let reply = transform(&message);
        debug!("Replying to {}: {:?}", user_id, reply);

        if let Err(e) = conn.send(reply).await {
            break CloseReason::SendFailed(e);
        }
    };

    registry.release(&user_id, connection_id).await;
    conn.close().await;
    log_close(&user_id, connection_id, &reason);

    reason
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectionError;
    use crate::protocol::CANNED_REPLY;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite;

    /// In-memory connection driven by the test through channels
    struct ChannelConnection {
        inbound: mpsc::UnboundedReceiver<Result<Inbound, ConnectionError>>,
        outbound: mpsc::UnboundedSender<String>,
        fail_sends: bool,
        closed: Arc<AtomicBool>,
    }

    struct Peer {
        to_server: mpsc::UnboundedSender<Result<Inbound, ConnectionError>>,
        from_server: mpsc::UnboundedReceiver<String>,
        closed: Arc<AtomicBool>,
    }

    impl Peer {
        fn say(&self, text: &str) {
            self.to_server.send(Ok(Inbound::Text(text.to_string()))).unwrap();
        }

        fn hang_up(&self) {
            let _ = self.to_server.send(Ok(Inbound::Disconnected));
        }

        fn fail(&self) {
            let _ = self.to_server.send(Err(broken_pipe()));
        }

        async fn reply(&mut self) -> String {
            self.from_server.recv().await.unwrap()
        }
    }

    impl Connection for ChannelConnection {
        async fn receive(&mut self) -> Result<Inbound, ConnectionError> {
            self.inbound.recv().await.unwrap_or(Ok(Inbound::Disconnected))
        }

        async fn send(&mut self, text: String) -> Result<(), ConnectionError> {
            if self.fail_sends {
                return Err(broken_pipe());
            }
            let _ = self.outbound.send(text);
            Ok(())
        }

        async fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn broken_pipe() -> ConnectionError {
        ConnectionError::Transport(tungstenite::Error::Io(io::Error::from(
            io::ErrorKind::BrokenPipe,
        )))
    }

    fn pair(fail_sends: bool) -> (ChannelConnection, Peer) {
        let (to_server, inbound) = mpsc::unbounded_channel();
        let (outbound, from_server) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let conn = ChannelConnection {
            inbound,
            outbound,
            fail_sends,
            closed: Arc::clone(&closed),
        };
        let peer = Peer {
            to_server,
            from_server,
            closed,
        };
        (conn, peer)
    }

    fn handle() -> ConnectionHandle {
        ConnectionHandle::new("127.0.0.1:40000".parse().unwrap())
    }

    #[tokio::test]
    async fn alice_scenario() {
        let registry = ConnectionRegistry::new();
        let (conn, mut peer) = pair(false);
        let task = tokio::spawn(handle_connection(
            conn,
            "alice".into(),
            handle(),
            registry.clone(),
        ));

        peer.say("JJ test");
        assert_eq!(peer.reply().await, CANNED_REPLY);
        assert!(registry.lookup("alice").await.is_some());

        peer.say("bye");
        assert_eq!(peer.reply().await, "bye");

        peer.hang_up();
        let reason = task.await.unwrap();
        assert!(reason.is_clean());
        assert!(registry.lookup("alice").await.is_none());
        assert!(peer.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn replies_preserve_message_order() {
        let registry = ConnectionRegistry::new();
        let (conn, mut peer) = pair(false);
        let task = tokio::spawn(handle_connection(conn, "u1".into(), handle(), registry));

        let messages: Vec<String> = (0..50)
            .map(|i| if i % 7 == 0 { format!("JJ {i}") } else { format!("msg {i}") })
            .collect();
        for m in &messages {
            peer.say(m);
        }
        for m in &messages {
            assert_eq!(peer.reply().await, transform(m));
        }

        peer.hang_up();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn receive_failure_closes_and_unregisters() {
        let registry = ConnectionRegistry::new();
        let (conn, mut peer) = pair(false);
        let task = tokio::spawn(handle_connection(
            conn,
            "u1".into(),
            handle(),
            registry.clone(),
        ));

        peer.say("hello");
        assert_eq!(peer.reply().await, "hello");
        peer.fail();

        let reason = task.await.unwrap();
        assert!(matches!(reason, CloseReason::ReceiveFailed(_)));
        assert!(registry.is_empty().await);
        assert!(peer.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn send_failure_closes_and_unregisters() {
        let registry = ConnectionRegistry::new();
        let (conn, peer) = pair(true);
        let task = tokio::spawn(handle_connection(
            conn,
            "u1".into(),
            handle(),
            registry.clone(),
        ));

        peer.say("hello");
        let reason = task.await.unwrap();
        assert!(matches!(reason, CloseReason::SendFailed(_)));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn closing_one_connection_leaves_others_running() {
        let registry = ConnectionRegistry::new();
        let (conn_a, peer_a) = pair(false);
        let (conn_b, mut peer_b) = pair(false);
        let task_a = tokio::spawn(handle_connection(
            conn_a,
            "u1".into(),
            handle(),
            registry.clone(),
        ));
        let task_b = tokio::spawn(handle_connection(
            conn_b,
            "u2".into(),
            handle(),
            registry.clone(),
        ));

        peer_b.say("before");
        assert_eq!(peer_b.reply().await, "before");

        peer_a.hang_up();
        task_a.await.unwrap();
        assert!(registry.lookup("u1").await.is_none());

        peer_b.say("after JJ");
        assert_eq!(peer_b.reply().await, CANNED_REPLY);
        peer_b.say("still here");
        assert_eq!(peer_b.reply().await, "still here");
        assert!(registry.lookup("u2").await.is_some());

        peer_b.hang_up();
        task_b.await.unwrap();
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn error_after_disconnect_keeps_registry_intact() {
        let registry = ConnectionRegistry::new();
        registry.register("other", handle()).await;

        let (conn, peer) = pair(false);
        let h = handle();
        let id = h.id();
        let task = tokio::spawn(handle_connection(conn, "u1".into(), h, registry.clone()));

        peer.hang_up();
        peer.fail();
        assert!(task.await.unwrap().is_clean());

        // A second cleanup of the same connection finds nothing to remove
        assert!(!registry.release("u1", id).await);
        assert!(registry.unregister("u1").await.is_none());
        assert_eq!(registry.user_ids().await, vec!["other".to_string()]);
    }

    #[tokio::test]
    async fn orphaned_connection_does_not_evict_its_replacement() {
        let registry = ConnectionRegistry::new();
        let (first_conn, mut first) = pair(false);
        let (second_conn, mut second) = pair(false);

        let first_task = tokio::spawn(handle_connection(
            first_conn,
            "bob".into(),
            handle(),
            registry.clone(),
        ));
        first.say("one");
        assert_eq!(first.reply().await, "one");

        let second_handle = handle();
        let second_id = second_handle.id();
        let second_task = tokio::spawn(handle_connection(
            second_conn,
            "bob".into(),
            second_handle,
            registry.clone(),
        ));
        second.say("two");
        assert_eq!(second.reply().await, "two");
        assert_eq!(registry.lookup("bob").await.map(|c| c.id()), Some(second_id));

        // The displaced connection is still served until it closes itself
        first.say("still open");
        assert_eq!(first.reply().await, "still open");

        first.hang_up();
        first_task.await.unwrap();
        assert_eq!(registry.lookup("bob").await.map(|c| c.id()), Some(second_id));

        second.hang_up();
        second_task.await.unwrap();
        assert!(registry.lookup("bob").await.is_none());
    }
}
