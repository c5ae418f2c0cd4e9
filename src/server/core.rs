use log::{error, info};
use std::future::{self, Future};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::connection::{ConnectionHandle, ConnectionRegistry, handle_connection};
use crate::error::handlers::log_handshake_failure;
use crate::error::{HandshakeError, RelayError};
use crate::server::handshake;

pub struct Server {
    registry: ConnectionRegistry,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listener described by `config`
    pub async fn bind(config: ServerConfig) -> Result<Self, RelayError> {
        config.validate()?;
        let addr = config.socket_addr();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| RelayError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            registry: ConnectionRegistry::new(),
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Accepts connections forever
    pub async fn run(self) {
        self.run_until(future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// Connections already being served keep running.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Accepting connections on ws://{}{}/{{user_id}}",
            self.config.socket_addr(),
            self.config.path_prefix
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(
                        "Shutdown requested, no longer accepting ({} still connected)",
                        self.registry.len().await
                    );
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let registry = self.registry.clone();
                        let config = Arc::clone(&self.config);

                        // Spawn a task for each client so accept loop doesn't block
                        tokio::spawn(async move {
                            if let Err(e) = handle_new_connection(stream, addr, registry, config).await {
                                log_handshake_failure(&addr.to_string(), &e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                },
            }
        }
    }
}

/// Upgrades a new TCP stream and serves it until it closes.
async fn handle_new_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    registry: ConnectionRegistry,
    config: Arc<ServerConfig>,
) -> Result<(), HandshakeError> {
    let (conn, user_id) = handshake::accept(stream, &config).await?;
    let handle = ConnectionHandle::new(peer_addr);

    handle_connection(conn, user_id, handle, registry).await;
    Ok(())
}
