//! ws-relay - Entry Point
//!
//! WebSocket relay answering each message on the connection it came from.

use log::{error, info};
use std::process::ExitCode;

use ws_relay::error::RelayError;
use ws_relay::error::handlers::handle_error;
use ws_relay::logging::setup_logging;
use ws_relay::{Server, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    info!("Launching relay server...");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            handle_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), RelayError> {
    let config = ServerConfig::load()?;
    let server = Server::bind(config).await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Relay server stopped");
    Ok(())
}
