pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod server;

pub use config::ServerConfig;
pub use server::Server;
