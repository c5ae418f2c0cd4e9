//! Logging setup
//!
//! `RUST_LOG` controls verbosity, defaulting to `info`.

use env_logger::Env;

/// Setup logging for the server
pub fn setup_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
