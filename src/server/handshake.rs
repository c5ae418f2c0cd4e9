//! WebSocket upgrade
//!
//! Validates the request path and `Origin` header while the upgrade is in
//! flight, so rejected clients get a plain HTTP error instead of a socket.

use percent_encoding::percent_decode_str;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::ORIGIN;

use crate::config::{ANY_ORIGIN, ServerConfig};
use crate::connection::WsConnection;
use crate::error::HandshakeError;

/// Extracts the user id from `{prefix}/{user_id}`.
///
/// The id must be one non-empty path segment; it is percent-decoded.
pub fn parse_user_id(path: &str, prefix: &str) -> Result<String, HandshakeError> {
    let raw = path
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(|| HandshakeError::UnknownPath(path.to_string()))?;

    if raw.is_empty() || raw.contains('/') {
        return Err(HandshakeError::InvalidUserId(path.to_string()));
    }

    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| HandshakeError::InvalidUserId(path.to_string()))?;

    if decoded.is_empty() {
        return Err(HandshakeError::InvalidUserId(path.to_string()));
    }

    Ok(decoded.into_owned())
}

/// Checks an `Origin` header against the configured allow list.
///
/// Requests without an origin come from non-browser clients and are allowed.
pub fn check_origin(origin: Option<&str>, allowed: &[String]) -> Result<(), HandshakeError> {
    let Some(origin) = origin else {
        return Ok(());
    };

    if allowed.iter().any(|a| a == ANY_ORIGIN || a == origin) {
        Ok(())
    } else {
        Err(HandshakeError::OriginNotAllowed(origin.to_string()))
    }
}

/// Validates an upgrade request, returning the user id it addresses
pub fn authorize(request: &Request, config: &ServerConfig) -> Result<String, HandshakeError> {
    let origin = request
        .headers()
        .get(ORIGIN)
        .map(|value| value.to_str().unwrap_or_default());

    check_origin(origin, &config.allowed_origins)?;
    parse_user_id(request.uri().path(), &config.path_prefix)
}

fn rejection_response(err: &HandshakeError) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(err.to_string()));
    *response.status_mut() = err.status();
    response
}

/// Performs the WebSocket handshake on an accepted TCP stream
pub async fn accept(
    stream: TcpStream,
    config: &ServerConfig,
) -> Result<(WsConnection, String), HandshakeError> {
    let mut user_id = None;
    let mut rejection = None;

    let callback = |request: &Request, response: Response| match authorize(request, config) {
        Ok(id) => {
            user_id = Some(id);
            Ok(response)
        }
        Err(err) => {
            let reply = rejection_response(&err);
            rejection = Some(err);
            Err(reply)
        }
    };

    let accepted = tokio_tungstenite::accept_hdr_async(stream, callback).await;

    match (accepted, user_id, rejection) {
        (Ok(ws), Some(id), _) => Ok((WsConnection::new(ws), id)),
        (_, _, Some(err)) => Err(err),
        (Err(e), _, None) => Err(HandshakeError::Protocol(e)),
        // The callback always runs before a successful upgrade
        (Ok(_), None, None) => Err(HandshakeError::UnknownPath(String::new())),
    }
}
