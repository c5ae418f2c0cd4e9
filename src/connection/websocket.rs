//! WebSocket transport
//!
//! [`Connection`] over a `tokio-tungstenite` stream. Only text frames carry
//! messages; control frames are absorbed here.

use futures::{SinkExt, StreamExt};
use log::debug;
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message, Utf8Bytes};

use crate::connection::transport::{Connection, Inbound};
use crate::error::ConnectionError;

/// An upgraded WebSocket connection
pub struct WsConnection {
    stream: WebSocketStream<TcpStream>,
    close_code: CloseCode,
}

impl WsConnection {
    pub fn new(stream: WebSocketStream<TcpStream>) -> Self {
        Self {
            stream,
            close_code: CloseCode::Normal,
        }
    }
}

impl Connection for WsConnection {
    async fn receive(&mut self) -> Result<Inbound, ConnectionError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Inbound::Text(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!("Peer sent close frame: {:?}", frame);
                    return Ok(Inbound::Disconnected);
                }
                Some(Ok(Message::Binary(_))) => {
                    self.close_code = CloseCode::Unsupported;
                    return Err(ConnectionError::UnsupportedFrame("binary"));
                }
                // tungstenite answers pings on the next write or flush
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed))
                | None => return Ok(Inbound::Disconnected),
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<(), ConnectionError> {
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    async fn close(&mut self) {
        let reason = match self.close_code {
            CloseCode::Unsupported => Utf8Bytes::from_static("only text frames are supported"),
            _ => Utf8Bytes::from_static(""),
        };
        let frame = CloseFrame {
            code: self.close_code,
            reason,
        };

        if let Err(e) = self.stream.close(Some(frame)).await {
            debug!("Close handshake not completed: {}", e);
        }
    }
}
