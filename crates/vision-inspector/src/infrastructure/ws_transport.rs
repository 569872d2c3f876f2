//! Detector socket over tokio-tungstenite.
//!
//! [`TungsteniteTransport::connect`] performs the WebSocket handshake and
//! splits the stream into two tasks:
//!
//! - **Writer** – drains the outbound channel into text frames.  When every
//!   sender has been dropped it sends a Close frame, which is how the session
//!   closes the socket.
//! - **Reader** – turns incoming frames into [`SocketEvent`]s.  Always ends
//!   with exactly one [`SocketEvent::Closed`].
//!
//! `wss://` URLs use rustls with the webpki root set, so no system OpenSSL is
//! needed.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, info, warn};

use crate::application::ports::{FrameTransport, SocketConnection, SocketEvent, TransportError};

/// Frames queued before the capture loop has to wait for the socket.
const OUTBOUND_CAPACITY: usize = 8;
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct TungsteniteTransport;

impl TungsteniteTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FrameTransport for TungsteniteTransport {
    async fn connect(&self, url: &str) -> Result<SocketConnection, TransportError> {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(TransportError::InvalidUrl {
                url: url.to_string(),
                reason: "scheme must be ws or wss".to_string(),
            });
        }

        // The handshake completing is the "open" event.
        let (ws_stream, _response) = connect_async(url).await.map_err(|e| match e {
            WsError::Url(reason) => TransportError::InvalidUrl {
                url: url.to_string(),
                reason: reason.to_string(),
            },
            other => TransportError::Connect {
                url: url.to_string(),
                reason: other.to_string(),
            },
        })?;
        info!("WebSocket connected: {url}");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<SocketEvent>(EVENT_CAPACITY);

        // Cannot fail: the receiver is still in hand and the channel is empty.
        let _ = event_tx.try_send(SocketEvent::Open);

        // ── Writer ────────────────────────────────────────────────────────────
        tokio::spawn(async move {
            while let Some(payload) = outbound_rx.recv().await {
                if let Err(e) = ws_tx.send(WsMessage::Text(payload)).await {
                    debug!("WebSocket send failed: {e}");
                    return;
                }
            }
            // All senders dropped: the owner wants the socket closed.
            if let Err(e) = ws_tx.close().await {
                debug!("WebSocket close failed: {e}");
            }
        });

        // ── Reader ────────────────────────────────────────────────────────────
        tokio::spawn(async move {
            while let Some(frame) = ws_rx.next().await {
                let event = match frame {
                    Ok(WsMessage::Text(text)) => SocketEvent::Message(text),
                    Ok(WsMessage::Binary(bytes)) => match String::from_utf8(bytes) {
                        Ok(text) => SocketEvent::Message(text),
                        Err(_) => {
                            debug!("ignoring non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Ok(WsMessage::Close(frame)) => {
                        debug!(?frame, "WebSocket close frame received");
                        break;
                    }
                    // Ping/pong are answered by tungstenite itself.
                    Ok(_) => continue,
                    Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => break,
                    Err(e) => {
                        // The stream is unusable after any other error.
                        warn!("WebSocket error: {e}");
                        let _ = event_tx.send(SocketEvent::Error(e.to_string())).await;
                        break;
                    }
                };
                if event_tx.send(event).await.is_err() {
                    // Nobody is listening any more.
                    return;
                }
            }
            let _ = event_tx.send(SocketEvent::Closed).await;
        });

        Ok(SocketConnection {
            outbound: outbound_tx,
            events: event_rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Accepts one connection and echoes text frames until the client closes.
    async fn spawn_echo_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_text() {
                    if ws.send(msg).await.is_err() {
                        break;
                    }
                } else if msg.is_close() {
                    break;
                }
            }
        });
        format!("ws://{addr}/vision/stream-safety")
    }

    #[tokio::test]
    async fn test_connect_reports_open_then_echoes_frames() {
        // Arrange
        let url = spawn_echo_server().await;
        let transport = TungsteniteTransport::new();

        // Act
        let mut conn = transport.connect(&url).await.expect("connect");
        conn.outbound
            .send("data:image/jpeg;base64,AAAA".to_string())
            .await
            .unwrap();

        // Assert
        assert_eq!(conn.events.recv().await, Some(SocketEvent::Open));
        assert_eq!(
            conn.events.recv().await,
            Some(SocketEvent::Message("data:image/jpeg;base64,AAAA".to_string()))
        );
    }

    #[tokio::test]
    async fn test_dropping_outbound_closes_socket() {
        // Arrange
        let url = spawn_echo_server().await;
        let mut conn = TungsteniteTransport::new().connect(&url).await.unwrap();
        assert_eq!(conn.events.recv().await, Some(SocketEvent::Open));

        // Act
        drop(conn.outbound);

        // Assert
        let closed = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            loop {
                match conn.events.recv().await {
                    Some(SocketEvent::Closed) | None => return true,
                    Some(_) => continue,
                }
            }
        })
        .await;
        assert_eq!(closed, Ok(true));
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_error() {
        // Arrange: bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        // Act
        let result = TungsteniteTransport::new()
            .connect(&format!("ws://{addr}/vision/stream-safety"))
            .await;

        // Assert
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_non_websocket_scheme_is_rejected() {
        let result = TungsteniteTransport::new().connect("http://localhost/x").await;
        assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
    }
}
