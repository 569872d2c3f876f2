//! In-memory detector socket for tests.
//!
//! Every `connect` creates a pair of channels.  The session gets the usual
//! [`SocketConnection`]; the test gets the other ends as a
//! [`MockSocketPeer`], from which it can read the frames the session sent
//! and inject socket events (`Message`, `Error`, `Closed`).
//!
//! ```ignore
//! let transport = Arc::new(MockTransport::new(MockTransportMode::OpenImmediately));
//! session.start().await?;
//! let mut peer = transport.take_peer().unwrap();
//! let frame = peer.sent.recv().await.unwrap();
//! peer.events.send(SocketEvent::Closed).await.unwrap();
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::ports::{FrameTransport, SocketConnection, SocketEvent, TransportError};

/// Generous enough that a paused-clock cadence test never blocks on send.
const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockTransportMode {
    /// Queues `Open` right away.
    OpenImmediately,
    /// Queues `Closed` without ever opening.
    CloseImmediately,
    /// `connect` itself fails.
    Refuse,
}

/// The detector side of one mock connection.
#[derive(Debug)]
pub struct MockSocketPeer {
    pub url: String,
    /// Injects events into the session.
    pub events: mpsc::Sender<SocketEvent>,
    /// Frames the session sent.  Yields `None` once the session closed the
    /// socket.
    pub sent: mpsc::Receiver<String>,
}

#[derive(Debug)]
pub struct MockTransport {
    mode: MockTransportMode,
    peers: Mutex<VecDeque<MockSocketPeer>>,
    urls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new(mode: MockTransportMode) -> Self {
        Self {
            mode,
            peers: Mutex::new(VecDeque::new()),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Oldest connection not yet taken.
    pub fn take_peer(&self) -> Option<MockSocketPeer> {
        lock(&self.peers).pop_front()
    }

    /// Every URL `connect` was called with, in order.
    pub fn connected_urls(&self) -> Vec<String> {
        lock(&self.urls).clone()
    }
}

#[async_trait]
impl FrameTransport for MockTransport {
    async fn connect(&self, url: &str) -> Result<SocketConnection, TransportError> {
        lock(&self.urls).push(url.to_string());

        if self.mode == MockTransportMode::Refuse {
            return Err(TransportError::Connect {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let first = match self.mode {
            MockTransportMode::CloseImmediately => SocketEvent::Closed,
            _ => SocketEvent::Open,
        };
        // Fresh channel with capacity; cannot fail.
        let _ = event_tx.try_send(first);

        lock(&self.peers).push_back(MockSocketPeer {
            url: url.to_string(),
            events: event_tx,
            sent: outbound_rx,
        });

        Ok(SocketConnection {
            outbound: outbound_tx,
            events: event_rx,
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
