//! In-process message bus standing in for the lobby's app-message channel

use bytes::Bytes;
use tokio::sync::broadcast;

use crate::game::{ScoreTransport, TransportError};

/// Default bus capacity, in frames
pub const BUS_CAPACITY: usize = 256;

/// One app message on the bus
#[derive(Debug, Clone)]
pub struct BusFrame {
    /// Index of the sending peer
    pub sender: usize,
    pub msg_id: u8,
    pub payload: Bytes,
}

#[derive(Debug, Clone)]
pub struct MessageBus {
    tx: broadcast::Sender<BusFrame>,
}

impl MessageBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusFrame> {
        self.tx.subscribe()
    }

    /// Transport for `peer`
    pub fn transport(&self, peer: usize) -> BusTransport {
        BusTransport {
            peer,
            tx: self.tx.clone(),
            connected: true,
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(BUS_CAPACITY)
    }
}

/// A peer's sending half of the bus
#[derive(Debug, Clone)]
pub struct BusTransport {
    peer: usize,
    tx: broadcast::Sender<BusFrame>,
    connected: bool,
}

impl BusTransport {
    pub fn peer(&self) -> usize {
        self.peer
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Simulate losing or regaining the server connection
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl ScoreTransport for BusTransport {
    fn broadcast(&mut self, msg_id: u8, payload: &[u8]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }

        let frame = BusFrame {
            sender: self.peer,
            msg_id,
            payload: Bytes::copy_from_slice(payload),
        };
        self.tx
            .send(frame)
            .map(|_| ())
            .map_err(|_| TransportError::Closed)
    }
}
