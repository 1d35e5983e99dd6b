//! Loopback transport for testing.
//!
//! A [`LoopbackHub`] mimics the relay hub in-process: every send from any
//! attached [`LoopbackTransport`] is delivered to every attached transport,
//! the sender included, in send order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{Transport, TransportError, TransportType};

/// In-process broadcast hub.
///
/// Cloning the hub yields another handle to the same set of endpoints.
#[derive(Debug, Clone, Default)]
pub struct LoopbackHub {
    endpoints: Arc<Mutex<Vec<Endpoint>>>,
    next_id: Arc<AtomicU64>,
}

#[derive(Debug)]
struct Endpoint {
    id: u64,
    tx: mpsc::UnboundedSender<String>,
}

impl LoopbackHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new endpoint to the hub.
    #[must_use]
    pub fn attach(&self) -> LoopbackTransport {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.endpoints.lock().push(Endpoint { id, tx });
        LoopbackTransport {
            id,
            hub: self.clone(),
            rx: tokio::sync::Mutex::new(rx),
            open: AtomicBool::new(true),
        }
    }

    /// Number of endpoints still able to receive.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        let mut endpoints = self.endpoints.lock();
        endpoints.retain(|ep| !ep.tx.is_closed());
        endpoints.len()
    }

    /// Drop the hub's sender for `id`, ending that endpoint's stream once
    /// it has drained.
    fn detach(&self, id: u64) {
        self.endpoints.lock().retain(|ep| ep.id != id);
    }

    /// Deliver `ciphertext` to every live endpoint. Returns the number reached.
    fn broadcast(&self, ciphertext: &str) -> usize {
        let mut endpoints = self.endpoints.lock();
        endpoints.retain(|ep| ep.tx.send(ciphertext.to_string()).is_ok());
        endpoints.len()
    }
}

/// One endpoint attached to a [`LoopbackHub`].
pub struct LoopbackTransport {
    id: u64,
    hub: LoopbackHub,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
    open: AtomicBool,
}

impl LoopbackTransport {
    /// Detach from the hub. Already-delivered messages can still be received,
    /// after which `recv` reports [`TransportError::ConnectionClosed`].
    ///
    /// Does not touch the receiver lock, so it returns even while another
    /// task is parked in `recv`.
    pub async fn close(&self) {
        self.open.store(false, Ordering::Release);
        self.hub.detach(self.id);
    }
}

impl Transport for LoopbackTransport {
    async fn send(&self, ciphertext: &str) -> Result<(), TransportError> {
        if !self.open.load(Ordering::Acquire) {
            return Err(TransportError::ConnectionClosed);
        }
        let reached = self.hub.broadcast(ciphertext);
        tracing::trace!(reached, "loopback broadcast");
        Ok(())
    }

    async fn recv(&self) -> Result<String, TransportError> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(TransportError::ConnectionClosed)
    }

    fn is_connected(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn transport_type(&self) -> TransportType {
        TransportType::Loopback
    }
}
