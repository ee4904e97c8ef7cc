//! Event publishing seam
//!
//! The ledger and alert engine only ever call [`EventPublisher::publish`];
//! subscriber lifecycles (websocket fan-out, notification delivery) belong to
//! the layer that constructs the publisher.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::StockChangeKind;

/// Events emitted by the stock ledger and alert engine.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StockEvent {
    /// A quantity change was committed.
    InventoryUpdated {
        product_id: Uuid,
        product_name: String,
        sku: String,
        change_kind: StockChangeKind,
        quantity_before: i32,
        quantity_after: i32,
        quantity_changed: i32,
        updated_by: Uuid,
    },
    /// A low-stock alert was opened for a product.
    AlertRaised {
        alert_id: Uuid,
        product_id: Uuid,
        message: String,
    },
    /// A product recovered (or was deactivated) and its open alert was
    /// removed.
    AlertCleared { product_id: Uuid },
}

/// Sink for stock events. Implementations must not block the caller.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: StockEvent);
}

/// Publisher that discards every event; useful in tests.
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: StockEvent) {}
}

/// Publisher backed by a tokio broadcast channel. Observers subscribe with
/// [`BroadcastPublisher::subscribe`]; events published while no subscriber is
/// connected are dropped.
pub struct BroadcastPublisher {
    sender: broadcast::Sender<StockEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StockEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: StockEvent) {
        // send only fails when there are no subscribers
        let _ = self.sender.send(event);
    }
}
