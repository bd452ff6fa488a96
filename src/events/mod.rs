use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

/// Domain events emitted by the engine. Notification and delivery are the
/// surrounding application's concern; this is the seam it subscribes on.
///
/// Events are emitted after commit, never inside a transaction, so a consumer
/// never observes an event for state that was rolled back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    RequisitionCreated {
        requisition_id: i64,
        number: String,
    },
    RequisitionApproved {
        requisition_id: i64,
        approver: String,
    },
    RequisitionRejected {
        requisition_id: i64,
        reason: String,
    },
    RequisitionConverted {
        requisition_id: i64,
    },
    StockRequirementsRecalculated {
        sales_order_id: i64,
        lines: usize,
    },
    SweepCompleted {
        assemblies_scanned: usize,
        shortages_found: usize,
        requisitions_created: usize,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with its receiving half.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Post-commit emission. The business operation already committed, so a
    /// full channel or dropped receiver is logged and swallowed.
    pub async fn emit(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("event dropped: {}", e);
        }
    }
}
