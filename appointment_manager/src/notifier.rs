use crate::types::Appointment;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub id: i64,
    /// `None` for deletions.
    pub record: Option<Appointment>,
}

impl ChangeEvent {
    pub fn created(appointment: Appointment) -> Self {
        Self {
            kind: ChangeKind::Create,
            id: appointment.id,
            record: Some(appointment),
        }
    }

    pub fn updated(appointment: Appointment) -> Self {
        Self {
            kind: ChangeKind::Update,
            id: appointment.id,
            record: Some(appointment),
        }
    }

    pub fn deleted(id: i64) -> Self {
        Self {
            kind: ChangeKind::Delete,
            id,
            record: None,
        }
    }
}

/// Receives appointment changes for fan-out. `notify` must never block.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync + 'static {
    fn notify(&self, event: ChangeEvent);
    /// `None` when the sink has no subscribable stream.
    fn subscribe(&self) -> Option<broadcast::Receiver<ChangeEvent>>;
}

/// Fans events out over a bounded broadcast channel. Slow subscribers lag
/// and miss events instead of holding up senders.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<ChangeEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }
}

impl NotificationSink for BroadcastNotifier {
    fn notify(&self, event: ChangeEvent) {
        let kind = event.kind.as_str();
        let id = event.id;
        match self.sender.send(event) {
            Ok(receivers) => debug!(kind, id, receivers, "change event sent"),
            Err(_) => debug!(kind, id, "no subscribers for change event"),
        }
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
        Some(self.sender.subscribe())
    }
}
