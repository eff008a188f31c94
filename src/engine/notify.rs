// src/engine/notify.rs
//
// Notifications emitted by the batch processor. Hosts implement
// NotificationSink to drive a UI, a log or a channel; the engine assumes
// nothing about who listens.

use crate::engine::tasks::TaskSnapshot;
use parking_lot::Mutex;

/// Batch progress after a task transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
    /// `round(current / total * 100)`, 0 for an empty batch
    pub percent: u32,
}

impl Progress {
    pub fn new(current: u32, total: u32) -> Self {
        let percent = if total == 0 {
            0
        } else {
            (current as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            current,
            total,
            percent,
        }
    }
}

/// Full ordered queue listing after a change.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueChanged {
    pub tasks: Vec<TaskSnapshot>,
}

/// Receiver for batch notifications.
///
/// Called from the thread running the batch, never while the queue lock is
/// held, so implementations may inspect or modify the queue.
pub trait NotificationSink: Send + Sync {
    fn on_queue_changed(&self, event: &QueueChanged);
    fn on_progress(&self, progress: Progress);
}

/// Sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn on_queue_changed(&self, _event: &QueueChanged) {}
    fn on_progress(&self, _progress: Progress) {}
}

/// One delivered notification, as captured by [`RecordingSink`].
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    QueueChanged(QueueChanged),
    Progress(Progress),
}

/// Sink that keeps every notification in delivery order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().clone()
    }

    pub fn progress(&self) -> Vec<Progress> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Notification::Progress(p) => Some(*p),
                Notification::QueueChanged(_) => None,
            })
            .collect()
    }

    pub fn queue_changes(&self) -> Vec<QueueChanged> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Notification::QueueChanged(q) => Some(q.clone()),
                Notification::Progress(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl NotificationSink for RecordingSink {
    fn on_queue_changed(&self, event: &QueueChanged) {
        self.events
            .lock()
            .push(Notification::QueueChanged(event.clone()));
    }

    fn on_progress(&self, progress: Progress) {
        self.events.lock().push(Notification::Progress(progress));
    }
}
