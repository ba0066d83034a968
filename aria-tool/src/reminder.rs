use std::collections::HashMap;

use aria_cal::{Effects, Event, EventId, plan_reminders};
use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Whether reminders may be shown at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// Not asked yet.
    Default,
}

impl NotificationPermission {
    pub fn from_config(setting: Option<bool>) -> Self {
        match setting {
            Some(true) => NotificationPermission::Granted,
            Some(false) => NotificationPermission::Denied,
            None => NotificationPermission::Default,
        }
    }
}

/// A reminder that has come due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub event_id: EventId,
    pub title: String,
    pub body: String,
}

/// Pending reminders as tokio tasks, keyed by event id so they can be dropped.
pub struct ReminderScheduler {
    permission: NotificationPermission,
    tasks: HashMap<EventId, Vec<JoinHandle<()>>>,
    tx: mpsc::UnboundedSender<Notification>,
}

impl ReminderScheduler {
    pub fn new(
        permission: NotificationPermission,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            permission,
            tasks: HashMap::new(),
            tx,
        };
        (scheduler, rx)
    }

    pub fn permission(&self) -> NotificationPermission {
        self.permission
    }

    /// Asking in a terminal always succeeds.
    pub fn request_permission(&mut self) -> NotificationPermission {
        self.permission = NotificationPermission::Granted;
        self.permission
    }

    /// (Re)schedules every notification `event` still needs. Returns how many were armed.
    pub fn schedule(&mut self, event: &Event, now: DateTime<Local>) -> usize {
        self.prune();
        self.cancel(event.id);
        if self.permission != NotificationPermission::Granted {
            return 0;
        }

        let handles: Vec<JoinHandle<()>> = plan_reminders(event, now)
            .into_iter()
            .map(|planned| {
                let delay = (planned.fire_at - now).to_std().unwrap_or_default();
                let tx = self.tx.clone();
                let notification = Notification {
                    event_id: planned.event_id,
                    title: planned.title,
                    body: planned.body,
                };
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    info!(event_id = notification.event_id, title = %notification.title, "Reminder due");
                    let _ = tx.send(notification);
                })
            })
            .collect();

        let armed = handles.len();
        if armed > 0 {
            debug!(event_id = event.id, armed, "Scheduled reminders");
            self.tasks.insert(event.id, handles);
        }
        armed
    }

    /// Drops any pending reminders for `id`.
    pub fn cancel(&mut self, id: EventId) {
        if let Some(handles) = self.tasks.remove(&id) {
            for handle in handles {
                handle.abort();
            }
            debug!(event_id = id, "Cancelled reminders");
        }
    }

    pub fn apply(&mut self, effects: &Effects, now: DateTime<Local>) {
        for id in &effects.cancel {
            self.cancel(*id);
        }
        for event in &effects.schedule {
            self.schedule(event, now);
        }
    }

    /// Arms reminders for every event that still has one ahead of it.
    pub fn schedule_all<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a Event>,
        now: DateTime<Local>,
    ) -> usize {
        events.into_iter().map(|e| self.schedule(e, now)).sum()
    }

    /// Forgets handles whose reminder has already fired.
    pub fn prune(&mut self) {
        self.tasks.retain(|_, handles| {
            handles.retain(|h| !h.is_finished());
            !handles.is_empty()
        });
    }

    /// Reminders armed and not yet fired.
    pub fn pending(&self) -> usize {
        self.tasks
            .values()
            .flatten()
            .filter(|h| !h.is_finished())
            .count()
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        for handle in self.tasks.values().flatten() {
            handle.abort();
        }
    }
}
