use chrono::{DateTime, Local, TimeDelta};

use crate::event::{Event, EventId};

/// Start notices are only planned for events less than this many hours away.
const START_NOTICE_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    /// `reminder` minutes ahead of the event.
    Lead,
    /// At the event's start.
    Start,
}

/// A notification that should be shown at `fire_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedReminder {
    pub event_id: EventId,
    pub kind: ReminderKind,
    pub fire_at: DateTime<Local>,
    pub title: String,
    pub body: String,
}

/// Works out which notifications `event` still needs, as seen from `now`.
pub fn plan_reminders(event: &Event, now: DateTime<Local>) -> Vec<PlannedReminder> {
    let mut planned = Vec::new();

    let lead_at = event.date - TimeDelta::minutes(i64::from(event.reminder));
    if lead_at > now {
        planned.push(PlannedReminder {
            event_id: event.id,
            kind: ReminderKind::Lead,
            fire_at: lead_at,
            title: format!("⏰ Reminder: {}", event.title),
            body: format!("Starting in {} minutes", event.reminder),
        });
    }

    let until_start = event.date - now;
    if until_start > TimeDelta::zero() && until_start < TimeDelta::hours(START_NOTICE_HOURS) {
        planned.push(PlannedReminder {
            event_id: event.id,
            kind: ReminderKind::Start,
            fire_at: event.date,
            title: format!("🗓️ Now: {}", event.title),
            body: "Your event is starting now!".to_string(),
        });
    }

    planned
}
