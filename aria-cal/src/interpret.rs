//! Turning model replies into store mutations.

use chrono::{DateTime, Local, NaiveDate, SecondsFormat};
use rand::Rng;
use serde_json::json;
use tracing::{debug, warn};

use crate::action::{Action, ModelReply};
use crate::event::{
    Attendance, DEFAULT_REMINDER_MINUTES, Event, EventDraft, EventId, EventPatch, PALETTE,
};
use crate::store::{EventStore, Storage, StoreError};
use crate::time;

/// How many trailing events are shown to the model.
pub const RECENT_EVENTS: usize = 6;

pub const FALLBACK_REPLY: &str = "Try adding an event or uploading your timetable 📷";
pub const FAILURE_REPLY: &str = "Something went wrong. Try again!";

/// Reminder bookkeeping the caller has to carry out after a mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    /// Events whose reminders should be (re)scheduled.
    pub schedule: Vec<Event>,
    /// Events whose pending reminders should be dropped.
    pub cancel: Vec<EventId>,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty() && self.cancel.is_empty()
    }

    pub fn extend(&mut self, other: Effects) {
        self.schedule.extend(other.schedule);
        self.cancel.extend(other.cancel);
    }
}

/// Result of applying one reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Applied {
    pub message: String,
    pub effects: Effects,
    /// Calendar day to bring into view.
    pub focus: Option<NaiveDate>,
}

impl Applied {
    fn say(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Builds the system prompt describing the reply contract and the current calendar.
pub fn system_prompt(now: DateTime<Local>, events: &[Event]) -> String {
    let mut classes: Vec<&str> = Vec::new();
    for e in events.iter().filter(|e| e.is_class) {
        if !classes.contains(&e.title.as_str()) {
            classes.push(&e.title);
        }
    }

    let recent: Vec<_> = events
        .iter()
        .skip(events.len().saturating_sub(RECENT_EVENTS))
        .map(|e| {
            json!({
                "id": e.id,
                "title": e.title,
                "date": iso(e.date),
                "attendance": e.attendance,
                "isClass": e.is_class,
            })
        })
        .collect();

    format!(
        r#"You are Aria, an AI calendar assistant.
Current date: {now}
Classes in calendar: {classes}
Recent events: {recent}

Return ONLY valid JSON (no markdown):
{{
  "action": "add"|"update"|"delete"|"set_attendance"|"query",
  "title": "event name",
  "date": "ISO date",
  "time": "HH:MM 24h",
  "reminder": number,
  "matchTitle": "partial title lowercase",
  "newTime": "HH:MM",
  "newDate": "ISO date",
  "attendance": "mandatory"|"optional"|"unknown",
  "applyToAll": true,
  "response": "friendly reply with emoji"
}}
Rules:
- "X optional"/"X not mandatory"/"X no attendance" → set_attendance, attendance="optional"
- "X mandatory"/"X requires attendance" → set_attendance, attendance="mandatory"
- Natural dates: tomorrow, next Monday, etc."#,
        now = iso(now),
        classes = serde_json::Value::from(classes),
        recent = serde_json::Value::from(recent),
    )
}

fn iso(dt: DateTime<Local>) -> String {
    dt.with_timezone(&chrono::Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Applies a parsed reply to the store.
pub fn apply<S: Storage>(
    store: &mut EventStore<S>,
    reply: ModelReply,
    now: DateTime<Local>,
    rng: &mut impl Rng,
) -> Result<Applied, StoreError> {
    let ModelReply { action, response } = reply;
    debug!(?action, "Applying model action");

    match action {
        Action::Add {
            title,
            date,
            time: clock,
            reminder,
        } => {
            let day = match date.as_deref() {
                Some(raw) => time::parse_day(raw).unwrap_or_else(|| {
                    warn!(date = raw, "Unreadable date, using today");
                    now.date_naive()
                }),
                None => now.date_naive(),
            };
            let clock = clock
                .as_deref()
                .and_then(time::parse_clock)
                .unwrap_or_else(time::default_start);
            let when = time::at(day, clock);

            let color = PALETTE[rng.random_range(0..PALETTE.len())];
            let mut draft = EventDraft::new(title.unwrap_or_else(|| "New Event".into()), when, color);
            draft.reminder = reminder.unwrap_or(DEFAULT_REMINDER_MINUTES);

            let event = store.add(draft)?.clone();
            let message = response.unwrap_or_else(|| {
                format!(
                    "✅ Added \"{}\" - {} at {}",
                    event.title,
                    event.date.format("%a, %b %-d"),
                    event.date.format("%H:%M"),
                )
            });
            Ok(Applied {
                message,
                focus: Some(event.date.date_naive()),
                effects: Effects {
                    schedule: vec![event],
                    cancel: vec![],
                },
            })
        }

        Action::Delete { match_title } => {
            let Some(id) = store.find_first(&match_title).map(|e| e.id) else {
                return Ok(Applied::say("I couldn't find that event."));
            };
            let Some(removed) = store.remove(id)? else {
                return Ok(Applied::say("I couldn't find that event."));
            };
            Ok(Applied {
                message: response.unwrap_or_else(|| format!("🗑️ Deleted \"{}\"", removed.title)),
                focus: None,
                effects: Effects {
                    schedule: vec![],
                    cancel: vec![removed.id],
                },
            })
        }

        Action::Update {
            match_title,
            new_time,
            new_date,
        } => {
            let Some(found) = store.find_first(&match_title) else {
                return Ok(Applied::say("Couldn't find that event."));
            };
            let id = found.id;
            let mut date = found.date;

            if let Some(raw) = new_time.as_deref() {
                match time::parse_clock(raw) {
                    Some(clock) => date = time::with_clock(date, clock),
                    None => warn!(time = raw, "Ignoring unreadable newTime"),
                }
            }
            if let Some(raw) = new_date.as_deref() {
                match time::parse_day(raw) {
                    Some(day) => date = time::with_day(date, day),
                    None => warn!(date = raw, "Ignoring unreadable newDate"),
                }
            }

            let patch = EventPatch {
                date: Some(date),
                ..EventPatch::default()
            };
            let Some(event) = store.update(id, &patch)?.cloned() else {
                return Ok(Applied::say("Couldn't find that event."));
            };
            Ok(Applied {
                message: response.unwrap_or_else(|| format!("✏️ Updated \"{}\"", event.title)),
                focus: None,
                effects: Effects {
                    schedule: vec![event],
                    cancel: vec![],
                },
            })
        }

        Action::SetAttendance {
            match_title,
            attendance,
            ..
        } => {
            let ids: Vec<EventId> = store.find_all(&match_title).iter().map(|e| e.id).collect();
            let count = store.update_many(&ids, &EventPatch::attendance(attendance))?;
            if count == 0 {
                return Ok(Applied::say(format!(
                    "Couldn't find \"{}\".",
                    match_title.to_lowercase()
                )));
            }
            Ok(Applied::say(response.unwrap_or_else(|| {
                attendance_summary(attendance, count)
            })))
        }

        Action::Query | Action::Unrecognized(_) => {
            Ok(Applied::say(response.unwrap_or_else(|| FALLBACK_REPLY.into())))
        }
    }
}

fn attendance_summary(attendance: Attendance, count: usize) -> String {
    format!(
        "{} Set {} session(s) → {}",
        attendance.icon(),
        count,
        attendance.label()
    )
}
