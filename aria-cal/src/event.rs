use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::time::iso_millis;

pub type EventId = u64;

/// Display colors handed out to events.
pub const PALETTE: [&str; 12] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
    "#BB8FCE", "#85C1E9", "#F0A500", "#6BCB77",
];

/// Minutes of warning given when nothing else was asked for.
pub const DEFAULT_REMINDER_MINUTES: u32 = 15;

/// Whether showing up to a class session is required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attendance {
    Mandatory,
    Optional,
    #[default]
    Unknown,
}

impl Attendance {
    /// Lenient parse; anything outside the three known values is `Unknown`.
    pub fn from_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "mandatory" => Attendance::Mandatory,
            "optional" => Attendance::Optional,
            _ => Attendance::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Attendance::Mandatory => "Mandatory",
            Attendance::Optional => "Optional",
            Attendance::Unknown => "Unknown",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Attendance::Mandatory => "🔴",
            Attendance::Optional => "🟢",
            Attendance::Unknown => "⚪",
        }
    }

    /// Color used for the attendance badge, if it overrides the event color.
    pub fn color(self) -> Option<&'static str> {
        match self {
            Attendance::Mandatory => Some("#FF6B6B"),
            Attendance::Optional => Some("#4ECDC4"),
            Attendance::Unknown => None,
        }
    }
}

impl fmt::Display for Attendance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attendance::Mandatory => write!(f, "mandatory"),
            Attendance::Optional => write!(f, "optional"),
            Attendance::Unknown => write!(f, "unknown"),
        }
    }
}

/// A single calendar entry, either ad hoc or one session of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(with = "iso_millis")]
    pub date: DateTime<Local>,
    pub reminder: u32,
    pub color: String,
    #[serde(default)]
    pub attendance: Attendance,
    #[serde(default)]
    pub is_class: bool,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl Event {
    /// Case-insensitive substring match of `needle` against the title.
    ///
    /// An empty needle matches nothing.
    pub fn title_matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        // A plain `contains("")` would hit every title, letting a reply without a
        // matchTitle delete or re-mark arbitrary events.
        !needle.is_empty() && self.title.to_lowercase().contains(&needle)
    }

    /// Color shown for this event, letting a known attendance take over.
    pub fn display_color(&self) -> &str {
        self.attendance.color().unwrap_or(&self.color)
    }
}

/// An event that has not been given an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub date: DateTime<Local>,
    pub reminder: u32,
    pub color: String,
    pub attendance: Attendance,
    pub is_class: bool,
    pub location: Option<String>,
    pub end_time: Option<String>,
}

impl EventDraft {
    /// An ad hoc (non-class) event.
    pub fn new(title: impl Into<String>, date: DateTime<Local>, color: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date,
            reminder: DEFAULT_REMINDER_MINUTES,
            color: color.into(),
            attendance: Attendance::Unknown,
            is_class: false,
            location: None,
            end_time: None,
        }
    }

    pub fn into_event(self, id: EventId) -> Event {
        Event {
            id,
            title: self.title,
            date: self.date,
            reminder: self.reminder,
            color: self.color,
            attendance: self.attendance,
            is_class: self.is_class,
            location: self.location,
            end_time: self.end_time,
        }
    }
}

/// Partial update applied by [`crate::EventStore::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub date: Option<DateTime<Local>>,
    pub reminder: Option<u32>,
    pub attendance: Option<Attendance>,
}

impl EventPatch {
    pub fn attendance(attendance: Attendance) -> Self {
        Self {
            attendance: Some(attendance),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.reminder.is_none()
            && self.attendance.is_none()
    }

    pub(crate) fn apply(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(reminder) = self.reminder {
            event.reminder = reminder;
        }
        if let Some(attendance) = self.attendance {
            event.attendance = attendance;
        }
    }
}
