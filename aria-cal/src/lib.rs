//! Aria Calendar - events, natural-language commands and timetable import.

pub mod action;
pub mod event;
pub mod interpret;
pub mod reminder;
pub mod roster;
pub mod state;
pub mod store;
pub mod time;
pub mod timetable;
pub mod transcript;

pub use action::{Action, ModelReply, ParseError, parse_reply};
pub use event::{Attendance, Event, EventDraft, EventId, EventPatch, PALETTE};
pub use interpret::{Applied, Effects};
pub use reminder::{PlannedReminder, ReminderKind, plan_reminders};
pub use roster::{ClassGroup, class_groups, events_on};
pub use state::{AppState, CommandRequest, ScanRequest, View};
pub use store::{EventStore, FileStorage, MemoryStorage, Storage, StoreError};
pub use timetable::ClassSlot;
pub use transcript::{ChatMessage, Role, Transcript};
