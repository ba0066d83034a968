//! Application state shared by the chat, calendar and class views.

use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDate, TimeDelta};
use rand::Rng;
use tracing::{info, warn};

use crate::action::parse_reply;
use crate::interpret::{self, Effects};
use crate::roster;
use crate::store::{EventStore, Storage, StoreError};
use crate::timetable::{self, DEFAULT_HORIZON_WEEKS};
use crate::transcript::Transcript;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Chat,
    Calendar,
    Classes,
}

impl View {
    pub const ALL: [View; 3] = [View::Chat, View::Calendar, View::Classes];

    pub fn next(self) -> Self {
        match self {
            View::Chat => View::Calendar,
            View::Calendar => View::Classes,
            View::Classes => View::Chat,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            View::Chat => "CHAT",
            View::Calendar => "CALENDAR",
            View::Classes => "CLASSES",
        }
    }
}

/// A text request for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub system: String,
    pub text: String,
}

/// An image request for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub media_type: String,
    pub data: Vec<u8>,
    pub prompt: String,
}

/// Everything the presentation layer reads and the interpreter/importer write.
pub struct AppState<S> {
    pub store: EventStore<S>,
    pub transcript: Transcript,
    pub view: View,
    pub selected_date: NaiveDate,
    /// First day of the month shown in the calendar grid.
    pub visible_month: NaiveDate,
    pub pending_commands: usize,
    pub pending_scans: usize,
    horizon_weeks: u32,
}

impl<S: Storage> AppState<S> {
    pub fn new(store: EventStore<S>, today: NaiveDate) -> Self {
        Self {
            store,
            transcript: Transcript::new(),
            view: View::Chat,
            selected_date: today,
            visible_month: roster::month_start(today),
            pending_commands: 0,
            pending_scans: 0,
            horizon_weeks: DEFAULT_HORIZON_WEEKS,
        }
    }

    pub fn with_horizon(mut self, weeks: u32) -> Self {
        self.horizon_weeks = weeks;
        self
    }

    pub fn horizon_weeks(&self) -> u32 {
        self.horizon_weeks
    }

    pub fn is_busy(&self) -> bool {
        self.pending_commands > 0 || self.pending_scans > 0
    }

    /// Records the user's text and returns the request to send, or `None` for blank input.
    pub fn submit_command(&mut self, input: &str, now: DateTime<Local>) -> Option<CommandRequest> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        self.transcript.user(text);
        self.pending_commands += 1;

        Some(CommandRequest {
            system: interpret::system_prompt(now, self.store.list()),
            text: text.to_string(),
        })
    }

    /// Applies the model's answer (or the transport error) to the store and transcript.
    pub fn complete_command<E: Display>(
        &mut self,
        result: Result<Option<String>, E>,
        now: DateTime<Local>,
        rng: &mut impl Rng,
    ) -> Result<Effects, StoreError> {
        self.pending_commands = self.pending_commands.saturating_sub(1);

        let raw = match result {
            Ok(text) => text.unwrap_or_else(|| "{}".to_string()),
            Err(e) => {
                warn!(error = %e, "Command request failed");
                self.transcript.assistant(interpret::FAILURE_REPLY);
                return Ok(Effects::default());
            }
        };

        let reply = match parse_reply(&raw) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Unusable model reply");
                self.transcript.assistant(interpret::FAILURE_REPLY);
                return Ok(Effects::default());
            }
        };

        match interpret::apply(&mut self.store, reply, now, rng) {
            Ok(applied) => {
                self.transcript.assistant(applied.message);
                if let Some(day) = applied.focus {
                    self.focus(day);
                }
                Ok(applied.effects)
            }
            Err(e) => {
                self.transcript.assistant(interpret::FAILURE_REPLY);
                Err(e)
            }
        }
    }

    /// Starts an import. Non-image uploads are ignored without a trace.
    pub fn submit_scan(
        &mut self,
        media_type: &str,
        data: Vec<u8>,
        now: DateTime<Local>,
    ) -> Option<ScanRequest> {
        if !media_type.starts_with("image/") {
            info!(media_type, "Ignoring non-image upload");
            return None;
        }
        self.view = View::Chat;
        self.transcript.user(timetable::UPLOAD_NOTE);
        self.transcript.assistant(timetable::SCANNING_REPLY);
        self.pending_scans += 1;

        Some(ScanRequest {
            media_type: media_type.to_string(),
            data,
            prompt: timetable::extraction_prompt(now),
        })
    }

    /// Turns the extracted slots into class sessions.
    pub fn complete_scan<E: Display>(
        &mut self,
        result: Result<Option<String>, E>,
        now: DateTime<Local>,
    ) -> Result<Effects, StoreError> {
        self.pending_scans = self.pending_scans.saturating_sub(1);

        let slots = match result
            .map_err(|e| e.to_string())
            .and_then(|text| {
                timetable::parse_slots(text.as_deref().unwrap_or("[]")).map_err(|e| e.to_string())
            }) {
            Ok(slots) => slots,
            Err(e) => {
                warn!(error = %e, "Timetable scan failed");
                self.transcript.assistant(timetable::FAILURE_REPLY);
                return Ok(Effects::default());
            }
        };

        if slots.is_empty() {
            self.transcript.assistant(timetable::EMPTY_REPLY);
            return Ok(Effects::default());
        }

        let drafts = timetable::materialize(&slots, now, self.horizon_weeks);
        let ids = match self.store.add_batch(drafts) {
            Ok(ids) => ids,
            Err(e) => {
                self.transcript.assistant(timetable::FAILURE_REPLY);
                return Err(e);
            }
        };
        info!(classes = slots.len(), sessions = ids.len(), "Imported timetable");

        self.transcript
            .assistant(timetable::summary(&slots, self.horizon_weeks));
        self.view = View::Classes;

        let schedule = self
            .store
            .list()
            .iter()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect();
        Ok(Effects {
            schedule,
            cancel: vec![],
        })
    }

    /// Selects `day` and brings its month into view.
    pub fn focus(&mut self, day: NaiveDate) {
        self.selected_date = day;
        self.visible_month = roster::month_start(day);
    }

    pub fn move_selection(&mut self, days: i64) {
        let day = self.selected_date + TimeDelta::days(days);
        self.focus(day);
    }

    pub fn shift_month(&mut self, delta: i32) {
        self.visible_month = roster::shift_month(self.visible_month, delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;
    use crate::transcript::Role;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap()
    }

    fn state() -> AppState<MemoryStorage> {
        let store = EventStore::open(MemoryStorage::new()).unwrap();
        AppState::new(store, now().date_naive())
    }

    #[test]
    fn blank_input_sends_nothing() {
        let mut state = state();
        assert!(state.submit_command("   ", now()).is_none());
        assert_eq!(state.transcript.len(), 1);
        assert!(!state.is_busy());
    }

    #[test]
    fn transport_error_becomes_retry_prompt() {
        let mut state = state();
        let req = state.submit_command("add gym", now()).unwrap();
        assert_eq!(req.text, "add gym");
        assert!(state.is_busy());

        let mut rng = StdRng::seed_from_u64(1);
        let effects = state
            .complete_command(Err::<Option<String>, _>("connection reset"), now(), &mut rng)
            .unwrap();
        assert!(effects.is_empty());
        assert!(!state.is_busy());
        assert_eq!(state.transcript.last().unwrap().text, interpret::FAILURE_REPLY);
        assert!(state.store.is_empty());
    }

    #[test]
    fn garbage_reply_becomes_retry_prompt() {
        let mut state = state();
        state.submit_command("hello", now());
        let mut rng = StdRng::seed_from_u64(1);
        state
            .complete_command(Ok::<_, String>(Some("I think so?".into())), now(), &mut rng)
            .unwrap();
        assert_eq!(state.transcript.last().unwrap().text, interpret::FAILURE_REPLY);
    }

    #[test]
    fn empty_reply_nudges() {
        let mut state = state();
        state.submit_command("hello", now());
        let mut rng = StdRng::seed_from_u64(1);
        state
            .complete_command(Ok::<_, String>(None), now(), &mut rng)
            .unwrap();
        assert_eq!(state.transcript.last().unwrap().text, interpret::FALLBACK_REPLY);
    }

    #[test]
    fn add_moves_focus() {
        let mut state = state();
        state.submit_command("dentist", now());
        let mut rng = StdRng::seed_from_u64(1);
        state
            .complete_command(
                Ok::<_, String>(Some(
                    r#"{"action":"add","title":"Dentist","date":"2026-12-03","time":"10:00"}"#
                        .into(),
                )),
                now(),
                &mut rng,
            )
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 12, 3).unwrap();
        assert_eq!(state.selected_date, day);
        assert_eq!(state.visible_month, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
    }

    #[test]
    fn stray_field_types_do_not_block_an_add() {
        let mut state = state();
        state.submit_command("gym tomorrow at 7", now());
        let mut rng = StdRng::seed_from_u64(1);
        let effects = state
            .complete_command(
                Ok::<_, String>(Some(
                    r#"{"action":"add","title":"Gym","date":"2026-10-15","time":"07:00","applyToAll":"yes"}"#
                        .into(),
                )),
                now(),
                &mut rng,
            )
            .unwrap();
        assert_eq!(state.store.len(), 1);
        assert_eq!(effects.schedule.len(), 1);
    }

    struct FullDisk;

    impl Storage for FullDisk {
        fn load(&self) -> std::io::Result<Option<String>> {
            Ok(None)
        }

        fn save(&self, _contents: &str) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    #[test]
    fn failed_save_leaves_nothing_behind() {
        let store = EventStore::open(FullDisk).unwrap();
        let mut state = AppState::new(store, now().date_naive());
        state.submit_command("add gym", now());

        let mut rng = StdRng::seed_from_u64(1);
        let result = state.complete_command(
            Ok::<_, String>(Some(
                r#"{"action":"add","title":"Gym","date":"2026-10-15","time":"07:00"}"#.into(),
            )),
            now(),
            &mut rng,
        );
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(state.store.is_empty());
        assert_eq!(state.transcript.last().unwrap().text, interpret::FAILURE_REPLY);

        state.submit_scan("image/png", vec![], now());
        let result = state.complete_scan(
            Ok::<_, String>(Some(r#"[{"title":"Math","dayOfWeek":1}]"#.into())),
            now(),
        );
        assert!(result.is_err());
        assert!(state.store.is_empty());
        assert_eq!(state.transcript.last().unwrap().text, timetable::FAILURE_REPLY);
    }

    #[test]
    fn non_image_upload_is_silent() {
        let mut state = state();
        assert!(
            state
                .submit_scan("application/pdf", b"%PDF-1.7".to_vec(), now())
                .is_none()
        );
        assert_eq!(state.transcript.len(), 1);
        assert!(state.store.is_empty());
    }

    #[test]
    fn scan_flow_imports_and_switches_view() {
        let mut state = state().with_horizon(2);
        let req = state.submit_scan("image/png", vec![1, 2, 3], now()).unwrap();
        assert_eq!(req.media_type, "image/png");
        assert!(req.prompt.contains("dayOfWeek"));
        let msgs = state.transcript.messages();
        assert_eq!(msgs[msgs.len() - 2].role, Role::User);

        let effects = state
            .complete_scan(
                Ok::<_, String>(Some(
                    r#"[{"title":"Math","dayOfWeek":1,"startTime":"08:00"}]"#.into(),
                )),
                now(),
            )
            .unwrap();
        assert_eq!(state.store.len(), 2);
        assert_eq!(effects.schedule.len(), 2);
        assert_eq!(state.view, View::Classes);
        assert!(state.transcript.last().unwrap().text.contains("Added for 2 weeks!"));
    }

    #[test]
    fn empty_scan_reports_and_stops() {
        let mut state = state();
        state.submit_scan("image/jpeg", vec![], now());
        state
            .complete_scan(Ok::<_, String>(Some("[]".into())), now())
            .unwrap();
        assert!(state.store.is_empty());
        assert_eq!(state.transcript.last().unwrap().text, timetable::EMPTY_REPLY);
        assert_eq!(state.view, View::Chat);
    }

    #[test]
    fn failed_scan_reports() {
        let mut state = state();
        state.submit_scan("image/jpeg", vec![], now());
        state
            .complete_scan(Err::<Option<String>, _>("timeout"), now())
            .unwrap();
        assert_eq!(state.transcript.last().unwrap().text, timetable::FAILURE_REPLY);
        assert!(!state.is_busy());
    }

    #[test]
    fn view_cycle() {
        assert_eq!(View::Chat.next().next().next(), View::Chat);
    }
}
