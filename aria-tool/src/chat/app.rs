use std::time::{Duration, Instant};

use aria_anthropic::AnthropicError;
use aria_cal::{AppState, Effects, FileStorage, StoreError, View};
use chrono::Local;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::assistant::Assistant;
use crate::gate::Gate;
use crate::reminder::{Notification, NotificationPermission, ReminderScheduler};
use crate::upload::{expand_path, read_upload};

const SHAKE: Duration = Duration::from_millis(600);
const BANNER: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Waiting for the shared password.
    Locked,
    Chat,
    /// The input line holds the path of a timetable image.
    ScanPath,
}

/// A finished model call, sent back to the UI loop.
#[derive(Debug)]
pub enum Completion {
    Command(Result<Option<String>, AnthropicError>),
    Scan(Result<Option<String>, AnthropicError>),
}

pub struct ChatApp {
    pub mode: AppMode,
    pub should_quit: bool,
    pub state: AppState<FileStorage>,
    pub assistant: Assistant,
    pub gate: Gate,
    pub reminders: ReminderScheduler,
    notifications_rx: mpsc::UnboundedReceiver<Notification>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    pub input: String,
    pub cursor_pos: usize,
    pub messages_scroll: u16,
    pub banner: Option<Notification>,
    banner_until: Option<Instant>,
    shake_until: Option<Instant>,
    pub last_error: Option<String>,
}

impl ChatApp {
    pub fn new(
        state: AppState<FileStorage>,
        assistant: Assistant,
        gate: Gate,
        permission: NotificationPermission,
    ) -> Self {
        let (reminders, notifications_rx) = ReminderScheduler::new(permission);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let mode = if gate.is_unlocked() {
            AppMode::Chat
        } else {
            AppMode::Locked
        };

        let mut app = Self {
            mode,
            should_quit: false,
            state,
            assistant,
            gate,
            reminders,
            notifications_rx,
            completions_tx,
            completions_rx,
            input: String::new(),
            cursor_pos: 0,
            messages_scroll: 0,
            banner: None,
            banner_until: None,
            shake_until: None,
            last_error: None,
        };
        app.arm_reminders();
        app
    }

    fn arm_reminders(&mut self) {
        let armed = self
            .reminders
            .schedule_all(self.state.store.list(), Local::now());
        if armed > 0 {
            info!(armed, "Re-armed reminders");
        }
    }

    pub fn submit_password(&mut self) {
        if self.gate.try_unlock(&self.input) {
            self.mode = AppMode::Chat;
            self.shake_until = None;
        } else {
            self.shake_until = Some(Instant::now() + SHAKE);
        }
        self.clear_input();
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_until.is_some_and(|until| Instant::now() < until)
    }

    pub fn send_message(&mut self) {
        let Some(request) = self.state.submit_command(&self.input, Local::now()) else {
            return;
        };
        self.clear_input();
        self.state.view = View::Chat;
        self.messages_scroll = 0;
        self.last_error = None;

        let assistant = self.assistant.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = assistant.command(&request).await;
            let _ = tx.send(Completion::Command(result));
        });
    }

    pub fn open_scan_prompt(&mut self) {
        self.clear_input();
        self.mode = AppMode::ScanPath;
    }

    pub fn close_scan_prompt(&mut self) {
        self.clear_input();
        self.mode = AppMode::Chat;
    }

    pub fn start_scan(&mut self) {
        let path = expand_path(&self.input);
        self.close_scan_prompt();
        if path.as_os_str().is_empty() {
            return;
        }

        let upload = match read_upload(&path) {
            Ok(upload) => upload,
            Err(e) => {
                self.last_error = Some(format!("Couldn't read {}: {}", path.display(), e));
                return;
            }
        };

        let Some(request) = self
            .state
            .submit_scan(&upload.media_type, upload.data, Local::now())
        else {
            return;
        };
        self.messages_scroll = 0;
        self.last_error = None;

        let assistant = self.assistant.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = assistant.scan(&request).await;
            let _ = tx.send(Completion::Scan(result));
        });
    }

    pub fn enable_reminders(&mut self) {
        if self.reminders.permission() == NotificationPermission::Granted {
            return;
        }
        self.reminders.request_permission();
        self.arm_reminders();
    }

    /// Drains finished requests and due reminders. Called once per tick.
    pub fn poll(&mut self) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.handle_completion(completion);
        }

        let mut fired = false;
        while let Ok(notification) = self.notifications_rx.try_recv() {
            self.banner = Some(notification);
            self.banner_until = Some(Instant::now() + BANNER);
            fired = true;
        }
        if fired {
            self.reminders.prune();
        }

        if self.banner_until.is_some_and(|until| Instant::now() >= until) {
            self.banner = None;
            self.banner_until = None;
        }
    }

    pub fn handle_completion(&mut self, completion: Completion) {
        let now = Local::now();
        let outcome = match completion {
            Completion::Command(result) => {
                self.state
                    .complete_command(result, now, &mut rand::rng())
            }
            Completion::Scan(result) => self.state.complete_scan(result, now),
        };
        self.messages_scroll = 0;
        self.apply_outcome(outcome);
    }

    fn apply_outcome(&mut self, outcome: Result<Effects, StoreError>) {
        match outcome {
            Ok(effects) => self.reminders.apply(&effects, Local::now()),
            Err(e) => {
                error!(error = %e, "Failed to save events");
                self.last_error = Some(format!("Couldn't save events: {}", e));
            }
        }
    }

    pub fn next_view(&mut self) {
        self.state.view = self.state.view.next();
    }

    pub fn scroll_up(&mut self) {
        self.messages_scroll = self.messages_scroll.saturating_add(1);
    }

    pub fn scroll_down(&mut self) {
        self.messages_scroll = self.messages_scroll.saturating_sub(1);
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }

    pub fn input_char(&mut self, c: char) {
        self.input.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
    }

    pub fn input_backspace(&mut self) {
        if let Some((prev, _)) = self.input[..self.cursor_pos].char_indices().next_back() {
            self.input.remove(prev);
            self.cursor_pos = prev;
        }
    }

    pub fn input_delete(&mut self) {
        if self.cursor_pos < self.input.len() {
            self.input.remove(self.cursor_pos);
        }
    }

    pub fn input_left(&mut self) {
        if let Some((prev, _)) = self.input[..self.cursor_pos].char_indices().next_back() {
            self.cursor_pos = prev;
        }
    }

    pub fn input_right(&mut self) {
        if let Some(c) = self.input[self.cursor_pos..].chars().next() {
            self.cursor_pos += c.len_utf8();
        }
    }

    pub fn input_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn input_end(&mut self) {
        self.cursor_pos = self.input.len();
    }

    /// Display width of the input before the cursor.
    pub fn cursor_column(&self) -> u16 {
        self.input[..self.cursor_pos].chars().count() as u16
    }
}
