use aria_cal::View;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app::{AppMode, ChatApp};

pub fn handle_event(app: &mut ChatApp, event: Event) {
    if let Event::Key(key) = event {
        if key.kind == KeyEventKind::Press {
            handle_key(app, key);
        }
    }
}

fn handle_key(app: &mut ChatApp, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.mode {
        AppMode::Locked => handle_locked_key(app, key),
        AppMode::Chat => handle_chat_key(app, key),
        AppMode::ScanPath => handle_scan_key(app, key),
    }
}

fn handle_locked_key(app: &mut ChatApp, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => app.submit_password(),
        _ => handle_editing_key(app, key),
    }
}

fn handle_chat_key(app: &mut ChatApp, key: KeyEvent) {
    if app.state.view == View::Calendar && handle_calendar_key(app, key) {
        return;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            app.should_quit = true;
        }
        (KeyCode::Tab, _) => {
            app.next_view();
        }
        (KeyCode::F(2), _) => {
            app.open_scan_prompt();
        }
        (KeyCode::F(3), _) => {
            app.enable_reminders();
        }
        (KeyCode::Enter, KeyModifiers::NONE) => {
            app.send_message();
        }
        (KeyCode::Up, KeyModifiers::CONTROL) => {
            app.scroll_up();
        }
        (KeyCode::Down, KeyModifiers::CONTROL) => {
            app.scroll_down();
        }
        _ => handle_editing_key(app, key),
    }
}

/// Arrows move the selected day, PageUp/PageDown flip months.
fn handle_calendar_key(app: &mut ChatApp, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Left => app.state.move_selection(-1),
        KeyCode::Right => app.state.move_selection(1),
        KeyCode::Up => app.state.move_selection(-7),
        KeyCode::Down => app.state.move_selection(7),
        KeyCode::PageUp => app.state.shift_month(-1),
        KeyCode::PageDown => app.state.shift_month(1),
        _ => return false,
    }
    true
}

fn handle_scan_key(app: &mut ChatApp, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_scan_prompt(),
        KeyCode::Enter => app.start_scan(),
        _ => handle_editing_key(app, key),
    }
}

fn handle_editing_key(app: &mut ChatApp, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Backspace, _) => app.input_backspace(),
        (KeyCode::Delete, _) => app.input_delete(),
        (KeyCode::Left, _) => app.input_left(),
        (KeyCode::Right, _) => app.input_right(),
        (KeyCode::Home, _) => app.input_home(),
        (KeyCode::End, _) => app.input_end(),
        (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => app.input_char(c),
        _ => {}
    }
}
