mod app;
mod input;
mod ui;

use std::io;
use std::time::Duration;

use aria_cal::{AppState, FileStorage};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use app::ChatApp;

use crate::assistant::Assistant;
use crate::error::AriaError;
use crate::gate::Gate;
use crate::reminder::NotificationPermission;

pub async fn run(
    state: AppState<FileStorage>,
    assistant: Assistant,
    gate: Gate,
    permission: NotificationPermission,
) -> Result<(), AriaError> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = ChatApp::new(state, assistant, gate, permission);

    let result = run_loop(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    let pending = app.reminders.pending();
    if pending > 0 {
        println!("{} reminder(s) were still pending and will not fire.", pending);
    }

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut ChatApp,
) -> Result<(), AriaError> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Poll with a timeout so finished requests and reminders get picked up
        if event::poll(Duration::from_millis(50))? {
            let event = event::read()?;
            input::handle_event(app, event);
        }

        app.poll();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
