use aria_cal::roster::{days_in_month, leading_blanks};
use aria_cal::{Attendance, Role, View, class_groups, events_on};
use chrono::{Datelike, Local, NaiveDate, TimeDelta};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
};

use super::app::{AppMode, ChatApp};
use crate::reminder::NotificationPermission;

pub fn render(frame: &mut Frame, app: &ChatApp) {
    if app.mode == AppMode::Locked {
        render_locked(frame, app);
        return;
    }

    let banner_height = if app.banner.is_some() { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // Tabs
            Constraint::Length(banner_height), // Reminder banner
            Constraint::Min(1),                // Active view
            Constraint::Length(3),             // Input
            Constraint::Length(1),             // Status bar
        ])
        .split(frame.area());

    render_tabs(frame, app, chunks[0]);
    render_banner(frame, app, chunks[1]);
    match app.state.view {
        View::Chat => render_messages(frame, app, chunks[2]),
        View::Calendar => render_calendar(frame, app, chunks[2]),
        View::Classes => render_classes(frame, app, chunks[2]),
    }
    render_input(frame, app, chunks[3]);
    render_status_bar(frame, app, chunks[4]);
}

/// Parses a `#RRGGBB` palette entry.
fn hex(color: &str) -> Color {
    color.parse().unwrap_or(Color::White)
}

fn render_locked(frame: &mut Frame, app: &ChatApp) {
    let area = centered_rect(40, 7, frame.area());
    frame.render_widget(Clear, area);

    let border = if app.is_shaking() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };
    // Nudge the box sideways while shaking
    let area = if app.is_shaking() && area.x > 0 {
        Rect { x: area.x - 1, ..area }
    } else {
        area
    };

    let masked = "•".repeat(app.input.chars().count());
    let text = Text::from(vec![
        Line::from(Span::styled("Aria", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("Your AI calendar"),
        Line::from(""),
        Line::from(masked),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(" 🔒 Password ");
    frame.render_widget(Paragraph::new(text).block(block), area);
    frame.set_cursor_position((area.x + 1 + app.cursor_column(), area.y + 4));
}

fn render_tabs(frame: &mut Frame, app: &ChatApp, area: Rect) {
    let selected = View::ALL
        .iter()
        .position(|v| *v == app.state.view)
        .unwrap_or(0);
    let tabs = Tabs::new(View::ALL.iter().map(|v| v.label()))
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider("│");

    let title_width = 6;
    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(title_width), Constraint::Min(1)])
        .split(area);
    frame.render_widget(
        Paragraph::new("Aria").style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        parts[0],
    );
    frame.render_widget(tabs, parts[1]);
}

fn render_banner(frame: &mut Frame, app: &ChatApp, area: Rect) {
    let Some(notification) = &app.banner else {
        return;
    };
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", notification.title),
            Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {}", notification.body)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_messages(frame: &mut Frame, app: &ChatApp, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    for msg in app.state.transcript.messages() {
        let (role, style) = match msg.role {
            Role::User => ("You", Style::default().fg(Color::Green)),
            Role::Assistant => ("Aria", Style::default().fg(Color::Blue)),
        };
        lines.push(Line::from(Span::styled(
            format!("{}:", role),
            style.add_modifier(Modifier::BOLD),
        )));
        for line in msg.text.lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
        lines.push(Line::from(""));
    }

    if app.state.is_busy() {
        lines.push(Line::from(Span::styled(
            "Aria is thinking...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )));
    }

    let block = Block::default().borders(Borders::ALL).title("Chat");

    let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    let inner = block.inner(area);
    let scroll = bottom_scroll(
        paragraph.line_count(inner.width),
        inner.height as usize,
        app.messages_scroll,
    );

    frame.render_widget(paragraph.block(block).scroll((scroll, 0)), area);
}

/// Offset that keeps the last wrapped row in view, `back` rows up from the bottom.
fn bottom_scroll(total_rows: usize, visible_rows: usize, back: u16) -> u16 {
    let hidden = total_rows.saturating_sub(visible_rows);
    let offset = hidden.saturating_sub(back as usize);
    u16::try_from(offset).unwrap_or(u16::MAX)
}

fn render_calendar(frame: &mut Frame, app: &ChatApp, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(20)])
        .split(area);

    render_month(frame, app, chunks[0]);
    render_day(frame, app, chunks[1]);
}

fn render_month(frame: &mut Frame, app: &ChatApp, area: Rect) {
    let month = app.state.visible_month;
    let today = Local::now().date_naive();
    let events = app.state.store.list();

    let mut lines = vec![Line::from(Span::styled(
        " Su  Mo  Tu  We  Th  Fr  Sa",
        Style::default().fg(Color::DarkGray),
    ))];

    let mut cells: Vec<Span> = (0..leading_blanks(month))
        .map(|_| Span::raw("    "))
        .collect();
    for d in 1..=days_in_month(month) {
        let Some(day) = month.with_day(d) else {
            continue;
        };
        let busy = !events_on(events, day).is_empty();
        let mut style = Style::default();
        if day == today {
            style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
        }
        if day == app.state.selected_date {
            style = style.add_modifier(Modifier::REVERSED);
        }
        let marker = if busy { "•" } else { " " };
        cells.push(Span::styled(format!("{:>3}{}", d, marker), style));
    }

    for week in cells.chunks(7) {
        lines.push(Line::from(week.to_vec()));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(month.format(" %B %Y ").to_string());
    frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn event_line(time: String, title: &str, color: &str, attendance: Attendance) -> Line<'static> {
    Line::from(vec![
        Span::styled("■ ", Style::default().fg(hex(color))),
        Span::styled(time, Style::default().fg(Color::DarkGray)),
        Span::raw(format!("  {} {}", attendance.icon(), title)),
    ])
}

fn render_day(frame: &mut Frame, app: &ChatApp, area: Rect) {
    let today = Local::now().date_naive();
    let events = app.state.store.list();
    let selected = app.state.selected_date;

    let mut lines: Vec<Line> = Vec::new();
    let on_day = events_on(events, selected);
    if on_day.is_empty() {
        lines.push(Line::from(Span::styled(
            "Nothing planned",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for event in on_day {
        let mut time = event.date.format("%H:%M").to_string();
        if let Some(end) = &event.end_time {
            time.push_str(&format!("-{}", end));
        }
        lines.push(event_line(time, &event.title, event.display_color(), event.attendance));
        if let Some(location) = &event.location {
            lines.push(Line::from(Span::styled(
                format!("         📍 {}", location),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    if selected != today {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Today",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        let todays = events_on(events, today);
        if todays.is_empty() {
            lines.push(Line::from(Span::styled(
                "Nothing planned",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for event in todays {
            lines.push(event_line(
                event.date.format("%H:%M").to_string(),
                &event.title,
                event.display_color(),
                event.attendance,
            ));
        }
    }

    let title = format!(" {} ", day_title(selected, today));
    let block = Block::default().borders(Borders::ALL).title(title);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn day_title(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        "Today".to_string()
    } else if day == today + TimeDelta::days(1) {
        "Tomorrow".to_string()
    } else {
        day.format("%A, %B %-d").to_string()
    }
}

fn render_classes(frame: &mut Frame, app: &ChatApp, area: Rect) {
    let groups = class_groups(app.state.store.list(), Local::now());

    let mut lines: Vec<Line> = Vec::new();
    if groups.is_empty() {
        lines.push(Line::from(Span::styled(
            "No classes yet. Press F2 to scan your timetable.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for group in &groups {
        let next = group
            .next
            .map(|d| d.format("next %a %b %-d %H:%M").to_string())
            .unwrap_or_else(|| "no upcoming sessions".to_string());
        let badge = match group.attendance.color() {
            Some(color) => Style::default().fg(hex(color)).add_modifier(Modifier::BOLD),
            None => Style::default().fg(Color::DarkGray),
        };
        lines.push(Line::from(vec![
            Span::styled("■ ", Style::default().fg(hex(&group.color))),
            Span::styled(group.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ]));
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                format!("{} {}", group.attendance.icon(), group.attendance.label()),
                badge,
            ),
            Span::styled(
                format!("  {} sessions  {}", group.sessions, next),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    if !groups.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Tell me which classes are mandatory, e.g. \"Math is mandatory\".",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Classes ({}) ", groups.len()));
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_input(frame: &mut Frame, app: &ChatApp, area: Rect) {
    let (title, placeholder) = match app.mode {
        AppMode::ScanPath => ("Timetable image", "Path to a photo of your timetable..."),
        _ => ("Message", "Add gym tomorrow at 7am"),
    };
    let input_block = Block::default().borders(Borders::ALL).title(title);

    let (display_text, style) = if app.input.is_empty() {
        (placeholder.to_string(), Style::default().fg(Color::DarkGray))
    } else {
        (app.input.clone(), Style::default())
    };

    frame.render_widget(
        Paragraph::new(display_text).style(style).block(input_block),
        area,
    );
    frame.set_cursor_position((area.x + 1 + app.cursor_column(), area.y + 1));
}

fn render_status_bar(frame: &mut Frame, app: &ChatApp, area: Rect) {
    if let Some(ref error) = app.last_error {
        let status = Paragraph::new(format!("Error: {}", error)).style(Style::default().fg(Color::Red));
        frame.render_widget(status, area);
        return;
    }

    let keys = match (app.mode, app.state.view) {
        (AppMode::ScanPath, _) => "Enter: Scan  Esc: Cancel".to_string(),
        (_, View::Calendar) => {
            "Arrows: Day  PgUp/PgDn: Month  Tab: View  F2: Timetable  Esc: Quit".to_string()
        }
        _ => "Enter: Send  Tab: View  F2: Timetable  Ctrl+↑/↓: Scroll  Esc: Quit".to_string(),
    };
    let reminders = match app.reminders.permission() {
        NotificationPermission::Granted => format!("  🔔 {}", app.reminders.pending()),
        NotificationPermission::Denied => "  🔕".to_string(),
        NotificationPermission::Default => "  F3: Reminders".to_string(),
    };

    let status_bar =
        Paragraph::new(format!("{}{}", keys, reminders)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(width),
            Constraint::Fill(1),
        ])
        .split(popup_layout[1])[1]
}
