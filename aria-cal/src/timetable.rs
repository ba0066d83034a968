//! Weekly class schedules read off a timetable image.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Local, SecondsFormat, TimeDelta};
use serde_json::Value;
use tracing::{debug, warn};

use crate::action::{ParseError, strip_code_fences};
use crate::event::{Attendance, DEFAULT_REMINDER_MINUTES, EventDraft, PALETTE};
use crate::time;

/// Weeks of sessions generated per detected slot.
pub const DEFAULT_HORIZON_WEEKS: u32 = 12;

pub const UPLOAD_NOTE: &str = "📷 [Uploaded school timetable]";
pub const SCANNING_REPLY: &str = "📷 Scanning your timetable… extracting all classes!";
pub const EMPTY_REPLY: &str = "Couldn't read classes from that image. Try a clearer photo.";
pub const FAILURE_REPLY: &str = "Something went wrong. Try again with a clearer photo!";

/// One weekly slot as extracted from the image.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSlot {
    pub title: String,
    /// 0 = Sunday.
    pub day_of_week: u32,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
}

/// Instruction sent alongside the image.
pub fn extraction_prompt(now: DateTime<Local>) -> String {
    format!(
        r#"Extract ALL classes from this school timetable image.
Return ONLY a valid JSON array, no markdown.
Each item: {{ "title": "Subject", "dayOfWeek": 0-6 (0=Sun), "startTime": "HH:MM", "endTime": "HH:MM", "location": "room or null" }}
Today: {}"#,
        now.with_timezone(&chrono::Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Parses the model's answer into class slots.
///
/// Anything other than a JSON array yields no slots; entries without a
/// title or with an out-of-range weekday are dropped.
pub fn parse_slots(raw: &str) -> Result<Vec<ClassSlot>, ParseError> {
    let value: Value = serde_json::from_str(&strip_code_fences(raw))?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    let slots: Vec<ClassSlot> = items.iter().filter_map(slot_from_value).collect();
    if slots.len() != items.len() {
        warn!(
            dropped = items.len() - slots.len(),
            "Skipped unusable timetable entries"
        );
    }
    Ok(slots)
}

fn slot_from_value(v: &Value) -> Option<ClassSlot> {
    let title = v.get("title")?.as_str()?.trim();
    if title.is_empty() {
        return None;
    }
    let day_of_week = match v.get("dayOfWeek")? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    if day_of_week > 6 {
        return None;
    }

    let text = |key: &str| {
        v.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "null")
            .map(String::from)
    };

    Some(ClassSlot {
        title: title.to_string(),
        day_of_week: day_of_week as u32,
        start_time: text("startTime"),
        end_time: text("endTime"),
        location: text("location"),
    })
}

/// Projects every slot over `weeks` weeks starting today.
///
/// Occurrences that would fall before `now` are skipped, so a class later
/// today is kept while one that already happened today starts next week.
/// Titles get palette colors in first-seen order.
pub fn materialize(slots: &[ClassSlot], now: DateTime<Local>, weeks: u32) -> Vec<EventDraft> {
    let mut colors: HashMap<&str, &str> = HashMap::new();
    let mut drafts = Vec::new();
    let today = now.date_naive();
    let weekday = now.weekday().num_days_from_sunday();

    for slot in slots {
        let next_color = PALETTE[colors.len() % PALETTE.len()];
        let color = *colors.entry(slot.title.as_str()).or_insert(next_color);

        let start = slot
            .start_time
            .as_deref()
            .and_then(time::parse_clock)
            .unwrap_or_else(time::default_start);

        for week in 0..weeks {
            let diff = (slot.day_of_week + 7 - weekday) % 7 + week * 7;
            let day = today + TimeDelta::days(i64::from(diff));
            let date = time::at(day, start);
            if date < now {
                continue;
            }
            drafts.push(EventDraft {
                title: slot.title.clone(),
                date,
                reminder: DEFAULT_REMINDER_MINUTES,
                color: color.to_string(),
                attendance: Attendance::Unknown,
                is_class: true,
                location: slot.location.clone(),
                end_time: slot.end_time.clone(),
            });
        }
    }

    debug!(slots = slots.len(), sessions = drafts.len(), "Materialized timetable");
    drafts
}

/// Distinct titles in first-seen order.
pub fn distinct_titles(slots: &[ClassSlot]) -> Vec<&str> {
    let mut titles: Vec<&str> = Vec::new();
    for slot in slots {
        if !titles.contains(&slot.title.as_str()) {
            titles.push(&slot.title);
        }
    }
    titles
}

/// The message shown after a successful import.
pub fn summary(slots: &[ClassSlot], weeks: u32) -> String {
    let titles = distinct_titles(slots);
    let list = titles
        .iter()
        .map(|t| format!("• {t}"))
        .collect::<Vec<_>>()
        .join("\n");
    let example = titles.first().copied().unwrap_or("Math");
    format!(
        "✅ Found {} class(es):\n\n{list}\n\nAdded for {weeks} weeks! 🎉\n\nNow tell me which are mandatory:\n\"{example} is mandatory\"",
        titles.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Timelike};

    // Wednesday.
    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap()
    }

    fn slot(title: &str, dow: u32, start: Option<&str>) -> ClassSlot {
        ClassSlot {
            title: title.into(),
            day_of_week: dow,
            start_time: start.map(String::from),
            end_time: None,
            location: None,
        }
    }

    #[test]
    fn parses_fenced_array() {
        let raw = "```json\n[{\"title\":\"Math\",\"dayOfWeek\":1,\"startTime\":\"08:30\",\"endTime\":\"09:20\",\"location\":\"B12\"},\n {\"title\":\"Art\",\"dayOfWeek\":\"4\",\"location\":null}]\n```";
        let slots = parse_slots(raw).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].location.as_deref(), Some("B12"));
        assert_eq!(slots[0].end_time.as_deref(), Some("09:20"));
        assert_eq!(slots[1].day_of_week, 4);
        assert_eq!(slots[1].start_time, None);
        assert_eq!(slots[1].location, None);
    }

    #[test]
    fn non_array_and_bad_entries_give_nothing() {
        assert!(parse_slots(r#"{"title":"Math"}"#).unwrap().is_empty());
        assert!(parse_slots(r#"[{"dayOfWeek":1},{"title":"X","dayOfWeek":9}]"#)
            .unwrap()
            .is_empty());
        assert!(parse_slots("no classes here").is_err());
    }

    #[test]
    fn twelve_weekly_sessions() {
        let drafts = materialize(&[slot("Math", 5, Some("08:00"))], now(), 12);
        assert_eq!(drafts.len(), 12);
        assert_eq!(
            drafts[0].date.date_naive(),
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
        );
        for pair in drafts.windows(2) {
            let gap = pair[1].date.date_naive() - pair[0].date.date_naive();
            assert_eq!(gap.num_days(), 7);
        }
        assert!(drafts
            .iter()
            .all(|d| d.date.hour() == 8 && d.date.minute() == 0 && d.is_class));
    }

    #[test]
    fn passed_slot_today_starts_next_week() {
        let drafts = materialize(&[slot("Early", 3, Some("08:00"))], now(), 12);
        assert_eq!(drafts.len(), 11);
        assert_eq!(
            drafts[0].date.date_naive(),
            NaiveDate::from_ymd_opt(2026, 10, 21).unwrap()
        );
    }

    #[test]
    fn later_slot_today_is_kept() {
        let drafts = materialize(&[slot("Late", 3, Some("15:00"))], now(), 12);
        assert_eq!(drafts.len(), 12);
        assert_eq!(drafts[0].date.date_naive(), now().date_naive());
    }

    #[test]
    fn missing_start_defaults_to_nine() {
        let drafts = materialize(&[slot("Chem", 1, None)], now(), 1);
        assert_eq!((drafts[0].date.hour(), drafts[0].date.minute()), (9, 0));
    }

    #[test]
    fn colors_follow_first_seen_titles() {
        let slots = [
            slot("Math", 1, None),
            slot("Art", 2, None),
            slot("Math", 4, None),
        ];
        let drafts = materialize(&slots, now(), 1);
        assert_eq!(drafts[0].color, PALETTE[0]);
        assert_eq!(drafts[1].color, PALETTE[1]);
        assert_eq!(drafts[2].color, PALETTE[0]);
    }

    #[test]
    fn palette_cycles() {
        let slots: Vec<_> = (0..13).map(|i| slot(&format!("C{i}"), 1, None)).collect();
        let drafts = materialize(&slots, now(), 1);
        assert_eq!(drafts[12].color, PALETTE[0]);
    }

    #[test]
    fn summary_lists_distinct_titles() {
        let slots = [slot("Math", 1, None), slot("Math", 3, None), slot("Art", 2, None)];
        let text = summary(&slots, 12);
        assert!(text.starts_with("✅ Found 2 class(es):"));
        assert!(text.contains("• Math\n• Art"));
        assert!(text.contains("Added for 12 weeks!"));
        assert!(text.ends_with("\"Math is mandatory\""));
    }
}
