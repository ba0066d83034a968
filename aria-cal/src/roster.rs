//! Read-only views over the event list: class roster and calendar days.

use chrono::{DateTime, Datelike, Local, NaiveDate};

use crate::event::{Attendance, Event};

/// All sessions of one class, summarized.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassGroup {
    pub title: String,
    pub color: String,
    /// Attendance of the last session seen.
    pub attendance: Attendance,
    pub sessions: usize,
    pub next: Option<DateTime<Local>>,
}

/// Groups class events by exact title, in first-seen order.
pub fn class_groups(events: &[Event], now: DateTime<Local>) -> Vec<ClassGroup> {
    let mut groups: Vec<ClassGroup> = Vec::new();

    for event in events.iter().filter(|e| e.is_class) {
        let idx = match groups.iter().position(|g| g.title == event.title) {
            Some(idx) => idx,
            None => {
                groups.push(ClassGroup {
                    title: event.title.clone(),
                    color: event.color.clone(),
                    attendance: event.attendance,
                    sessions: 0,
                    next: None,
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[idx];
        group.sessions += 1;
        group.attendance = event.attendance;
        if event.date >= now && group.next.is_none_or(|next| event.date < next) {
            group.next = Some(event.date);
        }
    }

    groups
}

/// Events on `day`, earliest first.
pub fn events_on(events: &[Event], day: NaiveDate) -> Vec<&Event> {
    let mut found: Vec<&Event> = events
        .iter()
        .filter(|e| e.date.date_naive() == day)
        .collect();
    found.sort_by_key(|e| e.date);
    found
}

/// First day of the month containing `day`.
pub fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Number of days in the month containing `day`.
pub fn days_in_month(day: NaiveDate) -> u32 {
    let start = month_start(day);
    let next = start
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(start);
    (next - start).num_days() as u32
}

/// Blank cells before the 1st in a Sunday-first grid.
pub fn leading_blanks(day: NaiveDate) -> u32 {
    month_start(day).weekday().num_days_from_sunday()
}

/// Moves `day`'s month by `delta`, landing on the 1st.
pub fn shift_month(day: NaiveDate, delta: i32) -> NaiveDate {
    let start = month_start(day);
    let months = chrono::Months::new(delta.unsigned_abs());
    let shifted = if delta >= 0 {
        start.checked_add_months(months)
    } else {
        start.checked_sub_months(months)
    };
    shifted.unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventDraft, PALETTE};
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, d, h, 0, 0).unwrap()
    }

    fn class(id: u64, title: &str, date: DateTime<Local>, color: &str) -> Event {
        let mut draft = EventDraft::new(title, date, color);
        draft.is_class = true;
        draft.into_event(id)
    }

    #[test]
    fn groups_by_title_with_next_session() {
        let mut events = vec![
            class(1, "Math", at(12, 8), PALETTE[0]),
            class(2, "Art", at(13, 9), PALETTE[1]),
            class(3, "Math", at(19, 8), PALETTE[5]),
            class(4, "Math", at(16, 8), PALETTE[0]),
        ];
        events[3].attendance = Attendance::Optional;
        let mut adhoc = EventDraft::new("Gym", at(15, 7), PALETTE[2]).into_event(5);
        adhoc.is_class = false;
        events.push(adhoc);

        let groups = class_groups(&events, at(14, 10));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Math");
        assert_eq!(groups[0].color, PALETTE[0]);
        assert_eq!(groups[0].sessions, 3);
        assert_eq!(groups[0].attendance, Attendance::Optional);
        assert_eq!(groups[0].next, Some(at(16, 8)));
        assert_eq!(groups[1].next, None);
    }

    #[test]
    fn day_listing_is_sorted() {
        let events = vec![
            EventDraft::new("Late", at(14, 18), PALETTE[0]).into_event(1),
            EventDraft::new("Other day", at(15, 9), PALETTE[0]).into_event(2),
            EventDraft::new("Early", at(14, 7), PALETTE[0]).into_event(3),
        ];
        let day = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let titles: Vec<_> = events_on(&events, day).iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Early", "Late"]);
    }

    #[test]
    fn month_grid_helpers() {
        let day = NaiveDate::from_ymd_opt(2026, 2, 17).unwrap();
        assert_eq!(days_in_month(day), 28);
        // 2026-02-01 is a Sunday.
        assert_eq!(leading_blanks(day), 0);
        assert_eq!(
            shift_month(day, -3),
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
        );
        assert_eq!(
            shift_month(day, 11),
            NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()
        );
        assert_eq!(leading_blanks(NaiveDate::from_ymd_opt(2026, 10, 5).unwrap()), 4);
    }
}
