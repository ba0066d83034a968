use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};

/// Time of day used when none (or garbage) was supplied.
pub fn default_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).expect("09:00 is a valid time")
}

/// Parses an `HH:MM` 24h clock string.
pub fn parse_clock(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.trim().split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    // Tolerate a trailing seconds part ("07:00:00").
    let m: u32 = m.split(':').next()?.trim().parse().ok()?;
    NaiveTime::from_hms_opt(h, m, 0)
}

/// Takes the calendar date from the leading `YYYY-MM-DD` of an ISO string.
///
/// Any time or offset after the date is ignored.
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = s.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Resolves a wall-clock time in the local zone.
///
/// Ambiguous times take the earlier instant; times inside a DST gap are read as UTC.
pub fn localize(naive: NaiveDateTime) -> DateTime<Local> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// `day` at `time`, local zone, zero seconds.
pub fn at(day: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    localize(day.and_time(time))
}

/// Keeps the date of `dt`, replacing hour and minute.
pub fn with_clock(dt: DateTime<Local>, time: NaiveTime) -> DateTime<Local> {
    at(dt.date_naive(), time)
}

/// Keeps hour and minute of `dt`, replacing the date.
pub fn with_day(dt: DateTime<Local>, day: NaiveDate) -> DateTime<Local> {
    let time = dt.time();
    let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);
    at(day, time)
}

/// Serde adapter: ISO-8601 UTC with milliseconds on the way out, any RFC 3339 on the way in.
pub mod iso_millis {
    use chrono::{DateTime, Local, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(
            &dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Local>, D::Error> {
        let s = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Local))
            .map_err(serde::de::Error::custom)
    }
}
