use serde_json::Value;
use thiserror::Error;

use crate::event::Attendance;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model reply is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model reply is not a JSON object")]
    NotAnObject,
}

/// A store operation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add {
        title: Option<String>,
        date: Option<String>,
        time: Option<String>,
        reminder: Option<u32>,
    },
    Delete {
        match_title: String,
    },
    Update {
        match_title: String,
        new_time: Option<String>,
        new_date: Option<String>,
    },
    SetAttendance {
        match_title: String,
        attendance: Attendance,
        apply_to_all: bool,
    },
    Query,
    /// Missing or unknown `action` tag.
    Unrecognized(Option<String>),
}

/// Parsed model reply: the action plus its optional friendly text.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub action: Action,
    pub response: Option<String>,
}

/// Removes markdown code-fence markers (```` ```json ```` and ```` ``` ````) and trims.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parses the model's text into a [`ModelReply`].
///
/// Non-JSON text is an error; a JSON object with a missing or unknown
/// `action` becomes [`Action::Unrecognized`].
pub fn parse_reply(raw: &str) -> Result<ModelReply, ParseError> {
    let value: Value = serde_json::from_str(&strip_code_fences(raw))?;
    if !value.is_object() {
        return Err(ParseError::NotAnObject);
    }
    let response = str_field(&value, "response").filter(|r| !r.trim().is_empty());
    let match_title = str_field(&value, "matchTitle").unwrap_or_default();

    let action = match value.get("action").and_then(Value::as_str).map(str::trim) {
        Some("add") => Action::Add {
            title: str_field(&value, "title").filter(|t| !t.trim().is_empty()),
            date: str_field(&value, "date"),
            time: str_field(&value, "time"),
            reminder: value.get("reminder").and_then(reminder_minutes),
        },
        Some("delete") => Action::Delete { match_title },
        Some("update") => Action::Update {
            match_title,
            new_time: str_field(&value, "newTime"),
            new_date: str_field(&value, "newDate"),
        },
        Some("set_attendance") => Action::SetAttendance {
            match_title,
            attendance: value
                .get("attendance")
                .and_then(Value::as_str)
                .map(Attendance::from_loose)
                .unwrap_or_default(),
            apply_to_all: value
                .get("applyToAll")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        },
        Some("query") => Action::Query,
        other => Action::Unrecognized(other.map(String::from)),
    };

    Ok(ModelReply { action, response })
}

/// A string field, or `None` when it is absent or not a string.
fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}

/// Zero or missing means "use the default", like an empty form field.
fn reminder_minutes(v: &Value) -> Option<u32> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (n >= 1.0 && n <= f64::from(u32::MAX)).then(|| n.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences() {
        let raw = "```json\n{\"action\":\"query\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"action\":\"query\"}");
    }

    #[test]
    fn parses_add() {
        let reply = parse_reply(
            r#"{"action":"add","title":"Gym","date":"2026-10-18","time":"07:00","reminder":30,"response":"On it 💪"}"#,
        )
        .unwrap();
        assert_eq!(
            reply.action,
            Action::Add {
                title: Some("Gym".into()),
                date: Some("2026-10-18".into()),
                time: Some("07:00".into()),
                reminder: Some(30),
            }
        );
        assert_eq!(reply.response.as_deref(), Some("On it 💪"));
    }

    #[test]
    fn parses_set_attendance() {
        let reply = parse_reply(
            r#"{"action":"set_attendance","matchTitle":"math","attendance":"mandatory","applyToAll":true}"#,
        )
        .unwrap();
        assert_eq!(
            reply.action,
            Action::SetAttendance {
                match_title: "math".into(),
                attendance: Attendance::Mandatory,
                apply_to_all: true,
            }
        );
        assert_eq!(reply.response, None);
    }

    #[test]
    fn bogus_attendance_becomes_unknown() {
        let reply =
            parse_reply(r#"{"action":"set_attendance","matchTitle":"x","attendance":"maybe"}"#)
                .unwrap();
        match reply.action {
            Action::SetAttendance { attendance, .. } => assert_eq!(attendance, Attendance::Unknown),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_action_is_unrecognized() {
        let reply = parse_reply(r#"{"action":"dance","response":"🕺"}"#).unwrap();
        assert_eq!(reply.action, Action::Unrecognized(Some("dance".into())));
        assert_eq!(reply.response.as_deref(), Some("🕺"));

        let reply = parse_reply("{}").unwrap();
        assert_eq!(reply.action, Action::Unrecognized(None));
    }

    #[test]
    fn mistyped_fields_do_not_fail_the_parse() {
        let reply = parse_reply(r#"{"action":"add","reminder":"10","title":""}"#).unwrap();
        assert_eq!(
            reply.action,
            Action::Add {
                title: None,
                date: None,
                time: None,
                reminder: Some(10),
            }
        );
    }

    #[test]
    fn wrongly_typed_unused_field_is_ignored() {
        let reply = parse_reply(
            r#"{"action":"add","title":"Gym","date":"2026-10-15","time":"07:00","applyToAll":"yes"}"#,
        )
        .unwrap();
        assert_eq!(
            reply.action,
            Action::Add {
                title: Some("Gym".into()),
                date: Some("2026-10-15".into()),
                time: Some("07:00".into()),
                reminder: None,
            }
        );
    }

    #[test]
    fn wrongly_typed_fields_read_as_absent() {
        let reply = parse_reply(
            r#"{"action":"set_attendance","matchTitle":"math","attendance":1,"applyToAll":"yes","time":7,"response":false}"#,
        )
        .unwrap();
        assert_eq!(
            reply.action,
            Action::SetAttendance {
                match_title: "math".into(),
                attendance: Attendance::Unknown,
                apply_to_all: true,
            }
        );
        assert_eq!(reply.response, None);

        let reply = parse_reply(r#"{"action":"add","title":"Gym","time":7}"#).unwrap();
        match reply.action {
            Action::Add { time, .. } => assert_eq!(time, None),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_json_is_an_error() {
        assert!(matches!(
            parse_reply("Sure! I added it."),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(parse_reply("[1,2]"), Err(ParseError::NotAnObject)));
    }
}
