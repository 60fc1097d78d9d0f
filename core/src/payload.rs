use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use crate::datetime::{DateTimeError, local_to_iso};

/// Timezone label sent with calendar events when none is configured.
pub const DEFAULT_TIMEZONE: &str = "America/Mazatlan";

/// Body of `POST /agent/invoke`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub session_id: String,
    pub input: String,
}

/// Success body of `POST /agent/invoke`. Only `output` is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvokeResponse {
    #[serde(default)]
    pub output: Option<String>,
}

/// Body of `POST /gmail/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailPayload {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Body of `POST /calendar/event`.
///
/// The timestamps carry the local offset; `timezone` is a separate label for the
/// target calendar. Both are sent as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventPayload {
    pub summary: String,
    pub description: String,
    pub start_datetime: String,
    pub end_datetime: String,
    pub timezone: String,
}

/// Raw field values of the send-email form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailForm {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailForm {
    /// Build the payload from trimmed fields. `None` when any field is blank.
    pub fn to_payload(&self) -> Option<EmailPayload> {
        let payload = EmailPayload {
            to: self.to.trim().to_string(),
            subject: self.subject.trim().to_string(),
            body: self.body.trim().to_string(),
        };
        if payload.to.is_empty() || payload.subject.is_empty() || payload.body.is_empty() {
            return None;
        }
        Some(payload)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Raw field values of the create-event form. `start` and `end` hold
/// zone-naive `YYYY-MM-DDTHH:MM` values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarForm {
    pub summary: String,
    pub description: String,
    pub start: String,
    pub end: String,
}

impl CalendarForm {
    /// Build the payload, converting both times with `zone`'s offset.
    ///
    /// Returns `Ok(None)` when summary, start or end is blank; description may
    /// be empty.
    pub fn to_payload<Tz: TimeZone>(
        &self,
        zone: &Tz,
        timezone_label: &str,
    ) -> Result<Option<CalendarEventPayload>, DateTimeError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let summary = self.summary.trim();
        if summary.is_empty() || self.start.trim().is_empty() || self.end.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(CalendarEventPayload {
            summary: summary.to_string(),
            description: self.description.trim().to_string(),
            start_datetime: local_to_iso(&self.start, zone)?,
            end_datetime: local_to_iso(&self.end, zone)?,
            timezone: timezone_label.to_string(),
        }))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use serde_json::json;

    use super::*;

    fn email(to: &str, subject: &str, body: &str) -> EmailForm {
        EmailForm {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    #[test]
    fn email_payload_is_trimmed() {
        let payload = email("  ana@example.com ", " Hola ", "\ncuerpo\n")
            .to_payload()
            .unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"to": "ana@example.com", "subject": "Hola", "body": "cuerpo"})
        );
    }

    #[test]
    fn email_with_any_blank_field_is_refused() {
        assert!(email("", "s", "b").to_payload().is_none());
        assert!(email("a@b.c", "   ", "b").to_payload().is_none());
        assert!(email("a@b.c", "s", "\t").to_payload().is_none());
    }

    #[test]
    fn calendar_payload_carries_offset_and_label() {
        let form = CalendarForm {
            summary: " Standup ".into(),
            description: String::new(),
            start: "2024-06-01T10:00".into(),
            end: "2024-06-01T11:00".into(),
        };
        let zone = FixedOffset::west_opt(5 * 3600).unwrap();
        let payload = form.to_payload(&zone, DEFAULT_TIMEZONE).unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "summary": "Standup",
                "description": "",
                "start_datetime": "2024-06-01T10:00:00-05:00",
                "end_datetime": "2024-06-01T11:00:00-05:00",
                "timezone": "America/Mazatlan"
            })
        );
    }

    #[test]
    fn calendar_requires_summary_start_and_end() {
        let zone = FixedOffset::east_opt(0).unwrap();
        let full = CalendarForm {
            summary: "x".into(),
            description: "d".into(),
            start: "2024-06-01T10:00".into(),
            end: "2024-06-01T11:00".into(),
        };
        for blanked in [
            CalendarForm { summary: " ".into(), ..full.clone() },
            CalendarForm { start: String::new(), ..full.clone() },
            CalendarForm { end: String::new(), ..full.clone() },
        ] {
            assert_eq!(blanked.to_payload(&zone, "UTC"), Ok(None));
        }
    }

    #[test]
    fn calendar_with_bad_time_is_an_error() {
        let form = CalendarForm {
            summary: "x".into(),
            description: String::new(),
            start: "soon".into(),
            end: "2024-06-01T11:00".into(),
        };
        assert!(form.to_payload(&chrono::Utc, "UTC").is_err());
    }

    #[test]
    fn invoke_response_tolerates_missing_output() {
        let resp: InvokeResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.output.is_none());
        let resp: InvokeResponse = serde_json::from_str(r#"{"output":"hello","extra":1}"#).unwrap();
        assert_eq!(resp.output.as_deref(), Some("hello"));
    }
}
