//! Audit record shape and CSV encoding.
//!
//! One [`AuditRecord`] is produced for every event that crosses the relay,
//! in the fixed 7-column layout the analysis scripts expect. Free-text
//! columns are always quoted; embedded quotes are doubled (RFC 4180), so a
//! note containing `","` can no longer corrupt the row.

use chrono::{DateTime, SecondsFormat, Utc};

/// Column header written once when the log file is created.
pub const CSV_HEADER: &str =
    "timestamp,action_type,action_id,description,expected_effect,participant_response,observer_note";

/// One durable line in the audit log.
///
/// Absent optional event fields are recorded as empty strings, never
/// omitted, so every row has all seven columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// Server receipt time.
    pub server_timestamp: DateTime<Utc>,
    /// Event category (`audio`, `ack`, `participant_input`, ...).
    pub action_type: String,
    /// Script- or client-assigned identifier of the action.
    pub action_id: String,
    /// Human-readable description of the event.
    pub description: String,
    /// Expected effect; carries the operator note for trigger rows,
    /// otherwise empty.
    pub expected_effect: String,
    /// Participant response value, if any.
    pub participant_response: String,
    /// Observer note, if any.
    pub observer_note: String,
}

impl AuditRecord {
    /// Renders the record as one CSV line (no trailing newline).
    #[must_use]
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            format_timestamp(self.server_timestamp),
            escape_field(&self.action_type),
            escape_field(&self.action_id),
            quote_field(&self.description),
            quote_field(&self.expected_effect),
            quote_field(&self.participant_response),
            quote_field(&self.observer_note),
        )
    }
}

/// Formats a timestamp as ISO-8601 UTC with millisecond precision
/// (`2026-08-28T10:00:00.000Z`). The same rendering is used in audit rows
/// and in outbound `serverTs` payload fields.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Quotes a field only when it contains the delimiter, a quote, or a line
/// break. Used for the structured columns.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        quote_field(field)
    } else {
        field.to_string()
    }
}

/// Always-quoted rendering with embedded quotes doubled. Used for the
/// free-text columns to keep the file shape stable.
fn quote_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> AuditRecord {
        let Some(ts) = Utc.with_ymd_and_hms(2026, 8, 28, 10, 0, 0).single() else {
            panic!("valid timestamp");
        };
        AuditRecord {
            server_timestamp: ts,
            action_type: "audio".to_string(),
            action_id: "overview_01".to_string(),
            description: "{\"volume\":5}".to_string(),
            expected_effect: String::new(),
            participant_response: String::new(),
            observer_note: String::new(),
        }
    }

    #[test]
    fn header_has_seven_columns() {
        assert_eq!(CSV_HEADER.split(',').count(), 7);
    }

    #[test]
    fn line_has_seven_columns() {
        let line = record().to_csv_line();
        // Quoted commas inside the description must not split the row; the
        // fixture description has none, so a plain split suffices here.
        assert!(line.starts_with("2026-08-28T10:00:00.000Z,audio,overview_01,"));
        assert!(line.ends_with(",\"\",\"\""));
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let mut rec = record();
        rec.observer_note = "said \"yes\", twice".to_string();
        let line = rec.to_csv_line();
        assert!(line.ends_with("\"said \"\"yes\"\", twice\""));
    }

    #[test]
    fn structured_column_with_comma_is_quoted() {
        let mut rec = record();
        rec.action_id = "a,b".to_string();
        let line = rec.to_csv_line();
        assert!(line.contains(",audio,\"a,b\","));
    }

    #[test]
    fn timestamp_is_millisecond_utc() {
        let Some(ts) = Utc
            .with_ymd_and_hms(2026, 8, 28, 10, 0, 0)
            .single()
            .and_then(|t| t.checked_add_signed(chrono::Duration::milliseconds(123)))
        else {
            panic!("valid timestamp");
        };
        assert_eq!(format_timestamp(ts), "2026-08-28T10:00:00.123Z");
    }
}
