use chrono::DateTime;
use model::record::AnalyticsRecord;
use serde_json::Value;
use tracing::warn;

/// Top-level audit fields rewritten to RFC 3339 when present.
const TIMESTAMP_FIELDS: [&str; 2] = ["created", "lastModified"];

/// Pulls the record array out of a response envelope and normalizes each
/// element. A response without the envelope yields no records.
pub fn extract_records(body: &Value) -> Vec<AnalyticsRecord> {
    let Some(elements) = body.get("elements").and_then(Value::as_array) else {
        return Vec::new();
    };
    elements
        .iter()
        .filter_map(Value::as_object)
        .map(|object| {
            let mut record = AnalyticsRecord::from_object(object.clone());
            normalize(&mut record);
            record
        })
        .collect()
}

/// Rewrites a raw fragment into the flat output shape: audit stamps and the
/// date range envelope are hoisted to top-level fields, and epoch-millisecond
/// timestamps become RFC 3339 strings.
pub fn normalize(record: &mut AnalyticsRecord) {
    flatten_change_audit_stamps(record);
    flatten_date_range(record);
    for field in TIMESTAMP_FIELDS {
        let Some(raw) = record.get(field) else {
            continue;
        };
        match to_rfc3339(raw) {
            Some(formatted) => record.set(field, Value::String(formatted)),
            None => warn!(field, value = %raw, "unrecognized timestamp left unchanged"),
        }
    }
}

/// `{"changeAuditStamps": {"created": {"time": ..}, "lastModified": {"time": ..}}}`
/// becomes top-level `created` / `lastModified`.
fn flatten_change_audit_stamps(record: &mut AnalyticsRecord) {
    let Some(stamps) = record.remove("changeAuditStamps") else {
        return;
    };
    for field in TIMESTAMP_FIELDS {
        if let Some(time) = stamps.get(field).and_then(|stamp| stamp.get("time")) {
            record.set(field, time.clone());
        }
    }
}

/// `{"dateRange": {"start": {..}, "end": {..}}}` becomes zero-padded
/// `start_date` / `end_date` strings.
fn flatten_date_range(record: &mut AnalyticsRecord) {
    let Some(range) = record.remove("dateRange") else {
        return;
    };
    if let Some(start) = range.get("start").and_then(format_date_parts) {
        record.set("start_date", Value::String(start));
    }
    if let Some(end) = range.get("end").and_then(format_date_parts) {
        record.set("end_date", Value::String(end));
    }
}

fn format_date_parts(parts: &Value) -> Option<String> {
    let year = parts.get("year")?.as_i64()?;
    let month = parts.get("month")?.as_u64()?;
    let day = parts.get("day")?.as_u64()?;
    Some(format!("{year:04}-{month:02}-{day:02}"))
}

/// Epoch milliseconds or a handful of upstream string layouts, rendered as
/// RFC 3339. Already-normalized values pass through untouched.
fn to_rfc3339(value: &Value) -> Option<String> {
    match value {
        Value::Number(millis) => {
            let instant = DateTime::from_timestamp_millis(millis.as_i64()?)?;
            Some(instant.to_rfc3339())
        }
        Value::String(text) => parse_datetime_text(text).map(|instant| instant.to_rfc3339()),
        _ => None,
    }
}

fn parse_datetime_text(text: &str) -> Option<DateTime<chrono::Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.to_utc());
    }
    for layout in ["%Y-%m-%dT%H:%M:%S%.3f%z", "%Y-%m-%dT%H:%M:%S%z"] {
        if let Ok(parsed) = DateTime::parse_from_str(text, layout) {
            return Some(parsed.to_utc());
        }
    }
    chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_envelope_yields_nothing() {
        assert!(extract_records(&json!({"paging": {"count": 10}})).is_empty());
        assert!(extract_records(&json!({"elements": "oops"})).is_empty());
    }

    #[test]
    fn date_range_is_flattened_with_zero_padding() {
        let body = json!({
            "elements": [{
                "clicks": 4,
                "dateRange": {
                    "start": {"year": 2023, "month": 1, "day": 5},
                    "end": {"year": 2023, "month": 1, "day": 5}
                }
            }]
        });

        let records = extract_records(&body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("start_date"), Some(&json!("2023-01-05")));
        assert_eq!(records[0].get("end_date"), Some(&json!("2023-01-05")));
        assert!(!records[0].contains("dateRange"));
        assert_eq!(records[0].get("clicks"), Some(&json!(4)));
    }

    #[test]
    fn audit_stamps_become_rfc3339_timestamps() {
        let body = json!({
            "elements": [{
                "changeAuditStamps": {
                    "created": {"time": 1_700_000_000_000u64},
                    "lastModified": {"time": 1_700_000_123_000u64}
                }
            }]
        });

        let records = extract_records(&body);
        assert_eq!(
            records[0].get("created"),
            Some(&json!("2023-11-14T22:13:20+00:00"))
        );
        assert_eq!(
            records[0].get("lastModified"),
            Some(&json!("2023-11-14T22:15:23+00:00"))
        );
        assert!(!records[0].contains("changeAuditStamps"));
    }

    #[test]
    fn offset_string_timestamps_are_reformatted() {
        let mut record = AnalyticsRecord::new();
        record.set("created", json!("2021-05-01T10:20:30+0000"));
        normalize(&mut record);
        assert_eq!(record.get("created"), Some(&json!("2021-05-01T10:20:30+00:00")));
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut record = AnalyticsRecord::new();
        record.set("created", json!(1_700_000_000_000u64));
        record.set(
            "dateRange",
            json!({"start": {"year": 2023, "month": 2, "day": 1}}),
        );
        normalize(&mut record);
        let once = record.clone();
        normalize(&mut record);
        assert_eq!(record, once);
    }

    #[test]
    fn unparseable_timestamp_is_left_alone() {
        let mut record = AnalyticsRecord::new();
        record.set("created", json!("not a time"));
        normalize(&mut record);
        assert_eq!(record.get("created"), Some(&json!("not a time")));
    }
}
