use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::CREATED_AT_FORMAT;
use crate::types::{MessageRecord, RawDocument};

/// Outcome of turning store documents into message rows
#[derive(Debug, Default, Clone, Serialize)]
pub struct LoadReport {
    pub documents: usize,
    pub loaded: usize,
    /// Documents that could not become a row, with the reason
    pub skipped: Vec<String>,
    /// Rows whose body was not a string and was coerced to its string form
    pub text_coerced: usize,
}

/// Convert every document; malformed documents are skipped and reported.
pub fn load_messages(documents: &[RawDocument]) -> (Vec<MessageRecord>, LoadReport) {
    let mut report = LoadReport {
        documents: documents.len(),
        ..Default::default()
    };
    let mut rows = Vec::with_capacity(documents.len());

    for (i, doc) in documents.iter().enumerate() {
        match message_from_document(doc) {
            Ok((row, coerced)) => {
                if coerced {
                    debug!("Coerced non-string text on tweet {}", row.tweet_id);
                    report.text_coerced += 1;
                }
                rows.push(row);
            }
            Err(reason) => {
                warn!("Skipping document {}: {}", i, reason);
                report.skipped.push(format!("document {}: {}", i, reason));
            }
        }
    }

    report.loaded = rows.len();
    (rows, report)
}

/// Build one row from a schema-less document. The flag is true when the body
/// had to be coerced.
pub fn message_from_document(doc: &RawDocument) -> Result<(MessageRecord, bool), String> {
    let obj = doc
        .as_object()
        .ok_or_else(|| "document is not an object".to_string())?;

    let tweet_id = obj
        .get("tweet_id")
        .and_then(id_string)
        .ok_or_else(|| "missing tweet_id".to_string())?;
    let author_id = obj
        .get("author_id")
        .and_then(id_string)
        .ok_or_else(|| "missing author_id".to_string())?;
    let inbound = obj
        .get("inbound")
        .and_then(parse_inbound)
        .ok_or_else(|| "missing or unreadable inbound flag".to_string())?;
    let created_at = obj
        .get("created_at")
        .and_then(parse_created_at)
        .ok_or_else(|| "missing or unreadable created_at".to_string())?;

    let (text, coerced) = match obj.get("text") {
        Some(Value::String(s)) => (s.clone(), false),
        Some(Value::Null) | None => (String::new(), true),
        Some(other) => (other.to_string(), true),
    };

    let mut row = MessageRecord::new(tweet_id, author_id, inbound, text, created_at);
    row.response_tweet_id = obj.get("response_tweet_id").and_then(id_string);
    row.in_response_to_tweet_id = obj.get("in_response_to_tweet_id").and_then(id_string);
    Ok((row, coerced))
}

/// Identifiers arrive as strings, integers, or floats (`119237.0`) depending
/// on how the export was produced. NaN/null mean absent.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case("nan") {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| format!("{:.0}", f))
            }
        }
        _ => None,
    }
}

/// The export stores the flag as a bool or as the strings `"True"`/`"False"`.
fn parse_inbound(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Accepts the dataset layout (`Tue Oct 31 22:10:47 +0000 2017`), RFC 3339,
/// `{"$date": ...}` extended JSON, and epoch milliseconds.
fn parse_created_at(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_str(s, CREATED_AT_FORMAT)
                .or_else(|_| DateTime::parse_from_rfc3339(s))
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::Object(obj) => obj.get("$date").and_then(parse_created_at),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_loads_dataset_layout() {
        let doc = json!({
            "_id": {"$oid": "5a0a0a0a0a0a0a0a0a0a0a0a"},
            "tweet_id": 119237,
            "author_id": "105834",
            "inbound": "True",
            "created_at": "Wed Oct 11 06:55:44 +0000 2017",
            "text": "@AppleSupport causing the reply to be disregarded",
            "response_tweet_id": "119236",
            "in_response_to_tweet_id": 119238.0
        });

        let (row, coerced) = message_from_document(&doc).unwrap();
        assert!(!coerced);
        assert_eq!(row.tweet_id, "119237");
        assert_eq!(row.author_id, "105834");
        assert!(row.inbound);
        assert_eq!(row.created_at.year(), 2017);
        assert_eq!(row.created_at.hour(), 6);
        assert_eq!(row.response_tweet_id.as_deref(), Some("119236"));
        assert_eq!(row.in_response_to_tweet_id.as_deref(), Some("119238"));
        assert!(row.text_clean.is_none());
        assert!(row.date_only.is_none());
    }

    #[test]
    fn test_non_string_text_is_coerced_not_rejected() {
        let doc = json!({
            "tweet_id": "1",
            "author_id": "a",
            "inbound": true,
            "created_at": "2017-10-11T06:55:44Z",
            "text": 404
        });
        let (row, coerced) = message_from_document(&doc).unwrap();
        assert!(coerced);
        assert_eq!(row.text, "404");

        let doc = json!({
            "tweet_id": "2",
            "author_id": "a",
            "inbound": false,
            "created_at": {"$date": "2017-10-11T06:55:44Z"},
            "text": null
        });
        let (row, coerced) = message_from_document(&doc).unwrap();
        assert!(coerced);
        assert_eq!(row.text, "");
    }

    #[test]
    fn test_malformed_documents_are_skipped_and_reported() {
        let docs = vec![
            json!({"tweet_id": "1", "author_id": "a", "inbound": "True",
                   "created_at": "Wed Oct 11 06:55:44 +0000 2017", "text": "hi"}),
            json!({"tweet_id": "2", "author_id": "a", "inbound": "maybe",
                   "created_at": "Wed Oct 11 06:55:44 +0000 2017", "text": "hi"}),
            json!({"tweet_id": "3", "author_id": "a", "inbound": "True",
                   "created_at": "yesterday", "text": "hi"}),
            json!("not an object"),
        ];

        let (rows, report) = load_messages(&docs);
        assert_eq!(rows.len(), 1);
        assert_eq!(report.documents, 4);
        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped.len(), 3);
        assert!(report.skipped[0].contains("inbound"));
        assert!(report.skipped[1].contains("created_at"));
    }

    #[test]
    fn test_nan_reference_is_absent() {
        let doc = json!({
            "tweet_id": "1",
            "author_id": "a",
            "inbound": "False",
            "created_at": 1507704944000i64,
            "text": "hi",
            "response_tweet_id": "NaN"
        });
        let (row, _) = message_from_document(&doc).unwrap();
        assert!(!row.inbound);
        assert!(row.response_tweet_id.is_none());
        assert_eq!(row.created_at.timestamp_millis(), 1507704944000);
    }
}
