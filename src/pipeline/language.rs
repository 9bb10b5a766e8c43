use serde::Serialize;
use tracing::debug;

use crate::types::MessageRecord;

/// Assigns a language tag to a piece of text
pub trait LanguageDetector: Send + Sync {
    /// ISO 639-3 code, or `None` when the classifier has no answer
    fn detect(&self, text: &str) -> Option<String>;
}

/// Trigram classifier from the `whatlang` crate. Classifications are taken
/// as-is with no confidence threshold, so short or noisy rows may be
/// misclassified.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        whatlang::detect(text).map(|info| info.lang().code().to_string())
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct LanguageReport {
    pub input: usize,
    pub kept: usize,
    /// Classified as some other language
    pub dropped_other: usize,
    /// Classifier returned nothing
    pub dropped_undetected: usize,
}

/// Tag every row from its `text_clean` and keep those tagged `target`.
pub fn filter_language(
    rows: Vec<MessageRecord>,
    detector: &dyn LanguageDetector,
    target: &str,
) -> (Vec<MessageRecord>, LanguageReport) {
    let mut report = LanguageReport {
        input: rows.len(),
        ..Default::default()
    };

    let kept: Vec<MessageRecord> = rows
        .into_iter()
        .filter_map(|mut row| {
            let clean = row.text_clean.as_deref().unwrap_or_default();
            let detected = detector.detect(clean).filter(|tag| !tag.is_empty());
            match detected {
                Some(tag) if tag == target => {
                    row.text_lang = Some(tag);
                    Some(row)
                }
                Some(tag) => {
                    debug!(tweet_id = %row.tweet_id, lang = %tag, "Dropping non-target language row");
                    report.dropped_other += 1;
                    None
                }
                None => {
                    report.dropped_undetected += 1;
                    None
                }
            }
        })
        .collect();

    report.kept = kept.len();
    (kept, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    struct FixedDetector(HashMap<&'static str, &'static str>);

    impl LanguageDetector for FixedDetector {
        fn detect(&self, text: &str) -> Option<String> {
            self.0.get(text).map(|s| s.to_string())
        }
    }

    fn row(id: &str, clean: &str) -> MessageRecord {
        let ts = Utc.with_ymd_and_hms(2017, 10, 31, 22, 10, 47).unwrap();
        let mut r = MessageRecord::new(id, "a", true, clean, ts);
        r.text_clean = Some(clean.to_string());
        r
    }

    #[test]
    fn test_keeps_target_and_tags_rows() {
        let detector = FixedDetector(HashMap::from([
            ("phone battery die", "eng"),
            ("mi telefono no funciona", "spa"),
            ("", ""),
        ]));
        let rows = vec![
            row("1", "phone battery die"),
            row("2", "mi telefono no funciona"),
            row("3", ""),
            row("4", "???"),
        ];

        let (kept, report) = filter_language(rows, &detector, "eng");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text_lang.as_deref(), Some("eng"));
        assert_eq!(report.dropped_other, 1);
        assert_eq!(report.dropped_undetected, 2);
    }

    #[test]
    fn test_whatlang_detects_plain_english() {
        let detector = WhatlangDetector;
        let tag = detector.detect(
            "my phone keeps restarting after the latest update and the battery drains very quickly",
        );
        assert_eq!(tag.as_deref(), Some("eng"));
    }
}
