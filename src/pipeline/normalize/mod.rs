//! Text normalization chain.
//!
//! A `Normalizer` owns a fixed, ordered list of transforms. Each transform maps
//! text to text and reports whether it could fully process its input. A
//! transform never fails a row: when it cannot do its job it hands back a
//! fallback and marks the row `Defaulted`, so the batch keeps going and the
//! fallback stays countable.

pub mod lemma;
pub mod lexicon;
pub mod spelling;
pub mod transforms;

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::types::MessageRecord;
pub use lemma::Lemmatizer;
pub use lexicon::{Lexicon, SlangMap, StopWords};
pub use spelling::Dictionary;
use transforms::{
    CaseFold, ReduceLengthening, RemoveDigitTokens, RemoveEmojiTokens, RemoveUrls,
    StripCurlyQuotes, StripPunctuation,
};

/// Result of one transform on one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    Applied(String),
    /// The transform fell back for part or all of the value
    Defaulted { text: String, reason: String },
}

impl TransformOutcome {
    pub fn text(&self) -> &str {
        match self {
            TransformOutcome::Applied(text) => text,
            TransformOutcome::Defaulted { text, .. } => text,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, TransformOutcome::Defaulted { .. })
    }
}

/// One step of the normalization chain
pub trait TextTransform: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, text: &str) -> TransformOutcome;
}

/// Replace chat acronyms with their expansion, token by token
pub struct ExpandSlang<'a> {
    slang: &'a SlangMap,
}

impl TextTransform for ExpandSlang<'_> {
    fn name(&self) -> &'static str {
        "expand_slang"
    }

    fn apply(&self, text: &str) -> TransformOutcome {
        let out: Vec<&str> = text
            .split_whitespace()
            .map(|token| self.slang.expand(token).unwrap_or(token))
            .collect();
        TransformOutcome::Applied(out.join(" "))
    }
}

/// Replace unknown tokens with the dictionary's best suggestion. A token with
/// no suggestion is kept as written and the row is reported as defaulted.
///
/// Lookups for unknown tokens are memoized for the life of the step, so a
/// token repeated across a batch is searched once.
pub struct CorrectSpelling<'a> {
    dictionary: &'a Dictionary,
    corrections: Mutex<HashMap<String, Option<String>>>,
}

impl<'a> CorrectSpelling<'a> {
    pub fn new(dictionary: &'a Dictionary) -> Self {
        Self {
            dictionary,
            corrections: Mutex::new(HashMap::new()),
        }
    }

    fn correct(&self, token: &str) -> Option<String> {
        if self.dictionary.is_known(token) {
            return Some(token.to_string());
        }
        // the cache holds plain lookups, so a poisoned lock is still usable
        let mut corrections = self.corrections.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = corrections.get(token) {
            return cached.clone();
        }
        let corrected = self.dictionary.correction(token);
        corrections.insert(token.to_string(), corrected.clone());
        corrected
    }
}

impl TextTransform for CorrectSpelling<'_> {
    fn name(&self) -> &'static str {
        "correct_spelling"
    }

    fn apply(&self, text: &str) -> TransformOutcome {
        let mut uncorrected = Vec::new();
        let out: Vec<String> = text
            .split_whitespace()
            .map(|token| match self.correct(token) {
                Some(corrected) => corrected,
                None => {
                    uncorrected.push(token.to_string());
                    token.to_string()
                }
            })
            .collect();

        let text = out.join(" ");
        if uncorrected.is_empty() {
            TransformOutcome::Applied(text)
        } else {
            TransformOutcome::Defaulted {
                text,
                reason: format!("no spelling suggestion for: {}", uncorrected.join(", ")),
            }
        }
    }
}

pub struct RemoveStopWords<'a> {
    stop_words: &'a StopWords,
}

impl TextTransform for RemoveStopWords<'_> {
    fn name(&self) -> &'static str {
        "remove_stop_words"
    }

    fn apply(&self, text: &str) -> TransformOutcome {
        let out: Vec<&str> = text
            .split_whitespace()
            .filter(|token| !self.stop_words.contains(token))
            .collect();
        TransformOutcome::Applied(out.join(" "))
    }
}

pub struct Lemmatize<'a> {
    lemmatizer: &'a Lemmatizer,
    vocabulary: &'a Dictionary,
}

impl TextTransform for Lemmatize<'_> {
    fn name(&self) -> &'static str {
        "lemmatize"
    }

    fn apply(&self, text: &str) -> TransformOutcome {
        let out: Vec<String> = text
            .split_whitespace()
            .map(|token| self.lemmatizer.lemmatize(token, self.vocabulary))
            .collect();
        TransformOutcome::Applied(out.join(" "))
    }
}

/// A transform fallback recorded against one row
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DefaultedRow {
    /// Position of the row in the normalized batch
    pub row: usize,
    pub tweet_id: String,
    pub step: &'static str,
    pub reason: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct NormalizeReport {
    pub rows: usize,
    /// Every fallback, in row then step order
    pub defaulted: Vec<DefaultedRow>,
}

impl NormalizeReport {
    /// Rows with at least one fallback, counted by batch position so rows
    /// sharing a `tweet_id` are still counted separately
    pub fn defaulted_rows(&self) -> usize {
        self.defaulted
            .iter()
            .map(|d| d.row)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Normalized text for one value plus the fallbacks it hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub defaulted: Vec<(&'static str, String)>,
}

pub struct Normalizer<'a> {
    steps: Vec<Box<dyn TextTransform + 'a>>,
}

impl<'a> Normalizer<'a> {
    /// The standard chain. Order matters: later steps assume the cleanup done
    /// by earlier ones.
    pub fn new(lexicon: &'a Lexicon) -> Self {
        let steps: Vec<Box<dyn TextTransform + 'a>> = vec![
            Box::new(ReduceLengthening),
            Box::new(CaseFold),
            Box::new(StripPunctuation),
            Box::new(StripCurlyQuotes),
            Box::new(RemoveDigitTokens),
            Box::new(ExpandSlang {
                slang: &lexicon.slang,
            }),
            Box::new(CorrectSpelling::new(&lexicon.dictionary)),
            Box::new(RemoveStopWords {
                stop_words: &lexicon.stop_words,
            }),
            Box::new(Lemmatize {
                lemmatizer: &lexicon.lemmatizer,
                vocabulary: &lexicon.dictionary,
            }),
            Box::new(RemoveEmojiTokens),
            Box::new(RemoveUrls),
        ];
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn normalize_text(&self, text: &str) -> NormalizedText {
        let mut current = text.to_string();
        let mut defaulted = Vec::new();
        for step in &self.steps {
            match step.apply(&current) {
                TransformOutcome::Applied(next) => current = next,
                TransformOutcome::Defaulted { text, reason } => {
                    defaulted.push((step.name(), reason));
                    current = text;
                }
            }
        }
        NormalizedText {
            text: current,
            defaulted,
        }
    }

    /// Fill `text_clean` on every row from its raw `text`
    pub fn normalize_rows(&self, rows: Vec<MessageRecord>) -> (Vec<MessageRecord>, NormalizeReport) {
        let mut report = NormalizeReport {
            rows: rows.len(),
            ..Default::default()
        };

        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, mut row)| {
                let normalized = self.normalize_text(&row.text);
                for (step, reason) in normalized.defaulted {
                    debug!(tweet_id = %row.tweet_id, step, "Transform fell back: {}", reason);
                    report.defaulted.push(DefaultedRow {
                        row: idx,
                        tweet_id: row.tweet_id.clone(),
                        step,
                        reason,
                    });
                }
                row.text_clean = Some(normalized.text);
                row
            })
            .collect();

        (rows, report)
    }
}
