//! Lexicon-free text transforms.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{TextTransform, TransformOutcome};

/// ASCII punctuation, the same set Python's `string.punctuation` holds
pub const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

/// Typographic single and double quotes, open and close
pub const CURLY_QUOTES: [char; 4] = ['\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

static DIGIT_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S*\d\S*").unwrap());
static EMOJI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{Extended_Pictographic}\p{Emoji_Presentation}]").unwrap());
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").unwrap());

/// Collapse runs of three or more identical characters to two
/// (`soooo` -> `soo`). Newlines never form a run.
pub fn reduce_lengthening(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut run = 0usize;

    for c in text.chars() {
        if Some(c) == prev && c != '\n' {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run <= 2 {
            out.push(c);
        }
    }
    out
}

pub fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| if PUNCTUATION.contains(c) { ' ' } else { c })
        .collect()
}

pub fn strip_curly_quotes(text: &str) -> String {
    text.chars()
        .map(|c| if CURLY_QUOTES.contains(&c) { ' ' } else { c })
        .collect()
}

/// Blank every whitespace-delimited token that contains a digit. Each such
/// token becomes one space; surrounding whitespace is untouched.
pub fn remove_digit_tokens(text: &str) -> String {
    DIGIT_TOKEN.replace_all(text, " ").into_owned()
}

/// Drop every token holding at least one emoji glyph, the whole token
/// rather than just the glyph.
pub fn remove_emoji_tokens(text: &str) -> String {
    text.split_whitespace()
        .filter(|token| !EMOJI.is_match(token))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn remove_urls(text: &str) -> String {
    URL.replace_all(text, "").into_owned()
}

pub struct ReduceLengthening;
pub struct CaseFold;
pub struct StripPunctuation;
pub struct StripCurlyQuotes;
pub struct RemoveDigitTokens;
pub struct RemoveEmojiTokens;
pub struct RemoveUrls;

impl TextTransform for ReduceLengthening {
    fn name(&self) -> &'static str {
        "reduce_lengthening"
    }

    fn apply(&self, text: &str) -> TransformOutcome {
        TransformOutcome::Applied(reduce_lengthening(text))
    }
}

impl TextTransform for CaseFold {
    fn name(&self) -> &'static str {
        "case_fold"
    }

    fn apply(&self, text: &str) -> TransformOutcome {
        TransformOutcome::Applied(text.to_lowercase())
    }
}

impl TextTransform for StripPunctuation {
    fn name(&self) -> &'static str {
        "strip_punctuation"
    }

    fn apply(&self, text: &str) -> TransformOutcome {
        TransformOutcome::Applied(strip_punctuation(text))
    }
}

impl TextTransform for StripCurlyQuotes {
    fn name(&self) -> &'static str {
        "strip_curly_quotes"
    }

    fn apply(&self, text: &str) -> TransformOutcome {
        TransformOutcome::Applied(strip_curly_quotes(text))
    }
}

impl TextTransform for RemoveDigitTokens {
    fn name(&self) -> &'static str {
        "remove_digit_tokens"
    }

    fn apply(&self, text: &str) -> TransformOutcome {
        TransformOutcome::Applied(remove_digit_tokens(text))
    }
}

impl TextTransform for RemoveEmojiTokens {
    fn name(&self) -> &'static str {
        "remove_emoji_tokens"
    }

    fn apply(&self, text: &str) -> TransformOutcome {
        TransformOutcome::Applied(remove_emoji_tokens(text))
    }
}

impl TextTransform for RemoveUrls {
    fn name(&self) -> &'static str {
        "remove_urls"
    }

    fn apply(&self, text: &str) -> TransformOutcome {
        TransformOutcome::Applied(remove_urls(text))
    }
}
