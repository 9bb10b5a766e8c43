use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::{PrepError, Result};

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Longest token a second-distance search is attempted for; the candidate
/// set grows quadratically with length.
const MAX_EDIT2_CHARS: usize = 20;

/// Word-frequency dictionary with frequency-ranked edit-distance correction.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    frequencies: HashMap<String, u64>,
}

impl Dictionary {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| PrepError::resource(path.display().to_string(), e.to_string()))?;
        let dictionary = Self::parse(&content)
            .map_err(|msg| PrepError::resource(path.display().to_string(), msg))?;
        if dictionary.is_empty() {
            return Err(PrepError::resource(
                path.display().to_string(),
                "dictionary has no words",
            ));
        }
        Ok(dictionary)
    }

    /// `word=frequency` per line; a bare word counts once. Words are lowercased.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let mut frequencies = HashMap::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (word, count) = match line.split_once('=') {
                Some((word, count)) => {
                    let count = count.trim().parse::<u64>().map_err(|_| {
                        format!("line {}: frequency '{}' is not a number", lineno + 1, count)
                    })?;
                    (word.trim(), count)
                }
                None => (line, 1),
            };
            if word.is_empty() {
                return Err(format!("line {}: empty word", lineno + 1));
            }
            *frequencies.entry(word.to_lowercase()).or_insert(0) += count;
        }
        Ok(Self { frequencies })
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.frequencies.contains_key(word)
    }

    pub fn frequency(&self, word: &str) -> u64 {
        self.frequencies.get(word).copied().unwrap_or(0)
    }

    /// Single-character tokens are never treated as misspellings
    pub fn should_check(word: &str) -> bool {
        word.chars().count() > 1
    }

    pub fn is_known(&self, word: &str) -> bool {
        !Self::should_check(word) || self.contains(word)
    }

    /// Best replacement for an unknown word: the most frequent known word at
    /// edit distance one, else at distance two. Ties go to the
    /// lexicographically smaller word. `None` when nothing is in reach.
    pub fn correction(&self, word: &str) -> Option<String> {
        if self.is_known(word) {
            return Some(word.to_string());
        }

        let first = edits1(word);
        let known1: HashSet<&String> = first.iter().filter(|w| self.contains(w)).collect();
        if let Some(best) = self.best_of(known1.into_iter()) {
            return Some(best);
        }

        if word.chars().count() > MAX_EDIT2_CHARS {
            return None;
        }
        let mut known2: HashSet<String> = HashSet::new();
        for e1 in &first {
            for e2 in edits1(e1) {
                if self.contains(&e2) {
                    known2.insert(e2);
                }
            }
        }
        self.best_of(known2.iter())
    }

    fn best_of<'a, I>(&self, candidates: I) -> Option<String>
    where
        I: Iterator<Item = &'a String>,
    {
        candidates
            .max_by(|a, b| {
                self.frequency(a)
                    .cmp(&self.frequency(b))
                    .then_with(|| b.cmp(a))
            })
            .cloned()
    }
}

/// All strings one delete, transpose, replace or insert away from `word`
fn edits1(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();
    let mut out = Vec::with_capacity(54 * n + 25);

    fn join(left: &[char], mid: &[char], right: &[char]) -> String {
        left.iter().chain(mid).chain(right).collect()
    }

    for i in 0..n {
        out.push(join(&chars[..i], &[], &chars[i + 1..]));
    }
    for i in 0..n.saturating_sub(1) {
        out.push(join(&chars[..i], &[chars[i + 1], chars[i]], &chars[i + 2..]));
    }
    for i in 0..n {
        for c in ALPHABET.chars() {
            if c != chars[i] {
                out.push(join(&chars[..i], &[c], &chars[i + 1..]));
            }
        }
    }
    for i in 0..=n {
        for c in ALPHABET.chars() {
            out.push(join(&chars[..i], &[c], &chars[i..]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> Dictionary {
        Dictionary::parse(
            "phone=500\nbattery=300\nscreen=200\nthe=1000\nthen=400\nthem=400\nupdate=100\nbeautiful\n",
        )
        .unwrap()
    }

    #[test]
    fn test_parse_counts_bare_words_once_and_lowercases() {
        let dict = Dictionary::parse("Hello=3\nworld\nhello=2\n\n# comment\n").unwrap();
        assert_eq!(dict.frequency("hello"), 5);
        assert_eq!(dict.frequency("world"), 1);
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_parse_rejects_bad_frequency() {
        assert!(Dictionary::parse("phone=lots").is_err());
        assert!(Dictionary::parse("=3").is_err());
    }

    #[test]
    fn test_known_words_pass_through() {
        let dict = dictionary();
        assert_eq!(dict.correction("phone").as_deref(), Some("phone"));
        assert_eq!(dict.correction("x").as_deref(), Some("x"));
    }

    #[test]
    fn test_corrects_at_distance_one_and_two() {
        let dict = dictionary();
        assert_eq!(dict.correction("phne").as_deref(), Some("phone"));
        assert_eq!(dict.correction("batery").as_deref(), Some("battery"));
        assert_eq!(dict.correction("beutifull").as_deref(), Some("beautiful"));
        assert_eq!(dict.correction("scren").as_deref(), Some("screen"));
    }

    #[test]
    fn test_prefers_frequency_then_lexicographic_order() {
        let dict = dictionary();
        // "the" (1000) beats "then"/"them" at distance one
        assert_eq!(dict.correction("thx").as_deref(), Some("the"));
        // "then" and "them" tie; the smaller word wins
        assert_eq!(dict.correction("thenm").as_deref(), Some("them"));
    }

    #[test]
    fn test_no_candidate_returns_none() {
        let dict = dictionary();
        assert_eq!(dict.correction("zzzzqqqq"), None);
    }

    #[test]
    fn test_load_missing_file_is_a_resource_error() {
        let result = Dictionary::load("/no/such/dictionary.txt");
        assert!(matches!(result, Err(PrepError::Resource { .. })));
    }
}
