use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::spelling::Dictionary;
use crate::error::{PrepError, Result};

/// Irregular noun plurals resolved before any suffix rule is tried
const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("analyses", "analysis"),
    ("children", "child"),
    ("crises", "crisis"),
    ("criteria", "criterion"),
    ("data", "datum"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("halves", "half"),
    ("indices", "index"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("matrices", "matrix"),
    ("men", "man"),
    ("mice", "mouse"),
    ("oxen", "ox"),
    ("phenomena", "phenomenon"),
    ("selves", "self"),
    ("shelves", "shelf"),
    ("teeth", "tooth"),
    ("theses", "thesis"),
    ("thieves", "thief"),
    ("wives", "wife"),
    ("wolves", "wolf"),
    ("women", "woman"),
];

/// Noun detachment rules, tried in order against the word's suffix
const NOUN_SUFFIX_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

/// Dictionary-backed noun lemmatizer.
///
/// A word found in the exception table maps straight to its lemma. Otherwise
/// the word and every suffix-rule rewrite of it are checked against the
/// vocabulary, and the shortest one the vocabulary knows wins. Words with no
/// known form come back unchanged.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    exceptions: HashMap<String, String>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self {
            exceptions: IRREGULAR_NOUNS
                .iter()
                .map(|(form, lemma)| (form.to_string(), lemma.to_string()))
                .collect(),
        }
    }
}

impl Lemmatizer {
    /// Built-in table merged with `form=lemma` lines from `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| PrepError::resource(path.display().to_string(), e.to_string()))?;
        let mut lemmatizer = Self::default();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (form, lemma) = line.split_once('=').ok_or_else(|| {
                PrepError::resource(
                    path.display().to_string(),
                    format!("line {}: expected form=lemma", lineno + 1),
                )
            })?;
            lemmatizer.add_exception(form.trim(), lemma.trim());
        }
        Ok(lemmatizer)
    }

    pub fn add_exception(&mut self, form: &str, lemma: &str) {
        self.exceptions
            .insert(form.to_lowercase(), lemma.to_lowercase());
    }

    pub fn lemmatize(&self, word: &str, vocabulary: &Dictionary) -> String {
        if let Some(lemma) = self.exceptions.get(word) {
            return lemma.clone();
        }

        let mut best: Option<String> = None;
        let candidates = std::iter::once(word.to_string()).chain(
            NOUN_SUFFIX_RULES.iter().filter_map(|(suffix, replacement)| {
                word.strip_suffix(suffix)
                    .map(|stem| format!("{}{}", stem, replacement))
            }),
        );
        for candidate in candidates {
            if candidate.is_empty() || !vocabulary.contains(&candidate) {
                continue;
            }
            let shorter = best
                .as_ref()
                .map_or(true, |b| candidate.chars().count() < b.chars().count());
            if shorter {
                best = Some(candidate);
            }
        }
        best.unwrap_or_else(|| word.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary() -> Dictionary {
        Dictionary::parse("phone\nglass\nbox\nbattery\nchurch\nissue\nwatch\nwas\nwa\n").unwrap()
    }

    #[test]
    fn test_regular_plurals_reduce_to_known_base() {
        let lem = Lemmatizer::default();
        let vocab = vocabulary();
        assert_eq!(lem.lemmatize("phones", &vocab), "phone");
        assert_eq!(lem.lemmatize("glasses", &vocab), "glass");
        assert_eq!(lem.lemmatize("boxes", &vocab), "box");
        assert_eq!(lem.lemmatize("batteries", &vocab), "battery");
        assert_eq!(lem.lemmatize("churches", &vocab), "church");
        assert_eq!(lem.lemmatize("issues", &vocab), "issue");
    }

    #[test]
    fn test_irregular_forms_use_exception_table() {
        let lem = Lemmatizer::default();
        let vocab = Dictionary::default();
        assert_eq!(lem.lemmatize("children", &vocab), "child");
        assert_eq!(lem.lemmatize("lives", &vocab), "life");
    }

    #[test]
    fn test_unknown_words_pass_through() {
        let lem = Lemmatizer::default();
        let vocab = vocabulary();
        assert_eq!(lem.lemmatize("airpods", &vocab), "airpods");
        assert_eq!(lem.lemmatize("watch", &vocab), "watch");
    }

    #[test]
    fn test_shortest_known_form_wins() {
        let lem = Lemmatizer::default();
        // both the word and its stripped form are known; the shorter is taken
        assert_eq!(lem.lemmatize("was", &vocabulary()), "wa");
    }

    #[test]
    fn test_custom_exception_overrides() {
        let mut lem = Lemmatizer::default();
        lem.add_exception("Cacti", "cactus");
        assert_eq!(lem.lemmatize("cacti", &Dictionary::default()), "cactus");
    }
}
