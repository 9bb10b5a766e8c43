use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::info;

use super::lemma::Lemmatizer;
use super::spelling::Dictionary;
use crate::config::ResourceConfig;
use crate::error::{PrepError, Result};

/// English stop words (the NLTK list)
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Chat acronym expansions, keyed by the uppercased acronym
#[derive(Debug, Clone, Default)]
pub struct SlangMap {
    expansions: HashMap<String, String>,
}

impl SlangMap {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| PrepError::resource(path.display().to_string(), e.to_string()))?;
        Self::parse(&content).map_err(|msg| PrepError::resource(path.display().to_string(), msg))
    }

    /// `ACRONYM=expansion` per line; blank lines are skipped
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let mut expansions = HashMap::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let (key, expansion) = line
                .split_once('=')
                .ok_or_else(|| format!("line {}: expected KEY=value", lineno + 1))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("line {}: empty key", lineno + 1));
            }
            expansions.insert(key.to_uppercase(), expansion.trim().to_string());
        }
        Ok(Self { expansions })
    }

    pub fn len(&self) -> usize {
        self.expansions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expansions.is_empty()
    }

    pub fn expand(&self, token: &str) -> Option<&str> {
        self.expansions.get(&token.to_uppercase()).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn english() -> Self {
        Self {
            words: ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::english()
    }
}

/// Every lookup table the normalizer consults, loaded once before the batch
/// starts and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub slang: SlangMap,
    pub stop_words: StopWords,
    pub dictionary: Dictionary,
    pub lemmatizer: Lemmatizer,
}

impl Lexicon {
    /// Any missing or unreadable resource fails the whole load.
    pub fn load(resources: &ResourceConfig) -> Result<Self> {
        let slang = SlangMap::load(&resources.chat_words)?;
        let dictionary = Dictionary::load(&resources.dictionary)?;
        let lemmatizer = match &resources.lemma_exceptions {
            Some(path) => Lemmatizer::load(path)?,
            None => Lemmatizer::default(),
        };
        info!(
            slang_entries = slang.len(),
            dictionary_words = dictionary.len(),
            "Loaded lexicon"
        );
        Ok(Self {
            slang,
            stop_words: StopWords::english(),
            dictionary,
            lemmatizer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_slang_lookup_is_case_insensitive() {
        let slang = SlangMap::parse("BRB=be right back\nIMHO=in my humble opinion\n").unwrap();
        assert_eq!(slang.expand("brb"), Some("be right back"));
        assert_eq!(slang.expand("Imho"), Some("in my humble opinion"));
        assert_eq!(slang.expand("ok"), None);
    }

    #[test]
    fn test_slang_line_without_separator_is_rejected() {
        let err = SlangMap::parse("BRB=be right back\nLOL\n").unwrap_err();
        assert!(err.contains("line 2"));
    }

    #[test]
    fn test_stop_words_cover_contraction_fragments() {
        let stop = StopWords::english();
        for w in ["the", "don", "t", "s", "wouldn"] {
            assert!(stop.contains(w), "{} should be a stop word", w);
        }
        assert!(!stop.contains("iphone"));
    }

    #[test]
    fn test_lexicon_load_fails_on_missing_resource() {
        let dir = tempdir().unwrap();
        let chat = dir.path().join("chat.txt");
        fs::write(&chat, "BRB=be right back\n").unwrap();

        let resources = ResourceConfig {
            chat_words: chat,
            dictionary: PathBuf::from("/no/such/dictionary.txt"),
            lemma_exceptions: None,
        };
        assert!(matches!(
            Lexicon::load(&resources),
            Err(PrepError::Resource { .. })
        ));
    }

    #[test]
    fn test_lexicon_load_reads_all_resources() {
        let dir = tempdir().unwrap();
        let chat = dir.path().join("chat.txt");
        let dict = dir.path().join("dict.txt");
        let lemmas = dir.path().join("lemmas.txt");
        fs::write(&chat, "BRB=be right back\n").unwrap();
        fs::write(&dict, "phone=10\nback\n").unwrap();
        fs::write(&lemmas, "cacti=cactus\n").unwrap();

        let lexicon = Lexicon::load(&ResourceConfig {
            chat_words: chat,
            dictionary: dict,
            lemma_exceptions: Some(lemmas),
        })
        .unwrap();
        assert_eq!(lexicon.slang.len(), 1);
        assert_eq!(lexicon.dictionary.len(), 2);
        assert_eq!(
            lexicon.lemmatizer.lemmatize("cacti", &lexicon.dictionary),
            "cactus"
        );
    }
}
