// Word tokenizer for corpus text and occupation titles.
//
// Text is lowercased, split into words on Unicode word boundaries, filtered
// by character class, and stripped of English stop words. Hyphenated,
// slashed and apostrophe'd compounds ("load/unload", "first-line",
// "don't") stay whole and are therefore dropped by the character filter,
// the same way a treebank-style tokenizer would leave them.

use std::collections::HashSet;

use regex::Regex;
use stop_words::{get, LANGUAGE};

/// Word runs, with internal joiners kept inside a single token.
const WORD_PATTERN: &str = r"\w+(?:[-'’/.]\w+)*";

/// Which tokens survive the character-class filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Letters only. Used for the industry corpus.
    Alphabetic,
    /// Letters and digits. Used for occupation titles, which may carry codes.
    Alphanumeric,
}

impl TokenClass {
    fn admits(self, token: &str) -> bool {
        !token.is_empty()
            && match self {
                Self::Alphabetic => token.chars().all(char::is_alphabetic),
                Self::Alphanumeric => token.chars().all(char::is_alphanumeric),
            }
    }
}

/// Tokenizer holding its stop-word set. Build once per run and pass it
/// to whatever needs to tokenize.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stop_words: HashSet<String>,
    word: Regex,
}

impl Tokenizer {
    /// Tokenizer using the English stop-word list from the `stop-words` crate.
    pub fn english() -> Self {
        Self::with_stop_words(get(LANGUAGE::English).iter().map(|w| w.to_string()))
    }

    /// Tokenizer with a caller-supplied stop-word set. Words are lowercased.
    pub fn with_stop_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
            word: Regex::new(WORD_PATTERN).expect("word pattern is valid"),
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Tokenize `text`, keeping tokens of `class` that aren't stop words.
    /// Order follows the input and duplicates are kept.
    pub fn tokenize(&self, text: &str, class: TokenClass) -> Vec<String> {
        let lower = text.to_lowercase();
        self.word
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|t| class.admits(t) && !self.is_stop_word(t))
            .map(str::to_string)
            .collect()
    }

    /// Tokens of an industry description: alphabetic words only.
    pub fn tokenize_corpus(&self, text: &str) -> Vec<String> {
        self.tokenize(text, TokenClass::Alphabetic)
    }

    /// Tokens of an occupation title: alphanumeric words.
    pub fn tokenize_title(&self, title: &str) -> Vec<String> {
        self.tokenize(title, TokenClass::Alphanumeric)
    }
}
