//! Lexical normalizer
//!
//! Lowercases, tokenizes on non-alphanumeric boundaries, drops stop-words and
//! applies a crude suffix-stripping stemmer. The stemmer only exists to make
//! keyword matching tolerant of tense and plural variation; false positives
//! are acceptable.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Function words carrying no task intent
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "i", "me", "my", "mine", "we", "us", "our", "you", "your", "he", "she", "it", "its", "they",
    "them", "their", "this", "that", "these", "those", "is", "are", "was", "were", "be", "been", "am", "do", "does",
    "did", "can", "could", "would", "should", "will", "please", "thanks", "thank", "hi", "hello", "hey", "for", "to",
    "of", "in", "on", "at", "by", "with", "from", "about", "into", "and", "or", "so", "some", "any", "just", "also",
];

static STOP_WORD_SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// Whether a lowercase word is a stop-word
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORD_SET.contains(word)
}

/// Split into lowercase alphanumeric words, keeping stop-words
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Stem a single lowercase word
///
/// Only words longer than 3 characters are touched. Rules are tried in order
/// and the first applicable one wins, so at most one suffix is removed:
/// `-tion` (remainder longer than 1), `-ing` (word longer than 5),
/// `-ed` (word longer than 4), trailing `-s` but not `-ss` (word longer than 3).
pub fn stem(word: &str) -> String {
    let len = word.chars().count();
    if len <= 3 {
        return word.to_string();
    }

    if let Some(base) = word.strip_suffix("tion")
        && base.chars().count() > 1
    {
        return base.to_string();
    }
    if len > 5
        && let Some(base) = word.strip_suffix("ing")
    {
        return base.to_string();
    }
    if len > 4
        && let Some(base) = word.strip_suffix("ed")
    {
        return base.to_string();
    }
    if !word.ends_with("ss")
        && let Some(base) = word.strip_suffix('s')
    {
        return base.to_string();
    }

    word.to_string()
}

/// Full normalization: tokenize, drop stop-words, stem
pub fn normalize(text: &str) -> Vec<String> {
    words(text)
        .into_iter()
        .filter(|w| !is_stop_word(w))
        .map(|w| stem(&w))
        .collect()
}

/// Number of query words that are not stop-words
pub fn content_word_count(text: &str) -> usize {
    words(text).iter().filter(|w| !is_stop_word(w)).count()
}
