use std::collections::HashSet;

use super::normalizer::{CompoundTerm, NormalizedText, Normalizer};

/// Per-record lookup structure over normalized text.
///
/// Term lookups see primary tokens and variants. Phrase lookups only walk the
/// primary sequence, because variants carry no position.
#[derive(Debug, Clone, Default)]
pub struct MatcherIndex {
    tokens: Vec<String>,
    terms: HashSet<String>,
}

impl MatcherIndex {
    pub fn new(normalized: NormalizedText) -> Self {
        let (tokens, variants) = normalized.into_parts();
        let mut terms: HashSet<String> = tokens.iter().cloned().collect();
        terms.extend(variants);
        Self { tokens, terms }
    }

    /// Normalize `raw` and index it
    pub fn from_text(raw: &str, normalizer: &Normalizer) -> Self {
        Self::new(normalizer.normalize(raw))
    }

    /// Index for a record without usable text; matches nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// True if the lowercase `term` is a primary token or a variant
    pub fn contains_term(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    /// True if `words` appear contiguously and in order in the primary sequence
    pub fn contains_phrase<S: AsRef<str>>(&self, words: &[S]) -> bool {
        if words.is_empty() || words.len() > self.tokens.len() {
            return false;
        }

        self.tokens.windows(words.len()).any(|window| {
            window
                .iter()
                .zip(words)
                .all(|(token, word)| token.as_str() == AsRef::<str>::as_ref(word))
        })
    }

    /// Literal form, or every split part when the term is a compound
    pub fn matches_compound(&self, term: &CompoundTerm) -> bool {
        if term.is_empty() {
            return false;
        }

        self.contains_term(&term.literal)
            || (term.is_compound() && term.parts.iter().all(|part| self.contains_term(part)))
    }
}
