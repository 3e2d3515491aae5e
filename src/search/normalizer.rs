//! Resume text normalization.
//!
//! Turns free-form resume text into a lowercase primary token sequence plus a
//! set of variant spellings. CamelCase boundaries are detected on the original
//! casing, so `HuggingFace` yields the tokens `hugging face` and the variant
//! `huggingface`, letting either spelling match at query time.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+").expect("email pattern is valid"));

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("url pattern is valid")
});

// Standalone ".NET"; "ASP.NET" or "foo@bar.net" are left alone
static DOTNET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[^\w@.])\.net\b").expect("dotnet pattern is valid")
});

/// Switches for the optional normalization rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Rewrite a standalone `.NET` to the token `dotnet`
    pub expand_dotnet: bool,

    /// Add the concatenation of every adjacent token pair as a variant, so
    /// text written `Hugging Face` also matches `huggingface`
    pub merge_adjacent_words: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            expand_dotnet: true,
            merge_adjacent_words: true,
        }
    }
}

/// Normalized form of one text blob
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    tokens: Vec<String>,
    variants: BTreeSet<String>,
}

impl NormalizedText {
    /// Primary tokens in text order (duplicates kept)
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Generated spellings (merged compounds, split halves)
    pub fn variants(&self) -> &BTreeSet<String> {
        &self.variants
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Every matchable token, primary and variant, deduplicated
    pub fn token_set(&self) -> BTreeSet<&str> {
        self.tokens
            .iter()
            .chain(self.variants.iter())
            .map(String::as_str)
            .collect()
    }

    /// Primary sequence rendered back to text.
    ///
    /// Normalizing this text gives the same primary sequence and a token set
    /// contained in this one. Merges of three or more CamelCase parts need the
    /// original casing and are not rebuilt.
    pub fn as_text(&self) -> String {
        self.tokens.join(" ")
    }

    pub fn into_parts(self) -> (Vec<String>, BTreeSet<String>) {
        (self.tokens, self.variants)
    }
}

/// Query-side view of a bare term.
///
/// A term matches when the index holds its merged `literal` form, or when it
/// splits into several parts and every part is present on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundTerm {
    pub literal: String,
    pub parts: Vec<String>,
}

impl CompoundTerm {
    pub fn is_empty(&self) -> bool {
        self.literal.is_empty()
    }

    pub fn is_compound(&self) -> bool {
        self.parts.len() > 1
    }
}

/// Text normalizer
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a raw text blob
    pub fn normalize(&self, raw: &str) -> NormalizedText {
        if raw.trim().is_empty() {
            return NormalizedText::default();
        }

        let cleaned = self.strip_noise(raw);

        let mut tokens = Vec::new();
        let mut variants = BTreeSet::new();

        for word in extract_words(&cleaned) {
            if word.contains(is_joiner) {
                // Hyphenated/apostrophe words stay whole in the primary sequence
                tokens.push(word.to_lowercase());

                let pieces: Vec<&str> = word
                    .split(is_joiner)
                    .filter(|p| !p.is_empty())
                    .collect();
                let lowered: Vec<String> = pieces.iter().map(|p| p.to_lowercase()).collect();
                add_compound_variants(&lowered, &mut variants);

                for piece in pieces {
                    let parts = lowercase_parts(&split_camel_case(piece));
                    if parts.len() > 1 {
                        add_compound_variants(&parts, &mut variants);
                    }
                }
            } else {
                let parts = lowercase_parts(&split_camel_case(&word));
                if parts.len() > 1 {
                    add_compound_variants(&parts, &mut variants);
                }
                tokens.extend(parts);
            }
        }

        if self.config.merge_adjacent_words {
            for pair in tokens.windows(2) {
                variants.insert(format!("{}{}", pair[0], pair[1]));
            }
        }

        NormalizedText { tokens, variants }
    }

    /// Normalize a bare query term with the same rules used for record text.
    ///
    /// Hyphenated and apostrophe words are split into their pieces, matching
    /// the variants record text gets for them.
    pub fn compound_term(&self, raw: &str) -> CompoundTerm {
        let (tokens, _) = self.normalize(raw).into_parts();
        let parts: Vec<String> = tokens
            .iter()
            .flat_map(|token| token.split(is_joiner))
            .filter(|piece| !piece.is_empty())
            .map(String::from)
            .collect();
        CompoundTerm {
            literal: parts.concat(),
            parts,
        }
    }

    /// Normalize the words of a quoted phrase to primary tokens
    pub fn phrase_tokens(&self, words: &[String]) -> Vec<String> {
        let (tokens, _) = self.normalize(&words.join(" ")).into_parts();
        tokens
    }

    fn strip_noise(&self, raw: &str) -> String {
        let text = EMAIL_PATTERN.replace_all(raw, " ");
        let text = URL_PATTERN.replace_all(&text, " ");
        if self.config.expand_dotnet {
            DOTNET_PATTERN.replace_all(&text, "${1} dotnet ").into_owned()
        } else {
            text.into_owned()
        }
    }
}

/// Normalize with the default configuration
pub fn normalize(raw: &str) -> NormalizedText {
    Normalizer::default().normalize(raw)
}

/// Query-term normalization with the default configuration
pub fn normalize_term(raw: &str) -> CompoundTerm {
    Normalizer::default().compound_term(raw)
}

fn is_joiner(ch: char) -> bool {
    matches!(ch, '-' | '\'' | '\u{2019}')
}

/// Split text into words, keeping `-` and `'` only between two alphanumerics
fn extract_words(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_alphanumeric() {
            current.push(ch);
            continue;
        }

        let internal = is_joiner(ch)
            && !current.is_empty()
            && chars.get(i + 1).is_some_and(|next| next.is_alphanumeric());

        if internal {
            current.push(ch);
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// Split a word at lowercase-to-uppercase boundaries of its original casing.
///
/// `HuggingFace` -> `Hugging`, `Face`. Uppercase runs stay together, so
/// `RESTful` and `APIs` are not split.
fn split_camel_case(word: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut previous: Option<char> = None;

    for (offset, current) in word.char_indices() {
        if previous.is_some_and(|p| p.is_lowercase()) && current.is_uppercase() {
            parts.push(&word[start..offset]);
            start = offset;
        }
        previous = Some(current);
    }

    parts.push(&word[start..]);
    parts
}

fn lowercase_parts(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_lowercase()).collect()
}

fn add_compound_variants(parts: &[String], variants: &mut BTreeSet<String>) {
    if parts.len() < 2 {
        return;
    }

    for part in parts {
        variants.insert(part.clone());
    }
    for pair in parts.windows(2) {
        variants.insert(format!("{}{}", pair[0], pair[1]));
    }
    variants.insert(parts.concat());
}
