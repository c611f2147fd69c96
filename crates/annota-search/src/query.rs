//! Tri-state query building and language detection.
//!
//! The ranking engine consumes queries in `to_tsquery` form: each token
//! suffixed with the prefix-match operator and tokens AND-joined
//! (`"hello world"` → `hello:* & world:*`). Building that string from user
//! input is the only place raw queries are validated; violations are thrown
//! as [`Error::Validation`] before any I/O is issued.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_script::{Script, UnicodeScript};

use annota_core::defaults::{QUERY_MAX_LEN, QUERY_MIN_LEN};
use annota_core::{Error, Result};

/// Query languages with a text-search configuration mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
    Uk,
}

impl Language {
    /// Name of the text-search configuration the ranking engine should use.
    ///
    /// Ukrainian has no dedicated configuration in the backend; it is
    /// deliberately routed to the Russian analyzer. An approximation, not a
    /// bug.
    pub fn fts_config(self) -> &'static str {
        match self {
            Language::Ru | Language::Uk => "russian",
            Language::En => "english",
        }
    }
}

/// Characters with meaning in tsquery syntax, stripped before tokenizing.
static TSQUERY_SPECIALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[&|!():<>]").unwrap());

/// Build a tri-state query string from raw user input.
///
/// Lowercases, strips tsquery operator characters, splits on whitespace, and
/// joins the tokens as `token:* & token:*`.
///
/// # Errors
///
/// [`Error::Validation`] when the input is empty, shorter than
/// [`QUERY_MIN_LEN`] after trimming, longer than [`QUERY_MAX_LEN`], or empty
/// after sanitization (e.g. punctuation-only queries).
pub fn build_ts_query(query: &str) -> Result<String> {
    if query.is_empty() {
        return Err(Error::Validation(
            "Query must be a non-empty string".to_string(),
        ));
    }

    if query.chars().count() > QUERY_MAX_LEN {
        return Err(Error::Validation(format!(
            "Query exceeds maximum length: {QUERY_MAX_LEN}"
        )));
    }

    let trimmed = query.trim();
    if trimmed.chars().count() < QUERY_MIN_LEN {
        return Err(Error::Validation(format!(
            "Query must be at least {QUERY_MIN_LEN} characters"
        )));
    }

    let lowered = trimmed.to_lowercase();
    let sanitized = TSQUERY_SPECIALS.replace_all(&lowered, " ");
    let tokens: Vec<&str> = sanitized.split_whitespace().collect();

    if tokens.is_empty() {
        return Err(Error::Validation(
            "Query is empty after sanitization".to_string(),
        ));
    }

    Ok(tokens
        .iter()
        .map(|token| format!("{token}:*"))
        .collect::<Vec<_>>()
        .join(" & "))
}

/// Detect the query language from its script.
///
/// Any Cyrillic character classifies the query as Russian; everything else
/// (including the empty query) defaults per the dominant user base: empty →
/// Russian, otherwise English.
pub fn detect_language(query: &str) -> Language {
    if query.is_empty() {
        return Language::Ru;
    }
    if query.chars().any(|ch| ch.script() == Script::Cyrillic) {
        Language::Ru
    } else {
        Language::En
    }
}
