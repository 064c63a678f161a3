//! Placeholder tokens - the template's own wire format
//!
//! A placeholder is `[` + one or more of `A-Z`, `0-9`, `_` + `]`, and the body must
//! contain at least one letter. Anything else in square brackets (`[sic]`, `[1]`,
//! `[1a]`, `[ ]`) is ordinary text and never matched.

use crate::{DocModelError, Result};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::sync::OnceLock;

/// Regex matching one placeholder token, capturing its body
pub const PLACEHOLDER_PATTERN: &str = r"\[([A-Z0-9_]+)\]";

fn placeholder_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern is valid"))
}

/// The body of a placeholder token, e.g. `INSURED_NAME` for `[INSURED_NAME]`.
///
/// Two placeholders with the same body are the same field wherever they appear.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlaceholderName(String);

impl PlaceholderName {
    /// Create a placeholder name from its body (without brackets)
    pub fn new(body: impl Into<String>) -> Result<Self> {
        let body = body.into();
        if is_valid_body(&body) {
            Ok(Self(body))
        } else {
            Err(DocModelError::InvalidPlaceholder(body))
        }
    }

    /// Parse a full bracketed token such as `[DATE_LOSS]`
    pub fn from_token(token: &str) -> Result<Self> {
        token
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| DocModelError::InvalidPlaceholder(token.to_string()))
            .and_then(Self::new)
    }

    /// The body text, e.g. `INSURED_NAME`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The literal bracketed token as it appears in a template
    pub fn token(&self) -> String {
        format!("[{}]", self.0)
    }
}

fn is_valid_body(body: &str) -> bool {
    body.chars().any(|c| c.is_ascii_uppercase())
        && body
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

impl fmt::Display for PlaceholderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

impl FromStr for PlaceholderName {
    type Err = DocModelError;

    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with('[') {
            Self::from_token(s)
        } else {
            Self::new(s)
        }
    }
}

impl TryFrom<String> for PlaceholderName {
    type Error = DocModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PlaceholderName> for String {
    fn from(name: PlaceholderName) -> Self {
        name.0
    }
}

impl AsRef<str> for PlaceholderName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One placeholder occurrence inside a piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMatch {
    /// Byte range of the whole token, brackets included
    pub range: Range<usize>,
    /// The placeholder found there
    pub name: PlaceholderName,
}

/// Find every placeholder occurrence in `text`, in order
pub fn scan_placeholders(text: &str) -> Vec<PlaceholderMatch> {
    placeholder_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let body = caps.get(1)?;
            // numeric references such as footnote markers are not fields
            if !is_valid_body(body.as_str()) {
                return None;
            }
            Some(PlaceholderMatch {
                range: whole.range(),
                name: PlaceholderName(body.as_str().to_string()),
            })
        })
        .collect()
}

/// True when `text` contains at least one placeholder token
pub fn contains_placeholder(text: &str) -> bool {
    !scan_placeholders(text).is_empty()
}
