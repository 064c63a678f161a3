//! Name similarity between placeholders and record keys
//!
//! Scoring is a pure function over two normalized names, returning a value in
//! `[0, 1]`. The mapper only compares the score against a threshold, so any
//! [`Similarity`] implementation can be swapped in.

/// Minimum score for a fuzzy match (inclusive)
pub const FUZZY_THRESHOLD: f64 = 0.5;

/// Shortest compact key that may match by containment
const MIN_CONTAINED_LEN: usize = 4;

/// Words dropped during tokenization
const STOPWORDS: &[&str] = &["of", "the", "and"];

/// Words too generic to justify a match on their own
const GENERIC_WORDS: &[&str] = &[
    "number", "no", "num", "id", "date", "name", "code", "type", "desc", "description", "info",
];

/// Qualifiers that all name the insured property. Any two of them describe the
/// same place, so `INSURED_H_CITY` and `address_city` agree.
pub(crate) const PROPERTY_QUALIFIERS: &[&str] = &[
    "insured", "risk", "property", "loss", "location", "h", "home", "full", "site", "dwelling",
];

/// A field name folded for comparison.
///
/// `INSURED_H_CITY` becomes tokens `[insured, h, city]` and compact form
/// `insuredhcity`; `date_of_loss` becomes `[date, loss]` / `dateloss`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    compact: String,
    tokens: Vec<String>,
}

impl NormalizedName {
    pub fn new(raw: &str) -> Self {
        let tokens: Vec<String> = raw
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .filter(|t| !STOPWORDS.contains(&t.as_str()))
            .collect();
        let compact = tokens.concat();
        Self { compact, tokens }
    }

    /// Lowercase name with separators and stopwords removed
    pub fn compact(&self) -> &str {
        &self.compact
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The last token, which names what the field is (`city`, `zip`, ...)
    pub fn head(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    /// Every token before the head (`[insured, h]` for `INSURED_H_CITY`)
    pub fn qualifiers(&self) -> &[String] {
        match self.tokens.split_last() {
            Some((_, qualifiers)) => qualifiers,
            None => &[],
        }
    }

    pub fn has_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// True when every token is a generic word such as `number` or `date`
    pub fn is_generic(&self) -> bool {
        self.tokens.iter().all(|t| is_generic_word(t))
    }
}

fn is_generic_word(token: &str) -> bool {
    GENERIC_WORDS.contains(&token)
}

fn is_property_word(token: &str) -> bool {
    PROPERTY_QUALIFIERS.contains(&token) || token == "address" || token == "addr"
}

/// Qualifiers agree when either side has none, when they share a specific
/// word, or when both sides only name the insured property.
fn qualifiers_agree(a: &[String], b: &[String]) -> bool {
    if a.is_empty() || b.is_empty() {
        return true;
    }
    if a.iter().any(|t| !is_generic_word(t) && b.contains(t)) {
        return true;
    }
    a.iter().chain(b).all(|t| is_property_word(t))
}

/// Pluggable similarity score in `[0, 1]`
pub trait Similarity: Send + Sync {
    fn score(&self, placeholder: &NormalizedName, key: &NormalizedName) -> f64;
}

/// Default scorer: containment first, then token overlap on a shared head.
///
/// - a key whose compact form (at least 4 characters, not purely generic words)
///   is contained in the placeholder's compact form scores `1.0`
/// - otherwise the two names must end in the same head token and their
///   qualifiers must agree (`DATE_LOSS` vs `type_of_loss` and
///   `MORTGAGEE_STATE` vs `address_state` do not); the score is the overlap
///   coefficient `|shared| / min(|a|, |b|)`
/// - overlap made only of generic words scores `0.0`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlap;

impl Similarity for TokenOverlap {
    fn score(&self, placeholder: &NormalizedName, key: &NormalizedName) -> f64 {
        if key.tokens.is_empty() || placeholder.tokens.is_empty() {
            return 0.0;
        }
        if key.compact.len() >= MIN_CONTAINED_LEN
            && !key.is_generic()
            && placeholder.compact.contains(&key.compact)
        {
            return 1.0;
        }
        if placeholder.head() != key.head()
            || !qualifiers_agree(placeholder.qualifiers(), key.qualifiers())
        {
            return 0.0;
        }

        let shared: Vec<&String> = key
            .tokens
            .iter()
            .filter(|t| placeholder.has_token(t))
            .collect();
        if shared.iter().all(|t| is_generic_word(t)) {
            return 0.0;
        }
        let smaller = placeholder.tokens.len().min(key.tokens.len());
        (shared.len() as f64 / smaller as f64).min(1.0)
    }
}

/// Alternative scorer: normalized Levenshtein similarity of the compact forms
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistance;

impl Similarity for EditDistance {
    fn score(&self, placeholder: &NormalizedName, key: &NormalizedName) -> f64 {
        let a: Vec<char> = placeholder.compact.chars().collect();
        let b: Vec<char> = key.compact.chars().collect();
        let longest = a.len().max(b.len());
        if longest == 0 {
            return 0.0;
        }
        1.0 - levenshtein(&a, &b) as f64 / longest as f64
    }
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn score(placeholder: &str, key: &str) -> f64 {
        TokenOverlap.score(&NormalizedName::new(placeholder), &NormalizedName::new(key))
    }

    #[test]
    fn test_normalization() {
        let name = NormalizedName::new("date_of_loss");
        assert_eq!(name.compact(), "dateloss");
        assert_eq!(name.tokens(), ["date", "loss"]);
        assert_eq!(NormalizedName::new("INSURED_H_CITY").head(), Some("city"));
    }

    #[test]
    fn test_shared_head_token() {
        assert_eq!(score("INSURED_H_CITY", "address_city"), 0.5);
        assert_eq!(score("INSURED_H_ZIP", "address_zip"), 0.5);
    }

    #[test]
    fn test_conflicting_qualifiers_do_not_match() {
        assert_eq!(score("DATE_LOSS", "type_of_loss"), 0.0);
        assert_eq!(score("MORTGAGEE_STATE", "address_state"), 0.0);
        assert_eq!(score("MORTGAGEE_ZIP", "address_zip"), 0.0);
        assert_eq!(score("AGENT_CITY", "address_city"), 0.0);
    }

    #[test]
    fn test_agreeing_qualifiers() {
        assert_eq!(score("RISK_CITY", "address_city"), 0.5);
        assert_eq!(score("CITY", "address_city"), 1.0);
        assert_eq!(score("MORTGAGEE_LOAN_NUMBER", "mortgagee_account_number"), 2.0 / 3.0);
        assert_eq!(NormalizedName::new("INSURED_H_CITY").qualifiers(), ["insured", "h"]);
        assert!(NormalizedName::new("city").qualifiers().is_empty());
    }

    #[test]
    fn test_containment() {
        assert_eq!(score("ROOF_PITCH_NOTE", "roof_pitch"), 1.0);
        assert_eq!(score("DATE_LOSS", "date_of_loss"), 1.0);
    }

    #[test]
    fn test_different_heads_do_not_match() {
        assert_eq!(score("INSURED_H_CITY", "insured_name"), 0.0);
        assert_eq!(score("DATE_INSPECTED", "date_of_loss"), 0.0);
    }

    #[test]
    fn test_generic_overlap_does_not_match() {
        assert_eq!(score("CLAIM_NUMBER", "policy_number"), 0.0);
        assert_eq!(score("AGENT_NAME", "insured_name"), 0.0);
        assert_eq!(score("INSURED_NAME", "name"), 0.0);
    }

    #[test]
    fn test_edit_distance() {
        let exact = EditDistance.score(&NormalizedName::new("ROOF_AGE"), &NormalizedName::new("roof_age"));
        assert_eq!(exact, 1.0);
        let near = EditDistance.score(&NormalizedName::new("ROOF_AGES"), &NormalizedName::new("roof_age"));
        assert!(near > 0.8 && near < 1.0);
        assert_eq!(levenshtein(&['a', 'b', 'c'], &['y', 'a', 'b']), 2);
    }

    proptest! {
        #[test]
        fn prop_scores_are_in_unit_range(a in "[A-Z_]{0,16}", b in "[a-z_]{0,16}") {
            let (a, b) = (NormalizedName::new(&a), NormalizedName::new(&b));
            for s in [TokenOverlap.score(&a, &b), EditDistance.score(&a, &b)] {
                prop_assert!((0.0..=1.0).contains(&s));
            }
        }
    }
}
