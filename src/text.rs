//! Lexical primitives shared by the classifier, router and linker.
//!
//! Everything here is deterministic: token sets are `BTreeSet`s so iteration
//! order never depends on hashing, and scores are plain ratios of set sizes.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Maximum excerpt length (in characters) kept from a record body.
pub const EXCERPT_MAX_CHARS: usize = 400;

static RE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9][a-z0-9\-]{2,}").expect("static token regex"));

static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace regex"));

static RE_REDACT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://([\w.-]+)(?:/\S*)?").expect("static redact url regex")
});

static RE_REDACT_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("static redact email regex")
});

static RE_REDACT_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b").expect("static redact phone regex")
});

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "else", "for", "to", "of", "in", "on",
    "at", "by", "with", "without", "from", "this", "that", "these", "those", "is", "are", "was",
    "were", "be", "been", "being", "do", "does", "did", "not", "no", "yes", "it", "its",
    "itself", "you", "your", "i", "me", "my", "mine", "we", "our", "they", "them", "their", "as",
    "into", "about", "over", "under", "within", "across", "up", "down", "out", "more", "most",
    "less", "least", "many", "much", "few", "lot", "lots", "very", "just", "here", "there",
    "now", "new", "old", "other", "another", "same", "different", "also", "than", "while",
    "when", "where", "why", "how", "which", "who", "whom", "whose", "because", "so", "such",
    "can", "could", "should", "would", "will", "shall", "may", "might", "must", "own", "per",
    "vs", "via", "etc",
];

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// A de-duplicated, ordered set of lowercase lexical tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet(BTreeSet<String>);

impl TokenSet {
    /// Tokenize free text: lowercase, runs of `[a-z0-9-]` at least three
    /// characters long, stopwords removed.
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        Self(
            RE_TOKEN
                .find_iter(&lower)
                .map(|m| m.as_str())
                .filter(|t| !is_stopword(t))
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Add every token of `other` to this set.
    pub fn extend(&mut self, other: &TokenSet) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Number of tokens present in both sets.
    pub fn intersection_len(&self, other: &TokenSet) -> usize {
        self.0.intersection(&other.0).count()
    }

    /// Number of tokens present in either set.
    pub fn union_len(&self, other: &TokenSet) -> usize {
        self.len() + other.len() - self.intersection_len(other)
    }
}

impl<S: Into<String>> FromIterator<S> for TokenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`.
///
/// Two empty sets score 0: an empty category or value carries no evidence.
pub fn jaccard(a: &TokenSet, b: &TokenSet) -> f64 {
    let union = a.union_len(b);
    if union == 0 {
        return 0.0;
    }
    a.intersection_len(b) as f64 / union as f64
}

/// Overlap relative to the shorter set: `|A ∩ B| / min(|A|, |B|)`.
pub fn shorter_overlap(a: &TokenSet, b: &TokenSet) -> f64 {
    let shorter = a.len().min(b.len());
    if shorter == 0 {
        return 0.0;
    }
    a.intersection_len(b) as f64 / shorter as f64
}

/// Generate a URL-safe slug: diacritics folded, lowercase ASCII alphanumerics,
/// every other run collapsed into a single hyphen. Empty input yields `misc`.
pub fn slugify(text: &str) -> String {
    let slug = text
        .nfkd()
        .filter(|c| c.is_ascii())
        .collect::<String>()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() { "misc".into() } else { slug }
}

/// Collapse whitespace runs and trim.
pub fn normalize_whitespace(text: &str) -> String {
    RE_WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Replace URLs with `[URL:domain]`, email addresses with `[EMAIL]` and
/// phone numbers with `[PHONE]`.
pub fn redact(text: &str) -> String {
    let text = RE_REDACT_URL.replace_all(text, |caps: &regex::Captures<'_>| {
        format!("[URL:{}]", caps[1].to_lowercase())
    });
    let text = RE_REDACT_EMAIL.replace_all(&text, "[EMAIL]");
    RE_REDACT_PHONE.replace_all(&text, "[PHONE]").into_owned()
}

/// Normalized, redacted, length-bounded excerpt of a record body.
///
/// Source discovery reads the raw body, never the excerpt.
pub fn excerpt(text: &str) -> String {
    let normalized = redact(&normalize_whitespace(text));
    match normalized.char_indices().nth(EXCERPT_MAX_CHARS) {
        Some((idx, _)) => normalized[..idx].to_string(),
        None => normalized,
    }
}

/// Truncate a string to at most `max` characters on a char boundary,
/// dropping a trailing hyphen left by the cut.
pub fn truncate_slug(slug: &str, max: usize) -> String {
    let cut = match slug.char_indices().nth(max) {
        Some((idx, _)) => &slug[..idx],
        None => slug,
    };
    cut.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tokens: &[&str]) -> TokenSet {
        tokens.iter().copied().collect()
    }

    #[test]
    fn tokenize_filters_short_and_stopwords() {
        let toks = TokenSet::from_text("The Rust borrow-checker is OK, and it works!");
        assert!(toks.contains("rust"));
        assert!(toks.contains("borrow-checker"));
        assert!(toks.contains("works"));
        assert!(!toks.contains("the"));
        assert!(!toks.contains("ok"));
        assert!(!toks.contains("and"));
    }

    #[test]
    fn tokenize_deduplicates() {
        let toks = TokenSet::from_text("salt salt SALT rinse");
        assert_eq!(toks.len(), 2);
    }

    #[test]
    fn jaccard_scenario() {
        let value = set(&["rust", "ownership", "borrow"]);
        let category = set(&["rust", "borrow", "compiler"]);
        assert!((jaccard(&value, &category) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_bounds() {
        let a = set(&["alpha", "beta"]);
        let b = set(&["gamma"]);
        assert_eq!(jaccard(&a, &b), 0.0);
        assert_eq!(jaccard(&a, &a.clone()), 1.0);
        assert_eq!(jaccard(&TokenSet::default(), &TokenSet::default()), 0.0);
        let c = set(&["alpha", "gamma"]);
        let s = jaccard(&a, &c);
        assert!(s > 0.0 && s < 1.0);
    }

    #[test]
    fn shorter_overlap_uses_min_len() {
        let short = set(&["rust", "borrow"]);
        let long = set(&["rust", "borrow", "compiler", "lifetimes"]);
        assert_eq!(shorter_overlap(&short, &long), 1.0);
        assert_eq!(shorter_overlap(&short, &TokenSet::default()), 0.0);
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Quantum Bread Proofing!!"), "quantum-bread-proofing");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(slugify("AI strategy & games"), "ai-strategy-games");
        assert_eq!(slugify("Café crème"), "cafe-creme");
        assert_eq!(slugify("!!!"), "misc");
    }

    #[test]
    fn excerpt_collapses_and_truncates() {
        assert_eq!(excerpt("  a\n\n b\tc "), "a b c");
        let long = "x".repeat(EXCERPT_MAX_CHARS + 20);
        assert_eq!(excerpt(&long).chars().count(), EXCERPT_MAX_CHARS);
    }

    #[test]
    fn redact_masks_contact_details() {
        assert_eq!(
            redact("mail me at jane.doe@example.com or 555-123-4567"),
            "mail me at [EMAIL] or [PHONE]"
        );
        assert_eq!(
            redact("see https://Docs.Example.org/a/b?c=d now"),
            "see [URL:docs.example.org] now"
        );
        assert_eq!(redact("room 101, ext 42"), "room 101, ext 42");
        assert_eq!(excerpt("ping\n  jane@example.com"), "ping [EMAIL]");
    }

    #[test]
    fn truncate_slug_drops_trailing_hyphen() {
        assert_eq!(truncate_slug("abc-def", 4), "abc");
        assert_eq!(truncate_slug("abc", 40), "abc");
    }
}
