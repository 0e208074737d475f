//! Source discovery and accumulation.
//!
//! Every run scans record bodies for references (web domains, Wikipedia pages
//! and categories, ISBNs, books of known authors) and takes explicit
//! `source_hint`s at face value. Findings are merged into the seed store's
//! append-only `sources` section, keyed by `(kind, id)`.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::record::{InteractionRecord, parse_timestamp};
use crate::seeds::{AuthorSeed, ExtraFields, SeedWarning};
use crate::text::slugify;

static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"https?://([\w.-]+)(?:/([^\s#?]*))?")
        .case_insensitive(true)
        .build()
        .expect("static url regex")
});

static RE_WIKI_CATEGORY: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^wiki/Category:(.+)$")
        .case_insensitive(true)
        .build()
        .expect("static wiki category regex")
});

static RE_WIKI_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^wiki/([^/]+)$")
        .case_insensitive(true)
        .build()
        .expect("static wiki page regex")
});

static RE_ISBN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bISBN(?:-1[03])?:?\s*([0-9Xx\-]{10,17})\b").expect("static isbn regex")
});

/// What kind of reference a source entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    WikipediaCategory,
    WikipediaPage,
    UrlDomain,
    Isbn,
    Author,
    /// A title/author reference given explicitly on a record.
    Reference,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WikipediaCategory => "wikipedia_category",
            Self::WikipediaPage => "wikipedia_page",
            Self::UrlDomain => "url_domain",
            Self::Isbn => "isbn",
            Self::Author => "author",
            Self::Reference => "reference",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accumulated source in the seed store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub last_seen: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl SourceEntry {
    fn new(kind: SourceKind, id: impl Into<String>, label: impl Into<String>, seen: &str) -> Self {
        Self {
            kind,
            id: id.into(),
            label: label.into(),
            url: None,
            subjects: Vec::new(),
            count: 1,
            last_seen: seen.to_string(),
            extra: ExtraFields::new(),
        }
    }

    fn with_url(mut self, url: String) -> Self {
        self.url = Some(url);
        self
    }

    /// Display label, falling back to the id.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() { &self.id } else { &self.label }
    }
}

/// Seed authors with their book patterns compiled.
#[derive(Debug, Default)]
pub struct AuthorMatcher {
    authors: Vec<CompiledAuthor>,
}

#[derive(Debug)]
struct CompiledAuthor {
    name: String,
    subjects: Vec<String>,
    isbns: BTreeSet<String>,
    patterns: Vec<Regex>,
}

impl AuthorMatcher {
    /// Compile author book patterns. Invalid patterns are skipped with a warning.
    pub fn compile(authors: &[AuthorSeed]) -> (Self, Vec<SeedWarning>) {
        let mut warnings = Vec::new();
        let mut compiled = Vec::new();
        for author in authors {
            if author.name.trim().is_empty() {
                warnings.push(SeedWarning::new("authors", "", "author without a name"));
                continue;
            }
            let mut patterns = Vec::new();
            for rx in &author.book_patterns {
                match RegexBuilder::new(rx).case_insensitive(true).build() {
                    Ok(re) => patterns.push(re),
                    Err(e) => warnings.push(SeedWarning::new(
                        "authors.book_patterns",
                        rx,
                        format!("invalid regex for {}: {e}", author.name),
                    )),
                }
            }
            compiled.push(CompiledAuthor {
                name: author.name.trim().to_string(),
                subjects: author.subjects.clone(),
                isbns: author.isbns.iter().map(|i| normalize_isbn(i)).collect(),
                patterns,
            });
        }
        (Self { authors: compiled }, warnings)
    }

    /// Whether any author lists this (normalized) ISBN.
    pub fn knows_isbn(&self, isbn: &str) -> bool {
        self.authors.iter().any(|a| a.isbns.contains(isbn))
    }
}

/// Strip hyphens and uppercase the check digit.
pub fn normalize_isbn(raw: &str) -> String {
    raw.replace('-', "").trim().to_uppercase()
}

/// Split a free-text reference into a normalized `(title, author)` key.
///
/// Recognizes `Title by Author`, `Title - Author` and `Title — Author`.
pub fn normalize_hint(hint: &str) -> String {
    let lower = hint.to_lowercase();
    let split = lower
        .rsplit_once(" by ")
        .or_else(|| lower.rsplit_once(" — "))
        .or_else(|| lower.rsplit_once(" - "));
    match split {
        Some((title, author)) if !title.trim().is_empty() && !author.trim().is_empty() => {
            format!("{}--{}", slugify(title), slugify(author))
        }
        _ => slugify(&lower),
    }
}

/// Scan records for sources and aggregate the findings.
pub fn discover(records: &[InteractionRecord], authors: &AuthorMatcher) -> Vec<SourceEntry> {
    let mut found = Vec::new();
    for record in records {
        let seen = record.timestamp.as_deref().unwrap_or_default();
        let body = record.body_text.as_str();

        for caps in RE_URL.captures_iter(body) {
            let domain = caps
                .get(1)
                .map(|m| m.as_str().trim_end_matches('.').to_lowercase())
                .unwrap_or_default();
            let path = caps
                .get(2)
                .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', ')', ']']))
                .unwrap_or_default();
            if domain.is_empty() {
                continue;
            }
            if domain.ends_with("wikipedia.org") {
                if let Some(c) = RE_WIKI_CATEGORY.captures(path) {
                    let cat = c[1].to_string();
                    let url = format!("https://{domain}/wiki/Category:{cat}");
                    found.push(
                        SourceEntry::new(
                            SourceKind::WikipediaCategory,
                            &cat,
                            cat.replace('_', " "),
                            seen,
                        )
                        .with_url(url),
                    );
                    continue;
                }
                if let Some(p) = RE_WIKI_PAGE.captures(path) {
                    let page = p[1].to_string();
                    let url = format!("https://{domain}/wiki/{page}");
                    found.push(
                        SourceEntry::new(SourceKind::WikipediaPage, &page, page.replace('_', " "), seen)
                            .with_url(url),
                    );
                    continue;
                }
            }
            found.push(SourceEntry::new(SourceKind::UrlDomain, &domain, &domain, seen));
        }

        let mut row_isbns = BTreeSet::new();
        for caps in RE_ISBN.captures_iter(body) {
            let isbn = normalize_isbn(&caps[1]);
            row_isbns.insert(isbn.clone());
            found.push(SourceEntry::new(
                SourceKind::Isbn,
                &isbn,
                format!("ISBN {isbn}"),
                seen,
            ));
        }

        for author in &authors.authors {
            let matched = author.isbns.iter().any(|i| row_isbns.contains(i))
                || author.patterns.iter().any(|re| re.is_match(body));
            if matched {
                let mut entry =
                    SourceEntry::new(SourceKind::Author, slugify(&author.name), &author.name, seen);
                entry.subjects = author.subjects.clone();
                found.push(entry);
            }
        }

        if let Some(hint) = &record.source_hint {
            found.push(SourceEntry::new(
                SourceKind::Reference,
                normalize_hint(hint),
                hint.as_str(),
                seen,
            ));
        }
    }
    merge_sources(&[], found)
}

/// Merge new findings into an existing source list.
///
/// Entries are keyed by `(kind, id)`; existing order is preserved and new
/// keys are appended in first-seen order. Counts add up, the newest
/// `last_seen` wins, and a missing url/label/subjects is filled in.
pub fn merge_sources(existing: &[SourceEntry], found: Vec<SourceEntry>) -> Vec<SourceEntry> {
    let mut merged: Vec<SourceEntry> = existing.to_vec();
    let mut index: HashMap<(SourceKind, String), usize> = merged
        .iter()
        .enumerate()
        .map(|(i, s)| ((s.kind, s.id.clone()), i))
        .collect();

    for entry in found {
        let key = (entry.kind, entry.id.clone());
        let Some(&pos) = index.get(&key) else {
            index.insert(key, merged.len());
            merged.push(entry);
            continue;
        };
        let cur = &mut merged[pos];
        cur.count += entry.count.max(1);
        if is_newer(&entry.last_seen, &cur.last_seen) {
            cur.last_seen = entry.last_seen;
        }
        if cur.url.is_none() {
            cur.url = entry.url;
        }
        if cur.label.is_empty() {
            cur.label = entry.label;
        }
        if cur.subjects.is_empty() {
            cur.subjects = entry.subjects;
        }
    }
    merged
}

fn is_newer(candidate: &str, current: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    if current.is_empty() {
        return true;
    }
    match (parse_timestamp(candidate), parse_timestamp(current)) {
        (Some(a), Some(b)) => a > b,
        _ => candidate > current,
    }
}

/// Wikipedia categories mentioned at least `threshold` times, sorted by label.
pub fn frequent_wiki_categories(sources: &[SourceEntry], threshold: u32) -> Vec<&SourceEntry> {
    let mut out: Vec<&SourceEntry> = sources
        .iter()
        .filter(|s| s.kind == SourceKind::WikipediaCategory && s.count >= u64::from(threshold))
        .filter(|s| !s.display_label().trim().is_empty())
        .collect();
    out.sort_by(|a, b| a.display_label().cmp(b.display_label()).then(a.id.cmp(&b.id)));
    out
}

/// ISBNs no seed author claims, most frequent first.
pub fn unmapped_isbns<'a>(sources: &'a [SourceEntry], authors: &AuthorMatcher) -> Vec<&'a SourceEntry> {
    let mut out: Vec<&SourceEntry> = sources
        .iter()
        .filter(|s| s.kind == SourceKind::Isbn && !authors.knows_isbn(&s.id.to_uppercase()))
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then(a.id.cmp(&b.id)));
    out
}
