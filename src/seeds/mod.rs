//! The seed store: human-editable source of truth for categories, aliases,
//! routing patterns, curated values, authors, and accumulated sources.
//!
//! Seeds live in `ontology_sources.json` next to the ontology. A missing file
//! is not an error: a minimal empty default is synthesized and persisted.
//! Each section and each entry is read independently, so one malformed entry
//! is skipped with a [`SeedWarning`] instead of discarding the human's edits.
//! Skipped entries, unknown fields and unknown top-level keys are written
//! back verbatim on save.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use miette::Diagnostic;
use regex::{Regex, RegexBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StoreError;
use crate::sources::SourceEntry;
use crate::store;

mod patterns;

pub use patterns::{PatternRule, PatternTable};

// ── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Error, Diagnostic)]
pub enum SeedError {
    #[error("failed to read seed file: {path}")]
    #[diagnostic(
        code(memart::seed::io),
        help("Ensure the file is readable. A missing file is fine; an unreadable one is not.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed file {path}: {message}")]
    #[diagnostic(
        code(memart::seed::parse),
        help(
            "The seed file is not a JSON object. Fix the syntax by hand; it is never \
             overwritten while it cannot be parsed, so no curation is lost."
        )
    )]
    Parse { path: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

pub type SeedResult<T> = std::result::Result<T, SeedError>;

/// A seed entry that was skipped or adjusted, kept for the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedWarning {
    /// Seed section, e.g. `patterns` or `categories`.
    pub section: String,
    /// Offending key within the section.
    pub key: String,
    pub message: String,
}

impl SeedWarning {
    pub fn new(
        section: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            section: section.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SeedWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}: {}", self.section, self.message)
        } else {
            write!(f, "{} `{}`: {}", self.section, self.key, self.message)
        }
    }
}

// ── Seed data model ─────────────────────────────────────────────────────

/// Fields the model does not know. Written back unchanged.
pub type ExtraFields = serde_json::Map<String, serde_json::Value>;

/// A curated category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySeed {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub wiki_refs: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A curated Tier-0 value. The id is assigned on first build when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSeed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A known author and how to recognize their books.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSeed {
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub isbns: Vec<String>,
    #[serde(default)]
    pub book_patterns: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// The whole seed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seeds {
    /// slug → category.
    #[serde(default)]
    pub categories: BTreeMap<String, CategorySeed>,
    /// lowercased label → slug.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// regex → slug, in declared order.
    #[serde(default)]
    pub patterns: PatternTable,
    #[serde(default)]
    pub values: Vec<ValueSeed>,
    #[serde(default)]
    pub authors: Vec<AuthorSeed>,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
    /// Input that was skipped while parsing; spliced back in on save.
    #[serde(skip)]
    retained: Retained,
}

/// A skipped entry and where it stood in its section.
#[derive(Debug, Clone, PartialEq)]
struct SkippedEntry {
    position: usize,
    /// Object key; `None` for list items.
    key: Option<String>,
    raw: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Retained {
    entries: BTreeMap<&'static str, Vec<SkippedEntry>>,
    /// Sections whose shape was wrong as a whole.
    sections: ExtraFields,
    /// Top-level keys that are not seed sections.
    unknown: ExtraFields,
    patterns_as_list: bool,
}

impl Retained {
    fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.sections.is_empty() && self.unknown.is_empty()
    }
}

impl Seeds {
    /// Load the seed file, or synthesize and persist the default if absent.
    ///
    /// Returns the seeds, per-entry warnings, and whether the file was created.
    pub fn load_or_init(path: &Path) -> SeedResult<(Self, Vec<SeedWarning>, bool)> {
        if !path.exists() {
            let seeds = Self::default();
            seeds.save(path)?;
            tracing::info!(path = %path.display(), "created default seed file");
            return Ok((seeds, Vec::new(), true));
        }
        let data = std::fs::read_to_string(path).map_err(|e| SeedError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let (seeds, warnings) = Self::from_json_str(&data).map_err(|message| SeedError::Parse {
            path: path.display().to_string(),
            message,
        })?;
        for w in &warnings {
            tracing::warn!(path = %path.display(), "seed entry skipped: {w}");
        }
        Ok((seeds, warnings, false))
    }

    /// Parse a seed document, skipping malformed sections and entries.
    ///
    /// Skipped input is remembered and written back by [`Seeds::save`].
    pub fn from_json_str(data: &str) -> Result<(Self, Vec<SeedWarning>), String> {
        let value: serde_json::Value = serde_json::from_str(data).map_err(|e| e.to_string())?;
        let serde_json::Value::Object(root) = value else {
            return Err("seed document must be a JSON object".into());
        };
        let mut reader = SeedReader {
            root,
            warnings: Vec::new(),
            retained: Retained::default(),
        };
        let mut seeds = Self::default();

        for (i, slug, entry) in reader.object("categories") {
            if slug.trim().is_empty() {
                reader
                    .warnings
                    .push(SeedWarning::new("categories", "", "empty category slug"));
                reader.retain("categories", i, Some(slug), entry);
                continue;
            }
            if let Some(cat) = reader.entry::<CategorySeed>("categories", i, Some(&slug), entry) {
                seeds.categories.insert(slug, cat);
            }
        }
        for (i, alias, entry) in reader.object("aliases") {
            if let Some(slug) = reader.entry::<String>("aliases", i, Some(&alias), entry) {
                seeds.aliases.insert(alias, slug);
            }
        }
        let mut patterns = Vec::new();
        match reader.root.remove("patterns") {
            None | Some(serde_json::Value::Null) => {}
            Some(serde_json::Value::Object(map)) => {
                for (i, (pattern, entry)) in map.into_iter().enumerate() {
                    if let Some(slug) = reader.entry::<String>("patterns", i, Some(&pattern), entry)
                    {
                        patterns.push(PatternRule::new(pattern, slug));
                    }
                }
            }
            Some(serde_json::Value::Array(items)) => {
                reader.retained.patterns_as_list = true;
                for (i, entry) in items.into_iter().enumerate() {
                    if let Some(rule) = reader.entry::<PatternRule>("patterns", i, None, entry) {
                        patterns.push(rule);
                    }
                }
            }
            Some(other) => reader.reject_section("patterns", other, "an object or a list"),
        }
        seeds.patterns = PatternTable::from(patterns);

        seeds.values = reader.list("values");
        seeds.authors = reader.list("authors");
        seeds.sources = reader.list("sources");

        let SeedReader {
            root,
            warnings,
            mut retained,
        } = reader;
        retained.unknown = root;
        seeds.retained = retained;
        Ok((seeds, warnings))
    }

    /// Persist atomically, with skipped entries and unknown keys put back.
    pub fn save(&self, path: &Path) -> SeedResult<()> {
        let doc = self.to_document().map_err(|e| StoreError::Serialize {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        store::write_json(path, &doc)?;
        Ok(())
    }

    /// The document as it will be written.
    pub fn to_document(&self) -> serde_json::Result<serde_json::Value> {
        let mut doc = serde_json::to_value(self)?;
        if self.retained.is_empty() && !self.retained.patterns_as_list {
            return Ok(doc);
        }
        let serde_json::Value::Object(root) = &mut doc else {
            return Ok(doc);
        };
        if self.retained.patterns_as_list {
            let rules = self
                .patterns
                .iter()
                .map(serde_json::to_value)
                .collect::<serde_json::Result<Vec<_>>>()?;
            root.insert("patterns".into(), serde_json::Value::Array(rules));
        }
        for (section, skipped) in &self.retained.entries {
            if let Some(slot) = root.get_mut(*section) {
                splice(slot, skipped);
            }
        }
        for (section, raw) in &self.retained.sections {
            let empty = match root.get(section) {
                Some(serde_json::Value::Object(m)) => m.is_empty(),
                Some(serde_json::Value::Array(a)) => a.is_empty(),
                _ => true,
            };
            if empty {
                root.insert(section.clone(), raw.clone());
            } else {
                tracing::warn!(section = %section, "malformed seed section replaced by new entries");
            }
        }
        for (key, raw) in &self.retained.unknown {
            if !root.contains_key(key) {
                root.insert(key.clone(), raw.clone());
            }
        }
        Ok(doc)
    }

    /// Compile aliases and patterns into a routing index.
    pub fn compile(&self) -> (SeedIndex, Vec<SeedWarning>) {
        SeedIndex::compile(self)
    }
}

/// Put skipped entries back at their original positions.
fn splice(slot: &mut serde_json::Value, skipped: &[SkippedEntry]) {
    match slot {
        serde_json::Value::Object(map) => {
            let typed = std::mem::take(map);
            let mut pending = skipped
                .iter()
                .filter(|s| s.key.as_deref().is_some_and(|k| !typed.contains_key(k)))
                .collect::<Vec<_>>()
                .into_iter()
                .peekable();
            for (key, value) in typed {
                while let Some(s) = pending.next_if(|s| s.position <= map.len()) {
                    if let Some(k) = &s.key {
                        map.insert(k.clone(), s.raw.clone());
                    }
                }
                map.insert(key, value);
            }
            for s in pending {
                if let Some(k) = &s.key {
                    map.insert(k.clone(), s.raw.clone());
                }
            }
        }
        serde_json::Value::Array(items) => {
            for s in skipped {
                let at = s.position.min(items.len());
                items.insert(at, s.raw.clone());
            }
        }
        _ => {}
    }
}

/// Section-by-section reader that records what it skips.
struct SeedReader {
    root: ExtraFields,
    warnings: Vec<SeedWarning>,
    retained: Retained,
}

impl SeedReader {
    fn object(&mut self, section: &'static str) -> Vec<(usize, String, serde_json::Value)> {
        match self.root.remove(section) {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Object(map)) => map
                .into_iter()
                .enumerate()
                .map(|(i, (k, v))| (i, k, v))
                .collect(),
            Some(other) => {
                self.reject_section(section, other, "an object");
                Vec::new()
            }
        }
    }

    fn list<T: DeserializeOwned>(&mut self, section: &'static str) -> Vec<T> {
        match self.root.remove(section) {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .filter_map(|(i, v)| self.entry(section, i, None, v))
                .collect(),
            Some(other) => {
                self.reject_section(section, other, "a list");
                Vec::new()
            }
        }
    }

    fn entry<T: DeserializeOwned>(
        &mut self,
        section: &'static str,
        position: usize,
        key: Option<&str>,
        raw: serde_json::Value,
    ) -> Option<T> {
        match T::deserialize(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                let label = key.map_or_else(|| format!("#{position}"), str::to_string);
                self.warnings.push(SeedWarning::new(
                    section,
                    label,
                    format!("malformed entry: {e}"),
                ));
                self.retain(section, position, key.map(str::to_string), raw);
                None
            }
        }
    }

    fn retain(
        &mut self,
        section: &'static str,
        position: usize,
        key: Option<String>,
        raw: serde_json::Value,
    ) {
        self.retained
            .entries
            .entry(section)
            .or_default()
            .push(SkippedEntry { position, key, raw });
    }

    fn reject_section(&mut self, section: &'static str, raw: serde_json::Value, shape: &str) {
        self.warnings.push(SeedWarning::new(
            section,
            "",
            format!("section must be {shape}; ignored"),
        ));
        self.retained.sections.insert(section.to_string(), raw);
    }
}

// ── Routing index ───────────────────────────────────────────────────────

/// Compiled routing tables. Every alias and pattern maps to exactly one slug.
#[derive(Debug, Default)]
pub struct SeedIndex {
    aliases: HashMap<String, String>,
    patterns: Vec<(String, Regex, String)>,
    /// Slugs referenced by aliases/patterns without a declared category.
    implied: BTreeMap<String, CategorySeed>,
}

impl SeedIndex {
    /// Build the index. Alias precedence: the `aliases` section, then each
    /// category's label and own aliases in slug order. The first claim on an
    /// alias wins; later conflicting claims are warned about and dropped.
    pub fn compile(seeds: &Seeds) -> (Self, Vec<SeedWarning>) {
        let mut index = Self::default();
        let mut warnings = Vec::new();

        let category_claims = seeds.categories.iter().flat_map(|(slug, cat)| {
            std::iter::once((cat.label.as_str(), slug.as_str(), "categories.label"))
                .chain(
                    cat.aliases
                        .iter()
                        .map(move |a| (a.as_str(), slug.as_str(), "categories.aliases")),
                )
        });
        let claims = seeds
            .aliases
            .iter()
            .map(|(a, s)| (a.as_str(), s.as_str(), "aliases"))
            .chain(category_claims);

        for (alias, slug, section) in claims {
            let key = alias.trim().to_lowercase();
            let slug = slug.trim();
            if key.is_empty() {
                if section == "aliases" {
                    warnings.push(SeedWarning::new(section, alias, "empty alias"));
                }
                continue;
            }
            if slug.is_empty() {
                warnings.push(SeedWarning::new(section, alias, "empty target slug"));
                continue;
            }
            match index.aliases.get(&key) {
                Some(existing) if existing == slug => {}
                Some(existing) => warnings.push(SeedWarning::new(
                    section,
                    alias,
                    format!("already maps to `{existing}`; ignoring `{slug}`"),
                )),
                None => {
                    index.note_slug(seeds, slug, section, alias, &mut warnings);
                    index.aliases.insert(key, slug.to_string());
                }
            }
        }

        for rule in seeds.patterns.iter() {
            let slug = rule.slug.trim();
            if slug.is_empty() {
                warnings.push(SeedWarning::new("patterns", &rule.pattern, "empty target slug"));
                continue;
            }
            match RegexBuilder::new(&rule.pattern).case_insensitive(true).build() {
                Ok(re) => {
                    index.note_slug(seeds, slug, "patterns", &rule.pattern, &mut warnings);
                    index
                        .patterns
                        .push((rule.pattern.clone(), re, slug.to_string()));
                }
                Err(e) => warnings.push(SeedWarning::new(
                    "patterns",
                    &rule.pattern,
                    format!("invalid regex: {e}"),
                )),
            }
        }

        (index, warnings)
    }

    fn note_slug(
        &mut self,
        seeds: &Seeds,
        slug: &str,
        section: &str,
        key: &str,
        warnings: &mut Vec<SeedWarning>,
    ) {
        if seeds.categories.contains_key(slug) || self.implied.contains_key(slug) {
            return;
        }
        warnings.push(SeedWarning::new(
            section,
            key,
            format!("targets undeclared category `{slug}`; registering it"),
        ));
        self.implied.insert(
            slug.to_string(),
            CategorySeed {
                label: slug.to_string(),
                ..Default::default()
            },
        );
    }

    /// Exact case-insensitive alias lookup.
    pub fn alias(&self, label: &str) -> Option<&str> {
        self.aliases
            .get(&label.trim().to_lowercase())
            .map(String::as_str)
    }

    /// First pattern (declared order) matching `text`: `(pattern, slug)`.
    pub fn first_pattern(&self, text: &str) -> Option<(&str, &str)> {
        self.patterns
            .iter()
            .find(|(_, re, _)| re.is_match(text))
            .map(|(src, _, slug)| (src.as_str(), slug.as_str()))
    }

    /// Aliases (lowercased) that resolve to `slug`, sorted.
    pub fn aliases_for(&self, slug: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .aliases
            .iter()
            .filter(|(_, s)| s.as_str() == slug)
            .map(|(a, _)| a.clone())
            .collect();
        out.sort();
        out
    }

    /// Pattern sources that resolve to `slug`, in declared order.
    pub fn patterns_for(&self, slug: &str) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|(_, _, s)| s == slug)
            .map(|(src, _, _)| src.clone())
            .collect()
    }

    /// Categories referenced by routing rules but not declared.
    pub fn implied_categories(&self) -> &BTreeMap<String, CategorySeed> {
        &self.implied
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "categories": {
            "home-appliances": {"label": "Home appliances", "aliases": ["appliances"]},
            "dishwasher-tips": {"label": "Dishwasher tips", "description": "Salt and rinse aid"},
            "broken": {"label": 7}
        },
        "aliases": {"dishwasher": "home-appliances", "Appliances": "dishwasher-tips"},
        "patterns": {
            "zzz-first": "dishwasher-tips",
            "rinse aid|salt|siemens": "dishwasher-tips",
            "(unclosed": "home-appliances",
            "kitchen": "kitchen-misc"
        },
        "authors": [{"name": "Daniel Kahneman", "isbns": ["978-0-374-53355-7"]}, {"nom": "x"}],
        "values": [{"text": "Memory must be auditable."}]
    }"#;

    #[test]
    fn malformed_entries_are_skipped() {
        let (seeds, warnings) = Seeds::from_json_str(SAMPLE).unwrap();
        assert_eq!(seeds.categories.len(), 2);
        assert_eq!(seeds.authors.len(), 1);
        assert_eq!(seeds.values.len(), 1);
        assert!(warnings.iter().any(|w| w.section == "categories" && w.key == "broken"));
        assert!(warnings.iter().any(|w| w.section == "authors"));
    }

    #[test]
    fn patterns_keep_declared_order() {
        let (seeds, _) = Seeds::from_json_str(SAMPLE).unwrap();
        let order: Vec<&str> = seeds.patterns.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(
            order,
            vec!["zzz-first", "rinse aid|salt|siemens", "(unclosed", "kitchen"]
        );
    }

    #[test]
    fn compile_resolves_aliases_and_warns() {
        let (seeds, _) = Seeds::from_json_str(SAMPLE).unwrap();
        let (index, warnings) = seeds.compile();

        assert_eq!(index.alias("Dishwasher"), Some("home-appliances"));
        assert_eq!(index.alias("  home APPLIANCES "), Some("home-appliances"));
        // The aliases section claims "appliances" first.
        assert_eq!(index.alias("appliances"), Some("dishwasher-tips"));
        assert!(warnings.iter().any(|w| w.section == "categories.aliases"));

        // Invalid regex skipped, undeclared slug registered.
        assert_eq!(index.pattern_count(), 3);
        assert!(warnings.iter().any(|w| w.key == "(unclosed"));
        assert!(index.implied_categories().contains_key("kitchen-misc"));
    }

    #[test]
    fn first_pattern_wins() {
        let (seeds, _) = Seeds::from_json_str(SAMPLE).unwrap();
        let (index, _) = seeds.compile();
        let (pattern, slug) = index.first_pattern("siemens rinse aid refill").unwrap();
        assert_eq!(pattern, "rinse aid|salt|siemens");
        assert_eq!(slug, "dishwasher-tips");
        assert_eq!(
            index.patterns_for("dishwasher-tips"),
            vec!["zzz-first", "rinse aid|salt|siemens"]
        );
    }

    #[test]
    fn non_object_document_is_rejected() {
        assert!(Seeds::from_json_str("[1, 2]").is_err());
        assert!(Seeds::from_json_str("{ nope").is_err());
    }

    #[test]
    fn missing_file_creates_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ontology_sources.json");
        let (seeds, warnings, created) = Seeds::load_or_init(&path).unwrap();
        assert!(created);
        assert!(warnings.is_empty());
        assert_eq!(seeds, Seeds::default());
        assert!(path.exists());

        let (_, _, created_again) = Seeds::load_or_init(&path).unwrap();
        assert!(!created_again);
    }

    #[test]
    fn save_round_trip_preserves_pattern_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seeds.json");
        let (seeds, _) = Seeds::from_json_str(SAMPLE).unwrap();
        seeds.save(&path).unwrap();
        let (reloaded, _, _) = Seeds::load_or_init(&path).unwrap();
        assert_eq!(reloaded.patterns, seeds.patterns);
        assert_eq!(reloaded.categories, seeds.categories);
    }

    #[test]
    fn save_keeps_skipped_entries_and_unknown_fields() {
        let doc = r#"{
            "categories": {
                "gardening": {"label": "Gardening", "descripton": "typo kept"},
                "kitchen": {"label": ["Kitchen"]}
            },
            "patterns": {"tomato": "gardening", "bad": 5, "basil": "gardening"},
            "authors": [{"nme": "Someone"}],
            "values": [{"text": "Grow what you eat", "note": "mine"}],
            "notes": "top-level scratch"
        }"#;
        let (mut seeds, warnings) = Seeds::from_json_str(doc).unwrap();
        assert_eq!(warnings.len(), 3);
        seeds.values[0].id = Some("T0:grow-what-you-eat".into());
        seeds.aliases.insert("veg".into(), "gardening".into());

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seeds.json");
        seeds.save(&path).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(raw["categories"]["gardening"]["descripton"], "typo kept");
        assert_eq!(raw["categories"]["kitchen"]["label"][0], "Kitchen");
        let order: Vec<&str> = raw["patterns"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(order, vec!["tomato", "bad", "basil"]);
        assert_eq!(raw["authors"][0]["nme"], "Someone");
        assert_eq!(raw["values"][0]["note"], "mine");
        assert_eq!(raw["values"][0]["id"], "T0:grow-what-you-eat");
        assert_eq!(raw["aliases"]["veg"], "gardening");
        assert_eq!(raw["notes"], "top-level scratch");

        let (reloaded, again, _) = Seeds::load_or_init(&path).unwrap();
        assert_eq!(again.len(), 3);
        assert_eq!(reloaded.categories, seeds.categories);
    }

    #[test]
    fn list_form_patterns_stay_a_list() {
        let (seeds, warnings) = Seeds::from_json_str(
            r#"{"patterns": [
                {"pattern": "a", "slug": "x"},
                {"pattern": 1},
                {"pattern": "b", "slug": "y"}
            ], "authors": "not a list"}"#,
        )
        .unwrap();
        assert_eq!(warnings.len(), 2);
        let doc = seeds.to_document().unwrap();
        assert_eq!(doc["patterns"][0]["slug"], "x");
        assert_eq!(doc["patterns"][1]["pattern"], 1);
        assert_eq!(doc["patterns"][2]["slug"], "y");
        assert_eq!(doc["authors"], "not a list");
    }

    #[test]
    fn unparseable_file_is_not_overwritten() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seeds.json");
        std::fs::write(&path, "{ broken").unwrap();
        let err = Seeds::load_or_init(&path).unwrap_err();
        assert!(matches!(err, SeedError::Parse { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ broken");
    }
}
