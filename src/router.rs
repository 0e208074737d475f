//! Category routing: topic label → category slug.
//!
//! Resolution order is alias, then first matching pattern, then an
//! auto-category derived from the label. Labels that are empty fall back to
//! matching patterns against the body text, and finally to
//! [`UNCATEGORIZED_SLUG`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::seeds::SeedIndex;
use crate::text::slugify;

/// Prefix for categories synthesized from unmatched labels.
pub const AUTO_PREFIX: &str = "auto-";

/// Bucket for records without a usable topic label.
pub const UNCATEGORIZED_SLUG: &str = "auto-uncategorized";

const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Which rule produced a routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Alias,
    Pattern,
    Auto,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alias => "alias",
            Self::Pattern => "pattern",
            Self::Auto => "auto",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of routing one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub slug: String,
    pub rule: RuleKind,
    /// The alias key or pattern source that matched; empty for auto.
    pub detail: String,
}

/// Resolve a label (and, for empty labels, the body) against the seed index.
/// Pure: does not register anything.
pub fn resolve(index: &SeedIndex, topic_label: &str, body_text: &str) -> Route {
    let label = topic_label.trim();
    if label.is_empty() {
        if let Some((pattern, slug)) = index.first_pattern(body_text) {
            return Route {
                slug: slug.to_string(),
                rule: RuleKind::Pattern,
                detail: pattern.to_string(),
            };
        }
        return Route {
            slug: UNCATEGORIZED_SLUG.to_string(),
            rule: RuleKind::Auto,
            detail: String::new(),
        };
    }
    if let Some(slug) = index.alias(label) {
        return Route {
            slug: slug.to_string(),
            rule: RuleKind::Alias,
            detail: label.to_lowercase(),
        };
    }
    if let Some((pattern, slug)) = index.first_pattern(&label.to_lowercase()) {
        return Route {
            slug: slug.to_string(),
            rule: RuleKind::Pattern,
            detail: pattern.to_string(),
        };
    }
    Route {
        slug: auto_slug(label),
        rule: RuleKind::Auto,
        detail: String::new(),
    }
}

/// `auto-<slugify(label)>`.
pub fn auto_slug(label: &str) -> String {
    format!("{AUTO_PREFIX}{}", slugify(label))
}

/// A category synthesized from an unmatched label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoCategory {
    pub slug: String,
    /// The first label that produced this slug.
    pub label: String,
}

/// Append-only registry of auto-categories. Inserting an existing slug is a no-op.
#[derive(Debug, Clone, Default)]
pub struct AutoRegistry {
    entries: BTreeMap<String, AutoCategory>,
}

impl AutoRegistry {
    /// Register `slug` with `label`; returns `true` if it was new.
    pub fn insert(&mut self, slug: &str, label: &str) -> bool {
        if self.entries.contains_key(slug) {
            return false;
        }
        self.entries.insert(
            slug.to_string(),
            AutoCategory {
                slug: slug.to_string(),
                label: label.to_string(),
            },
        );
        true
    }

    pub fn get(&self, slug: &str) -> Option<&AutoCategory> {
        self.entries.get(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.entries.contains_key(slug)
    }

    /// Entries in slug order.
    pub fn iter(&self) -> impl Iterator<Item = &AutoCategory> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One distinct `(label, slug)` routing outcome, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub label: String,
    pub slug: String,
    pub rule: RuleKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    pub count: usize,
}

/// Stateful router for one build: records the label map, the auto
/// registry, and which labels reached each `(slug, rule)`.
#[derive(Debug)]
pub struct CategoryRouter<'a> {
    index: &'a SeedIndex,
    auto: AutoRegistry,
    map: BTreeMap<String, String>,
    decisions: Vec<RoutingDecision>,
    decision_pos: BTreeMap<(String, String), usize>,
    hits: BTreeMap<(String, RuleKind), BTreeSet<String>>,
}

impl<'a> CategoryRouter<'a> {
    pub fn new(index: &'a SeedIndex) -> Self {
        Self {
            index,
            auto: AutoRegistry::default(),
            map: BTreeMap::new(),
            decisions: Vec::new(),
            decision_pos: BTreeMap::new(),
            hits: BTreeMap::new(),
        }
    }

    /// Route one record and remember the outcome.
    pub fn route(&mut self, topic_label: &str, body_text: &str) -> Route {
        let route = resolve(self.index, topic_label, body_text);
        let label = topic_label.trim();

        if route.rule == RuleKind::Auto {
            let auto_label = if route.slug == UNCATEGORIZED_SLUG && label.is_empty() {
                UNCATEGORIZED_LABEL
            } else {
                label
            };
            if self.auto.insert(&route.slug, auto_label) {
                tracing::debug!(slug = %route.slug, label = auto_label, "registered auto category");
            }
        }

        self.map.insert(label.to_string(), route.slug.clone());
        self.hits
            .entry((route.slug.clone(), route.rule))
            .or_default()
            .insert(label.to_string());

        let key = (label.to_string(), route.slug.clone());
        match self.decision_pos.get(&key) {
            Some(&pos) => self.decisions[pos].count += 1,
            None => {
                self.decision_pos.insert(key, self.decisions.len());
                self.decisions.push(RoutingDecision {
                    label: label.to_string(),
                    slug: route.slug.clone(),
                    rule: route.rule,
                    detail: route.detail.clone(),
                    count: 1,
                });
            }
        }
        route
    }

    pub fn auto_categories(&self) -> &AutoRegistry {
        &self.auto
    }

    /// Label → slug, last seen wins.
    pub fn map(&self) -> &BTreeMap<String, String> {
        &self.map
    }

    pub fn decisions(&self) -> &[RoutingDecision] {
        &self.decisions
    }

    /// Labels grouped by `(slug, rule)`, in key order.
    pub fn hits(&self) -> &BTreeMap<(String, RuleKind), BTreeSet<String>> {
        &self.hits
    }
}
