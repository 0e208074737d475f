//! Audit log of one build: why every label went where it went and which
//! values each category was linked to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::router::{RoutingDecision, RuleKind};

/// Per-category routing and linking outcome.
///
/// A category reached by more than one rule kind gets one entry per kind.
/// A category no label reached but which still has linked values gets one
/// entry with no rule kind; its links come from its label and description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub category_slug: String,
    pub matched_labels: Vec<String>,
    pub rule_kind: Option<RuleKind>,
    pub linked_value_ids: Vec<String>,
    /// Jaccard score per linked value, parallel to `linked_value_ids`.
    #[serde(default)]
    pub scores: Vec<f64>,
}

/// Record-level counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub records_loaded: usize,
    pub records_skipped: usize,
    pub records_filtered: usize,
    pub records_deduped: usize,
    /// tier number → item count.
    pub tiers: BTreeMap<u8, usize>,
    pub values: usize,
    pub categories: usize,
    pub sources_found: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    /// RFC 3339 time the build finished. Not part of the ontology itself.
    pub built_at: String,
    pub entries: Vec<AuditEntry>,
    pub decisions: Vec<RoutingDecision>,
    /// Categories promoted from frequently cited Wikipedia categories.
    pub promoted: Vec<String>,
    /// Skipped or adjusted input, in the order it was found.
    pub warnings: Vec<String>,
    pub stats: BuildStats,
}

impl AuditLog {
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn extend_warnings<I, W>(&mut self, warnings: I)
    where
        I: IntoIterator<Item = W>,
        W: std::fmt::Display,
    {
        self.warnings
            .extend(warnings.into_iter().map(|w| w.to_string()));
    }

    /// Entries for one category.
    pub fn entries_for<'a>(&'a self, slug: &'a str) -> impl Iterator<Item = &'a AuditEntry> + 'a {
        self.entries.iter().filter(move |e| e.category_slug == slug)
    }

    pub fn count_by_rule(&self) -> BTreeMap<RuleKind, usize> {
        let mut out = BTreeMap::new();
        for kind in self.entries.iter().filter_map(|e| e.rule_kind) {
            *out.entry(kind).or_insert(0) += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_collect_display_values() {
        let mut log = AuditLog::default();
        log.warn("first");
        log.extend_warnings([1, 2]);
        assert_eq!(log.warnings, vec!["first", "1", "2"]);
    }

    #[test]
    fn entries_group_by_rule() {
        let entry = |slug: &str, rule| AuditEntry {
            category_slug: slug.into(),
            matched_labels: vec![],
            rule_kind: Some(rule),
            linked_value_ids: vec![],
            scores: vec![],
        };
        let mut unrouted = entry("c", RuleKind::Auto);
        unrouted.rule_kind = None;
        let log = AuditLog {
            entries: vec![
                entry("a", RuleKind::Alias),
                entry("a", RuleKind::Pattern),
                entry("b", RuleKind::Alias),
                unrouted,
            ],
            ..Default::default()
        };
        assert_eq!(log.entries_for("a").count(), 2);
        assert_eq!(log.count_by_rule()[&RuleKind::Alias], 2);
        assert!(!log.count_by_rule().contains_key(&RuleKind::Auto));
    }
}
