//! Markdown reports and the tier document.
//!
//! Renderers return strings; the pipeline decides where they go.

use serde::Serialize;

use crate::audit::AuditLog;
use crate::ontology::{Ontology, TieredItem};
use crate::seeds::Seeds;
use crate::sources::{self, AuthorMatcher, SourceKind};
use crate::suggest::{CategoryOrigin, Proposal};
use crate::tier::Tier;

/// Rows shown per section in the sources report.
const SOURCES_TOP_N: usize = 25;

/// `memory_tiers.json`: every classified item, grouped counts first.
#[derive(Debug, Clone, Serialize)]
pub struct TierDocument<'a> {
    pub counts: std::collections::BTreeMap<u8, usize>,
    pub items: &'a [TieredItem],
}

impl<'a> TierDocument<'a> {
    pub fn new(items: &'a [TieredItem]) -> Self {
        let mut counts = std::collections::BTreeMap::new();
        for item in items {
            *counts.entry(item.tier.as_u8()).or_insert(0) += 1;
        }
        Self { counts, items }
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// `final/ontology_build_log.md`.
pub fn build_log(ontology: &Ontology, audit: &AuditLog) -> String {
    let mut out = String::new();
    out.push_str("# Ontology build log\n\n");
    out.push_str(&format!("Built at: {}\n\n", audit.built_at));

    let s = &audit.stats;
    out.push_str("## Summary\n\n");
    out.push_str(&format!(
        "- Records: {} loaded, {} skipped, {} outside date range, {} duplicates\n",
        s.records_loaded, s.records_skipped, s.records_filtered, s.records_deduped
    ));
    for (tier, count) in &s.tiers {
        out.push_str(&format!("- Tier {tier}: {count} items\n"));
    }
    out.push_str(&format!(
        "- Values: {}\n- Categories: {}\n- Labels mapped: {}\n- Sources discovered: {}\n\n",
        ontology.values.len(),
        ontology.categories.len(),
        ontology.map.len(),
        s.sources_found
    ));

    out.push_str("## Categories\n\n");
    out.push_str("| Category | Rule | Labels | Linked values |\n");
    out.push_str("|---|---|---|---|\n");
    for entry in &audit.entries {
        let linked: Vec<String> = entry
            .linked_value_ids
            .iter()
            .zip(entry.scores.iter().chain(std::iter::repeat(&0.0)))
            .map(|(id, score)| format!("{id} ({score:.2})"))
            .collect();
        let rule = match entry.rule_kind {
            Some(kind) => kind.to_string(),
            None if audit.promoted.contains(&entry.category_slug) => "promoted".to_string(),
            None => "seed".to_string(),
        };
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            entry.category_slug,
            rule,
            escape_cell(&entry.matched_labels.join(", ")),
            escape_cell(&linked.join(", "))
        ));
    }
    out.push('\n');

    if !audit.promoted.is_empty() {
        out.push_str("## Promoted from Wikipedia\n\n");
        for slug in &audit.promoted {
            out.push_str(&format!("- {slug}\n"));
        }
        out.push('\n');
    }

    out.push_str("## Routing decisions\n\n");
    for d in &audit.decisions {
        let label = if d.label.is_empty() { "(empty)" } else { &d.label };
        if d.detail.is_empty() {
            out.push_str(&format!("- `{label}` → {} [{}] ×{}\n", d.slug, d.rule, d.count));
        } else {
            out.push_str(&format!(
                "- `{label}` → {} [{}: `{}`] ×{}\n",
                d.slug, d.rule, d.detail, d.count
            ));
        }
    }
    out.push('\n');

    if !audit.warnings.is_empty() {
        out.push_str("## Warnings\n\n");
        for w in &audit.warnings {
            out.push_str(&format!("- {w}\n"));
        }
        out.push('\n');
    }
    out
}

/// `final/sources_suggestions.md`.
pub fn sources_report(seeds: &Seeds, wiki_category_threshold: u32) -> String {
    let mut out = String::new();
    out.push_str("# Sources suggestions\n\n");

    let sections = [
        (SourceKind::WikipediaCategory, "Wikipedia categories"),
        (SourceKind::WikipediaPage, "Wikipedia pages"),
        (SourceKind::UrlDomain, "Web domains"),
        (SourceKind::Author, "Authors"),
        (SourceKind::Reference, "References"),
    ];
    for (kind, title) in sections {
        let mut entries: Vec<_> = seeds.sources.iter().filter(|s| s.kind == kind).collect();
        if entries.is_empty() {
            continue;
        }
        entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.id.cmp(&b.id)));
        out.push_str(&format!("## {title}\n\n"));
        for e in entries.into_iter().take(SOURCES_TOP_N) {
            match &e.url {
                Some(url) => out.push_str(&format!(
                    "- [{}]({url}) ×{}\n",
                    escape_cell(e.display_label()),
                    e.count
                )),
                None => out.push_str(&format!("- {} ×{}\n", escape_cell(e.display_label()), e.count)),
            }
        }
        out.push('\n');
    }

    let frequent = sources::frequent_wiki_categories(&seeds.sources, wiki_category_threshold);
    let candidates: Vec<_> = frequent
        .into_iter()
        .filter(|s| {
            !seeds
                .categories
                .contains_key(&crate::text::slugify(s.display_label()))
        })
        .collect();
    if !candidates.is_empty() {
        out.push_str("## Category candidates\n\n");
        for c in candidates {
            out.push_str(&format!("- {} ({} mentions)\n", c.display_label(), c.count));
        }
        out.push('\n');
    }

    let (authors, _) = AuthorMatcher::compile(&seeds.authors);
    let unmapped = sources::unmapped_isbns(&seeds.sources, &authors);
    if !unmapped.is_empty() {
        out.push_str("## Unmapped ISBNs\n\n");
        out.push_str("Add these to an author's `isbns` in the seed file.\n\n");
        for s in unmapped {
            out.push_str(&format!("- {} ×{}\n", s.id, s.count));
        }
        out.push('\n');
    }
    out
}

/// `final/category_suggestions.md`.
pub fn suggestions_report(proposal: &Proposal, merged: bool) -> String {
    let mut out = String::new();
    out.push_str("# Category suggestions\n\n");
    if merged {
        out.push_str("These suggestions were merged into the seed file.\n\n");
    } else {
        out.push_str(
            "Review and copy into `ontology_sources.json`, or rebuild with auto-merge enabled.\n\n",
        );
    }
    if proposal.is_empty() {
        out.push_str("Nothing to suggest.\n");
        return out;
    }

    if !proposal.categories.is_empty() {
        out.push_str("## Categories\n\n");
        out.push_str("| Slug | Label | Origin | Aliases | Support |\n");
        out.push_str("|---|---|---|---|---|\n");
        for c in &proposal.categories {
            let origin = match c.origin {
                CategoryOrigin::Derived => "derived",
                CategoryOrigin::Wikipedia => "wikipedia",
            };
            out.push_str(&format!(
                "| {} | {} | {origin} | {} | {} |\n",
                c.slug,
                escape_cell(&c.label),
                escape_cell(&c.aliases.join(", ")),
                c.support
            ));
        }
        out.push('\n');
    }
    if !proposal.values.is_empty() {
        out.push_str("## Tier-0 values\n\n");
        for v in &proposal.values {
            out.push_str(&format!("- {} (seen {}×)\n", v.text, v.occurrences));
        }
        out.push('\n');
    }
    out
}

/// `final/memory_mart_tier01.md`: Tier-0 and Tier-1 values, with the
/// categories each is linked from.
pub fn memory_mart(ontology: &Ontology) -> String {
    let mut out = String::new();
    out.push_str("# Memory mart: Tier 0 and Tier 1\n\n");
    for tier in [Tier::Foundational, Tier::Anchor] {
        let values: Vec<_> = ontology.values.iter().filter(|v| v.tier == tier).collect();
        out.push_str(&format!("## {tier}\n\n"));
        if values.is_empty() {
            out.push_str("_none_\n\n");
            continue;
        }
        for v in values {
            let linked_from: Vec<&str> = ontology
                .value_map
                .iter()
                .filter(|(_, ids)| ids.contains(&v.id))
                .map(|(slug, _)| slug.as_str())
                .collect();
            out.push_str(&format!("- **{}** {}", v.id, v.text));
            if let Some(r) = &v.reinforces {
                out.push_str(&format!(" (reinforces {r})"));
            }
            if !linked_from.is_empty() {
                out.push_str(&format!(" [{}]", linked_from.join(", ")));
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditEntry;
    use crate::ontology::Assembler;
    use crate::record::InteractionRecord;
    use crate::suggest::{ProposedCategory, ProposedValue};

    fn assembled() -> (Seeds, crate::ontology::Assembly) {
        let (mut seeds, _) = Seeds::from_json_str(
            r#"{
                "aliases": {"dishwasher": "home-appliances"},
                "values": [{"text": "Dishwasher salt keeps glasses clean"}]
            }"#,
        )
        .unwrap();
        let records = vec![
            InteractionRecord::new("Dishwasher", "Refill the salt | then run. ISBN 978-0-374-53355-7"),
            InteractionRecord::new("", "dishwasher salt keeps glasses clean"),
        ];
        let out = Assembler::default().assemble(&mut seeds, &records, None).unwrap();
        (seeds, out)
    }

    #[test]
    fn build_log_lists_categories_and_decisions() {
        let (_, out) = assembled();
        let md = build_log(&out.ontology, &out.audit);
        assert!(md.starts_with("# Ontology build log"));
        assert!(md.contains("| home-appliances | alias | Dishwasher |"));
        assert!(md.contains("`(empty)` → auto-uncategorized"));
        // The implied category warning shows up.
        assert!(md.contains("## Warnings"));
    }

    #[test]
    fn unrouted_entries_name_their_origin() {
        let entry = |slug: &str| AuditEntry {
            category_slug: slug.into(),
            matched_labels: vec![],
            rule_kind: None,
            linked_value_ids: vec!["T0:x".into()],
            scores: vec![0.5],
        };
        let audit = AuditLog {
            entries: vec![entry("curated"), entry("knights-hospitaller")],
            promoted: vec!["knights-hospitaller".into()],
            ..Default::default()
        };
        let md = build_log(&Ontology::default(), &audit);
        assert!(md.contains("| curated | seed |  | T0:x (0.50) |"));
        assert!(md.contains("| knights-hospitaller | promoted |"));
    }

    #[test]
    fn sources_report_lists_unmapped_isbns() {
        let (seeds, _) = assembled();
        let md = sources_report(&seeds, 3);
        assert!(md.contains("## Unmapped ISBNs"));
        assert!(md.contains("9780374533557"));
    }

    #[test]
    fn memory_mart_shows_both_tiers() {
        let (_, out) = assembled();
        let md = memory_mart(&out.ontology);
        assert!(md.contains("## Tier 0"));
        assert!(md.contains("## Tier 1"));
        assert!(md.contains("reinforces T0:dishwasher-salt-keeps-glasses-clean"));
    }

    #[test]
    fn suggestions_report_renders_tables() {
        let proposal = Proposal {
            categories: vec![ProposedCategory {
                slug: "sourdough".into(),
                label: "Sourdough".into(),
                origin: CategoryOrigin::Derived,
                aliases: vec!["sourdough".into()],
                wiki_refs: vec![],
                support: 3,
            }],
            values: vec![ProposedValue {
                text: "Feed the starter".into(),
                occurrences: 2,
            }],
        };
        let md = suggestions_report(&proposal, false);
        assert!(md.contains("| sourdough | Sourdough | derived | sourdough | 3 |"));
        assert!(md.contains("- Feed the starter (seen 2×)"));
        assert!(suggestions_report(&Proposal::default(), true).contains("Nothing to suggest."));
    }

    #[test]
    fn tier_document_counts_items() {
        let (_, out) = assembled();
        let doc = TierDocument::new(&out.items);
        assert_eq!(doc.counts.values().sum::<usize>(), 2);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
    }
}
