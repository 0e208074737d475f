//! Ontology assembly: classify, route, link, and validate in one pass.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::audit::{AuditEntry, AuditLog};
use crate::config::BuildConfig;
use crate::error::OntologyResult;
use crate::intent::{Intent, classify_intent};
use crate::linker::{LinkCandidates, ScoredValue, ValueLinker};
use crate::record::{InteractionRecord, parse_timestamp};
use crate::router::{CategoryRouter, RuleKind};
use crate::seeds::{CategorySeed, SeedIndex, Seeds};
use crate::sources::{self, AuthorMatcher};
use crate::text::{TokenSet, slugify};
use crate::tier::{Tier, TierClassifier};
use crate::value::ValueRegistry;

use super::{Category, Ontology};

/// One classified and routed record, as written to `memory_tiers.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredItem {
    pub tier: Tier,
    pub text: String,
    #[serde(default)]
    pub intent: Intent,
    pub topic_label: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinforces: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hint: Option<String>,
    /// Index of the previous item with the same category and role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follows: Option<usize>,
}

/// Everything one assembly produced.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub ontology: Ontology,
    pub audit: AuditLog,
    pub items: Vec<TieredItem>,
}

/// Assembly parameters.
#[derive(Debug, Clone)]
pub struct Assembler {
    overlap_threshold: f64,
    linker: ValueLinker,
    wiki_category_threshold: u32,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::from_config(&BuildConfig::default())
    }
}

impl Assembler {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            overlap_threshold: config.overlap_threshold,
            linker: ValueLinker::new(config.value_cap, config.min_link_score),
            wiki_category_threshold: config.wiki_category_threshold,
        }
    }

    /// Build an ontology from seeds and records.
    ///
    /// `seeds` is updated in place: ids are filled in for curated values
    /// that lacked one, and newly discovered sources are accumulated. Values
    /// of `prior` are always carried forward. The result is validated; an
    /// error here means nothing should be written.
    pub fn assemble(
        &self,
        seeds: &mut Seeds,
        records: &[InteractionRecord],
        prior: Option<&Ontology>,
    ) -> OntologyResult<Assembly> {
        let mut audit = AuditLog::default();

        let (index, warnings) = seeds.compile();
        audit.extend_warnings(warnings);

        let prior_values = prior.map(|o| o.values.as_slice()).unwrap_or_default();
        let (mut registry, warnings) = ValueRegistry::from_prior(prior_values);
        audit.extend_warnings(warnings);
        let (assigned, warnings) = registry.merge_seed_values(&seeds.values);
        audit.extend_warnings(warnings);
        let mut assigned = assigned.into_iter();
        for seed in seeds
            .values
            .iter_mut()
            .filter(|s| s.id.is_none() && !s.text.trim().is_empty())
        {
            seed.id = assigned.next();
        }

        // ── Classify and route ──
        let classifier = TierClassifier::new(registry.values(), self.overlap_threshold);
        let mut router = CategoryRouter::new(&index);
        let mut category_tokens: BTreeMap<String, TokenSet> = BTreeMap::new();
        let mut items = Vec::with_capacity(records.len());

        for record in records {
            let class = classifier.classify(record);
            let text = record.excerpt();
            if class.tier == Tier::Anchor {
                let id = registry.ensure(Tier::Anchor, &text, class.reinforces.as_deref());
                tracing::debug!(value = %id, overlap = class.overlap, "promoted tier-1 value");
            }
            let route = router.route(&record.topic_label, &record.body_text);
            category_tokens
                .entry(route.slug.clone())
                .or_default()
                .extend(&TokenSet::from_text(&record.body_text));
            *audit.stats.tiers.entry(class.tier.as_u8()).or_insert(0) += 1;
            items.push(TieredItem {
                tier: class.tier,
                intent: classify_intent(&text),
                text,
                topic_label: record.topic_label.trim().to_string(),
                category: route.slug,
                reinforces: class.reinforces,
                role: record.role.clone(),
                timestamp: record.timestamp.clone(),
                source_hint: record.source_hint.clone(),
                follows: None,
            });
        }
        link_evolution(&mut items);

        // ── Sources ──
        let (authors, warnings) = AuthorMatcher::compile(&seeds.authors);
        audit.extend_warnings(warnings);
        let found = sources::discover(records, &authors);
        audit.stats.sources_found = found.len();
        seeds.sources = sources::merge_sources(&seeds.sources, found);

        // ── Categories: seeds win over implied, auto and promoted ──
        let mut categories: BTreeMap<String, Category> = BTreeMap::new();
        for (slug, seed) in &seeds.categories {
            categories.insert(slug.clone(), category_from_seed(slug, seed, &index));
        }
        for (slug, seed) in index.implied_categories() {
            categories
                .entry(slug.clone())
                .or_insert_with(|| category_from_seed(slug, seed, &index));
        }
        for auto in router.auto_categories().iter() {
            if categories.contains_key(&auto.slug) {
                tracing::debug!(slug = %auto.slug, "curated category shadows auto category");
                continue;
            }
            categories.insert(auto.slug.clone(), Category::minimal(&auto.slug, &auto.label));
        }
        for source in sources::frequent_wiki_categories(&seeds.sources, self.wiki_category_threshold)
        {
            let title = source.display_label().trim();
            let slug = slugify(title);
            if categories.contains_key(&slug) {
                continue;
            }
            let mut category = Category::minimal(&slug, title);
            category.wiki_refs = source.url.iter().cloned().collect();
            categories.insert(slug.clone(), category);
            tracing::info!(slug = %slug, mentions = source.count, "promoted wikipedia category");
            audit.promoted.push(slug);
        }

        // ── Link ──
        let candidates = LinkCandidates::new(registry.values());
        let mut links: BTreeMap<String, Vec<ScoredValue>> = BTreeMap::new();
        for (slug, category) in &categories {
            let linked = match category_tokens.get(slug) {
                Some(tokens) if !tokens.is_empty() => self.linker.link(tokens, &candidates),
                _ => self.linker.link(&descriptive_tokens(category), &candidates),
            };
            links.insert(slug.clone(), linked);
        }

        let hits = router.hits();
        for ((slug, rule), labels) in hits {
            let linked = links.get(slug).map(Vec::as_slice).unwrap_or_default();
            audit
                .entries
                .push(audit_entry(slug, labels.iter().cloned().collect(), Some(*rule), linked));
        }
        let routed: BTreeSet<&str> = hits.keys().map(|(slug, _)| slug.as_str()).collect();
        for (slug, linked) in &links {
            if !linked.is_empty() && !routed.contains(slug.as_str()) {
                audit.entries.push(audit_entry(slug, Vec::new(), None, linked));
            }
        }
        audit
            .entries
            .sort_by(|a, b| a.category_slug.cmp(&b.category_slug));
        audit.decisions = router.decisions().to_vec();

        let mut ontology = Ontology {
            map: router.map().clone(),
            value_map: links
                .into_iter()
                .map(|(slug, linked)| (slug, linked.into_iter().map(|s| s.id).collect()))
                .collect(),
            categories: categories.into_values().collect(),
            values: registry.into_values(),
        };
        ontology.normalize();
        ontology.validate()?;

        audit.stats.values = ontology.values.len();
        audit.stats.categories = ontology.categories.len();
        audit.built_at = chrono::Utc::now().to_rfc3339();
        tracing::info!(
            values = ontology.values.len(),
            categories = ontology.categories.len(),
            labels = ontology.map.len(),
            "assembled ontology"
        );

        Ok(Assembly {
            ontology,
            audit,
            items,
        })
    }
}

/// Chain items of one category and role by timestamp, then text.
fn link_evolution(items: &mut [TieredItem]) {
    let mut chains: BTreeMap<(&str, Option<&str>), Vec<usize>> = BTreeMap::new();
    for (i, item) in items.iter().enumerate() {
        chains
            .entry((item.category.as_str(), item.role.as_deref()))
            .or_default()
            .push(i);
    }
    let mut links = Vec::new();
    for mut chain in chains.into_values() {
        chain.sort_by_cached_key(|&i| {
            let item = &items[i];
            (
                item.timestamp.as_deref().and_then(parse_timestamp),
                item.text.clone(),
                i,
            )
        });
        links.extend(chain.windows(2).map(|pair| (pair[1], pair[0])));
    }
    for (item, prev) in links {
        items[item].follows = Some(prev);
    }
}

fn audit_entry(
    slug: &str,
    matched_labels: Vec<String>,
    rule_kind: Option<RuleKind>,
    linked: &[ScoredValue],
) -> AuditEntry {
    AuditEntry {
        category_slug: slug.to_string(),
        matched_labels,
        rule_kind,
        linked_value_ids: linked.iter().map(|s| s.id.clone()).collect(),
        scores: linked.iter().map(|s| s.score).collect(),
    }
}

fn category_from_seed(slug: &str, seed: &CategorySeed, index: &SeedIndex) -> Category {
    let label = if seed.label.trim().is_empty() {
        slug.to_string()
    } else {
        seed.label.trim().to_string()
    };
    let own = label.to_lowercase();
    Category {
        slug: slug.to_string(),
        aliases: index
            .aliases_for(slug)
            .into_iter()
            .filter(|a| *a != own)
            .collect(),
        patterns: index.patterns_for(slug),
        description: seed.description.clone(),
        wiki_refs: seed.wiki_refs.clone(),
        label,
    }
}

/// Tokens for a category that no record reached this run.
fn descriptive_tokens(category: &Category) -> TokenSet {
    let mut tokens = TokenSet::from_text(&category.label);
    if let Some(desc) = &category.description {
        tokens.extend(&TokenSet::from_text(desc));
    }
    tokens
}
