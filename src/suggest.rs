//! Seed suggestions derived from a finished build.
//!
//! [`propose`] is pure: it inspects an assembly and returns a [`Proposal`].
//! Nothing changes until [`apply_proposal`] is called on a seed document,
//! which only ever adds entries and never overwrites curated ones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ontology::{Ontology, TieredItem};
use crate::router::AUTO_PREFIX;
use crate::seeds::{CategorySeed, Seeds, ValueSeed};
use crate::sources::{self, SourceEntry};
use crate::text::{normalize_whitespace, slugify};
use crate::tier::Tier;

/// Why a category is proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryOrigin {
    /// An auto category with enough lower-tier items.
    Derived,
    /// A frequently cited Wikipedia category.
    Wikipedia,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedCategory {
    pub slug: String,
    pub label: String,
    pub origin: CategoryOrigin,
    /// Aliases to add so the observed labels route to the new slug.
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wiki_refs: Vec<String>,
    /// Supporting item or mention count.
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedValue {
    pub text: String,
    pub occurrences: usize,
}

/// A proposed seed diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub categories: Vec<ProposedCategory>,
    pub values: Vec<ProposedValue>,
}

impl Proposal {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.values.is_empty()
    }
}

/// Thresholds for proposals.
#[derive(Debug, Clone, Copy)]
pub struct SuggestOptions {
    pub min_items: usize,
    pub wiki_category_threshold: u32,
}

/// Inspect a build and propose additions to the seeds.
pub fn propose(
    seeds: &Seeds,
    ontology: &Ontology,
    items: &[TieredItem],
    opts: SuggestOptions,
) -> Proposal {
    let mut proposal = Proposal::default();
    let min_items = opts.min_items.max(1);

    // Auto categories backed by enough practical/reference items.
    let mut support: BTreeMap<&str, usize> = BTreeMap::new();
    let mut labels: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for item in items {
        if !item.category.starts_with(AUTO_PREFIX)
            || !matches!(item.tier, Tier::Practical | Tier::Reference)
        {
            continue;
        }
        *support.entry(item.category.as_str()).or_insert(0) += 1;
        let seen = labels.entry(item.category.as_str()).or_default();
        if !item.topic_label.is_empty() && !seen.contains(&item.topic_label.as_str()) {
            seen.push(item.topic_label.as_str());
        }
    }
    for (auto_slug, count) in support {
        if count < min_items {
            continue;
        }
        let Some(curated) = auto_slug.strip_prefix(AUTO_PREFIX) else {
            continue;
        };
        if curated.is_empty() || seeds.categories.contains_key(curated) {
            continue;
        }
        let observed = labels.remove(auto_slug).unwrap_or_default();
        let Some(first) = observed.first() else {
            continue;
        };
        let label = ontology
            .category(auto_slug)
            .map(|c| c.label.clone())
            .unwrap_or_else(|| (*first).to_string());
        let mut aliases: Vec<String> = Vec::new();
        for alias in observed.iter().map(|l| l.trim().to_lowercase()) {
            if !seeds.aliases.contains_key(&alias) && !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }
        proposal.categories.push(ProposedCategory {
            slug: curated.to_string(),
            label,
            origin: CategoryOrigin::Derived,
            aliases,
            wiki_refs: Vec::new(),
            support: count,
        });
    }

    // Frequently cited Wikipedia categories not yet curated.
    for source in sources::frequent_wiki_categories(&seeds.sources, opts.wiki_category_threshold) {
        if let Some(category) = wiki_category(seeds, &proposal, source) {
            proposal.categories.push(category);
        }
    }

    // Practices that keep coming back.
    let known: Vec<String> = ontology
        .values
        .iter()
        .map(|v| practice_key(&v.text))
        .chain(seeds.values.iter().map(|v| practice_key(&v.text)))
        .collect();
    let mut practices: BTreeMap<String, (String, usize, usize)> = BTreeMap::new();
    for (pos, item) in items.iter().enumerate() {
        if item.tier != Tier::Practical || item.text.is_empty() {
            continue;
        }
        practices
            .entry(practice_key(&item.text))
            .or_insert_with(|| (item.text.clone(), 0, pos))
            .1 += 1;
    }
    let mut repeated: Vec<(String, usize, usize)> = practices
        .into_iter()
        .filter(|(key, (_, n, _))| *n >= min_items && !known.contains(key))
        .map(|(_, v)| v)
        .collect();
    repeated.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    proposal.values = repeated
        .into_iter()
        .map(|(text, occurrences, _)| ProposedValue { text, occurrences })
        .collect();

    proposal
}

fn wiki_category(seeds: &Seeds, proposal: &Proposal, source: &SourceEntry) -> Option<ProposedCategory> {
    let title = source.display_label().trim();
    let slug = slugify(title);
    if seeds.categories.contains_key(&slug) || proposal.categories.iter().any(|c| c.slug == slug) {
        return None;
    }
    Some(ProposedCategory {
        slug,
        label: title.to_string(),
        origin: CategoryOrigin::Wikipedia,
        aliases: Vec::new(),
        wiki_refs: source.url.iter().cloned().collect(),
        support: usize::try_from(source.count).unwrap_or(usize::MAX),
    })
}

fn practice_key(text: &str) -> String {
    normalize_whitespace(text)
        .trim_end_matches(['.', '!', '?'])
        .to_lowercase()
}

/// Outcome of merging a proposal into seeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub categories: usize,
    pub aliases: usize,
    pub values: usize,
}

impl MergeSummary {
    pub fn total(&self) -> usize {
        self.categories + self.aliases + self.values
    }
}

/// Add the proposal's entries to `seeds`. Existing entries are left alone.
pub fn apply_proposal(seeds: &mut Seeds, proposal: &Proposal) -> MergeSummary {
    let mut summary = MergeSummary::default();
    for cat in &proposal.categories {
        if !seeds.categories.contains_key(&cat.slug) {
            seeds.categories.insert(
                cat.slug.clone(),
                CategorySeed {
                    label: cat.label.clone(),
                    description: None,
                    aliases: Vec::new(),
                    wiki_refs: cat.wiki_refs.clone(),
                    extra: Default::default(),
                },
            );
            summary.categories += 1;
        }
        for alias in &cat.aliases {
            if !seeds.aliases.contains_key(alias) {
                seeds.aliases.insert(alias.clone(), cat.slug.clone());
                summary.aliases += 1;
            }
        }
    }
    for value in &proposal.values {
        let key = practice_key(&value.text);
        if seeds.values.iter().any(|v| practice_key(&v.text) == key) {
            continue;
        }
        seeds.values.push(ValueSeed {
            text: value.text.clone(),
            ..Default::default()
        });
        summary.values += 1;
    }
    summary
}
