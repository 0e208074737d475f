//! The persisted ontology: values, categories, the label map and value links.
//!
//! `ontology.json` is deterministic: categories are sorted by slug, both maps
//! by key, and no timestamps are stored. [`Ontology::validate`] runs before
//! every save, so an inconsistent document is never written.

mod assemble;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OntologyError, OntologyResult, StoreResult};
use crate::store;
use crate::value::Value;

pub use assemble::{Assembler, Assembly, TieredItem};

/// A category as persisted in the ontology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub wiki_refs: Vec<String>,
}

impl Category {
    /// A bare category with only a slug and label.
    pub fn minimal(slug: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            label: label.into(),
            description: None,
            aliases: Vec::new(),
            patterns: Vec::new(),
            wiki_refs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ontology {
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub categories: Vec<Category>,
    /// topic label → slug, for every label seen.
    #[serde(default)]
    pub map: BTreeMap<String, String>,
    /// slug → value ids, most related first.
    #[serde(default)]
    pub value_map: BTreeMap<String, Vec<String>>,
}

impl Ontology {
    /// Load a prior ontology; `None` if the file does not exist.
    pub fn load(path: &Path) -> StoreResult<Option<Self>> {
        store::read_json(path)
    }

    /// Validate, then write atomically.
    pub fn save(&self, path: &Path) -> crate::error::ArtifactResult<()> {
        self.validate()?;
        store::write_json(path, self)?;
        Ok(())
    }

    pub fn category(&self, slug: &str) -> Option<&Category> {
        self.categories
            .binary_search_by(|c| c.slug.as_str().cmp(slug))
            .ok()
            .map(|i| &self.categories[i])
    }

    pub fn value(&self, id: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.id == id)
    }

    /// Sort categories by slug. Maps are already ordered.
    pub fn normalize(&mut self) {
        self.categories.sort_by(|a, b| a.slug.cmp(&b.slug));
    }

    /// Check slug uniqueness, value id uniqueness, and that every map and
    /// value_map reference resolves.
    pub fn validate(&self) -> OntologyResult<()> {
        let mut slugs = HashSet::new();
        for c in &self.categories {
            if !slugs.insert(c.slug.as_str()) {
                return Err(OntologyError::DuplicateSlug {
                    slug: c.slug.clone(),
                });
            }
        }
        let mut ids = HashSet::new();
        for v in &self.values {
            if !ids.insert(v.id.as_str()) {
                return Err(OntologyError::DuplicateValueId { id: v.id.clone() });
            }
        }
        for (label, slug) in &self.map {
            if !slugs.contains(slug.as_str()) {
                return Err(OntologyError::UnknownMappedSlug {
                    label: label.clone(),
                    slug: slug.clone(),
                });
            }
        }
        for (slug, linked) in &self.value_map {
            if !slugs.contains(slug.as_str()) {
                return Err(OntologyError::UnknownValueMapSlug { slug: slug.clone() });
            }
            if let Some(id) = linked.iter().find(|id| !ids.contains(id.as_str())) {
                return Err(OntologyError::UnknownValueId {
                    slug: slug.clone(),
                    id: id.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::Tier;

    fn sample() -> Ontology {
        let mut o = Ontology {
            values: vec![Value::new("T0:a", Tier::Foundational, "alpha")],
            categories: vec![Category::minimal("b", "B"), Category::minimal("a", "A")],
            ..Default::default()
        };
        o.map.insert("Label".into(), "a".into());
        o.value_map.insert("a".into(), vec!["T0:a".into()]);
        o.normalize();
        o
    }

    #[test]
    fn valid_ontology_passes() {
        let o = sample();
        o.validate().unwrap();
        assert_eq!(o.categories[0].slug, "a");
        assert_eq!(o.category("b").unwrap().label, "B");
        assert!(o.category("zzz").is_none());
    }

    #[test]
    fn duplicate_slug_is_rejected() {
        let mut o = sample();
        o.categories.push(Category::minimal("a", "again"));
        assert!(matches!(o.validate(), Err(OntologyError::DuplicateSlug { .. })));
    }

    #[test]
    fn dangling_references_are_rejected() {
        let mut o = sample();
        o.map.insert("Other".into(), "missing".into());
        assert!(matches!(o.validate(), Err(OntologyError::UnknownMappedSlug { .. })));

        let mut o = sample();
        o.value_map.insert("a".into(), vec!["T0:nope".into()]);
        assert!(matches!(o.validate(), Err(OntologyError::UnknownValueId { .. })));

        let mut o = sample();
        o.value_map.insert("ghost".into(), vec![]);
        assert!(matches!(o.validate(), Err(OntologyError::UnknownValueMapSlug { .. })));
    }

    #[test]
    fn invalid_ontology_is_never_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ontology.json");
        let mut o = sample();
        o.save(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        o.map.insert("Other".into(), "missing".into());
        assert!(o.save(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

        let loaded = Ontology::load(&path).unwrap().unwrap();
        assert_eq!(loaded, sample());
    }
}
