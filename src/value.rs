//! Values: Tier-0/1 knowledge anchors with stable identifiers.
//!
//! Ids look like `T0:memory-must-be-auditable` and are assigned once. An id
//! already carried by a prior ontology or a seed entry is kept verbatim even
//! when the text is edited; a new value whose derived id is taken by a
//! different text gets a `-2`, `-3`, ... suffix. Values are never removed here.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::seeds::{SeedWarning, ValueSeed};
use crate::text::{TokenSet, slugify, truncate_slug};
use crate::tier::Tier;

/// Maximum slug length inside a derived id.
const ID_SLUG_MAX: usize = 40;

/// A linking anchor. Tokens are derived on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub id: String,
    pub tier: Tier,
    #[serde(alias = "label")]
    pub text: String,
    /// For Tier 1: the Tier-0 value this one reinforces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinforces: Option<String>,
}

impl Value {
    pub fn new(id: impl Into<String>, tier: Tier, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tier,
            text: text.into(),
            reinforces: None,
        }
    }

    pub fn tokens(&self) -> TokenSet {
        TokenSet::from_text(&self.text)
    }
}

/// Append-only set of values with id allocation.
#[derive(Debug, Clone, Default)]
pub struct ValueRegistry {
    values: Vec<Value>,
    by_id: HashMap<String, usize>,
    by_text: HashMap<(Tier, String), usize>,
}

impl ValueRegistry {
    /// Start from the values of a prior ontology. Entries that are not
    /// Tier 0/1 or repeat an id are dropped with a warning.
    pub fn from_prior(prior: &[Value]) -> (Self, Vec<SeedWarning>) {
        let mut reg = Self::default();
        let mut warnings = Vec::new();
        for v in prior {
            if !v.tier.is_value_tier() {
                warnings.push(SeedWarning::new(
                    "ontology.values",
                    &v.id,
                    format!("{} cannot be a value; dropped", v.tier),
                ));
                continue;
            }
            if reg.by_id.contains_key(&v.id) {
                warnings.push(SeedWarning::new("ontology.values", &v.id, "duplicate id; dropped"));
                continue;
            }
            reg.insert(v.clone());
        }
        (reg, warnings)
    }

    /// Merge curated Tier-0 seed values. A seed id that exists updates the
    /// text in place; a seed without id reuses a value with identical text
    /// or gets a fresh id. Returns the ids assigned to id-less seeds, in order.
    pub fn merge_seed_values(&mut self, seeds: &[ValueSeed]) -> (Vec<String>, Vec<SeedWarning>) {
        let mut assigned = Vec::new();
        let mut warnings = Vec::new();
        for seed in seeds {
            let text = seed.text.trim();
            if text.is_empty() {
                warnings.push(SeedWarning::new(
                    "values",
                    seed.id.as_deref().unwrap_or_default(),
                    "empty value text",
                ));
                continue;
            }
            match &seed.id {
                Some(id) => match self.by_id.get(id).copied() {
                    Some(pos) if self.values[pos].tier != Tier::Foundational => {
                        warnings.push(SeedWarning::new(
                            "values",
                            id,
                            "id belongs to a promoted Tier-1 value; seed ignored",
                        ));
                    }
                    Some(pos) => self.retext(pos, text),
                    None => {
                        self.insert(Value::new(id.clone(), Tier::Foundational, text));
                    }
                },
                None => {
                    let id = self.ensure(Tier::Foundational, text, None);
                    assigned.push(id);
                }
            }
        }
        (assigned, warnings)
    }

    /// Return the id of the value with this tier and text, creating it if needed.
    pub fn ensure(&mut self, tier: Tier, text: &str, reinforces: Option<&str>) -> String {
        let key = (tier, text.to_string());
        if let Some(&pos) = self.by_text.get(&key) {
            return self.values[pos].id.clone();
        }
        let id = self.allocate_id(tier, text);
        let mut value = Value::new(id.clone(), tier, text);
        value.reinforces = reinforces.map(str::to_string);
        self.insert(value);
        id
    }

    fn allocate_id(&self, tier: Tier, text: &str) -> String {
        let base = format!(
            "T{}:{}",
            tier.as_u8(),
            truncate_slug(&slugify(text), ID_SLUG_MAX)
        );
        if !self.by_id.contains_key(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !self.by_id.contains_key(candidate))
            .unwrap_or(base)
    }

    fn insert(&mut self, value: Value) {
        let pos = self.values.len();
        self.by_id.insert(value.id.clone(), pos);
        self.by_text
            .entry((value.tier, value.text.clone()))
            .or_insert(pos);
        self.values.push(value);
    }

    fn retext(&mut self, pos: usize, text: &str) {
        let value = &mut self.values[pos];
        if value.text == text {
            return;
        }
        let old = (value.tier, std::mem::replace(&mut value.text, text.to_string()));
        if self.by_text.get(&old) == Some(&pos) {
            self.by_text.remove(&old);
        }
        self.by_text
            .entry((value.tier, value.text.clone()))
            .or_insert(pos);
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.by_id.get(id).map(|&pos| &self.values[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn ids(&self) -> BTreeSet<&str> {
        self.values.iter().map(|v| v.id.as_str()).collect()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
