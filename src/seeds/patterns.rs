//! Ordered regex → slug routing rules.
//!
//! First match wins, so declaration order is part of the contract. The table
//! is written as a JSON object (keys in declared order) and also accepts a
//! list of `{ "pattern": ..., "slug": ... }` objects.

use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One routing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub pattern: String,
    pub slug: String,
}

impl PatternRule {
    pub fn new(pattern: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            slug: slug.into(),
        }
    }
}

/// Routing rules in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternTable(Vec<PatternRule>);

impl PatternTable {
    pub fn iter(&self) -> impl Iterator<Item = &PatternRule> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a rule with this exact pattern text exists.
    pub fn contains_pattern(&self, pattern: &str) -> bool {
        self.0.iter().any(|r| r.pattern == pattern)
    }

    /// Append a rule at the lowest precedence. Returns `false` if the
    /// pattern text is already declared.
    pub fn push(&mut self, rule: PatternRule) -> bool {
        if self.contains_pattern(&rule.pattern) {
            return false;
        }
        self.0.push(rule);
        true
    }
}

impl From<Vec<PatternRule>> for PatternTable {
    fn from(rules: Vec<PatternRule>) -> Self {
        let mut table = Self::default();
        for rule in rules {
            table.push(rule);
        }
        table
    }
}

impl Serialize for PatternTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for rule in &self.0 {
            map.serialize_entry(&rule.pattern, &rule.slug)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PatternTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PatternTableVisitor)
    }
}

struct PatternTableVisitor;

impl<'de> Visitor<'de> for PatternTableVisitor {
    type Value = PatternTable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of regex → slug or a list of {pattern, slug}")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut rules = Vec::new();
        while let Some((pattern, slug)) = access.next_entry::<String, String>()? {
            rules.push(PatternRule::new(pattern, slug));
        }
        Ok(PatternTable::from(rules))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut rules = Vec::new();
        while let Some(rule) = access.next_element::<PatternRule>()? {
            rules.push(rule);
        }
        Ok(PatternTable::from(rules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_form_keeps_order() {
        let table: PatternTable =
            serde_json::from_str(r#"{"zeta": "z", "alpha": "a", "mid": "m"}"#).unwrap();
        let order: Vec<&str> = table.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(order, vec!["zeta", "alpha", "mid"]);

        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"zeta":"z","alpha":"a","mid":"m"}"#);
    }

    #[test]
    fn list_form_is_accepted() {
        let table: PatternTable =
            serde_json::from_str(r#"[{"pattern": "salt", "slug": "dishwasher-tips"}]"#).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn push_rejects_duplicates() {
        let mut table = PatternTable::default();
        assert!(table.push(PatternRule::new("salt", "a")));
        assert!(!table.push(PatternRule::new("salt", "b")));
        assert_eq!(table.len(), 1);
    }
}
