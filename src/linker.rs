//! Category ↔ value linking by Jaccard token overlap.

use serde::{Deserialize, Serialize};

use crate::text::{TokenSet, jaccard};
use crate::value::Value;

/// Default number of values linked to one category.
pub const DEFAULT_VALUE_CAP: usize = 5;

/// A linked value with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredValue {
    pub id: String,
    pub score: f64,
}

/// Tier-0/1 values with their tokens computed once per build.
#[derive(Debug, Clone, Default)]
pub struct LinkCandidates {
    values: Vec<(String, TokenSet)>,
}

impl LinkCandidates {
    pub fn new(values: &[Value]) -> Self {
        Self {
            values: values
                .iter()
                .filter(|v| v.tier.is_value_tier())
                .map(|v| (v.id.clone(), v.tokens()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValueLinker {
    cap: usize,
    min_score: f64,
}

impl Default for ValueLinker {
    fn default() -> Self {
        Self::new(DEFAULT_VALUE_CAP, 0.0)
    }
}

impl ValueLinker {
    pub fn new(cap: usize, min_score: f64) -> Self {
        Self { cap, min_score }
    }

    /// Score every Tier-0/1 value against the category tokens. Keeps scores
    /// strictly above `min_score`, most related first, ties by ascending id.
    pub fn link(&self, category_tokens: &TokenSet, candidates: &LinkCandidates) -> Vec<ScoredValue> {
        if category_tokens.is_empty() || self.cap == 0 {
            return Vec::new();
        }
        let mut scored: Vec<ScoredValue> = candidates
            .values
            .iter()
            .filter_map(|(id, tokens)| {
                let score = jaccard(category_tokens, tokens);
                (score > self.min_score).then(|| ScoredValue {
                    id: id.clone(),
                    score,
                })
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        scored.truncate(self.cap);
        scored
    }
}
