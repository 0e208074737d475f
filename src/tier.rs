//! Tier classification for freshly observed interactions.
//!
//! | Tier | Meaning                                  | Assigned by              |
//! |------|------------------------------------------|--------------------------|
//! | 0    | foundational, curated                    | humans only              |
//! | 1    | reinforces a Tier-0 anchor               | token overlap            |
//! | 2    | actionable constraint or practice        | keyword patterns         |
//! | 3    | reference snippet                        | default                  |
//!
//! The classifier is a pure function of the record and the current Tier-0
//! values. Anchors are scanned in ascending id order so ties always resolve
//! to the same value.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::record::InteractionRecord;
use crate::text::{TokenSet, shorter_overlap};
use crate::value::Value;

/// Knowledge stratum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Tier {
    Foundational = 0,
    Anchor = 1,
    Practical = 2,
    Reference = 3,
}

impl Tier {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether items of this tier can serve as linking anchors.
    pub fn is_value_tier(self) -> bool {
        matches!(self, Self::Foundational | Self::Anchor)
    }
}

impl From<Tier> for u8 {
    fn from(t: Tier) -> u8 {
        t as u8
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Foundational),
            1 => Ok(Self::Anchor),
            2 => Ok(Self::Practical),
            3 => Ok(Self::Reference),
            other => Err(format!("tier must be 0..=3, got {other}")),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tier {}", self.as_u8())
    }
}

/// Imperative or constraint-indicating phrasing.
static CONSTRAINT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(?:must|mustn't|must not|shall|should|shouldn't|should not|ought to)\b",
        r"\b(?:never|always|avoid|prefer|don't|do not|make sure|ensure|remember to)\b",
        r"\b(?:required?|requirements?|mandatory|forbidden|not allowed|prohibited|limit(?:ed)? to)\b",
        r"\bif\b.{1,80}\bthen\b",
        r"^(?:use|run|set|keep|check|disable|enable|install|configure|refill|replace|store)\b",
        r"\b(?:best practice|rule of thumb|constraint|policy)\b",
    ]
    .iter()
    .map(|p| {
        RegexBuilder::new(p)
            .case_insensitive(true)
            .build()
            .expect("static constraint regex")
    })
    .collect()
});

/// Whether the text carries an actionable constraint/practice signal.
pub fn has_constraint_signal(text: &str) -> bool {
    CONSTRAINT_PATTERNS.iter().any(|re| re.is_match(text.trim()))
}

/// Outcome of classifying one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub tier: Tier,
    /// The Tier-0 value this record reinforces (Tier 1 only).
    pub reinforces: Option<String>,
    /// Shorter-set overlap with that value.
    pub overlap: f64,
}

/// Tier-0 anchors with their tokens precomputed.
#[derive(Debug, Clone)]
pub struct TierClassifier {
    overlap_threshold: f64,
    anchors: Vec<(String, TokenSet)>,
}

impl TierClassifier {
    /// Build a classifier over the Tier-0 values in `values`.
    pub fn new(values: &[Value], overlap_threshold: f64) -> Self {
        let mut anchors: Vec<(String, TokenSet)> = values
            .iter()
            .filter(|v| v.tier == Tier::Foundational)
            .map(|v| (v.id.clone(), v.tokens()))
            .collect();
        anchors.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            overlap_threshold,
            anchors,
        }
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// Classify a record. Never returns Tier 0.
    ///
    /// Promotion bound is inclusive: an overlap equal to the threshold counts.
    pub fn classify(&self, record: &InteractionRecord) -> Classification {
        let tokens = TokenSet::from_text(&record.body_text);
        if !tokens.is_empty() {
            for (id, anchor) in &self.anchors {
                let overlap = shorter_overlap(&tokens, anchor);
                if overlap > 0.0 && overlap >= self.overlap_threshold {
                    return Classification {
                        tier: Tier::Anchor,
                        reinforces: Some(id.clone()),
                        overlap,
                    };
                }
            }
        }
        let tier = if has_constraint_signal(&record.body_text) {
            Tier::Practical
        } else {
            Tier::Reference
        };
        Classification {
            tier,
            reinforces: None,
            overlap: 0.0,
        }
    }
}
