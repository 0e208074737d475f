//! Build configuration: TOML file, environment overrides, CLI overrides.
//!
//! Precedence is file < environment < command line. Every tunable the
//! builder uses is a named field with a default here, never a literal in
//! the algorithm modules.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Environment switch: rebuild the ontology from seeds (`1`) or reuse it (`0`).
pub const ENV_REBUILD: &str = "ONTOLOGY_REBUILD";
/// Environment switch: emit derived-category suggestions.
pub const ENV_SUGGEST: &str = "ONTOLOGY_SUGGEST";
/// Environment switch: merge suggestions into the persisted seeds and ontology.
pub const ENV_AUTO_MERGE: &str = "ONTOLOGY_AUTO_MERGE";
/// Environment switch: emit the accumulated-sources suggestion report.
pub const ENV_SOURCES_SUGGEST: &str = "ONTOLOGY_SOURCES_SUGGEST";
/// Environment override for the Tier-1 promotion threshold.
pub const ENV_OVERLAP_THRESHOLD: &str = "ONTOLOGY_OVERLAP_THRESHOLD";
/// Environment override for the per-category value cap.
pub const ENV_VALUE_CAP: &str = "ONTOLOGY_VALUE_CAP";

/// Whether the ontology is rebuilt from seeds or reused as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Rebuild,
    Reuse,
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rebuild => f.write_str("rebuild"),
            Self::Reuse => f.write_str("reuse"),
        }
    }
}

/// Configuration for one build run, persisted as TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory. Defaults to the XDG data directory.
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
    /// Interaction export to ingest.
    #[serde(default)]
    pub records: Option<PathBuf>,
    #[serde(default)]
    pub mode: BuildMode,
    /// Emit derived-category suggestions from lower tiers.
    #[serde(default)]
    pub suggest: bool,
    /// Apply suggestions to the persisted seeds and ontology. Destructive, off by default.
    #[serde(default)]
    pub auto_merge: bool,
    /// Emit the accumulated-sources suggestion report.
    #[serde(default)]
    pub sources_suggest: bool,
    /// Minimum shorter-set overlap for Tier-1 promotion.
    #[serde(default = "default_overlap_threshold")]
    pub overlap_threshold: f64,
    /// Maximum number of linked values per category.
    #[serde(default = "default_value_cap")]
    pub value_cap: usize,
    /// Links must score strictly above this Jaccard value.
    #[serde(default)]
    pub min_link_score: f64,
    /// Mentions needed before a Wikipedia category is promoted.
    #[serde(default = "default_wiki_category_threshold")]
    pub wiki_category_threshold: u32,
    /// Minimum supporting items before a suggestion is proposed.
    #[serde(default = "default_suggest_min_items")]
    pub suggest_min_items: usize,
    /// Inclusive lower date bound for records with a parseable timestamp.
    #[serde(default)]
    pub since: Option<NaiveDate>,
    /// Inclusive upper date bound for records with a parseable timestamp.
    #[serde(default)]
    pub until: Option<NaiveDate>,
}

fn default_overlap_threshold() -> f64 {
    0.5
}
fn default_value_cap() -> usize {
    5
}
fn default_wiki_category_threshold() -> u32 {
    3
}
fn default_suggest_min_items() -> usize {
    2
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            out_dir: None,
            records: None,
            mode: BuildMode::default(),
            suggest: false,
            auto_merge: false,
            sources_suggest: false,
            overlap_threshold: default_overlap_threshold(),
            value_cap: default_value_cap(),
            min_link_score: 0.0,
            wiki_category_threshold: default_wiki_category_threshold(),
            suggest_min_items: default_suggest_min_items(),
            since: None,
            until: None,
        }
    }
}

impl BuildConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) -> ConfigResult<()> {
        self.apply_env(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rebuild) = env_bool(&lookup, ENV_REBUILD)? {
            self.mode = if rebuild {
                BuildMode::Rebuild
            } else {
                BuildMode::Reuse
            };
        }
        if let Some(v) = env_bool(&lookup, ENV_SUGGEST)? {
            self.suggest = v;
        }
        if let Some(v) = env_bool(&lookup, ENV_AUTO_MERGE)? {
            self.auto_merge = v;
        }
        if let Some(v) = env_bool(&lookup, ENV_SOURCES_SUGGEST)? {
            self.sources_suggest = v;
        }
        if let Some(raw) = lookup(ENV_OVERLAP_THRESHOLD) {
            self.overlap_threshold = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_OVERLAP_THRESHOLD.into(),
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup(ENV_VALUE_CAP) {
            self.value_cap = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_VALUE_CAP.into(),
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    /// Reject settings the algorithms cannot honor.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.overlap_threshold) {
            return Err(ConfigError::Invalid {
                field: "overlap_threshold".into(),
                message: format!("{} is outside 0.0..=1.0", self.overlap_threshold),
            });
        }
        if !(0.0..1.0).contains(&self.min_link_score) {
            return Err(ConfigError::Invalid {
                field: "min_link_score".into(),
                message: format!("{} is outside 0.0..1.0", self.min_link_score),
            });
        }
        if self.value_cap == 0 {
            return Err(ConfigError::Invalid {
                field: "value_cap".into(),
                message: "must be at least 1".into(),
            });
        }
        if let (Some(since), Some(until)) = (self.since, self.until) {
            if since > until {
                return Err(ConfigError::Invalid {
                    field: "since".into(),
                    message: format!("{since} is after until ({until})"),
                });
            }
        }
        Ok(())
    }
}

fn env_bool<F>(lookup: &F, var: &str) -> ConfigResult<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidEnv {
            var: var.into(),
            value: raw,
        }),
    }
}
