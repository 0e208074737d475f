//! Output layout for a build run.
//!
//! `ArtifactPaths` names every document a run reads or writes under a single
//! output directory. When no directory is given, the XDG data directory
//! (`$XDG_DATA_HOME/memory-artifacts/`) is used.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(memart::paths::no_home),
        help("Set the HOME environment variable or pass --out-dir explicitly.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(memart::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Every document location for one output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Output root.
    pub out_dir: PathBuf,
    /// `out_dir/ontology.json`
    pub ontology: PathBuf,
    /// `out_dir/ontology_sources.json` — the editable seed store.
    pub seeds: PathBuf,
    /// `out_dir/memory_tiers.json`
    pub tiers: PathBuf,
    /// `out_dir/final/` — human-readable reports.
    pub final_dir: PathBuf,
    /// `final/ontology_build_log.md`
    pub build_log: PathBuf,
    /// `final/sources_suggestions.md`
    pub sources_report: PathBuf,
    /// `final/category_suggestions.md`
    pub suggestions_report: PathBuf,
    /// `final/memory_mart_tier01.md`
    pub memory_mart: PathBuf,
}

impl ArtifactPaths {
    /// Derive the layout from an output directory.
    pub fn new(out_dir: &Path) -> Self {
        let final_dir = out_dir.join("final");
        Self {
            out_dir: out_dir.to_path_buf(),
            ontology: out_dir.join("ontology.json"),
            seeds: out_dir.join("ontology_sources.json"),
            tiers: out_dir.join("memory_tiers.json"),
            build_log: final_dir.join("ontology_build_log.md"),
            sources_report: final_dir.join("sources_suggestions.md"),
            suggestions_report: final_dir.join("category_suggestions.md"),
            memory_mart: final_dir.join("memory_mart_tier01.md"),
            final_dir,
        }
    }

    /// Resolve the default output directory from XDG environment variables.
    pub fn resolve_default() -> PathResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| PathError::NoHome)?;
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/share"))
            .join("memory-artifacts");
        Ok(Self::new(&data_dir))
    }

    /// Create the output and report directories. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [&self.out_dir, &self.final_dir] {
            std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }
}
