//! Build pipeline: load → assemble → suggest → write.
//!
//! Stages run strictly in order. Everything that can fail on consistency
//! fails before the first document is written; the writes themselves are
//! individually atomic.

use serde::Serialize;

use crate::audit::AuditLog;
use crate::config::{BuildConfig, BuildMode};
use crate::error::ArtifactResult;
use crate::ontology::{Assembler, Assembly, Ontology};
use crate::paths::ArtifactPaths;
use crate::record::{RecordBatch, RecordWarning};
use crate::render::{self, TierDocument};
use crate::seeds::{SeedWarning, Seeds};
use crate::store;
use crate::suggest::{self, MergeSummary, Proposal, SuggestOptions};

/// Built-in pipeline stage types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Read (or create) the seed store and the prior ontology.
    LoadSeeds,
    /// Read, filter and de-duplicate interaction records.
    LoadRecords,
    /// Classify, route, link, validate.
    Assemble,
    /// Propose seed additions, optionally merge and re-assemble.
    Suggest,
    /// Persist documents and reports.
    Write,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::LoadSeeds => "load-seeds",
            Self::LoadRecords => "load-records",
            Self::Assemble => "assemble",
            Self::Suggest => "suggest",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// What a pipeline run did.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub mode: BuildMode,
    pub ontology: Ontology,
    pub audit: AuditLog,
    /// Set when suggestions were computed.
    pub proposal: Option<Proposal>,
    /// Set when a proposal was merged into the seeds.
    pub merged: Option<MergeSummary>,
    /// The seed file did not exist and was created.
    pub seeds_created: bool,
    pub stages: Vec<StageKind>,
}

/// One configured build.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: BuildConfig,
    paths: ArtifactPaths,
}

impl Pipeline {
    pub fn new(config: BuildConfig, paths: ArtifactPaths) -> Self {
        Self { config, paths }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Run every stage.
    pub fn run(&self) -> ArtifactResult<BuildOutcome> {
        self.config.validate()?;
        self.paths.ensure_dirs()?;
        let mut stages = Vec::new();

        enter(&mut stages, StageKind::LoadSeeds);
        let (seeds, seed_warnings, seeds_created) = Seeds::load_or_init(&self.paths.seeds)?;
        let prior = Ontology::load(&self.paths.ontology)?;

        let mut mode = self.config.mode;
        if mode == BuildMode::Reuse {
            match prior {
                Some(ontology) => return self.reuse(ontology, seeds_created, stages),
                None => {
                    tracing::warn!(
                        path = %self.paths.ontology.display(),
                        "reuse requested but no ontology exists; rebuilding"
                    );
                    mode = BuildMode::Rebuild;
                }
            }
        }

        enter(&mut stages, StageKind::LoadRecords);
        let batch = self.load_records()?;

        enter(&mut stages, StageKind::Assemble);
        let assembler = Assembler::from_config(&self.config);
        let pristine = seeds.clone();
        let mut working = seeds.clone();
        let mut assembly = assemble(
            &assembler,
            &mut working,
            &batch,
            prior.as_ref(),
            &seed_warnings,
        )?;

        let mut proposal = None;
        let mut merged = None;
        if self.config.suggest || self.config.auto_merge {
            enter(&mut stages, StageKind::Suggest);
            let found = suggest::propose(
                &working,
                &assembly.ontology,
                &assembly.items,
                SuggestOptions {
                    min_items: self.config.suggest_min_items,
                    wiki_category_threshold: self.config.wiki_category_threshold,
                },
            );
            tracing::info!(
                categories = found.categories.len(),
                values = found.values.len(),
                "computed suggestions"
            );
            if self.config.auto_merge && !found.is_empty() {
                let mut merged_seeds = pristine;
                let summary = suggest::apply_proposal(&mut merged_seeds, &found);
                tracing::info!(added = summary.total(), "merged suggestions into seeds");
                assembly = assemble(
                    &assembler,
                    &mut merged_seeds,
                    &batch,
                    prior.as_ref(),
                    &seed_warnings,
                )?;
                working = merged_seeds;
                merged = Some(summary);
            }
            proposal = Some(found);
        }

        enter(&mut stages, StageKind::Write);
        assembly.ontology.save(&self.paths.ontology)?;
        if working != seeds {
            working.save(&self.paths.seeds)?;
        }
        store::write_json(&self.paths.tiers, &TierDocument::new(&assembly.items))?;
        store::write_atomic(
            &self.paths.build_log,
            render::build_log(&assembly.ontology, &assembly.audit).as_bytes(),
        )?;
        store::write_atomic(
            &self.paths.memory_mart,
            render::memory_mart(&assembly.ontology).as_bytes(),
        )?;
        if let Some(p) = &proposal {
            store::write_atomic(
                &self.paths.suggestions_report,
                render::suggestions_report(p, merged.is_some()).as_bytes(),
            )?;
        }
        if self.config.sources_suggest {
            store::write_atomic(
                &self.paths.sources_report,
                render::sources_report(&working, self.config.wiki_category_threshold).as_bytes(),
            )?;
        }
        tracing::info!(out_dir = %self.paths.out_dir.display(), "build complete");

        Ok(BuildOutcome {
            mode,
            ontology: assembly.ontology,
            audit: assembly.audit,
            proposal,
            merged,
            seeds_created,
            stages,
        })
    }

    fn reuse(
        &self,
        ontology: Ontology,
        seeds_created: bool,
        mut stages: Vec<StageKind>,
    ) -> ArtifactResult<BuildOutcome> {
        ontology.validate()?;
        enter(&mut stages, StageKind::Write);
        let mut audit = AuditLog {
            built_at: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        };
        audit.stats.values = ontology.values.len();
        audit.stats.categories = ontology.categories.len();
        audit.warn("reused the existing ontology; records were not processed");
        store::write_atomic(
            &self.paths.build_log,
            render::build_log(&ontology, &audit).as_bytes(),
        )?;
        store::write_atomic(
            &self.paths.memory_mart,
            render::memory_mart(&ontology).as_bytes(),
        )?;
        tracing::info!(path = %self.paths.ontology.display(), "reused existing ontology");
        Ok(BuildOutcome {
            mode: BuildMode::Reuse,
            ontology,
            audit,
            proposal: None,
            merged: None,
            seeds_created,
            stages,
        })
    }

    fn load_records(&self) -> ArtifactResult<LoadedRecords> {
        let Some(path) = &self.config.records else {
            tracing::warn!("no record file configured; building from seeds only");
            return Ok(LoadedRecords::default());
        };
        let mut batch = RecordBatch::load(path)?;
        let filtered = batch.retain_date_range(self.config.since, self.config.until);
        let deduped = batch.dedupe();
        if filtered > 0 || deduped > 0 {
            tracing::info!(filtered, deduped, "normalized records");
        }
        Ok(LoadedRecords {
            loaded: batch.records.len() + filtered + deduped,
            filtered,
            deduped,
            batch,
        })
    }
}

#[derive(Debug, Default)]
struct LoadedRecords {
    batch: RecordBatch,
    loaded: usize,
    filtered: usize,
    deduped: usize,
}

fn enter(stages: &mut Vec<StageKind>, kind: StageKind) {
    tracing::info!(stage = %kind, "entering stage");
    stages.push(kind);
}

fn assemble(
    assembler: &Assembler,
    seeds: &mut Seeds,
    records: &LoadedRecords,
    prior: Option<&Ontology>,
    seed_warnings: &[SeedWarning],
) -> ArtifactResult<Assembly> {
    let mut assembly = assembler.assemble(seeds, &records.batch.records, prior)?;
    let audit = &mut assembly.audit;
    let mut warnings: Vec<String> = seed_warnings.iter().map(ToString::to_string).collect();
    warnings.extend(records.batch.warnings.iter().map(record_warning));
    warnings.append(&mut audit.warnings);
    audit.warnings = warnings;
    audit.stats.records_loaded = records.loaded;
    audit.stats.records_skipped = records.batch.warnings.len();
    audit.stats.records_filtered = records.filtered;
    audit.stats.records_deduped = records.deduped;
    Ok(assembly)
}

fn record_warning(w: &RecordWarning) -> String {
    format!("records row {}: {}", w.row, w.message)
}
