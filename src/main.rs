//! memart CLI: build a tiered ontology from assistant interaction history.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use memory_artifacts::config::{BuildConfig, BuildMode};
use memory_artifacts::ontology::Ontology;
use memory_artifacts::paths::ArtifactPaths;
use memory_artifacts::pipeline::Pipeline;
use memory_artifacts::router;
use memory_artifacts::seeds::Seeds;

/// Config file looked up in the output directory when `--config` is absent.
const CONFIG_FILE: &str = "memart.toml";

#[derive(Parser)]
#[command(name = "memart", version, about = "Tiered ontology builder for interaction history")]
struct Cli {
    /// Output directory (defaults to $XDG_DATA_HOME/memory-artifacts).
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// Build config (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the output directory, an empty seed file and a default config.
    Init,

    /// Build the ontology, tier documents and reports.
    Build {
        /// Interaction export (csv, json or jsonl).
        #[arg(long)]
        records: Option<PathBuf>,

        /// Keep the existing ontology instead of rebuilding it.
        #[arg(long)]
        reuse: bool,

        /// Write category suggestions.
        #[arg(long)]
        suggest: bool,

        /// Merge suggestions into the seed file and rebuild.
        #[arg(long)]
        auto_merge: bool,

        /// Write the accumulated-sources report.
        #[arg(long)]
        sources_suggest: bool,

        /// Only records on or after this date (YYYY-MM-DD).
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Only records on or before this date (YYYY-MM-DD).
        #[arg(long)]
        until: Option<NaiveDate>,
    },

    /// Show where a topic label would be routed with the current seeds.
    Route {
        /// Topic label.
        label: String,

        /// Body text, used for pattern matching when the label is empty.
        #[arg(long, default_value = "")]
        body: String,
    },

    /// Inspect the persisted ontology.
    Show {
        /// Show one category with its linked values.
        #[arg(long)]
        category: Option<String>,

        /// Show which category a label was mapped to.
        #[arg(long)]
        label: Option<String>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    let paths = match cli.out_dir.clone().or_else(|| config.out_dir.clone()) {
        Some(dir) => ArtifactPaths::new(&dir),
        None => ArtifactPaths::resolve_default()?,
    };

    match cli.command {
        Commands::Init => {
            paths.ensure_dirs()?;
            let (_, _, created) = Seeds::load_or_init(&paths.seeds)?;
            let config_path = paths.out_dir.join(CONFIG_FILE);
            if !config_path.exists() {
                let toml = toml::to_string_pretty(&BuildConfig::default()).into_diagnostic()?;
                std::fs::write(&config_path, toml).into_diagnostic()?;
            }
            println!("Initialized memory artifacts at {}", paths.out_dir.display());
            if created {
                println!("  seeds:  {} (empty)", paths.seeds.display());
            } else {
                println!("  seeds:  {} (kept)", paths.seeds.display());
            }
            println!("  config: {}", config_path.display());
        }

        Commands::Build {
            records,
            reuse,
            suggest,
            auto_merge,
            sources_suggest,
            since,
            until,
        } => {
            if records.is_some() {
                config.records = records;
            }
            if reuse {
                config.mode = BuildMode::Reuse;
            }
            config.suggest |= suggest;
            config.auto_merge |= auto_merge;
            config.sources_suggest |= sources_suggest;
            if since.is_some() {
                config.since = since;
            }
            if until.is_some() {
                config.until = until;
            }

            let outcome = Pipeline::new(config, paths.clone()).run()?;
            let stats = &outcome.audit.stats;
            println!("Build ({}) complete: {}", outcome.mode, paths.out_dir.display());
            println!(
                "  records: {} loaded, {} skipped",
                stats.records_loaded, stats.records_skipped
            );
            println!(
                "  ontology: {} values, {} categories, {} labels",
                outcome.ontology.values.len(),
                outcome.ontology.categories.len(),
                outcome.ontology.map.len()
            );
            if let Some(p) = &outcome.proposal {
                println!(
                    "  suggestions: {} categories, {} values",
                    p.categories.len(),
                    p.values.len()
                );
            }
            if let Some(m) = &outcome.merged {
                println!(
                    "  merged: {} categories, {} aliases, {} values",
                    m.categories, m.aliases, m.values
                );
            }
            if !outcome.audit.warnings.is_empty() {
                println!(
                    "  warnings: {} (see {})",
                    outcome.audit.warnings.len(),
                    paths.build_log.display()
                );
            }
        }

        Commands::Route { label, body } => {
            let (seeds, _, _) = Seeds::load_or_init(&paths.seeds)?;
            let (index, warnings) = seeds.compile();
            for w in &warnings {
                tracing::warn!("{w}");
            }
            let route = router::resolve(&index, &label, &body);
            if route.detail.is_empty() {
                println!("{} [{}]", route.slug, route.rule);
            } else {
                println!("{} [{}: {}]", route.slug, route.rule, route.detail);
            }
        }

        Commands::Show { category, label } => {
            let Some(ontology) = Ontology::load(&paths.ontology)? else {
                miette::bail!(
                    "no ontology at {}; run `memart build` first",
                    paths.ontology.display()
                );
            };

            if let Some(label) = label {
                match ontology.map.get(label.trim()) {
                    Some(slug) => println!("{label} → {slug}"),
                    None => println!("Label not seen: {label}"),
                }
            } else if let Some(slug) = category {
                let Some(cat) = ontology.category(&slug) else {
                    miette::bail!("unknown category: {slug}");
                };
                println!("{} ({})", cat.label, cat.slug);
                if let Some(desc) = &cat.description {
                    println!("  {desc}");
                }
                if !cat.aliases.is_empty() {
                    println!("  aliases: {}", cat.aliases.join(", "));
                }
                for pattern in &cat.patterns {
                    println!("  pattern: {pattern}");
                }
                for r in &cat.wiki_refs {
                    println!("  wiki: {r}");
                }
                let linked = ontology.value_map.get(&slug).cloned().unwrap_or_default();
                println!("  linked values ({}):", linked.len());
                for id in &linked {
                    let text = ontology.value(id).map(|v| v.text.as_str()).unwrap_or("?");
                    println!("    {id}: {text}");
                }
            } else {
                println!(
                    "Ontology: {} values, {} categories, {} labels",
                    ontology.values.len(),
                    ontology.categories.len(),
                    ontology.map.len()
                );
                for cat in &ontology.categories {
                    let linked = ontology.value_map.get(&cat.slug).map_or(0, Vec::len);
                    println!("  {:<40} {:>3} values  {}", cat.slug, linked, cat.label);
                }
            }
        }
    }

    Ok(())
}

/// File (explicit or in the output dir) < environment. CLI flags come later.
fn load_config(cli: &Cli) -> Result<BuildConfig> {
    let explicit = cli.config.clone();
    let implicit = cli.out_dir.as_ref().map(|d| d.join(CONFIG_FILE));
    let mut config = match (explicit, implicit) {
        (Some(path), _) => BuildConfig::load(&path)?,
        (None, Some(path)) if path.exists() => BuildConfig::load(&path)?,
        _ => BuildConfig::default(),
    };
    config.apply_process_env()?;
    Ok(config)
}
