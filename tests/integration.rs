//! End-to-end build tests: records and seeds on disk in, documents out.

use std::path::Path;

use memory_artifacts::config::{BuildConfig, BuildMode};
use memory_artifacts::ontology::Ontology;
use memory_artifacts::paths::ArtifactPaths;
use memory_artifacts::pipeline::Pipeline;
use memory_artifacts::router::RuleKind;
use memory_artifacts::seeds::Seeds;

const SEEDS: &str = r#"{
    "categories": {
        "home-appliances": {"label": "Home appliances", "description": "Kitchen machines"},
        "dishwasher-tips": {"label": "Dishwasher tips"}
    },
    "aliases": {"dishwasher": "home-appliances"},
    "patterns": {"rinse aid|salt|siemens": "dishwasher-tips"},
    "values": [
        {"text": "Memory must be intentional, auditable and explainable"},
        {"text": "Dishwasher salt keeps glasses clean"}
    ]
}"#;

const RECORDS: &str = "\
Time,Conversation,Author,Message
2024-03-01 10:00:00,Dishwasher,user,How often should I refill the dishwasher salt?
2024-03-01 10:01:00,Siemens rinse aid refill,assistant,Rinse aid keeps glasses clean and dry
2024-03-02 09:00:00,Quantum Bread Proofing!!,user,Proof the dough overnight in the fridge
2024-03-02 09:05:00,Quantum Bread Proofing!!,assistant,Always proof the dough overnight
2024-03-03 12:00:00,Assistant memory,user,I want memory to stay auditable and explainable
2024-03-04 08:00:00,,user,Napoleon took Malta in 1798
2024-03-04 08:00:00,,user,Napoleon took Malta in 1798
";

fn setup(dir: &Path) -> (ArtifactPaths, BuildConfig) {
    let paths = ArtifactPaths::new(dir);
    paths.ensure_dirs().unwrap();
    std::fs::write(&paths.seeds, SEEDS).unwrap();
    let records = dir.join("history.csv");
    std::fs::write(&records, RECORDS).unwrap();
    let config = BuildConfig {
        records: Some(records),
        ..Default::default()
    };
    (paths, config)
}

fn load(paths: &ArtifactPaths) -> Ontology {
    Ontology::load(&paths.ontology).unwrap().unwrap()
}

#[test]
fn build_routes_every_label() {
    let dir = tempfile::TempDir::new().unwrap();
    let (paths, config) = setup(dir.path());
    let outcome = Pipeline::new(config, paths.clone()).run().unwrap();
    let ontology = load(&paths);

    assert_eq!(ontology.map["Dishwasher"], "home-appliances");
    assert_eq!(ontology.map["Siemens rinse aid refill"], "dishwasher-tips");
    assert_eq!(
        ontology.map["Quantum Bread Proofing!!"],
        "auto-quantum-bread-proofing"
    );
    assert_eq!(ontology.map[""], "auto-uncategorized");

    // Map totality and referential integrity.
    for slug in ontology.map.values() {
        assert!(ontology.category(slug).is_some(), "{slug}");
    }
    for (slug, ids) in &ontology.value_map {
        assert!(ontology.category(slug).is_some());
        for id in ids {
            assert!(ontology.value(id).is_some(), "{id}");
        }
    }

    let stats = &outcome.audit.stats;
    assert_eq!(stats.records_loaded, 7);
    assert_eq!(stats.records_deduped, 1);

    let rules: Vec<RuleKind> = outcome
        .audit
        .entries
        .iter()
        .filter_map(|e| e.rule_kind)
        .collect();
    assert!(rules.contains(&RuleKind::Alias));
    assert!(rules.contains(&RuleKind::Pattern));
    assert!(rules.contains(&RuleKind::Auto));
}

#[test]
fn build_writes_all_documents() {
    let dir = tempfile::TempDir::new().unwrap();
    let (paths, mut config) = setup(dir.path());
    config.suggest = true;
    config.sources_suggest = true;
    Pipeline::new(config, paths.clone()).run().unwrap();

    for path in [
        &paths.ontology,
        &paths.seeds,
        &paths.tiers,
        &paths.build_log,
        &paths.memory_mart,
        &paths.suggestions_report,
        &paths.sources_report,
    ] {
        assert!(path.exists(), "{} missing", path.display());
    }

    let tiers: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.tiers).unwrap()).unwrap();
    assert_eq!(tiers["items"].as_array().unwrap().len(), 6);

    let log = std::fs::read_to_string(&paths.build_log).unwrap();
    assert!(log.contains("home-appliances"));

    // No temp files left behind.
    let leftovers: Vec<_> = std::fs::read_dir(&paths.out_dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn reinforcing_interaction_becomes_tier_one() {
    let dir = tempfile::TempDir::new().unwrap();
    let (paths, config) = setup(dir.path());
    Pipeline::new(config, paths.clone()).run().unwrap();
    let ontology = load(&paths);

    let anchor = "T0:memory-must-be-intentional-auditable-and";
    let promoted = ontology
        .values
        .iter()
        .find(|v| v.reinforces.as_deref() == Some(anchor));
    assert!(promoted.is_some(), "{:#?}", ontology.values);
    assert!(promoted.unwrap().id.starts_with("T1:"));
}

#[test]
fn seed_value_ids_are_persisted() {
    let dir = tempfile::TempDir::new().unwrap();
    let (paths, config) = setup(dir.path());
    Pipeline::new(config, paths.clone()).run().unwrap();

    let (seeds, warnings, _) = Seeds::load_or_init(&paths.seeds).unwrap();
    assert!(warnings.is_empty());
    assert!(seeds.values.iter().all(|v| v.id.is_some()));
    // Patterns kept their declared order through the rewrite.
    let first = seeds.patterns.iter().next().unwrap();
    assert_eq!(first.pattern, "rinse aid|salt|siemens");
}

#[test]
fn reuse_keeps_the_ontology_byte_for_byte() {
    let dir = tempfile::TempDir::new().unwrap();
    let (paths, config) = setup(dir.path());
    Pipeline::new(config.clone(), paths.clone()).run().unwrap();
    let before = std::fs::read(&paths.ontology).unwrap();

    // New records would change the map, but reuse ignores them.
    let extra = dir.path().join("more.jsonl");
    std::fs::write(&extra, r#"{"topic_label": "Gardening", "body_text": "Water tomatoes"}"#).unwrap();
    let reuse = BuildConfig {
        mode: BuildMode::Reuse,
        records: Some(extra),
        ..config
    };
    let outcome = Pipeline::new(reuse, paths.clone()).run().unwrap();
    assert_eq!(outcome.mode, BuildMode::Reuse);
    assert!(!outcome.ontology.map.contains_key("Gardening"));
    assert_eq!(std::fs::read(&paths.ontology).unwrap(), before);
}

#[test]
fn reuse_without_ontology_falls_back_to_rebuild() {
    let dir = tempfile::TempDir::new().unwrap();
    let (paths, mut config) = setup(dir.path());
    config.mode = BuildMode::Reuse;
    let outcome = Pipeline::new(config, paths.clone()).run().unwrap();
    assert_eq!(outcome.mode, BuildMode::Rebuild);
    assert!(paths.ontology.exists());
}

#[test]
fn suggestions_do_not_touch_seeds_unless_merged() {
    let dir = tempfile::TempDir::new().unwrap();
    let (paths, mut config) = setup(dir.path());
    config.suggest = true;
    let outcome = Pipeline::new(config.clone(), paths.clone()).run().unwrap();
    let proposal = outcome.proposal.unwrap();
    assert!(
        proposal
            .categories
            .iter()
            .any(|c| c.slug == "quantum-bread-proofing")
    );
    assert!(outcome.merged.is_none());
    let (seeds, _, _) = Seeds::load_or_init(&paths.seeds).unwrap();
    assert!(!seeds.categories.contains_key("quantum-bread-proofing"));

    config.auto_merge = true;
    let outcome = Pipeline::new(config, paths.clone()).run().unwrap();
    assert!(outcome.merged.unwrap().categories >= 1);
    let (seeds, _, _) = Seeds::load_or_init(&paths.seeds).unwrap();
    assert!(seeds.categories.contains_key("quantum-bread-proofing"));
    let ontology = load(&paths);
    assert_eq!(
        ontology.map["Quantum Bread Proofing!!"],
        "quantum-bread-proofing"
    );
}

#[test]
fn unparseable_seeds_abort_without_writing() {
    let dir = tempfile::TempDir::new().unwrap();
    let (paths, config) = setup(dir.path());
    std::fs::write(&paths.seeds, "{ not json").unwrap();
    assert!(Pipeline::new(config, paths.clone()).run().is_err());
    assert_eq!(std::fs::read_to_string(&paths.seeds).unwrap(), "{ not json");
    assert!(!paths.ontology.exists());
}

#[test]
fn malformed_seed_entries_are_reported_not_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    let (paths, config) = setup(dir.path());
    std::fs::write(
        &paths.seeds,
        r#"{"patterns": {"(unclosed": "x", "salt": "dishwasher-tips"}, "categories": {"bad": 3}}"#,
    )
    .unwrap();
    let outcome = Pipeline::new(config, paths.clone()).run().unwrap();
    let warnings = outcome.audit.warnings.join("\n");
    assert!(warnings.contains("(unclosed"));
    assert!(warnings.contains("bad"));
    // The valid pattern still targets its (implied) category.
    let ontology = load(&paths);
    assert_eq!(ontology.category("dishwasher-tips").unwrap().label, "dishwasher-tips");
    assert_eq!(ontology.map["Dishwasher"], "auto-dishwasher");
}

#[test]
fn rebuild_keeps_hand_edits_the_model_cannot_read() {
    let dir = tempfile::TempDir::new().unwrap();
    let (paths, mut config) = setup(dir.path());
    std::fs::write(
        &paths.seeds,
        r#"{
            "categories": {
                "gardening": {"label": "Gardening", "descripton": "misspelled on purpose"},
                "kitchen": {"label": ["Kitchen"]}
            },
            "authors": [{"nme": "Frank Herbert"}]
        }"#,
    )
    .unwrap();
    let records = dir.path().join("linked.jsonl");
    std::fs::write(
        &records,
        r#"{"topic_label": "Gardening", "body_text": "See https://example.com/tomatoes"}"#,
    )
    .unwrap();
    config.records = Some(records);
    Pipeline::new(config, paths.clone()).run().unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.seeds).unwrap()).unwrap();
    // The file was rewritten with the new source.
    assert_eq!(raw["sources"][0]["id"], "example.com");
    assert_eq!(
        raw["categories"]["gardening"]["descripton"],
        "misspelled on purpose"
    );
    assert_eq!(raw["categories"]["kitchen"]["label"][0], "Kitchen");
    assert_eq!(raw["authors"][0]["nme"], "Frank Herbert");
}

#[test]
fn contact_details_never_reach_the_tier_document() {
    let dir = tempfile::TempDir::new().unwrap();
    let (paths, mut config) = setup(dir.path());
    let records = dir.path().join("contact.jsonl");
    std::fs::write(
        &records,
        r#"{"topic_label": "Contact", "body_text": "mail me at jane.doe@example.com or 555-123-4567, notes at https://Notes.example.org/x"}"#,
    )
    .unwrap();
    config.records = Some(records);
    let outcome = Pipeline::new(config, paths.clone()).run().unwrap();

    let tiers = std::fs::read_to_string(&paths.tiers).unwrap();
    assert!(!tiers.contains("jane.doe"));
    assert!(!tiers.contains("555-123-4567"));
    assert!(tiers.contains("mail me at [EMAIL] or [PHONE], notes at [URL:notes.example.org]"));
    // Discovery still saw the raw link.
    assert!(outcome.audit.stats.sources_found >= 1);
}
