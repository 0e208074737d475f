//! Reproducibility: identical inputs produce identical documents, and
//! rebuilding over a prior ontology keeps every id stable.

use std::path::Path;

use memory_artifacts::config::BuildConfig;
use memory_artifacts::ontology::Ontology;
use memory_artifacts::paths::ArtifactPaths;
use memory_artifacts::pipeline::Pipeline;

const SEEDS: &str = r#"{
    "categories": {"rust": {"label": "Rust", "aliases": ["rustlang"]}},
    "patterns": [
        {"pattern": "borrow|lifetime", "slug": "rust"},
        {"pattern": "garden", "slug": "gardening"}
    ],
    "values": [
        {"text": "Prefer ownership over shared mutable state"},
        {"text": "Rust ownership borrow rules prevent data races"}
    ]
}"#;

const RECORDS: &str = r#"{"topic_label": "Borrow checker", "body_text": "The borrow checker enforces rust ownership rules"}
{"topic_label": "rustlang", "body_text": "Never share mutable state across threads"}
{"topic_label": "Garden planning", "body_text": "Plant tomatoes after the last frost"}
{"topic_label": "Sourdough", "body_text": "See https://en.wikipedia.org/wiki/Sourdough and ISBN 978-1-60774-273-2"}
{"topic_label": "", "body_text": "lifetime annotations"}
"#;

fn build(dir: &Path) -> ArtifactPaths {
    let paths = ArtifactPaths::new(dir);
    paths.ensure_dirs().unwrap();
    if !paths.seeds.exists() {
        std::fs::write(&paths.seeds, SEEDS).unwrap();
    }
    let records = dir.join("history.jsonl");
    std::fs::write(&records, RECORDS).unwrap();
    let config = BuildConfig {
        records: Some(records),
        ..Default::default()
    };
    Pipeline::new(config, paths.clone()).run().unwrap();
    paths
}

#[test]
fn identical_inputs_give_identical_ontologies() {
    let a = tempfile::TempDir::new().unwrap();
    let b = tempfile::TempDir::new().unwrap();
    let pa = build(a.path());
    let pb = build(b.path());

    assert_eq!(
        std::fs::read(&pa.ontology).unwrap(),
        std::fs::read(&pb.ontology).unwrap()
    );
    assert_eq!(
        std::fs::read(&pa.tiers).unwrap(),
        std::fs::read(&pb.tiers).unwrap()
    );
    assert_eq!(
        std::fs::read(&pa.seeds).unwrap(),
        std::fs::read(&pb.seeds).unwrap()
    );
}

#[test]
fn rebuild_over_prior_ontology_is_stable() {
    let dir = tempfile::TempDir::new().unwrap();
    let paths = build(dir.path());
    let first = std::fs::read(&paths.ontology).unwrap();
    build(dir.path());
    let second = std::fs::read(&paths.ontology).unwrap();
    assert_eq!(first, second);
}

#[test]
fn ontology_document_is_sorted() {
    let dir = tempfile::TempDir::new().unwrap();
    let paths = build(dir.path());
    let ontology = Ontology::load(&paths.ontology).unwrap().unwrap();

    let slugs: Vec<&str> = ontology.categories.iter().map(|c| c.slug.as_str()).collect();
    let mut sorted = slugs.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(slugs, sorted, "categories sorted and unique");

    assert_eq!(ontology.map["Borrow checker"], "rust");
    assert_eq!(ontology.map["rustlang"], "rust");
    assert_eq!(ontology.map["Garden planning"], "gardening");
    assert_eq!(ontology.map[""], "rust");
    assert_eq!(ontology.map["Sourdough"], "auto-sourdough");

    let linked = &ontology.value_map["rust"];
    assert!(!linked.is_empty());
    assert!(linked.len() <= 5);
}

#[test]
fn values_are_never_dropped() {
    let dir = tempfile::TempDir::new().unwrap();
    let paths = build(dir.path());
    let before = Ontology::load(&paths.ontology).unwrap().unwrap();

    // A human removes every curated value from the seeds.
    std::fs::write(&paths.seeds, r#"{"categories": {}}"#).unwrap();
    build(dir.path());
    let after = Ontology::load(&paths.ontology).unwrap().unwrap();

    for v in &before.values {
        let kept = after.value(&v.id).unwrap();
        assert_eq!(kept.text, v.text);
    }
}
