// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # memory-artifacts
//!
//! Distills an assistant interaction-history export into a tiered knowledge
//! base and a cross-referenced, human-editable ontology.
//!
//! ## Architecture
//!
//! - **Seed store** (`seeds`): curated categories, aliases, ordered routing patterns, values
//! - **Tier classifier** (`tier`): Tier 1 by overlap with Tier-0 anchors, Tier 2 by constraint phrasing
//! - **Category router** (`router`): alias → pattern → `auto-<slug>`
//! - **Value linker** (`linker`): Jaccard ranking of values per category
//! - **Ontology assembler** (`ontology`): merge, link, validate, audit
//! - **Store** (`store`): whole-document JSON with temp-file-and-rename writes
//!
//! ## Library usage
//!
//! ```no_run
//! use memory_artifacts::ontology::Assembler;
//! use memory_artifacts::record::InteractionRecord;
//! use memory_artifacts::seeds::Seeds;
//!
//! let (mut seeds, _warnings) =
//!     Seeds::from_json_str(r#"{"aliases": {"dishwasher": "home-appliances"}}"#).unwrap();
//! let records = vec![InteractionRecord::new("Dishwasher", "Refill the salt monthly")];
//! let out = Assembler::default().assemble(&mut seeds, &records, None).unwrap();
//! assert_eq!(out.ontology.map["Dishwasher"], "home-appliances");
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod intent;
pub mod linker;
pub mod ontology;
pub mod paths;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod router;
pub mod seeds;
pub mod sources;
pub mod store;
pub mod suggest;
pub mod text;
pub mod tier;
pub mod value;
