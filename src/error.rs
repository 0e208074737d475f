//! Rich diagnostic error types for the memory-artifacts pipeline.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

use crate::paths::PathError;
use crate::seeds::SeedError;

/// Top-level error type for a build run.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum ArtifactError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ontology(#[from] OntologyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("failed to read document: {path}")]
    #[diagnostic(
        code(memart::store::read),
        help("Ensure the file exists and is readable by the current user.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse document {path}: {message}")]
    #[diagnostic(
        code(memart::store::parse),
        help(
            "The document is not valid JSON for its expected shape. \
             Fix the syntax by hand or move the file aside to start fresh."
        )
    )]
    Parse { path: String, message: String },

    #[error("failed to serialize document {path}: {message}")]
    #[diagnostic(
        code(memart::store::serialize),
        help("This indicates a bug in the document model. Please file a bug report.")
    )]
    Serialize { path: String, message: String },

    #[error("failed to write document: {path}")]
    #[diagnostic(
        code(memart::store::write),
        help(
            "Check that the output directory is writable and the disk is not full. \
             The previous version of the document was left untouched."
        )
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Record errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RecordError {
    #[error("failed to read interaction records: {path}")]
    #[diagnostic(
        code(memart::record::read),
        help("Ensure the export file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported record format: \"{format}\"")]
    #[diagnostic(
        code(memart::record::unsupported_format),
        help("Supported formats are csv, json (an array of objects) and jsonl.")
    )]
    UnsupportedFormat { format: String },

    #[error("malformed record file {path}: {message}")]
    #[diagnostic(
        code(memart::record::malformed),
        help(
            "The file as a whole could not be parsed. Individual bad rows are skipped, \
             but the container itself (header line, JSON array) must be valid."
        )
    )]
    Malformed { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Ontology consistency errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum OntologyError {
    #[error("duplicate category slug: \"{slug}\"")]
    #[diagnostic(
        code(memart::ontology::duplicate_slug),
        help("Category slugs must be unique. This is a builder defect; nothing was written.")
    )]
    DuplicateSlug { slug: String },

    #[error("duplicate value id: \"{id}\"")]
    #[diagnostic(
        code(memart::ontology::duplicate_value),
        help("Value ids must be unique. Check the seed `values` section for repeated ids.")
    )]
    DuplicateValueId { id: String },

    #[error("label \"{label}\" maps to unknown category \"{slug}\"")]
    #[diagnostic(
        code(memart::ontology::unknown_slug),
        help("Every mapped slug must exist in `categories`. Nothing was written.")
    )]
    UnknownMappedSlug { label: String, slug: String },

    #[error("value_map references unknown category \"{slug}\"")]
    #[diagnostic(
        code(memart::ontology::unknown_value_map_slug),
        help("Every value_map key must exist in `categories`. Nothing was written.")
    )]
    UnknownValueMapSlug { slug: String },

    #[error("value_map entry \"{slug}\" references unknown value \"{id}\"")]
    #[diagnostic(
        code(memart::ontology::unknown_value),
        help("Every linked value id must exist in `values`. Nothing was written.")
    )]
    UnknownValueId { slug: String, id: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read build config: {path}")]
    #[diagnostic(
        code(memart::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse build config {path}: {message}")]
    #[diagnostic(
        code(memart::config::parse),
        help("Check the TOML syntax in the build config file.")
    )]
    Parse { path: String, message: String },

    #[error("invalid value for {var}: \"{value}\"")]
    #[diagnostic(
        code(memart::config::env),
        help("Boolean switches accept 1/0, true/false, yes/no, on/off; numbers must parse.")
    )]
    InvalidEnv { var: String, value: String },

    #[error("invalid setting {field}: {message}")]
    #[diagnostic(code(memart::config::invalid))]
    Invalid { field: String, message: String },
}

/// Convenience alias for build-level results.
pub type ArtifactResult<T> = std::result::Result<T, ArtifactError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type RecordResult<T> = std::result::Result<T, RecordError>;
pub type OntologyResult<T> = std::result::Result<T, OntologyError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
