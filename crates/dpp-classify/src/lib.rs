//! # dpp-classify
//!
//! Offline ontology classification.
//!
//! This crate provides:
//! - `Classifier`: raw definitions -> part-class categories, per source
//! - pluggable `ClassificationStrategy` (keyword heuristic by default)
//! - `ClassificationTable` with the lookups mappers need
//! - JSONL read/write for the shared mapping store
//! - `HeuristicsConfig`: extra keywords and manual overrides from TOML
//!
//! ## Data flow
//!
//! ```text
//! RawDefinition[] ──tokenize──▶ Tokens ──strategy──▶ Assignment
//!                                                     │
//! JSONL (sorted rows)  ◀── flush ── ClassificationTable ◀┘
//! ```

pub mod classifier;
pub mod heuristics;
pub mod jsonl;
pub mod profile;
pub mod strategy;
pub mod table;
pub mod tokenize;

pub use classifier::{
    ClassificationRun, ClassificationWarning, Classifier, OPERATIONS_SOURCE, RawDefinition,
};
pub use heuristics::{HeuristicsConfig, HeuristicsError, ManualOverride};
pub use jsonl::{TableStoreError, read_records, read_table_from_path, write_table, write_table_to_path};
pub use profile::{Keyword, KeywordProfile};
pub use strategy::{
    Assignment, ClassificationStrategy, DEFAULT_FALLBACK, DEFAULT_MIN_SCORE, KeywordStrategy,
};
pub use table::{ClassificationKey, ClassificationRecord, ClassificationTable, ConfidenceSource};
pub use tokenize::{Tokens, stem, tokenize};
