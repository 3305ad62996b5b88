//! Mapper and registry failures.

use dpp_model::StructuralError;

/// A single `to_canonical`/`from_canonical` call failed.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// A source record has the wrong shape (not an object, wrong field type).
    #[error("{record}: malformed record: {detail}")]
    MalformedRecord { record: String, detail: String },

    /// A record's attribute values do not fit its part-class category.
    #[error("{record}: {source}")]
    Attributes {
        record: String,
        #[source]
        source: StructuralError,
    },
}

impl MapperError {
    pub fn malformed(record: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record: record.into(),
            detail: detail.into(),
        }
    }
}

/// A single registry call failed.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("schema name or alias `{name}` is already registered to {existing}")]
    DuplicateRegistration { name: String, existing: String },

    #[error("unknown schema: {name}")]
    UnknownSchema { name: String },

    #[error("mapping via {schema} failed: {source}")]
    Mapping {
        schema: String,
        #[source]
        source: MapperError,
    },
}
