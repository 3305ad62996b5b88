//! # dpp-schema
//!
//! Bidirectional mapping between external schemas and the canonical passport.
//!
//! - `SchemaMapper`: the per-schema contract (`to_canonical`, `from_canonical`,
//!   `validate`, `context`)
//! - `SchemaRegistry`: mappers by canonical name and alias, dispatching
//!   `map_to` / `map_from` without the caller naming an implementation
//! - built-in ECLASS and ISA-95 (B2MML) mappers
//! - `MapperConfig`: optional per-schema TOML configuration
//!
//! ```text
//! source doc ──to_canonical(table)──▶ Passport ──from_canonical──▶ target doc + @context
//!                  ▲                                    ▲
//!                  └──────── SchemaRegistry ────────────┘
//! ```

pub mod config;
pub mod error;
pub mod finding;
pub mod mapper;
pub mod mappers;
pub mod registry;

pub use config::MapperConfig;
pub use error::{MapperError, RegistryError};
pub use finding::{Severity, ValidationFinding, has_errors, sort_findings};
pub use mapper::{CategorySource, SchemaMapper, build_part, native_class_ids, resolve_category};
pub use mappers::{
    ECLASS_SCHEMA, ECLASS_VERSION, EclassMapper, ISA95_SCHEMA, ISA95_VERSION, Isa95Mapper,
};
pub use registry::{CONTEXT_KEY, SchemaInfo, SchemaRegistry, register_default_mappers};
