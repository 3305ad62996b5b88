//! Built-in reference mappers.

pub mod eclass;
pub mod isa95;

pub use eclass::{ECLASS_SCHEMA, ECLASS_VERSION, EclassMapper};
pub use isa95::{ISA95_SCHEMA, ISA95_VERSION, Isa95Mapper};
