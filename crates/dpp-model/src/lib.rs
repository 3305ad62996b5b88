//! # dpp-model
//!
//! The canonical product model every ontology is normalised into and every
//! export is produced from.
//!
//! This crate is **schema-agnostic**: it knows nothing about ECLASS, ISA-95
//! or any other vocabulary. It prescribes how a passport is shaped and which
//! structural invariants it must keep.
//!
//! ## Architecture
//!
//! ```text
//! PartCategory          ← Fixed, domain-neutral taxonomy (15 categories)
//!     │
//! PartAttributes        ← One closed attribute record per category
//!     │
//! PartClass             ← Identifier + attributes + ontology bindings
//!     │
//! StructureLayer        ← Parts, hierarchy forest, interfaces, materials
//!     │
//! Passport              ← Six optional layers, validate + content_hash
//! ```

pub mod error;
pub mod hash;
pub mod hierarchy;
pub mod part_class;
pub mod passport;

pub use error::{StructuralError, UnknownCategory};
pub use hash::{ContentHash, ContentHashBuilder};
pub use hierarchy::{Hierarchy, validate_hierarchy};
pub use part_class::{
    ActuatorAttributes, ConnectivityAttributes, ConsumableAttributes, ControlUnitAttributes,
    EnergyStorageAttributes, FastenerAttributes, FluidicsAttributes, OntologyBinding,
    PartAttributes, PartCategory, PartClass, PowerConversionAttributes, ProtectionAttributes,
    SensorAttributes, SoftwareModuleAttributes, StructuralAttributes, ThermalAttributes,
    TransmissionAttributes, UserInterfaceAttributes,
};
pub use passport::{
    Criticality, CriticalityLevel, EndOfLife, FmeaEntry, IdentityLayer, Interface, InterfaceKind,
    LifecycleEvent, LifecycleLayer, MakeModel, ManufactureRecord, Material, Ownership, Passport,
    PREFERRED_ID_SCHEMES, ProvenanceLayer, Remanufacture, RiskLayer, SecurityPosture,
    ServicePlan, Signature, StructureLayer, SustainabilityLayer, UsageSummary,
};
