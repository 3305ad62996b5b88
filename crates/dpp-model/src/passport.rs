//! The six-layer canonical passport.
//!
//! Every layer is an independent record and independently optional: a
//! passport built from a schema that only knows identity and structure simply
//! leaves the other layers unset. Exporters borrow a passport immutably.

use crate::error::StructuralError;
use crate::hash::ContentHash;
use crate::hierarchy::{Hierarchy, validate_hierarchy};
use crate::part_class::PartClass;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Global id schemes in the order a single "primary" id is chosen.
pub const PREFERRED_ID_SCHEMES: &[&str] = &["gtin", "sgtin", "serial", "uuid"];

// ── Identity ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityLayer {
    /// Scheme -> value (`gtin`, `serial`, `manufacturer_pn`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub global_ids: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "MakeModel::is_empty")]
    pub make_model: MakeModel,
    #[serde(default, skip_serializing_if = "Ownership::is_empty")]
    pub ownership: Ownership,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub conformity: BTreeSet<String>,
}

impl IdentityLayer {
    pub fn with_global_id(scheme: impl Into<String>, value: impl Into<String>) -> Self {
        let mut layer = Self::default();
        layer.global_ids.insert(scheme.into(), value.into());
        layer
    }

    /// The preferred `(scheme, value)` pair, falling back to the first id.
    pub fn primary_id(&self) -> Option<(&str, &str)> {
        PREFERRED_ID_SCHEMES
            .iter()
            .find_map(|scheme| {
                self.global_ids
                    .get_key_value(*scheme)
                    .map(|(k, v)| (k.as_str(), v.as_str()))
            })
            .or_else(|| {
                self.global_ids
                    .iter()
                    .next()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MakeModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_revision: Option<String>,
}

impl MakeModel {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ownership {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Ownership {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// ── Structure ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceKind {
    Electrical,
    Fluid,
    Data,
    Mechanical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub kind: InterfaceKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub substance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas_number: Option<String>,
    /// Fraction of product mass, 0..=1.
    pub mass_fraction: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recyclable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureLayer {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hierarchy: Hierarchy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<PartClass>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Interface>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Material>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bom_refs: Vec<String>,
}

impl StructureLayer {
    /// Check identifier uniqueness and the hierarchy forest invariants.
    pub fn validate(&self) -> Result<(), StructuralError> {
        let mut seen = BTreeSet::new();
        for (idx, part) in self.parts.iter().enumerate() {
            if part.identifier.trim().is_empty() {
                return Err(StructuralError::MissingField {
                    record: format!("structure.parts[{idx}]"),
                    field: "identifier".to_string(),
                });
            }
            if !seen.insert(part.identifier.as_str()) {
                return Err(StructuralError::DuplicateIdentifier {
                    identifier: part.identifier.clone(),
                });
            }
        }
        validate_hierarchy(&self.hierarchy)?;
        Ok(())
    }

    pub fn part(&self, identifier: &str) -> Option<&PartClass> {
        self.parts.iter().find(|part| part.identifier == identifier)
    }
}

// ── Lifecycle ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManufactureRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2e_kg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Hours, cycles, starts.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub counters: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub telemetry: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePlan {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schedule: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repair_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spare_parts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repairability_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndOfLife {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disassembly: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hazards: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recovery_routes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacture: Option<ManufactureRecord>,
    #[serde(default)]
    pub usage: UsageSummary,
    #[serde(default)]
    pub serviceability: ServicePlan,
    /// Ordered as recorded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<LifecycleEvent>,
    #[serde(default)]
    pub end_of_life: EndOfLife,
}

// ── Risk ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalityLevel {
    Safety,
    Mission,
    Operational,
    Minor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criticality {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<CriticalityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_limited: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtbf_hours: Option<f64>,
}

/// One failure mode -> effect -> mitigation triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FmeaEntry {
    pub failure_mode: String,
    pub effect: String,
    pub mitigation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPosture {
    /// Software component inventory (SBOM entries).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signing_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_policy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskLayer {
    #[serde(default)]
    pub criticality: Criticality,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fmea: Vec<FmeaEntry>,
    #[serde(default)]
    pub security: SecurityPosture,
}

// ── Sustainability ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Remanufacture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SustainabilityLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_kg: Option<f64>,
    /// Standby/active energy, water use.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub energy: BTreeMap<String, f64>,
    /// Percentages: post-consumer recycled, bio-based, ...
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub recycled_content: BTreeMap<String, f64>,
    #[serde(default)]
    pub remanufacture: Remanufacture,
}

impl SustainabilityLayer {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// ── Provenance ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub signer: String,
    pub certificate: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceLayer {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<Signature>,
    /// EPCIS event references, QR/NFC tag URIs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace_links: Vec<String>,
}

// ── Passport ──

/// One canonical product passport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Passport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<StructureLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<LifecycleLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sustainability: Option<SustainabilityLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<ProvenanceLayer>,
}

impl Passport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, layer: IdentityLayer) -> Self {
        self.identity = Some(layer);
        self
    }

    pub fn with_structure(mut self, layer: StructureLayer) -> Self {
        self.structure = Some(layer);
        self
    }

    pub fn with_lifecycle(mut self, layer: LifecycleLayer) -> Self {
        self.lifecycle = Some(layer);
        self
    }

    pub fn with_risk(mut self, layer: RiskLayer) -> Self {
        self.risk = Some(layer);
        self
    }

    pub fn with_sustainability(mut self, layer: SustainabilityLayer) -> Self {
        self.sustainability = Some(layer);
        self
    }

    pub fn with_provenance(mut self, layer: ProvenanceLayer) -> Self {
        self.provenance = Some(layer);
        self
    }

    /// Structural invariants: unique part identifiers, acyclic hierarchy with
    /// one parent per non-root node.
    pub fn validate(&self) -> Result<(), StructuralError> {
        if let Some(structure) = &self.structure {
            structure.validate()?;
        }
        Ok(())
    }

    /// All part-class instances, in structure order.
    pub fn parts(&self) -> &[PartClass] {
        self.structure
            .as_ref()
            .map(|structure| structure.parts.as_slice())
            .unwrap_or_default()
    }

    pub fn part(&self, identifier: &str) -> Option<&PartClass> {
        self.structure
            .as_ref()
            .and_then(|structure| structure.part(identifier))
    }

    /// SHA-256 over the canonical JSON exchange form.
    pub fn content_hash(&self) -> Result<ContentHash, serde_json::Error> {
        ContentHash::of_json(self)
    }
}
