//! Domain-neutral part classes.
//!
//! A part class is a typed component category (sensor, actuator, ...) with a
//! closed attribute record. Each category has exactly one attribute record;
//! attributes outside it are rejected when the record is built, never stored
//! on the side.
//!
//! Part-class instances carry ontology bindings: links to the class and item
//! identifiers of external schemas. Bindings from different mappers
//! accumulate on the same instance without conflict.

use crate::error::{StructuralError, UnknownCategory};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// The fixed set of part-class categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PartCategory {
    PowerConversion,
    EnergyStorage,
    Actuator,
    Sensor,
    ControlUnit,
    UserInterface,
    Thermal,
    Fluidics,
    Structural,
    Transmission,
    Protection,
    Connectivity,
    SoftwareModule,
    Consumable,
    Fastener,
}

impl PartCategory {
    /// All categories in declaration order.
    pub const ALL: [PartCategory; 15] = [
        PartCategory::PowerConversion,
        PartCategory::EnergyStorage,
        PartCategory::Actuator,
        PartCategory::Sensor,
        PartCategory::ControlUnit,
        PartCategory::UserInterface,
        PartCategory::Thermal,
        PartCategory::Fluidics,
        PartCategory::Structural,
        PartCategory::Transmission,
        PartCategory::Protection,
        PartCategory::Connectivity,
        PartCategory::SoftwareModule,
        PartCategory::Consumable,
        PartCategory::Fastener,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PowerConversion => "PowerConversion",
            Self::EnergyStorage => "EnergyStorage",
            Self::Actuator => "Actuator",
            Self::Sensor => "Sensor",
            Self::ControlUnit => "ControlUnit",
            Self::UserInterface => "UserInterface",
            Self::Thermal => "Thermal",
            Self::Fluidics => "Fluidics",
            Self::Structural => "Structural",
            Self::Transmission => "Transmission",
            Self::Protection => "Protection",
            Self::Connectivity => "Connectivity",
            Self::SoftwareModule => "SoftwareModule",
            Self::Consumable => "Consumable",
            Self::Fastener => "Fastener",
        }
    }

    /// Names of the attributes this category's record declares.
    pub fn attribute_names(self) -> &'static [&'static str] {
        match self {
            Self::PowerConversion => PowerConversionAttributes::FIELDS,
            Self::EnergyStorage => EnergyStorageAttributes::FIELDS,
            Self::Actuator => ActuatorAttributes::FIELDS,
            Self::Sensor => SensorAttributes::FIELDS,
            Self::ControlUnit => ControlUnitAttributes::FIELDS,
            Self::UserInterface => UserInterfaceAttributes::FIELDS,
            Self::Thermal => ThermalAttributes::FIELDS,
            Self::Fluidics => FluidicsAttributes::FIELDS,
            Self::Structural => StructuralAttributes::FIELDS,
            Self::Transmission => TransmissionAttributes::FIELDS,
            Self::Protection => ProtectionAttributes::FIELDS,
            Self::Connectivity => ConnectivityAttributes::FIELDS,
            Self::SoftwareModule => SoftwareModuleAttributes::FIELDS,
            Self::Consumable => ConsumableAttributes::FIELDS,
            Self::Fastener => FastenerAttributes::FIELDS,
        }
    }

    /// Direct attribute inspection: the first category (declaration order)
    /// whose attribute record declares every given name.
    ///
    /// Returns `None` for an empty name set or when no record fits.
    pub fn infer_from_attribute_names<'a>(
        names: impl IntoIterator<Item = &'a str>,
    ) -> Option<Self> {
        let names: BTreeSet<&str> = names.into_iter().collect();
        if names.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|category| {
            let declared = category.attribute_names();
            names.iter().all(|name| declared.contains(name))
        })
    }
}

impl fmt::Display for PartCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartCategory {
    type Err = UnknownCategory;

    /// Accepts the canonical label as well as snake/kebab/spaced spellings,
    /// case-insensitively (`"EnergyStorage"`, `"energy_storage"`, `"energy storage"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().to_ascii_lowercase() == folded)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

macro_rules! attribute_record {
    ($(#[$meta:meta])* $name:ident { $($field:ident: $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(deny_unknown_fields)]
        pub struct $name {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl $name {
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];
        }
    };
}

attribute_record!(
    /// PSUs, inverters, alternators. Voltages in V, power in W, efficiency 0..1.
    PowerConversionAttributes {
        input_voltage: f64,
        output_voltage: f64,
        power_rating: f64,
        efficiency: f64,
    }
);

attribute_record!(
    /// Batteries and capacitors. Capacity in Wh (or F), voltage in V.
    EnergyStorageAttributes {
        capacity: f64,
        voltage: f64,
        chemistry: String,
        recharge_cycles: u32,
    }
);

attribute_record!(
    /// Motors, valves, servos. Torque in Nm, speed in rpm.
    ActuatorAttributes {
        torque: f64,
        speed: f64,
        duty_cycle: f64,
        voltage: f64,
        actuation_type: String,
    }
);

attribute_record!(
    /// Temperature, pressure, flow, vibration and inertial sensors.
    SensorAttributes {
        sensor_type: String,
        range_min: f64,
        range_max: f64,
        accuracy: f64,
        drift: f64,
        response_time: f64,
    }
);

attribute_record!(
    /// ECUs, MCU boards, PLCs. Memory in MB.
    ControlUnitAttributes {
        cpu_type: String,
        memory: f64,
        firmware_version: String,
        io_count: u32,
    }
);

attribute_record!(
    UserInterfaceAttributes {
        ui_type: String,
        display_size: f64,
        input_methods: Vec<String>,
        indicator_count: u32,
    }
);

attribute_record!(
    ThermalAttributes {
        power: f64,
        delta_t: f64,
        airflow: f64,
    }
);

attribute_record!(
    FluidicsAttributes {
        flow_rate: f64,
        pressure: f64,
        fluid_type: String,
        volume: f64,
    }
);

attribute_record!(
    /// Housings, frames, blades. Mass in kg, named dimensions in mm.
    StructuralAttributes {
        material: String,
        mass: f64,
        dimensions: BTreeMap<String, f64>,
        load_rating: f64,
    }
);

attribute_record!(
    TransmissionAttributes {
        torque_rating: f64,
        speed_rating: f64,
        transmission_type: String,
    }
);

attribute_record!(
    ProtectionAttributes {
        protection_type: String,
        rating: f64,
        response_time: f64,
    }
);

attribute_record!(
    ConnectivityAttributes {
        interface_type: String,
        connector_standard: String,
        pin_count: u32,
    }
);

attribute_record!(
    /// Firmware, control laws, DSP blocks. Checksums keyed by algorithm.
    SoftwareModuleAttributes {
        version: String,
        language: String,
        license: String,
        checksums: BTreeMap<String, String>,
    }
);

attribute_record!(
    ConsumableAttributes {
        consumable_type: String,
        capacity: f64,
        replacement_interval: String,
    }
);

attribute_record!(
    FastenerAttributes {
        fastener_type: String,
        material: String,
        diameter: f64,
        length: f64,
        strength: f64,
    }
);

/// Closed tagged variant: one attribute record per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "values")]
pub enum PartAttributes {
    PowerConversion(PowerConversionAttributes),
    EnergyStorage(EnergyStorageAttributes),
    Actuator(ActuatorAttributes),
    Sensor(SensorAttributes),
    ControlUnit(ControlUnitAttributes),
    UserInterface(UserInterfaceAttributes),
    Thermal(ThermalAttributes),
    Fluidics(FluidicsAttributes),
    Structural(StructuralAttributes),
    Transmission(TransmissionAttributes),
    Protection(ProtectionAttributes),
    Connectivity(ConnectivityAttributes),
    SoftwareModule(SoftwareModuleAttributes),
    Consumable(ConsumableAttributes),
    Fastener(FastenerAttributes),
}

impl PartAttributes {
    /// An attribute record of the given category with every value unset.
    pub fn empty(category: PartCategory) -> Self {
        match category {
            PartCategory::PowerConversion => Self::PowerConversion(Default::default()),
            PartCategory::EnergyStorage => Self::EnergyStorage(Default::default()),
            PartCategory::Actuator => Self::Actuator(Default::default()),
            PartCategory::Sensor => Self::Sensor(Default::default()),
            PartCategory::ControlUnit => Self::ControlUnit(Default::default()),
            PartCategory::UserInterface => Self::UserInterface(Default::default()),
            PartCategory::Thermal => Self::Thermal(Default::default()),
            PartCategory::Fluidics => Self::Fluidics(Default::default()),
            PartCategory::Structural => Self::Structural(Default::default()),
            PartCategory::Transmission => Self::Transmission(Default::default()),
            PartCategory::Protection => Self::Protection(Default::default()),
            PartCategory::Connectivity => Self::Connectivity(Default::default()),
            PartCategory::SoftwareModule => Self::SoftwareModule(Default::default()),
            PartCategory::Consumable => Self::Consumable(Default::default()),
            PartCategory::Fastener => Self::Fastener(Default::default()),
        }
    }

    pub fn category(&self) -> PartCategory {
        match self {
            Self::PowerConversion(_) => PartCategory::PowerConversion,
            Self::EnergyStorage(_) => PartCategory::EnergyStorage,
            Self::Actuator(_) => PartCategory::Actuator,
            Self::Sensor(_) => PartCategory::Sensor,
            Self::ControlUnit(_) => PartCategory::ControlUnit,
            Self::UserInterface(_) => PartCategory::UserInterface,
            Self::Thermal(_) => PartCategory::Thermal,
            Self::Fluidics(_) => PartCategory::Fluidics,
            Self::Structural(_) => PartCategory::Structural,
            Self::Transmission(_) => PartCategory::Transmission,
            Self::Protection(_) => PartCategory::Protection,
            Self::Connectivity(_) => PartCategory::Connectivity,
            Self::SoftwareModule(_) => PartCategory::SoftwareModule,
            Self::Consumable(_) => PartCategory::Consumable,
            Self::Fastener(_) => PartCategory::Fastener,
        }
    }

    /// Build the category's attribute record from loose name/value pairs.
    ///
    /// Unknown attribute names and mistyped values are rejected with
    /// [`StructuralError::InvalidAttributes`]. `null` values count as unset.
    pub fn from_values(
        category: PartCategory,
        values: &Map<String, Value>,
    ) -> Result<Self, StructuralError> {
        let mut tagged = Map::new();
        tagged.insert(
            "category".to_string(),
            Value::String(category.as_str().to_string()),
        );
        tagged.insert("values".to_string(), Value::Object(values.clone()));
        serde_json::from_value(Value::Object(tagged)).map_err(|e| {
            StructuralError::InvalidAttributes {
                category,
                detail: e.to_string(),
            }
        })
    }

    /// The set attributes as a name/value map (unset attributes omitted).
    pub fn to_values(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut tagged)) => match tagged.remove("values") {
                Some(Value::Object(values)) => values,
                _ => Map::new(),
            },
            _ => Map::new(),
        }
    }
}

/// Link from a part-class instance to an external schema's identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OntologyBinding {
    pub schema_name: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub class_ids: BTreeSet<String>,
    /// Item classes declared as cases of `class_ids` (ECLASS "case-of").
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub item_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl OntologyBinding {
    pub fn new(schema_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            ..Self::default()
        }
    }

    fn merge(&mut self, other: OntologyBinding) {
        self.class_ids.extend(other.class_ids);
        self.item_ids.extend(other.item_ids);
        self.metadata.extend(other.metadata);
    }
}

/// One part-class instance inside a passport.
///
/// The category is fixed by the attribute record the instance was built
/// with; [`PartClass::set_attributes`] refuses records of another category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartClass {
    pub identifier: String,
    pub name: String,
    attributes: PartAttributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ontology_bindings: Vec<OntologyBinding>,
}

impl PartClass {
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        attributes: PartAttributes,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            attributes,
            ontology_bindings: Vec::new(),
        }
    }

    /// A part of `category` with no attribute values set.
    pub fn of_category(
        identifier: impl Into<String>,
        name: impl Into<String>,
        category: PartCategory,
    ) -> Self {
        Self::new(identifier, name, PartAttributes::empty(category))
    }

    pub fn category(&self) -> PartCategory {
        self.attributes.category()
    }

    pub fn attributes(&self) -> &PartAttributes {
        &self.attributes
    }

    /// Replace the attribute record, keeping the category fixed.
    pub fn set_attributes(&mut self, attributes: PartAttributes) -> Result<(), StructuralError> {
        if attributes.category() != self.category() {
            return Err(StructuralError::CategoryChange {
                identifier: self.identifier.clone(),
                from: self.category(),
                to: attributes.category(),
            });
        }
        self.attributes = attributes;
        Ok(())
    }

    /// Attach a binding, merging into an existing binding for the same schema.
    pub fn bind_ontology(&mut self, binding: OntologyBinding) {
        match self
            .ontology_bindings
            .iter_mut()
            .find(|existing| existing.schema_name == binding.schema_name)
        {
            Some(existing) => existing.merge(binding),
            None => self.ontology_bindings.push(binding),
        }
    }

    pub fn with_binding(mut self, binding: OntologyBinding) -> Self {
        self.bind_ontology(binding);
        self
    }

    pub fn binding(&self, schema_name: &str) -> Option<&OntologyBinding> {
        self.ontology_bindings
            .iter()
            .find(|binding| binding.schema_name == schema_name)
    }

    /// Bindings in the order they were first attached.
    pub fn ontology_bindings(&self) -> &[OntologyBinding] {
        &self.ontology_bindings
    }

    /// Item identifiers this part may manifest as in `schema_name`.
    pub fn allowed_item_ids(&self, schema_name: &str) -> Vec<&str> {
        self.binding(schema_name)
            .map(|binding| binding.item_ids.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn supported_ontologies(&self) -> Vec<&str> {
        self.ontology_bindings
            .iter()
            .map(|binding| binding.schema_name.as_str())
            .collect()
    }
}
