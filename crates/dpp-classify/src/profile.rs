//! Curated keyword profiles.
//!
//! A profile maps each part-class category to the keyword phrases that count
//! as evidence for it. Phrases are tokenised once, when added.

use crate::tokenize::tokenize;
use dpp_model::PartCategory;
use std::collections::BTreeMap;

/// One keyword phrase and its token form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub phrase: String,
    pub tokens: Vec<String>,
}

impl Keyword {
    /// `None` when the phrase has no tokens.
    pub fn new(phrase: &str) -> Option<Self> {
        let tokens = tokenize(phrase);
        if tokens.is_empty() {
            return None;
        }
        Some(Self {
            phrase: phrase.trim().to_lowercase(),
            tokens,
        })
    }
}

/// Category -> keyword phrases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordProfile {
    keywords: BTreeMap<PartCategory, Vec<Keyword>>,
}

impl KeywordProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a static `(category, phrases)` table.
    pub fn from_table(table: &[(PartCategory, &[&str])]) -> Self {
        let mut profile = Self::new();
        for (category, phrases) in table {
            profile.extend(*category, phrases.iter().copied());
        }
        profile
    }

    /// The general-purpose profile, tuned on equipment dictionaries.
    pub fn builtin() -> Self {
        Self::from_table(BUILTIN_KEYWORDS)
    }

    /// A broader profile for manufacturing-operations schemas, whose
    /// definitions describe roles and records rather than hardware.
    pub fn operations() -> Self {
        Self::from_table(OPERATIONS_KEYWORDS)
    }

    /// Add phrases to a category. Duplicate and empty phrases are ignored.
    pub fn extend<'a>(&mut self, category: PartCategory, phrases: impl IntoIterator<Item = &'a str>) {
        let entry = self.keywords.entry(category).or_default();
        for keyword in phrases.into_iter().filter_map(Keyword::new) {
            if !entry.iter().any(|existing| existing.tokens == keyword.tokens) {
                entry.push(keyword);
            }
        }
    }

    pub fn keywords(&self, category: PartCategory) -> &[Keyword] {
        self.keywords
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Categories with at least one keyword, in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = (PartCategory, &[Keyword])> {
        self.keywords
            .iter()
            .filter(|(_, keywords)| !keywords.is_empty())
            .map(|(category, keywords)| (*category, keywords.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.categories().next().is_none()
    }
}

const BUILTIN_KEYWORDS: &[(PartCategory, &[&str])] = &[
    (
        PartCategory::PowerConversion,
        &[
            "power supply",
            "power converter",
            "ac/dc converter",
            "dc/dc converter",
            "inverter",
            "rectifier",
            "uninterruptible power supply",
            "ups",
            "transformer",
        ],
    ),
    (
        PartCategory::EnergyStorage,
        &[
            "battery",
            "accumulator",
            "energy storage",
            "cell",
            "capacitor",
            "supercapacitor",
        ],
    ),
    (
        PartCategory::Actuator,
        &[
            "actuator",
            "drive",
            "servo",
            "motor",
            "motion",
            "positioning",
            "valve actuator",
        ],
    ),
    (
        PartCategory::Sensor,
        &[
            "sensor",
            "transducer",
            "measuring device",
            "detector",
            "measure",
            "measurement",
            "temperature",
            "temperature sensor",
            "pressure sensor",
            "flow sensor",
            "position sensor",
            "vibration sensor",
        ],
    ),
    (
        PartCategory::ControlUnit,
        &[
            "controller",
            "control unit",
            "logic controller",
            "plc",
            "control system",
            "control device",
        ],
    ),
    (
        PartCategory::UserInterface,
        &[
            "user interface",
            "operator panel",
            "display",
            "hmi",
            "control panel",
            "keypad",
        ],
    ),
    (
        PartCategory::Thermal,
        &[
            "heating",
            "cooling",
            "thermal",
            "heat exchanger",
            "radiator",
            "heater",
            "fan",
        ],
    ),
    (
        PartCategory::Fluidics,
        &[
            "fluid",
            "hydraulic",
            "pneumatic",
            "pump",
            "valve",
            "compressor",
        ],
    ),
    (
        PartCategory::Structural,
        &[
            "structural",
            "frame",
            "housing",
            "support",
            "chassis",
            "enclosure",
            "bracket",
        ],
    ),
    (
        PartCategory::Transmission,
        &[
            "gear",
            "gearbox",
            "drive shaft",
            "drivetrain",
            "belt drive",
            "chain drive",
            "coupling",
            "bearing",
        ],
    ),
    (
        PartCategory::Protection,
        &[
            "protection device",
            "fuse",
            "circuit breaker",
            "breaker",
            "protector",
            "surge protector",
            "overcurrent",
            "overvoltage",
        ],
    ),
    (
        PartCategory::Connectivity,
        &[
            "connector",
            "plug",
            "socket",
            "cable",
            "terminal block",
            "interface",
            "bus system",
        ],
    ),
    (
        PartCategory::SoftwareModule,
        &[
            "software",
            "firmware",
            "program",
            "control software",
            "software module",
        ],
    ),
    (
        PartCategory::Consumable,
        &[
            "consumable",
            "filter",
            "lubricant",
            "oil",
            "grease",
            "sealant",
            "cleaning agent",
        ],
    ),
    (
        PartCategory::Fastener,
        &[
            "fastener",
            "screw",
            "bolt",
            "nut",
            "washer",
            "rivet",
            "anchor bolt",
        ],
    ),
];

const OPERATIONS_KEYWORDS: &[(PartCategory, &[&str])] = &[
    (
        PartCategory::PowerConversion,
        &[
            "transformer",
            "inverter",
            "rectifier",
            "power supply",
            "converter",
            "ac/dc",
            "dc/dc",
            "voltage regulator",
            "energy",
            "power",
        ],
    ),
    (
        PartCategory::EnergyStorage,
        &[
            "battery",
            "energy storage",
            "accumulator",
            "storage tank",
            "reservoir",
            "silo",
            "storage",
            "storage unit",
        ],
    ),
    (
        PartCategory::Actuator,
        &[
            "actuator",
            "drive",
            "servo",
            "motion",
            "controlled element",
            "mechanical output",
            "execution",
        ],
    ),
    (
        PartCategory::Sensor,
        &[
            "sensor",
            "temperature sensor",
            "transducer",
            "measuring device",
            "detector",
            "measurement",
            "instrument",
            "test",
            "sample",
            "quality",
            "result",
        ],
    ),
    (
        PartCategory::ControlUnit,
        &[
            "controller",
            "control unit",
            "control system",
            "control function",
            "programmable controller",
            "control",
            "module",
            "logic",
            "capability",
        ],
    ),
    (
        PartCategory::UserInterface,
        &[
            "user interface",
            "operator",
            "hmi",
            "display",
            "panel",
            "annunciator",
            "operator station",
            "person",
            "personnel",
        ],
    ),
    (
        PartCategory::Thermal,
        &[
            "heating",
            "cooling",
            "thermal",
            "heat exchanger",
            "furnace",
            "oven",
            "kiln",
            "heater",
            "cooler",
            "temperature",
        ],
    ),
    (
        PartCategory::Fluidics,
        &[
            "pump",
            "compressor",
            "valve",
            "pipeline",
            "pipe",
            "duct",
            "fluid",
            "hydraulic",
            "pneumatic",
            "liquid",
            "gas",
            "flow",
        ],
    ),
    (
        PartCategory::Structural,
        &[
            "structure",
            "frame",
            "support",
            "foundation",
            "housing",
            "enclosure",
            "platform",
            "physical asset",
            "asset",
        ],
    ),
    (
        PartCategory::Transmission,
        &[
            "gear",
            "gearbox",
            "transmission",
            "drive train",
            "belt drive",
            "shaft",
            "coupling",
            "bearing",
            "assembly",
        ],
    ),
    (
        PartCategory::Protection,
        &[
            "protection",
            "protective",
            "fuse",
            "circuit breaker",
            "safety device",
            "interlock",
            "safety",
            "alarm",
            "alert",
            "security",
        ],
    ),
    (
        PartCategory::Connectivity,
        &[
            "connector",
            "connection",
            "terminal",
            "i/o point",
            "communication link",
            "bus",
            "fieldbus",
            "network",
            "interface",
        ],
    ),
    (
        PartCategory::SoftwareModule,
        &[
            "software",
            "application",
            "program",
            "algorithm",
            "recipe logic",
            "job",
            "order",
            "command",
            "transaction",
            "dispatch",
        ],
    ),
    (
        PartCategory::Consumable,
        &[
            "consumable",
            "material",
            "ingredient",
            "feedstock",
            "raw material",
            "lubricant",
            "consumed",
            "lot",
            "sublot",
            "inventory",
            "bill of material",
        ],
    ),
    (
        PartCategory::Fastener,
        &[
            "fastener", "bolt", "screw", "nut", "washer", "anchor", "clamp", "joint",
        ],
    ),
];
