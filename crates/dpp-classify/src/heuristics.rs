//! Heuristics configuration (TOML).
//!
//! ```toml
//! fallback_category = "Structural"
//! min_score = 1
//! replace_builtin = false
//!
//! [keywords]
//! Sensor = ["thermocouple", "probe"]
//!
//! [[manual]]
//! source_schema = "ECLASS"
//! definition_id = "0173-1#01-AGZ376#002"
//! category = "Sensor"
//! ```
//!
//! Category names are parsed leniently (`energy_storage`, `EnergyStorage`).

use crate::profile::KeywordProfile;
use crate::strategy::{DEFAULT_FALLBACK, DEFAULT_MIN_SCORE, KeywordStrategy};
use dpp_model::{PartCategory, UnknownCategory};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum HeuristicsError {
    #[error("failed to read heuristics file: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{path}: {field}: {source}")]
    Category {
        path: String,
        field: String,
        #[source]
        source: UnknownCategory,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHeuristics {
    fallback_category: Option<String>,
    min_score: Option<usize>,
    #[serde(default)]
    replace_builtin: bool,
    #[serde(default)]
    keywords: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    manual: Vec<RawManual>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManual {
    source_schema: String,
    definition_id: String,
    category: String,
}

/// A curated assignment that always wins over the heuristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualOverride {
    pub source_schema: String,
    pub definition_id: String,
    pub category: PartCategory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicsConfig {
    pub fallback_category: PartCategory,
    pub min_score: usize,
    pub replace_builtin: bool,
    pub keywords: BTreeMap<PartCategory, Vec<String>>,
    pub manual: Vec<ManualOverride>,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            fallback_category: DEFAULT_FALLBACK,
            min_score: DEFAULT_MIN_SCORE,
            replace_builtin: false,
            keywords: BTreeMap::new(),
            manual: Vec::new(),
        }
    }
}

impl HeuristicsConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HeuristicsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| HeuristicsError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    pub fn from_toml_str(text: &str) -> Result<Self, HeuristicsError> {
        Self::parse(text, "<inline>")
    }

    fn parse(text: &str, path: &str) -> Result<Self, HeuristicsError> {
        let raw: RawHeuristics = toml::from_str(text).map_err(|source| HeuristicsError::ParseToml {
            path: path.to_string(),
            source,
        })?;
        let category = |field: &str, value: &str| {
            value
                .parse::<PartCategory>()
                .map_err(|source| HeuristicsError::Category {
                    path: path.to_string(),
                    field: field.to_string(),
                    source,
                })
        };

        let fallback_category = match &raw.fallback_category {
            Some(name) => category("fallback_category", name)?,
            None => DEFAULT_FALLBACK,
        };
        let mut keywords = BTreeMap::new();
        for (name, phrases) in raw.keywords {
            let cat = category(&format!("keywords.{name}"), &name)?;
            keywords
                .entry(cat)
                .or_insert_with(Vec::new)
                .extend(phrases);
        }
        let mut manual = Vec::with_capacity(raw.manual.len());
        for (idx, entry) in raw.manual.into_iter().enumerate() {
            manual.push(ManualOverride {
                category: category(&format!("manual[{idx}].category"), &entry.category)?,
                source_schema: entry.source_schema,
                definition_id: entry.definition_id,
            });
        }

        Ok(Self {
            fallback_category,
            min_score: raw.min_score.unwrap_or(DEFAULT_MIN_SCORE),
            replace_builtin: raw.replace_builtin,
            keywords,
            manual,
        })
    }

    /// Layer the configured keywords over `base` (or replace it).
    pub fn profile(&self, base: KeywordProfile) -> KeywordProfile {
        let mut profile = if self.replace_builtin {
            KeywordProfile::new()
        } else {
            base
        };
        for (category, phrases) in &self.keywords {
            profile.extend(*category, phrases.iter().map(String::as_str));
        }
        profile
    }

    pub fn strategy(&self, base: KeywordProfile) -> KeywordStrategy {
        KeywordStrategy::new(self.profile(base))
            .with_fallback(self.fallback_category)
            .with_min_score(self.min_score)
    }
}
