//! Per-schema mapper configuration.
//!
//! One TOML file per schema in a config directory, named after the schema:
//! `ECLASS -> eclass_mapping.toml`, `ISA-95 -> isa95_mapping.toml`.
//!
//! ```toml
//! schema_version = "V0600"
//!
//! [domain_mappings.Sensor]
//! class_ids = ["SensorEquipmentClass"]
//! ```
//!
//! Configuration is optional. A missing file is the default; an unreadable
//! or invalid one is logged and replaced by the default.

use dpp_model::PartCategory;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
struct RawMapperConfig {
    schema_version: Option<String>,
    #[serde(default)]
    domain_mappings: BTreeMap<String, RawDomainMapping>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDomainMapping {
    #[serde(default)]
    class_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapperConfig {
    pub schema_version: Option<String>,
    /// Preferred native class ids per category, used when a part carries no
    /// binding for the mapper's schema.
    pub domain_mappings: BTreeMap<PartCategory, Vec<String>>,
}

impl MapperConfig {
    pub fn file_name(schema_name: &str) -> String {
        format!("{}_mapping.toml", schema_name.to_lowercase().replace('-', ""))
    }

    pub fn path_for(config_dir: &Path, schema_name: &str) -> PathBuf {
        config_dir.join(Self::file_name(schema_name))
    }

    /// Strict parse. Unknown category keys are skipped with a warning.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let raw: RawMapperConfig = toml::from_str(text)?;
        let mut domain_mappings = BTreeMap::new();
        for (name, mapping) in raw.domain_mappings {
            match name.parse::<PartCategory>() {
                Ok(category) => {
                    domain_mappings.insert(category, mapping.class_ids);
                }
                Err(err) => tracing::warn!(%err, "ignoring domain mapping"),
            }
        }
        Ok(Self {
            schema_version: raw.schema_version,
            domain_mappings,
        })
    }

    /// Lenient load for `schema_name` from `config_dir`.
    pub fn load(config_dir: Option<&Path>, schema_name: &str) -> Self {
        let Some(dir) = config_dir else {
            return Self::default();
        };
        let path = Self::path_for(dir, schema_name);
        if !path.exists() {
            tracing::debug!(schema = schema_name, path = %path.display(), "no mapper config, using defaults");
            return Self::default();
        }
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(schema = schema_name, path = %path.display(), %err, "unreadable mapper config, using defaults");
                return Self::default();
            }
        };
        match Self::from_toml_str(&text) {
            Ok(config) => {
                tracing::info!(schema = schema_name, path = %path.display(), "loaded mapper config");
                config
            }
            Err(err) => {
                tracing::warn!(schema = schema_name, path = %path.display(), %err, "invalid mapper config, using defaults");
                Self::default()
            }
        }
    }

    pub fn class_ids(&self, category: PartCategory) -> &[String] {
        self.domain_mappings
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_follows_schema_name() {
        assert_eq!(MapperConfig::file_name("ISA-95"), "isa95_mapping.toml");
        assert_eq!(MapperConfig::file_name("ECLASS"), "eclass_mapping.toml");
    }

    #[test]
    fn parses_domain_mappings_with_loose_category_names() {
        let config = MapperConfig::from_toml_str(
            r#"
schema_version = "V0700"

[domain_mappings.energy_storage]
class_ids = ["StorageUnit"]

[domain_mappings.Gizmo]
class_ids = ["Ignored"]
"#,
        )
        .expect("config parses");
        assert_eq!(config.schema_version.as_deref(), Some("V0700"));
        assert_eq!(
            config.class_ids(PartCategory::EnergyStorage),
            ["StorageUnit".to_string()]
        );
        assert_eq!(config.domain_mappings.len(), 1);
        assert!(config.class_ids(PartCategory::Sensor).is_empty());
    }

    #[test]
    fn missing_directory_or_file_is_default() {
        assert_eq!(MapperConfig::load(None, "ECLASS"), MapperConfig::default());
        let dir = std::env::temp_dir().join(format!("dpp-no-config-{}", std::process::id()));
        assert_eq!(
            MapperConfig::load(Some(&dir), "ECLASS"),
            MapperConfig::default()
        );
    }
}
