//! Schema registry: mapper catalogue keyed by canonical name and aliases.
//!
//! The registry starts empty and is populated through [`SchemaRegistry::register`]
//! (normally once, via [`register_default_mappers`]). After population it is
//! only read, so a shared `&SchemaRegistry` serves concurrent mapping calls.
//! Lookups are case-insensitive; there is no fuzzy matching.

use crate::config::MapperConfig;
use crate::error::{MapperError, RegistryError};
use crate::finding::ValidationFinding;
use crate::mapper::SchemaMapper;
use crate::mappers::{ECLASS_SCHEMA, EclassMapper, ISA95_SCHEMA, Isa95Mapper};
use dpp_classify::ClassificationTable;
use dpp_model::{PartClass, Passport};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Key under which a mapped document carries its vocabulary declaration.
pub const CONTEXT_KEY: &str = "@context";

struct Entry {
    name: String,
    aliases: Vec<String>,
    mapper: Arc<dyn SchemaMapper>,
}

/// Registration metadata for one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    /// Registered canonical name.
    pub name: String,
    pub version: String,
    /// Name the mapper reports for itself.
    pub canonical_name: String,
    pub aliases: Vec<String>,
}

pub struct SchemaRegistry {
    entries: Vec<Entry>,
    /// Lowercased name or alias -> entry index.
    index: BTreeMap<String, usize>,
    table: Arc<ClassificationTable>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.list_schemas())
            .field("table_records", &self.table.len())
            .finish()
    }
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl SchemaRegistry {
    /// An empty registry with an empty classification table.
    pub fn new() -> Self {
        Self::with_table(ClassificationTable::new())
    }

    /// An empty registry whose ingestion calls resolve categories through `table`.
    pub fn with_table(table: impl Into<Arc<ClassificationTable>>) -> Self {
        Self {
            entries: Vec::new(),
            index: BTreeMap::new(),
            table: table.into(),
        }
    }

    pub fn table(&self) -> &ClassificationTable {
        &self.table
    }

    /// Register `mapper` under `schema_name` and `aliases`.
    ///
    /// Every name is checked before anything is written, so a rejected call
    /// leaves the registry unchanged. Registering the same mapper instance
    /// again is a no-op apart from adding new aliases.
    pub fn register(
        &mut self,
        schema_name: &str,
        mapper: Arc<dyn SchemaMapper>,
        aliases: &[&str],
    ) -> Result<(), RegistryError> {
        let existing_entry = self.index.get(&key(schema_name)).copied();
        for name in std::iter::once(schema_name).chain(aliases.iter().copied()) {
            if let Some(&idx) = self.index.get(&key(name)) {
                let entry = &self.entries[idx];
                if !Arc::ptr_eq(&entry.mapper, &mapper) || existing_entry != Some(idx) {
                    return Err(RegistryError::DuplicateRegistration {
                        name: name.to_string(),
                        existing: entry.name.clone(),
                    });
                }
            }
        }

        let idx = match existing_entry {
            Some(idx) => idx,
            None => {
                self.entries.push(Entry {
                    name: schema_name.to_string(),
                    aliases: Vec::new(),
                    mapper,
                });
                let idx = self.entries.len() - 1;
                self.index.insert(key(schema_name), idx);
                idx
            }
        };
        for alias in aliases {
            self.index.insert(key(alias), idx);
            let listed = &mut self.entries[idx].aliases;
            if !listed.iter().any(|known| key(known) == key(alias)) {
                listed.push(alias.to_string());
            }
        }
        tracing::info!(
            schema = schema_name,
            aliases = ?self.entries[idx].aliases,
            "registered schema mapper"
        );
        Ok(())
    }

    fn entry(&self, name: &str) -> Result<&Entry, RegistryError> {
        self.index
            .get(&key(name))
            .map(|&idx| &self.entries[idx])
            .ok_or_else(|| RegistryError::UnknownSchema {
                name: name.to_string(),
            })
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn SchemaMapper>, RegistryError> {
        self.entry(name).map(|entry| Arc::clone(&entry.mapper))
    }

    /// Registered canonical name for a name or alias.
    pub fn canonical_name(&self, name: &str) -> Result<&str, RegistryError> {
        self.entry(name).map(|entry| entry.name.as_str())
    }

    /// Canonical names in registration order.
    pub fn list_schemas(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn list_aliases(&self, name: &str) -> Result<&[String], RegistryError> {
        self.entry(name).map(|entry| entry.aliases.as_slice())
    }

    pub fn info(&self, name: &str) -> Result<SchemaInfo, RegistryError> {
        let entry = self.entry(name)?;
        Ok(SchemaInfo {
            name: entry.name.clone(),
            version: entry.mapper.schema_version().to_string(),
            canonical_name: entry.mapper.schema_name().to_string(),
            aliases: entry.aliases.clone(),
        })
    }

    /// Export `passport` through the mapper registered as `schema_name`, with
    /// the mapper's context merged in under `@context`.
    pub fn map_to(&self, schema_name: &str, passport: &Passport) -> Result<Value, RegistryError> {
        let entry = self.entry(schema_name)?;
        let mut document = entry
            .mapper
            .from_canonical(passport)
            .map_err(|source| mapping_error(entry, source))?;
        match &mut document {
            Value::Object(map) => {
                map.insert(CONTEXT_KEY.to_string(), entry.mapper.context());
            }
            _ => {
                return Err(mapping_error(
                    entry,
                    MapperError::malformed("document", "mapper produced a non-object document"),
                ));
            }
        }
        tracing::debug!(schema = %entry.name, parts = passport.parts().len(), "exported passport");
        Ok(document)
    }

    /// Ingest a source document through the mapper registered as `schema_name`.
    pub fn map_from(&self, schema_name: &str, raw: &Value) -> Result<Passport, RegistryError> {
        let entry = self.entry(schema_name)?;
        let passport = entry
            .mapper
            .to_canonical(raw, &self.table)
            .map_err(|source| mapping_error(entry, source))?;
        tracing::debug!(schema = %entry.name, parts = passport.parts().len(), "ingested document");
        Ok(passport)
    }

    pub fn map_part(&self, schema_name: &str, part: &PartClass) -> Result<Value, RegistryError> {
        let entry = self.entry(schema_name)?;
        entry
            .mapper
            .map_part(part)
            .map_err(|source| mapping_error(entry, source))
    }

    pub fn validate(
        &self,
        schema_name: &str,
        document: &Value,
    ) -> Result<Vec<ValidationFinding>, RegistryError> {
        Ok(self.entry(schema_name)?.mapper.validate(document))
    }
}

fn mapping_error(entry: &Entry, source: MapperError) -> RegistryError {
    RegistryError::Mapping {
        schema: entry.name.clone(),
        source,
    }
}

/// Register the built-in mappers, reading per-schema config from `config_dir`.
pub fn register_default_mappers(
    registry: &mut SchemaRegistry,
    config_dir: Option<&Path>,
) -> Result<(), RegistryError> {
    registry.register(
        ECLASS_SCHEMA,
        Arc::new(EclassMapper::new(MapperConfig::load(config_dir, ECLASS_SCHEMA))),
        &["eclass", "EC"],
    )?;
    registry.register(
        ISA95_SCHEMA,
        Arc::new(Isa95Mapper::new(MapperConfig::load(config_dir, ISA95_SCHEMA))),
        &["ISA95", "IEC62264"],
    )?;
    Ok(())
}
