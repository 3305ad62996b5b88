//! The schema mapper contract.
//!
//! A mapper is a bidirectional adapter between one external schema and the
//! canonical passport. Mappers hold only immutable configuration, so one
//! instance serves concurrent calls.

use crate::config::MapperConfig;
use crate::error::MapperError;
use crate::finding::ValidationFinding;
use dpp_classify::ClassificationTable;
use dpp_model::{PartAttributes, PartCategory, PartClass, Passport};
use serde_json::{Map, Value};

pub trait SchemaMapper: Send + Sync {
    /// Canonical schema name (`"ECLASS"`, `"ISA-95"`).
    fn schema_name(&self) -> &str;

    fn schema_version(&self) -> &str;

    /// The target vocabulary declaration, placed under `@context`.
    fn context(&self) -> Value;

    /// Parse a source document into a passport.
    ///
    /// Missing optional fields leave the corresponding layer field empty.
    /// A missing identifier or a broken hierarchy is a structural error.
    fn to_canonical(
        &self,
        raw: &Value,
        table: &ClassificationTable,
    ) -> Result<Passport, MapperError>;

    /// Project a passport into the target schema. Absent layers are
    /// omitted or nulled, never required.
    fn from_canonical(&self, passport: &Passport) -> Result<Value, MapperError>;

    /// Schema-specific structural checks on a mapped document.
    fn validate(&self, document: &Value) -> Vec<ValidationFinding>;

    /// Map one part-class instance.
    fn map_part(&self, part: &PartClass) -> Result<Value, MapperError> {
        serde_json::to_value(part).map_err(|e| MapperError::malformed(&part.identifier, e.to_string()))
    }
}

/// How a record's category was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySource {
    Declared,
    Table,
    Attributes,
    Fallback,
}

/// Resolve the category of one source record.
///
/// An explicitly declared canonical category wins; it only appears on
/// documents produced from the canonical model. Otherwise the first native
/// class id with a table entry decides, then the attribute names, then
/// `Structural`.
pub fn resolve_category(
    schema_name: &str,
    table: &ClassificationTable,
    declared: Option<&str>,
    class_ids: &[String],
    attribute_names: &[&str],
) -> (PartCategory, CategorySource) {
    if let Some(category) = declared.and_then(|name| name.parse::<PartCategory>().ok()) {
        return (category, CategorySource::Declared);
    }
    if let Some(record) = class_ids
        .iter()
        .find_map(|class_id| table.get(schema_name, class_id))
    {
        return (record.category, CategorySource::Table);
    }
    if let Some(category) = PartCategory::infer_from_attribute_names(attribute_names.iter().copied()) {
        return (category, CategorySource::Attributes);
    }
    (PartCategory::Structural, CategorySource::Fallback)
}

/// Build a part from loose attribute values, attributing failures to `record`.
pub fn build_part(
    record: &str,
    identifier: &str,
    name: &str,
    category: PartCategory,
    values: &Map<String, Value>,
) -> Result<PartClass, MapperError> {
    let attributes =
        PartAttributes::from_values(category, values).map_err(|source| MapperError::Attributes {
            record: record.to_string(),
            source,
        })?;
    Ok(PartClass::new(identifier, name, attributes))
}

/// Native class ids for `part` in `schema_name`: its own binding first, then
/// the configured domain mapping for its category.
pub fn native_class_ids(part: &PartClass, schema_name: &str, config: &MapperConfig) -> Vec<String> {
    match part.binding(schema_name) {
        Some(binding) if !binding.class_ids.is_empty() => binding.class_ids.iter().cloned().collect(),
        _ => config.class_ids(part.category()).to_vec(),
    }
}

// ── JSON access helpers ──

pub(crate) fn as_object<'a>(value: &'a Value, record: &str) -> Result<&'a Map<String, Value>, MapperError> {
    value
        .as_object()
        .ok_or_else(|| MapperError::malformed(record, "expected an object"))
}

/// Optional object field; `null` counts as absent.
pub(crate) fn object_field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    record: &str,
) -> Result<Option<&'a Map<String, Value>>, MapperError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(MapperError::malformed(
            format!("{record}.{key}"),
            "expected an object",
        )),
    }
}

/// Optional array field; `null` counts as empty.
pub(crate) fn array_field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    record: &str,
) -> Result<&'a [Value], MapperError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(MapperError::malformed(
            format!("{record}.{key}"),
            "expected an array",
        )),
    }
}

/// Non-empty string field. Numbers are accepted and rendered.
pub(crate) fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn string_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Deserialize an optional embedded canonical layer.
pub(crate) fn embedded_layer<T: serde::de::DeserializeOwned>(
    obj: &Map<String, Value>,
    key: &str,
) -> Result<Option<T>, MapperError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| MapperError::malformed(key, e.to_string())),
    }
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T, record: &str) -> Result<Value, MapperError> {
    serde_json::to_value(value).map_err(|e| MapperError::malformed(record, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpp_classify::{ClassificationRecord, ConfidenceSource};
    use dpp_model::OntologyBinding;

    fn table_with(schema: &str, id: &str, category: PartCategory) -> ClassificationTable {
        ClassificationTable::from_records([ClassificationRecord {
            source_schema: schema.to_string(),
            definition_id: id.to_string(),
            category,
            confidence_source: ConfidenceSource::Heuristic,
            evidence: Default::default(),
            case_of: Vec::new(),
        }])
    }

    #[test]
    fn resolution_order_is_declared_table_attributes_fallback() {
        let table = table_with("ECLASS", "C1", PartCategory::Thermal);
        let ids = vec!["unknown".to_string(), "C1".to_string()];

        assert_eq!(
            resolve_category("ECLASS", &table, Some("sensor"), &ids, &[]),
            (PartCategory::Sensor, CategorySource::Declared)
        );
        assert_eq!(
            resolve_category("ECLASS", &table, Some("not-a-category"), &ids, &["torque"]),
            (PartCategory::Thermal, CategorySource::Table)
        );
        assert_eq!(
            resolve_category("ISA-95", &table, None, &ids, &["torque"]),
            (PartCategory::Actuator, CategorySource::Attributes)
        );
        assert_eq!(
            resolve_category("ISA-95", &table, None, &[], &[]),
            (PartCategory::Structural, CategorySource::Fallback)
        );
    }

    #[test]
    fn build_part_names_the_offending_record() {
        let mut values = Map::new();
        values.insert("torque".to_string(), Value::from(1.0));
        let err = build_part("components[3]", "S1", "Probe", PartCategory::Sensor, &values)
            .expect_err("torque is not a sensor attribute");
        assert!(matches!(err, MapperError::Attributes { ref record, .. } if record == "components[3]"));
    }

    #[test]
    fn native_class_ids_prefer_the_binding() {
        let mut config = MapperConfig::default();
        config
            .domain_mappings
            .insert(PartCategory::Sensor, vec!["Configured".to_string()]);
        let plain = PartClass::of_category("S1", "Probe", PartCategory::Sensor);
        assert_eq!(native_class_ids(&plain, "ISA-95", &config), vec!["Configured"]);

        let mut binding = OntologyBinding::new("ISA-95");
        binding.class_ids.insert("Bound".to_string());
        let bound = plain.with_binding(binding);
        assert_eq!(native_class_ids(&bound, "ISA-95", &config), vec!["Bound"]);
    }
}
