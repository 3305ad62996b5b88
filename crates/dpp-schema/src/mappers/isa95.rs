//! ISA-95 / B2MML mapper.
//!
//! A passport becomes one `Equipment` element: global ids, make and
//! ownership as equipment properties, parts as `EquipmentChild` elements,
//! the hierarchy as `EquipmentHierarchy` rows and materials as
//! `MaterialDefinition`s. Manufacture data and events go to
//! `ProductionPerformance`. Risk, sustainability and provenance have no
//! B2MML counterpart and are not exported.

use crate::config::MapperConfig;
use crate::error::MapperError;
use crate::finding::{ValidationFinding, sort_findings};
use crate::mapper::{
    SchemaMapper, array_field, as_object, build_part, native_class_ids, object_field,
    resolve_category, string_list, text_field,
};
use dpp_classify::ClassificationTable;
use dpp_model::{
    IdentityLayer, LifecycleEvent, LifecycleLayer, ManufactureRecord, Material, OntologyBinding,
    PartClass, Passport, StructuralError, StructureLayer,
};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

pub const ISA95_SCHEMA: &str = "ISA-95";
pub const ISA95_VERSION: &str = "V0600";

/// Property id holding the domain part class of an equipment child.
pub const PART_CLASS_PROPERTY: &str = "dpp.partClass";

/// Equipment levels of the ISA-95 role-based equipment hierarchy.
pub const EQUIPMENT_LEVELS: &[&str] = &[
    "Enterprise",
    "Site",
    "Area",
    "ProcessCell",
    "Unit",
    "ProductionLine",
    "WorkCell",
    "ProductionUnit",
    "StorageZone",
    "StorageUnit",
    "WorkCenter",
    "WorkUnit",
    "EquipmentModule",
    "ControlModule",
    "Other",
];

const ID_PREFIX: &str = "id.";
const MAKE_FIELDS: &[&str] = &["brand", "model", "hardware_revision", "firmware_revision"];
const OWNER_FIELDS: &[&str] = &["manufacturer", "owner", "operator", "location"];

#[derive(Debug, Clone, Default)]
pub struct Isa95Mapper {
    config: MapperConfig,
}

fn property(id: &str, value: impl Into<Value>) -> Value {
    json!({"ID": id, "Value": value.into()})
}

/// `EquipmentProperty` rows as id -> value.
fn read_properties(
    obj: &Map<String, Value>,
    record: &str,
) -> Result<BTreeMap<String, Value>, MapperError> {
    let mut out = BTreeMap::new();
    for (idx, row) in array_field(obj, "EquipmentProperty", record)?.iter().enumerate() {
        let row_record = format!("{record}.EquipmentProperty[{idx}]");
        let row = as_object(row, &row_record)?;
        let id = text_field(row, "ID").ok_or_else(|| StructuralError::MissingField {
            record: row_record.clone(),
            field: "ID".to_string(),
        })?;
        out.insert(id, row.get("Value").cloned().unwrap_or(Value::Null));
    }
    Ok(out)
}

fn value_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Isa95Mapper {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    fn identity_properties(&self, identity: &IdentityLayer) -> Vec<Value> {
        let mut rows: Vec<Value> = identity
            .global_ids
            .iter()
            .map(|(scheme, value)| property(&format!("{ID_PREFIX}{scheme}"), value.as_str()))
            .collect();
        let make = &identity.make_model;
        for (field, value) in MAKE_FIELDS.iter().zip([
            &make.brand,
            &make.model,
            &make.hardware_revision,
            &make.firmware_revision,
        ]) {
            if let Some(value) = value {
                rows.push(property(&format!("make.{field}"), value.as_str()));
            }
        }
        let owner = &identity.ownership;
        for (field, value) in OWNER_FIELDS.iter().zip([
            &owner.manufacturer,
            &owner.owner,
            &owner.operator,
            &owner.location,
        ]) {
            if let Some(value) = value {
                rows.push(property(&format!("owner.{field}"), value.as_str()));
            }
        }
        if !identity.conformity.is_empty() {
            rows.push(property("conformity", json!(identity.conformity)));
        }
        rows
    }

    fn map_equipment(&self, passport: &Passport) -> Result<Value, MapperError> {
        let mut equipment = Map::new();
        if let Some(identity) = &passport.identity {
            if let Some((scheme, value)) = identity.primary_id() {
                equipment.insert("ID".into(), json!(value));
                equipment.insert("IDScheme".into(), json!(scheme));
            }
            let description: Vec<&str> = [&identity.make_model.brand, &identity.make_model.model]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .collect();
            if !description.is_empty() {
                equipment.insert("Description".into(), json!(description.join(" ")));
            }
        }
        equipment.insert("EquipmentLevel".into(), json!("Unit"));
        equipment.insert(
            "EquipmentProperty".into(),
            Value::Array(
                passport
                    .identity
                    .as_ref()
                    .map(|identity| self.identity_properties(identity))
                    .unwrap_or_default(),
            ),
        );

        if let Some(structure) = &passport.structure {
            let children = structure
                .parts
                .iter()
                .map(|part| self.map_part(part))
                .collect::<Result<Vec<_>, _>>()?;
            equipment.insert("EquipmentChild".into(), Value::Array(children));
            let hierarchy: Vec<Value> = structure
                .hierarchy
                .iter()
                .map(|(parent, children)| json!({"ParentID": parent, "ChildID": children}))
                .collect();
            equipment.insert("EquipmentHierarchy".into(), Value::Array(hierarchy));
            let materials: Vec<Value> = structure.materials.iter().map(material_json).collect();
            equipment.insert("MaterialDefinition".into(), Value::Array(materials));
        }
        Ok(Value::Object(equipment))
    }

    fn map_performance(&self, lifecycle: &LifecycleLayer) -> Value {
        let mut out = Map::new();
        if let Some(manufacture) = &lifecycle.manufacture {
            if let Some(lot) = &manufacture.lot {
                out.insert("WorkOrder".into(), json!(lot));
            }
            if let Some(batch) = &manufacture.batch {
                out.insert("BatchID".into(), json!(batch));
            }
            if let Some(factory) = &manufacture.factory {
                out.insert("Location".into(), json!(factory));
            }
            if let Some(date) = manufacture.date {
                out.insert("ProductionDate".into(), json!(date.format("%Y-%m-%d").to_string()));
            }
        }
        let events: Vec<Value> = lifecycle
            .events
            .iter()
            .map(|event| {
                let mut row = Map::new();
                row.insert("EventType".into(), json!(event.event_type));
                row.insert("Timestamp".into(), json!(event.timestamp));
                if !event.details.is_empty() {
                    row.insert("Details".into(), json!(event.details));
                }
                Value::Object(row)
            })
            .collect();
        out.insert("Events".into(), Value::Array(events));
        Value::Object(out)
    }

    fn read_identity(
        &self,
        equipment: &Map<String, Value>,
        properties: &BTreeMap<String, Value>,
    ) -> Result<IdentityLayer, MapperError> {
        let id = text_field(equipment, "ID").ok_or_else(|| StructuralError::MissingField {
            record: "Equipment".to_string(),
            field: "ID".to_string(),
        })?;
        let mut identity = IdentityLayer::default();
        for (key, value) in properties {
            if let Some(scheme) = key.strip_prefix(ID_PREFIX)
                && let Some(value) = value_text(Some(value))
            {
                identity.global_ids.insert(scheme.to_string(), value);
            }
        }
        let scheme = text_field(equipment, "IDScheme").unwrap_or_else(|| "equipment_id".into());
        identity.global_ids.entry(scheme).or_insert(id);

        let prop = |prefix: &str, field: &str| value_text(properties.get(&format!("{prefix}.{field}")));
        identity.make_model.brand = prop("make", "brand");
        identity.make_model.model = prop("make", "model");
        identity.make_model.hardware_revision = prop("make", "hardware_revision");
        identity.make_model.firmware_revision = prop("make", "firmware_revision");
        identity.ownership.manufacturer = prop("owner", "manufacturer");
        identity.ownership.owner = prop("owner", "owner");
        identity.ownership.operator = prop("owner", "operator");
        identity.ownership.location = prop("owner", "location");
        if let Some(Value::Array(items)) = properties.get("conformity") {
            identity.conformity = string_list(items).into_iter().collect();
        }
        Ok(identity)
    }

    fn read_child(
        &self,
        record: &str,
        value: &Value,
        table: &ClassificationTable,
    ) -> Result<PartClass, MapperError> {
        let obj = as_object(value, record)?;
        let identifier = text_field(obj, "ID").ok_or_else(|| StructuralError::MissingField {
            record: record.to_string(),
            field: "ID".to_string(),
        })?;
        let name = text_field(obj, "Description").unwrap_or_default();
        let class_ids = match obj.get("EquipmentClassID") {
            Some(Value::String(id)) => vec![id.clone()],
            _ => string_list(array_field(obj, "EquipmentClassID", record)?),
        };
        let mut properties = read_properties(obj, record)?;
        let declared = properties
            .remove(PART_CLASS_PROPERTY)
            .and_then(|value| value.as_str().map(str::to_string));
        let values: Map<String, Value> = properties.into_iter().collect();
        let names: Vec<&str> = values.keys().map(String::as_str).collect();

        let (category, source) =
            resolve_category(ISA95_SCHEMA, table, declared.as_deref(), &class_ids, &names);
        tracing::debug!(record, part = %identifier, %category, ?source, "resolved equipment category");
        let mut part = build_part(record, &identifier, &name, category, &values)?;

        for (idx, row) in array_field(obj, "OntologyBinding", record)?.iter().enumerate() {
            part.bind_ontology(read_binding(&format!("{record}.OntologyBinding[{idx}]"), row)?);
        }
        if !class_ids.is_empty() {
            let mut own = OntologyBinding::new(ISA95_SCHEMA);
            own.class_ids.extend(class_ids);
            part.bind_ontology(own);
        }
        Ok(part)
    }

    fn read_structure(
        &self,
        equipment: &Map<String, Value>,
        table: &ClassificationTable,
    ) -> Result<StructureLayer, MapperError> {
        let mut structure = StructureLayer::default();
        for (idx, child) in array_field(equipment, "EquipmentChild", "Equipment")?
            .iter()
            .enumerate()
        {
            let record = format!("Equipment.EquipmentChild[{idx}]");
            structure.parts.push(self.read_child(&record, child, table)?);
        }
        for (idx, row) in array_field(equipment, "EquipmentHierarchy", "Equipment")?
            .iter()
            .enumerate()
        {
            let record = format!("Equipment.EquipmentHierarchy[{idx}]");
            let row = as_object(row, &record)?;
            let parent = text_field(row, "ParentID").ok_or_else(|| StructuralError::MissingField {
                record: record.clone(),
                field: "ParentID".to_string(),
            })?;
            let children = string_list(array_field(row, "ChildID", &record)?);
            structure.hierarchy.entry(parent).or_default().extend(children);
        }
        for (idx, row) in array_field(equipment, "MaterialDefinition", "Equipment")?
            .iter()
            .enumerate()
        {
            let record = format!("Equipment.MaterialDefinition[{idx}]");
            structure.materials.push(read_material(&record, row)?);
        }
        Ok(structure)
    }

    fn read_lifecycle(&self, performance: &Map<String, Value>) -> Result<LifecycleLayer, MapperError> {
        let date = match text_field(performance, "ProductionDate") {
            Some(text) => Some(
                chrono::NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| {
                    MapperError::malformed("ProductionPerformance.ProductionDate", e.to_string())
                })?,
            ),
            None => None,
        };
        let manufacture = ManufactureRecord {
            lot: text_field(performance, "WorkOrder"),
            batch: text_field(performance, "BatchID"),
            factory: text_field(performance, "Location"),
            date,
            ..Default::default()
        };
        let mut lifecycle = LifecycleLayer {
            manufacture: (manufacture != ManufactureRecord::default()).then_some(manufacture),
            ..Default::default()
        };
        for (idx, row) in array_field(performance, "Events", "ProductionPerformance")?
            .iter()
            .enumerate()
        {
            let record = format!("ProductionPerformance.Events[{idx}]");
            let row = as_object(row, &record)?;
            let event_type = text_field(row, "EventType").ok_or_else(|| StructuralError::MissingField {
                record: record.clone(),
                field: "EventType".to_string(),
            })?;
            let timestamp = row
                .get("Timestamp")
                .cloned()
                .ok_or_else(|| StructuralError::MissingField {
                    record: record.clone(),
                    field: "Timestamp".to_string(),
                })?;
            let timestamp: chrono::DateTime<chrono::Utc> = serde_json::from_value(timestamp)
                .map_err(|e| MapperError::malformed(format!("{record}.Timestamp"), e.to_string()))?;
            let details = object_field(row, "Details", &record)?
                .map(|d| d.clone().into_iter().collect())
                .unwrap_or_default();
            lifecycle.events.push(LifecycleEvent {
                event_type,
                timestamp,
                details,
            });
        }
        Ok(lifecycle)
    }
}

fn material_json(material: &Material) -> Value {
    let mut row = Map::new();
    row.insert("ID".into(), json!(material.substance));
    if let Some(cas) = &material.cas_number {
        row.insert("CASNumber".into(), json!(cas));
    }
    row.insert("MassFraction".into(), json!(material.mass_fraction));
    if let Some(recyclable) = material.recyclable {
        row.insert("Recyclable".into(), json!(recyclable));
    }
    Value::Object(row)
}

fn read_material(record: &str, value: &Value) -> Result<Material, MapperError> {
    let row = as_object(value, record)?;
    let substance = text_field(row, "ID").ok_or_else(|| StructuralError::MissingField {
        record: record.to_string(),
        field: "ID".to_string(),
    })?;
    let mass_fraction = match row.get("MassFraction") {
        None | Some(Value::Null) => 0.0,
        Some(value) => value
            .as_f64()
            .ok_or_else(|| MapperError::malformed(format!("{record}.MassFraction"), "expected a number"))?,
    };
    Ok(Material {
        substance,
        cas_number: text_field(row, "CASNumber"),
        mass_fraction,
        recyclable: row.get("Recyclable").and_then(Value::as_bool),
    })
}

fn read_binding(record: &str, value: &Value) -> Result<OntologyBinding, MapperError> {
    let row = as_object(value, record)?;
    let schema_name = text_field(row, "SchemaName").ok_or_else(|| StructuralError::MissingField {
        record: record.to_string(),
        field: "SchemaName".to_string(),
    })?;
    let mut binding = OntologyBinding::new(schema_name);
    binding.class_ids = string_list(array_field(row, "ClassID", record)?)
        .into_iter()
        .collect();
    binding.item_ids = string_list(array_field(row, "ItemID", record)?)
        .into_iter()
        .collect();
    if let Some(metadata) = object_field(row, "Metadata", record)? {
        binding.metadata = metadata
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
    }
    Ok(binding)
}

/// `Metadata` is omitted when the binding carries none.
fn binding_row(binding: &OntologyBinding) -> Value {
    let mut row = json!({
        "SchemaName": binding.schema_name,
        "ClassID": binding.class_ids,
        "ItemID": binding.item_ids,
    });
    if !binding.metadata.is_empty() {
        row["Metadata"] = json!(binding.metadata);
    }
    row
}

impl SchemaMapper for Isa95Mapper {
    fn schema_name(&self) -> &str {
        ISA95_SCHEMA
    }

    fn schema_version(&self) -> &str {
        self.config.schema_version.as_deref().unwrap_or(ISA95_VERSION)
    }

    fn context(&self) -> Value {
        json!({
            "isa95": "http://www.mesa.org/xml/B2MML-V0600",
            "Equipment": "isa95:Equipment",
            "EquipmentChild": "isa95:Equipment",
            "EquipmentProperty": "isa95:EquipmentProperty",
            "EquipmentClassID": "isa95:EquipmentClassID",
            "EquipmentLevel": "isa95:EquipmentLevel",
            "MaterialDefinition": "isa95:MaterialDefinition",
            "ProductionPerformance": "isa95:ProductionPerformance",
            "OntologyBinding": "https://w3id.org/dpp/gas#ontologyBinding",
        })
    }

    fn to_canonical(
        &self,
        raw: &Value,
        table: &ClassificationTable,
    ) -> Result<Passport, MapperError> {
        let doc = as_object(raw, "document")?;
        let equipment = object_field(doc, "Equipment", "document")?.ok_or_else(|| {
            StructuralError::MissingField {
                record: "document".to_string(),
                field: "Equipment".to_string(),
            }
        })?;
        let properties = read_properties(equipment, "Equipment")?;
        let mut passport = Passport::new()
            .with_identity(self.read_identity(equipment, &properties)?)
            .with_structure(self.read_structure(equipment, table)?);
        if let Some(performance) = object_field(doc, "ProductionPerformance", "document")? {
            passport.lifecycle = Some(self.read_lifecycle(performance)?);
        }
        passport.validate()?;
        Ok(passport)
    }

    fn from_canonical(&self, passport: &Passport) -> Result<Value, MapperError> {
        passport.validate()?;
        let mut doc = Map::new();
        doc.insert("schema".into(), json!(ISA95_SCHEMA));
        doc.insert("schemaVersion".into(), json!(self.schema_version()));
        doc.insert("Equipment".into(), self.map_equipment(passport)?);
        if let Some(lifecycle) = &passport.lifecycle {
            doc.insert("ProductionPerformance".into(), self.map_performance(lifecycle));
        }
        Ok(Value::Object(doc))
    }

    fn map_part(&self, part: &PartClass) -> Result<Value, MapperError> {
        let mut properties = vec![property(PART_CLASS_PROPERTY, part.category().as_str())];
        properties.extend(
            part.attributes()
                .to_values()
                .into_iter()
                .map(|(id, value)| property(&id, value)),
        );
        let bindings: Vec<Value> = part.ontology_bindings().iter().map(binding_row).collect();
        Ok(json!({
            "ID": part.identifier,
            "Description": part.name,
            "EquipmentClassID": native_class_ids(part, ISA95_SCHEMA, &self.config),
            "EquipmentProperty": properties,
            "OntologyBinding": bindings,
        }))
    }

    fn validate(&self, document: &Value) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        let Some(doc) = document.as_object() else {
            return vec![ValidationFinding::error("type-mismatch", "", "document must be an object")];
        };
        if doc.get("schema").and_then(Value::as_str) != Some(ISA95_SCHEMA) {
            findings.push(ValidationFinding::error(
                "schema-mismatch",
                "schema",
                format!("expected schema `{ISA95_SCHEMA}`"),
            ));
        }
        let Some(equipment) = doc.get("Equipment").and_then(Value::as_object) else {
            findings.push(ValidationFinding::missing_field("Equipment"));
            sort_findings(&mut findings);
            return findings;
        };
        if text_field(equipment, "ID").is_none() {
            findings.push(ValidationFinding::missing_field("Equipment.ID"));
        }
        match equipment.get("EquipmentLevel").and_then(Value::as_str) {
            Some(level) if EQUIPMENT_LEVELS.contains(&level) => {}
            Some(level) => findings.push(ValidationFinding::error(
                "invalid-enum",
                "Equipment.EquipmentLevel",
                format!("`{level}` is not an ISA-95 equipment level"),
            )),
            None => findings.push(ValidationFinding::missing_field("Equipment.EquipmentLevel")),
        }
        let children = equipment
            .get("EquipmentChild")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for (idx, child) in children.iter().enumerate() {
            let path = format!("Equipment.EquipmentChild[{idx}]");
            let Some(child) = child.as_object() else {
                findings.push(ValidationFinding::error("type-mismatch", path, "equipment child must be an object"));
                continue;
            };
            if text_field(child, "ID").is_none() {
                findings.push(ValidationFinding::missing_field(format!("{path}.ID")));
            }
            let class_ids_ok = match child.get("EquipmentClassID") {
                None | Some(Value::String(_)) => true,
                Some(Value::Array(ids)) => ids.iter().all(Value::is_string),
                Some(_) => false,
            };
            if !class_ids_ok {
                findings.push(ValidationFinding::error(
                    "type-mismatch",
                    format!("{path}.EquipmentClassID"),
                    "equipment class ids must be strings",
                ));
            }
        }
        if let Some(date) = doc
            .get("ProductionPerformance")
            .and_then(|p| p.get("ProductionDate"))
            .and_then(Value::as_str)
            && chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err()
        {
            findings.push(ValidationFinding::warning(
                "date-format",
                "ProductionPerformance.ProductionDate",
                format!("`{date}` is not an ISO 8601 calendar date"),
            ));
        }
        sort_findings(&mut findings);
        findings
    }
}
