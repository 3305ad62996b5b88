//! ECLASS mapper.
//!
//! ECLASS is a product classification dictionary, so the mapped document
//! carries every canonical layer. Components list their ECLASS class and
//! item-class IRDIs next to the domain part class.

use crate::config::MapperConfig;
use crate::error::MapperError;
use crate::finding::{ValidationFinding, sort_findings};
use crate::mapper::{
    SchemaMapper, array_field, as_object, build_part, embedded_layer, native_class_ids,
    object_field, resolve_category, string_list, text_field, to_json,
};
use dpp_classify::ClassificationTable;
use dpp_model::{
    Hierarchy, IdentityLayer, OntologyBinding, PartCategory, PartClass, Passport, StructuralError,
    StructureLayer,
};
use regex::Regex;
use serde_json::{Map, Value, json};
use std::sync::OnceLock;

pub const ECLASS_SCHEMA: &str = "ECLASS";
pub const ECLASS_VERSION: &str = "16.0";

fn irdi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d#\d{2}-[A-Z]{3}\d{3}#\d{3}$").expect("IRDI regex must compile")
    })
}

#[derive(Debug, Clone, Default)]
pub struct EclassMapper {
    config: MapperConfig,
}

impl EclassMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    fn map_identity(&self, identity: &IdentityLayer) -> Value {
        let mut out = Map::new();
        if let Some((scheme, value)) = identity.primary_id() {
            out.insert("productId".into(), json!(value));
            out.insert("productIdScheme".into(), json!(scheme));
        }
        out.insert("globalIds".into(), json!(identity.global_ids));
        let make = &identity.make_model;
        let owner = &identity.ownership;
        for (key, value) in [
            ("manufacturerName", &owner.manufacturer),
            ("brand", &make.brand),
            ("model", &make.model),
            ("hardwareRevision", &make.hardware_revision),
            ("firmwareRevision", &make.firmware_revision),
            ("owner", &owner.owner),
            ("operator", &owner.operator),
            ("location", &owner.location),
        ] {
            if let Some(value) = value {
                out.insert(key.into(), json!(value));
            }
        }
        out.insert("conformity".into(), json!(identity.conformity));
        Value::Object(out)
    }

    fn map_structure(&self, structure: &StructureLayer) -> Result<Value, MapperError> {
        let components = structure
            .parts
            .iter()
            .map(|part| self.map_part(part))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(json!({
            "hierarchy": structure.hierarchy,
            "components": components,
            "interfaces": to_json(&structure.interfaces, "structure.interfaces")?,
            "materials": to_json(&structure.materials, "structure.materials")?,
            "bomRefs": structure.bom_refs,
        }))
    }

    fn read_identity(&self, obj: &Map<String, Value>) -> IdentityLayer {
        let mut identity = IdentityLayer::default();
        if let Some(Value::Object(ids)) = obj.get("globalIds") {
            for (scheme, value) in ids {
                if let Some(value) = value.as_str() {
                    identity.global_ids.insert(scheme.clone(), value.to_string());
                }
            }
        }
        if identity.global_ids.is_empty()
            && let Some(product_id) = text_field(obj, "productId")
        {
            let scheme = text_field(obj, "productIdScheme").unwrap_or_else(|| "product_id".into());
            identity.global_ids.insert(scheme, product_id);
        }
        identity.make_model.brand = text_field(obj, "brand");
        identity.make_model.model = text_field(obj, "model");
        identity.make_model.hardware_revision = text_field(obj, "hardwareRevision");
        identity.make_model.firmware_revision = text_field(obj, "firmwareRevision");
        identity.ownership.manufacturer = text_field(obj, "manufacturerName");
        identity.ownership.owner = text_field(obj, "owner");
        identity.ownership.operator = text_field(obj, "operator");
        identity.ownership.location = text_field(obj, "location");
        if let Some(Value::Array(items)) = obj.get("conformity") {
            identity.conformity = string_list(items).into_iter().collect();
        }
        identity
    }

    fn read_component(
        &self,
        record: &str,
        value: &Value,
        table: &ClassificationTable,
    ) -> Result<PartClass, MapperError> {
        let obj = as_object(value, record)?;
        let identifier = text_field(obj, "partId").ok_or_else(|| StructuralError::MissingField {
            record: record.to_string(),
            field: "partId".to_string(),
        })?;
        let name = text_field(obj, "name").unwrap_or_default();
        let class_ids = string_list(array_field(obj, "eclassClassIds", record)?);
        let item_ids = string_list(array_field(obj, "eclassItemIds", record)?);
        let attributes = object_field(obj, "attributes", record)?
            .cloned()
            .unwrap_or_default();
        let names: Vec<&str> = attributes.keys().map(String::as_str).collect();
        let declared = obj.get("partClass").and_then(Value::as_str);

        let (category, source) =
            resolve_category(ECLASS_SCHEMA, table, declared, &class_ids, &names);
        tracing::debug!(record, part = %identifier, %category, ?source, "resolved component category");
        let mut part = build_part(record, &identifier, &name, category, &attributes)?;

        for (idx, binding) in array_field(obj, "ontologyBindings", record)?.iter().enumerate() {
            part.bind_ontology(read_binding(&format!("{record}.ontologyBindings[{idx}]"), binding)?);
        }

        let mut own = OntologyBinding::new(ECLASS_SCHEMA);
        own.class_ids.extend(class_ids.iter().cloned());
        own.item_ids.extend(item_ids);
        for class_id in &class_ids {
            own.item_ids
                .extend(table.case_items(ECLASS_SCHEMA, class_id).into_iter().map(str::to_string));
        }
        if !own.class_ids.is_empty() || !own.item_ids.is_empty() {
            part.bind_ontology(own);
        }
        Ok(part)
    }

    fn read_structure(
        &self,
        obj: &Map<String, Value>,
        table: &ClassificationTable,
    ) -> Result<StructureLayer, MapperError> {
        let mut structure = StructureLayer::default();
        if let Some(hierarchy) = obj.get("hierarchy").filter(|v| !v.is_null()) {
            structure.hierarchy = serde_json::from_value::<Hierarchy>(hierarchy.clone())
                .map_err(|e| MapperError::malformed("structure.hierarchy", e.to_string()))?;
        }
        for (idx, component) in array_field(obj, "components", "structure")?.iter().enumerate() {
            let record = format!("structure.components[{idx}]");
            structure.parts.push(self.read_component(&record, component, table)?);
        }
        if let Some(interfaces) = embedded_layer(obj, "interfaces")? {
            structure.interfaces = interfaces;
        }
        if let Some(materials) = embedded_layer(obj, "materials")? {
            structure.materials = materials;
        }
        structure.bom_refs = string_list(array_field(obj, "bomRefs", "structure")?);
        Ok(structure)
    }
}

fn read_binding(record: &str, value: &Value) -> Result<OntologyBinding, MapperError> {
    let obj = as_object(value, record)?;
    let schema_name = text_field(obj, "schemaName").ok_or_else(|| StructuralError::MissingField {
        record: record.to_string(),
        field: "schemaName".to_string(),
    })?;
    let mut binding = OntologyBinding::new(schema_name);
    binding.class_ids = string_list(array_field(obj, "classIds", record)?)
        .into_iter()
        .collect();
    binding.item_ids = string_list(array_field(obj, "itemIds", record)?)
        .into_iter()
        .collect();
    if let Some(metadata) = object_field(obj, "metadata", record)? {
        binding.metadata = metadata.clone().into_iter().collect();
    }
    Ok(binding)
}

fn binding_json(binding: &OntologyBinding) -> Value {
    let mut out = Map::new();
    out.insert("schemaName".into(), json!(binding.schema_name));
    out.insert("classIds".into(), json!(binding.class_ids));
    out.insert("itemIds".into(), json!(binding.item_ids));
    if !binding.metadata.is_empty() {
        out.insert("metadata".into(), json!(binding.metadata));
    }
    Value::Object(out)
}

impl SchemaMapper for EclassMapper {
    fn schema_name(&self) -> &str {
        ECLASS_SCHEMA
    }

    fn schema_version(&self) -> &str {
        self.config.schema_version.as_deref().unwrap_or(ECLASS_VERSION)
    }

    fn context(&self) -> Value {
        json!({
            "eclass": "https://eclass.eu/eclass-standard/",
            "dpp": "https://w3id.org/dpp/gas#",
            "schema": "http://schema.org/",
            "productId": "schema:productID",
            "brand": "schema:brand",
            "model": "schema:model",
            "manufacturerName": "schema:manufacturer",
            "partClass": "dpp:partClass",
            "components": "dpp:component",
            "eclassClassIds": {"@id": "eclass:classId", "@container": "@set"},
            "eclassItemIds": {"@id": "eclass:itemClassId", "@container": "@set"},
            "ontologyBindings": "dpp:ontologyBinding",
        })
    }

    fn to_canonical(
        &self,
        raw: &Value,
        table: &ClassificationTable,
    ) -> Result<Passport, MapperError> {
        let doc = as_object(raw, "document")?;
        let mut passport = Passport::new();
        if let Some(identity) = object_field(doc, "identity", "document")? {
            passport.identity = Some(self.read_identity(identity));
        }
        if let Some(structure) = object_field(doc, "structure", "document")? {
            passport.structure = Some(self.read_structure(structure, table)?);
        }
        passport.lifecycle = embedded_layer(doc, "lifecycle")?;
        passport.risk = embedded_layer(doc, "risk")?;
        passport.sustainability = embedded_layer(doc, "sustainability")?;
        passport.provenance = embedded_layer(doc, "provenance")?;
        passport.validate()?;
        Ok(passport)
    }

    fn from_canonical(&self, passport: &Passport) -> Result<Value, MapperError> {
        passport.validate()?;
        let structure = match &passport.structure {
            Some(structure) => self.map_structure(structure)?,
            None => Value::Null,
        };
        let sustainability = match &passport.sustainability {
            Some(layer) if !layer.is_empty() => to_json(layer, "sustainability")?,
            _ => Value::Null,
        };
        let optional = |value: Option<Result<Value, MapperError>>| value.transpose().map(|v| v.unwrap_or(Value::Null));

        Ok(json!({
            "schema": ECLASS_SCHEMA,
            "schemaVersion": self.schema_version(),
            "identity": passport.identity.as_ref().map(|i| self.map_identity(i)),
            "structure": structure,
            "lifecycle": optional(passport.lifecycle.as_ref().map(|l| to_json(l, "lifecycle")))?,
            "risk": optional(passport.risk.as_ref().map(|l| to_json(l, "risk")))?,
            "sustainability": sustainability,
            "provenance": optional(passport.provenance.as_ref().map(|l| to_json(l, "provenance")))?,
        }))
    }

    fn map_part(&self, part: &PartClass) -> Result<Value, MapperError> {
        let own = part.binding(ECLASS_SCHEMA);
        let item_ids: Vec<&str> = own
            .map(|binding| binding.item_ids.iter().map(String::as_str).collect())
            .unwrap_or_default();
        let bindings: Vec<Value> = part.ontology_bindings().iter().map(binding_json).collect();
        Ok(json!({
            "partId": part.identifier,
            "name": part.name,
            "partClass": part.category(),
            "eclassClassIds": native_class_ids(part, ECLASS_SCHEMA, &self.config),
            "eclassItemIds": item_ids,
            "attributes": part.attributes().to_values(),
            "ontologyBindings": bindings,
        }))
    }

    fn validate(&self, document: &Value) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        let Some(doc) = document.as_object() else {
            return vec![ValidationFinding::error("type-mismatch", "", "document must be an object")];
        };
        if doc.get("schema").and_then(Value::as_str) != Some(ECLASS_SCHEMA) {
            findings.push(ValidationFinding::error(
                "schema-mismatch",
                "schema",
                format!("expected schema `{ECLASS_SCHEMA}`"),
            ));
        }
        match doc.get("identity") {
            Some(Value::Object(identity)) => {
                if text_field(identity, "productId").is_none() {
                    findings.push(ValidationFinding::missing_field("identity.productId"));
                }
            }
            _ => findings.push(ValidationFinding::missing_field("identity")),
        }

        let components = doc
            .get("structure")
            .and_then(|s| s.get("components"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for (idx, component) in components.iter().enumerate() {
            let path = format!("structure.components[{idx}]");
            let Some(obj) = component.as_object() else {
                findings.push(ValidationFinding::error("type-mismatch", path, "component must be an object"));
                continue;
            };
            if text_field(obj, "partId").is_none() {
                findings.push(ValidationFinding::missing_field(format!("{path}.partId")));
            }
            match obj.get("partClass").and_then(Value::as_str) {
                Some(name) if name.parse::<PartCategory>().is_ok() => {}
                Some(name) => findings.push(ValidationFinding::error(
                    "invalid-enum",
                    format!("{path}.partClass"),
                    format!("`{name}` is not a part class"),
                )),
                None => findings.push(ValidationFinding::missing_field(format!("{path}.partClass"))),
            }
            if !matches!(obj.get("attributes"), None | Some(Value::Object(_))) {
                findings.push(ValidationFinding::error(
                    "type-mismatch",
                    format!("{path}.attributes"),
                    "attributes must be an object",
                ));
            }
            if let Some(Value::Array(ids)) = obj.get("eclassClassIds") {
                for (i, id) in ids.iter().enumerate() {
                    let id_path = format!("{path}.eclassClassIds[{i}]");
                    match id.as_str() {
                        Some(id) if irdi_re().is_match(id) => {}
                        Some(id) => findings.push(ValidationFinding::warning(
                            "irdi-format",
                            id_path,
                            format!("`{id}` is not an ECLASS IRDI"),
                        )),
                        None => findings.push(ValidationFinding::error(
                            "type-mismatch",
                            id_path,
                            "class id must be a string",
                        )),
                    }
                }
            }
        }
        if !matches!(doc.get("sustainability"), None | Some(Value::Null) | Some(Value::Object(_))) {
            findings.push(ValidationFinding::error(
                "type-mismatch",
                "sustainability",
                "sustainability must be an object or null",
            ));
        }
        sort_findings(&mut findings);
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;
    use dpp_model::{PartAttributes, SensorAttributes, SustainabilityLayer};

    fn sensor_passport() -> Passport {
        let mut binding = OntologyBinding::new(ECLASS_SCHEMA);
        binding.class_ids.insert("0173-1#01-AGZ376#002".to_string());
        let part = PartClass::new(
            "S1",
            "Temperature Sensor",
            PartAttributes::Sensor(SensorAttributes {
                sensor_type: Some("temperature".to_string()),
                ..Default::default()
            }),
        )
        .with_binding(binding);
        Passport::new()
            .with_identity(IdentityLayer::with_global_id("gtin", "0123"))
            .with_structure(StructureLayer {
                parts: vec![part],
                ..Default::default()
            })
    }

    #[test]
    fn component_shape() {
        let doc = EclassMapper::default()
            .from_canonical(&sensor_passport())
            .expect("export");
        insta::assert_json_snapshot!(doc["structure"]["components"][0], @r###"
        {
          "attributes": {
            "sensor_type": "temperature"
          },
          "eclassClassIds": [
            "0173-1#01-AGZ376#002"
          ],
          "eclassItemIds": [],
          "name": "Temperature Sensor",
          "ontologyBindings": [
            {
              "classIds": [
                "0173-1#01-AGZ376#002"
              ],
              "itemIds": [],
              "schemaName": "ECLASS"
            }
          ],
          "partClass": "Sensor",
          "partId": "S1"
        }
        "###);
    }

    #[test]
    fn empty_sustainability_is_null() {
        let passport = sensor_passport().with_sustainability(SustainabilityLayer::default());
        let doc = EclassMapper::default().from_canonical(&passport).expect("export");
        assert_eq!(doc["sustainability"], Value::Null);
        assert_eq!(doc["risk"], Value::Null);
    }

    #[test]
    fn missing_part_id_is_structural() {
        let raw = json!({
            "schema": "ECLASS",
            "structure": {"components": [{"name": "Nameless"}]}
        });
        let err = EclassMapper::default()
            .to_canonical(&raw, &ClassificationTable::new())
            .expect_err("partId is required");
        assert!(matches!(
            err,
            MapperError::Structural(StructuralError::MissingField { ref record, ref field })
                if record == "structure.components[0]" && field == "partId"
        ));
    }

    #[test]
    fn case_items_from_the_table_extend_the_binding() {
        use dpp_classify::{ClassificationRecord, ConfidenceSource};
        let table = ClassificationTable::from_records([ClassificationRecord {
            source_schema: ECLASS_SCHEMA.to_string(),
            definition_id: "0173-1#01-ITM001#001".to_string(),
            category: PartCategory::Sensor,
            confidence_source: ConfidenceSource::Heuristic,
            evidence: Default::default(),
            case_of: vec!["0173-1#01-AGZ376#002".to_string()],
        }]);
        let raw = json!({
            "schema": "ECLASS",
            "structure": {"components": [{
                "partId": "S1",
                "eclassClassIds": ["0173-1#01-AGZ376#002"]
            }]}
        });
        let passport = EclassMapper::default().to_canonical(&raw, &table).expect("ingest");
        let part = passport.part("S1").expect("part");
        assert_eq!(part.category(), PartCategory::Structural);
        assert_eq!(part.allowed_item_ids(ECLASS_SCHEMA), vec!["0173-1#01-ITM001#001"]);
    }

    #[test]
    fn malformed_irdi_is_a_warning_and_bad_part_class_an_error() {
        let doc = json!({
            "schema": "ECLASS",
            "identity": {"productId": "0123"},
            "structure": {"components": [{
                "partId": "S1",
                "partClass": "Gizmo",
                "eclassClassIds": ["27-20-01-01"]
            }]}
        });
        let findings = EclassMapper::default().validate(&doc);
        let summary: Vec<(Severity, &str)> = findings
            .iter()
            .map(|f| (f.severity, f.code.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Severity::Warning, "irdi-format"),
                (Severity::Error, "invalid-enum"),
            ]
        );
    }
}
