//! The ontology classifier.
//!
//! Scans raw definitions and assigns each to one part-class category. Pure:
//! the run result is a value; persisting it is the caller's step.

use crate::heuristics::{HeuristicsConfig, ManualOverride};
use crate::profile::KeywordProfile;
use crate::strategy::{ClassificationStrategy, KeywordStrategy};
use crate::table::{ClassificationRecord, ClassificationTable, ConfidenceSource};
use crate::tokenize::Tokens;
use dpp_model::PartCategory;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Schema name of the manufacturing-operations vocabulary, which gets the
/// operations keyword profile by default.
pub const OPERATIONS_SOURCE: &str = "ISA-95";

/// One raw ontology definition, as produced by a format reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "documentation_text", alias = "definition")]
    pub documentation_text: String,
    /// Base classes this definition is a case of.
    #[serde(default, alias = "case_of", skip_serializing_if = "Vec::is_empty")]
    pub case_of: Vec<String>,
}

impl RawDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        documentation_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            documentation_text: documentation_text.into(),
            case_of: Vec::new(),
        }
    }

    /// Read one definition from a loosely shaped JSON object.
    ///
    /// Missing or null fields read as empty, which the classifier then
    /// reports. Numeric ids are taken as text. A field of any other type is
    /// an error naming that field.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let Value::Object(obj) = value else {
            return Err("definition is not a JSON object".to_string());
        };
        let case_of = match first_present(obj, &["caseOf", "case_of"]) {
            None => Vec::new(),
            Some((_, Value::String(base))) => vec![base.clone()],
            Some((key, Value::Array(items))) => items
                .iter()
                .map(|item| match item {
                    Value::String(base) => Ok(base.clone()),
                    _ => Err(format!("field `{key}` must list strings")),
                })
                .collect::<Result<_, _>>()?,
            Some((key, _)) => return Err(format!("field `{key}` must be a string list")),
        };
        Ok(Self {
            id: text_field(obj, &["id"], true)?,
            name: text_field(obj, &["name"], false)?,
            documentation_text: text_field(
                obj,
                &["documentationText", "documentation_text", "definition"],
                false,
            )?,
            case_of,
        })
    }
}

fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&'a str]) -> Option<(&'a str, &'a Value)> {
    keys.iter()
        .find_map(|key| obj.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))
}

fn text_field(obj: &Map<String, Value>, keys: &[&str], numbers: bool) -> Result<String, String> {
    match first_present(obj, keys) {
        None => Ok(String::new()),
        Some((_, Value::String(text))) => Ok(text.clone()),
        Some((_, Value::Number(n))) if numbers => Ok(n.to_string()),
        Some((key, _)) => Err(format!("field `{key}` must be a string")),
    }
}

/// A raw definition that was skipped. Non-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationWarning {
    /// Position in the input sequence.
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationRun {
    pub table: ClassificationTable,
    pub warnings: Vec<ClassificationWarning>,
}

/// Keyword classifier with per-source strategies and manual overrides.
#[derive(Clone)]
pub struct Classifier {
    default_strategy: Arc<dyn ClassificationStrategy>,
    per_source: BTreeMap<String, Arc<dyn ClassificationStrategy>>,
    manual: BTreeMap<(String, String), PartCategory>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(KeywordStrategy::default())
            .with_strategy(OPERATIONS_SOURCE, KeywordStrategy::new(KeywordProfile::operations()))
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("sources", &self.per_source.keys().collect::<Vec<_>>())
            .field("manual", &self.manual.len())
            .finish()
    }
}

impl Classifier {
    pub fn new(default_strategy: impl ClassificationStrategy + 'static) -> Self {
        Self {
            default_strategy: Arc::new(default_strategy),
            per_source: BTreeMap::new(),
            manual: BTreeMap::new(),
        }
    }

    /// The built-in profiles with a heuristics file layered on top.
    pub fn from_config(config: &HeuristicsConfig) -> Self {
        let mut classifier = Self::new(config.strategy(KeywordProfile::builtin()))
            .with_strategy(
                OPERATIONS_SOURCE,
                config.strategy(KeywordProfile::operations()),
            );
        for entry in &config.manual {
            classifier.add_manual(entry.clone());
        }
        classifier
    }

    /// Use `strategy` for definitions of `source_schema`.
    pub fn with_strategy(
        mut self,
        source_schema: impl Into<String>,
        strategy: impl ClassificationStrategy + 'static,
    ) -> Self {
        self.per_source
            .insert(source_schema.into(), Arc::new(strategy));
        self
    }

    /// Keyword strategy over `profile` for one source.
    pub fn with_profile(self, source_schema: impl Into<String>, profile: KeywordProfile) -> Self {
        self.with_strategy(source_schema, KeywordStrategy::new(profile))
    }

    pub fn add_manual(&mut self, entry: ManualOverride) {
        self.manual
            .insert((entry.source_schema, entry.definition_id), entry.category);
    }

    fn strategy_for(&self, source_schema: &str) -> &dyn ClassificationStrategy {
        self.per_source
            .get(source_schema)
            .map(|strategy| strategy.as_ref())
            .unwrap_or_else(|| self.default_strategy.as_ref())
    }

    /// Classify one definition. Returns `None` when it lacks an id or name.
    pub fn classify_one(
        &self,
        source_schema: &str,
        definition: &RawDefinition,
    ) -> Option<ClassificationRecord> {
        let id = definition.id.trim();
        if id.is_empty() || definition.name.trim().is_empty() {
            return None;
        }

        let (category, confidence_source, evidence) =
            match self.manual.get(&(source_schema.to_string(), id.to_string())) {
                Some(category) => (*category, ConfidenceSource::Manual, BTreeSet::new()),
                None => {
                    let tokens = Tokens::from_texts([
                        definition.name.as_str(),
                        definition.documentation_text.as_str(),
                    ]);
                    let assignment = self.strategy_for(source_schema).assign(&tokens);
                    (
                        assignment.category,
                        assignment.confidence_source,
                        assignment.evidence,
                    )
                }
            };

        let mut case_of: Vec<String> = definition
            .case_of
            .iter()
            .map(|base| base.trim().to_string())
            .filter(|base| !base.is_empty())
            .collect();
        case_of.sort();
        case_of.dedup();

        Some(ClassificationRecord {
            source_schema: source_schema.to_string(),
            definition_id: id.to_string(),
            category,
            confidence_source,
            evidence,
            case_of,
        })
    }

    /// Classify a whole source ontology.
    ///
    /// Malformed definitions become warnings. Duplicate ids keep the last
    /// definition and warn about the earlier one, so input order decides the
    /// table only when an id repeats.
    pub fn classify(&self, source_schema: &str, definitions: &[RawDefinition]) -> ClassificationRun {
        let mut run = ClassificationRun::default();
        let mut seen: BTreeMap<String, usize> = BTreeMap::new();

        for (index, definition) in definitions.iter().enumerate() {
            let Some(record) = self.classify_one(source_schema, definition) else {
                let missing = if definition.id.trim().is_empty() {
                    "id"
                } else {
                    "name"
                };
                tracing::warn!(
                    source = source_schema,
                    index,
                    field = missing,
                    "skipping raw definition"
                );
                run.warnings.push(ClassificationWarning {
                    index,
                    id: Some(definition.id.trim().to_string()).filter(|id| !id.is_empty()),
                    reason: format!("missing required field `{missing}`"),
                });
                continue;
            };

            if let Some(previous) = seen.insert(record.definition_id.clone(), index) {
                run.warnings.push(ClassificationWarning {
                    index: previous,
                    id: Some(record.definition_id.clone()),
                    reason: format!("superseded by duplicate definition at index {index}"),
                });
            }
            tracing::debug!(
                source = source_schema,
                id = %record.definition_id,
                category = %record.category,
                confidence = %record.confidence_source,
                "classified"
            );
            run.table.insert(record);
        }

        tracing::info!(
            source = source_schema,
            classified = run.table.len(),
            low_confidence = run.table.low_confidence(source_schema).count(),
            skipped = run.warnings.len(),
            "classification run complete"
        );
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs() -> Vec<RawDefinition> {
        vec![
            RawDefinition::new("X1", "Temperature Sensor", "measures ambient temperature"),
            RawDefinition::new("X2", "Gear Motor", "servo drive with planetary gearbox"),
            RawDefinition::new("", "Orphan", "no id"),
            RawDefinition::new("X4", "  ", "no name"),
            RawDefinition::new("X5", "Mounting plate", ""),
        ]
    }

    #[test]
    fn malformed_definitions_become_warnings() {
        let run = Classifier::default().classify("ECLASS", &defs());
        assert_eq!(run.table.len(), 3);
        let skipped: Vec<(usize, Option<&str>)> = run
            .warnings
            .iter()
            .map(|w| (w.index, w.id.as_deref()))
            .collect();
        assert_eq!(skipped, vec![(2, None), (3, Some("X4"))]);
    }

    #[test]
    fn classification_is_order_independent_and_idempotent() {
        let classifier = Classifier::default();
        let forward = classifier.classify("ECLASS", &defs());
        let mut reversed_defs = defs();
        reversed_defs.reverse();
        let reversed = classifier.classify("ECLASS", &reversed_defs);
        assert_eq!(forward.table, reversed.table);
        assert_eq!(forward.table, classifier.classify("ECLASS", &defs()).table);
    }

    #[test]
    fn manual_override_wins() {
        let mut classifier = Classifier::default();
        classifier.add_manual(ManualOverride {
            source_schema: "ECLASS".to_string(),
            definition_id: "X1".to_string(),
            category: PartCategory::Thermal,
        });
        let run = classifier.classify("ECLASS", &defs());
        let record = run.table.get("ECLASS", "X1").expect("X1 classified");
        assert_eq!(record.category, PartCategory::Thermal);
        assert_eq!(record.confidence_source, ConfidenceSource::Manual);

        let other = classifier.classify("ISA-95", &defs());
        assert_eq!(
            other.table.get("ISA-95", "X1").map(|r| r.confidence_source),
            Some(ConfidenceSource::Heuristic)
        );
    }

    #[test]
    fn operations_source_resolves_temperature_sensor_by_longest_phrase() {
        let run = Classifier::default().classify(OPERATIONS_SOURCE, &defs());
        let record = run.table.get(OPERATIONS_SOURCE, "X1").expect("X1 classified");
        assert_eq!(record.category, PartCategory::Sensor);
        assert_eq!(record.confidence_source, ConfidenceSource::Heuristic);
        assert!(record.evidence.contains("temperature sensor"));
    }

    #[test]
    fn duplicate_ids_keep_the_last_definition() {
        let run = Classifier::default().classify(
            "ECLASS",
            &[
                RawDefinition::new("D", "Fuse", ""),
                RawDefinition::new("D", "Battery", ""),
            ],
        );
        assert_eq!(
            run.table.get("ECLASS", "D").map(|r| r.category),
            Some(PartCategory::EnergyStorage)
        );
        assert_eq!(run.warnings.len(), 1);
        assert_eq!(run.warnings[0].index, 0);

        let reversed = Classifier::default().classify(
            "ECLASS",
            &[
                RawDefinition::new("D", "Battery", ""),
                RawDefinition::new("D", "Fuse", ""),
            ],
        );
        assert_ne!(
            reversed.table.get("ECLASS", "D").map(|r| r.category),
            Some(PartCategory::EnergyStorage)
        );
    }

    #[test]
    fn per_source_profile_is_used() {
        let mut profile = KeywordProfile::new();
        profile.extend(PartCategory::Consumable, ["plate"]);
        let classifier = Classifier::default().with_profile("CUSTOM", profile);
        let run = classifier.classify("CUSTOM", &defs());
        assert_eq!(
            run.table.get("CUSTOM", "X5").map(|r| r.category),
            Some(PartCategory::Consumable)
        );
    }

    #[test]
    fn empty_input_is_an_empty_run() {
        assert_eq!(
            Classifier::default().classify("ECLASS", &[]),
            ClassificationRun::default()
        );
    }

    #[test]
    fn loose_json_definitions_read_leniently() {
        let read = |text: &str| {
            RawDefinition::from_json(&serde_json::from_str(text).expect("valid json"))
        };
        let numeric = read(r#"{"id":42,"name":"Hex bolt","definition":"fastener","case_of":"C1"}"#)
            .expect("numeric id is text");
        assert_eq!(numeric.id, "42");
        assert_eq!(numeric.documentation_text, "fastener");
        assert_eq!(numeric.case_of, vec!["C1".to_string()]);

        let null_name = read(r#"{"id":"X2","name":null}"#).expect("null reads as empty");
        assert_eq!(null_name, RawDefinition::new("X2", "", ""));
        let run = Classifier::default().classify("ECLASS", &[null_name]);
        assert_eq!(run.warnings[0].reason, "missing required field `name`");

        assert_eq!(
            read(r#"{"id":"X3","name":["Fuse"]}"#),
            Err("field `name` must be a string".to_string())
        );
        assert_eq!(
            read(r#"["X4"]"#),
            Err("definition is not a JSON object".to_string())
        );
    }

    #[test]
    fn case_of_is_normalised() {
        let mut item = RawDefinition::new("I1", "Thermocouple type K", "");
        item.case_of = vec!["C2".to_string(), " ".to_string(), "C1".to_string(), "C2".to_string()];
        let record = Classifier::default()
            .classify_one("ECLASS", &item)
            .expect("well-formed");
        assert_eq!(record.case_of, vec!["C1".to_string(), "C2".to_string()]);
    }
}
