//! The classification table.
//!
//! Keyed by `(source_schema, definition_id)`. Built in full by a classifier
//! run, read by mappers, never edited at mapping time.

use dpp_model::{ContentHash, PartCategory};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    Heuristic,
    /// Fallback assignment; queued for manual review.
    LowConfidence,
    Manual,
}

impl ConfidenceSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::LowConfidence => "low_confidence",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ConfidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassificationKey {
    pub source_schema: String,
    pub definition_id: String,
}

impl ClassificationKey {
    pub fn new(source_schema: impl Into<String>, definition_id: impl Into<String>) -> Self {
        Self {
            source_schema: source_schema.into(),
            definition_id: definition_id.into(),
        }
    }
}

/// One persisted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRecord {
    pub source_schema: String,
    pub definition_id: String,
    pub category: PartCategory,
    pub confidence_source: ConfidenceSource,
    #[serde(default)]
    pub evidence: BTreeSet<String>,
    /// Base classes this definition is declared a case of.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub case_of: Vec<String>,
}

impl ClassificationRecord {
    pub fn key(&self) -> ClassificationKey {
        ClassificationKey::new(&self.source_schema, &self.definition_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationTable {
    records: BTreeMap<ClassificationKey, ClassificationRecord>,
}

impl ClassificationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later records replace earlier ones with the same key.
    pub fn from_records(records: impl IntoIterator<Item = ClassificationRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.insert(record);
        }
        table
    }

    pub fn insert(&mut self, record: ClassificationRecord) -> Option<ClassificationRecord> {
        self.records.insert(record.key(), record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, source_schema: &str, definition_id: &str) -> Option<&ClassificationRecord> {
        self.records
            .get(&ClassificationKey::new(source_schema, definition_id))
    }

    /// Rows in key order.
    pub fn records(&self) -> impl Iterator<Item = &ClassificationRecord> {
        self.records.values()
    }

    pub fn records_for<'a>(
        &'a self,
        source_schema: &str,
    ) -> impl Iterator<Item = &'a ClassificationRecord> {
        self.records
            .values()
            .filter(move |record| record.source_schema == source_schema)
    }

    pub fn sources(&self) -> BTreeSet<&str> {
        self.records
            .values()
            .map(|record| record.source_schema.as_str())
            .collect()
    }

    /// Definition ids of `source_schema` assigned to `category`, sorted.
    pub fn class_ids_for(&self, source_schema: &str, category: PartCategory) -> Vec<&str> {
        self.records_for(source_schema)
            .filter(|record| record.category == category)
            .map(|record| record.definition_id.as_str())
            .collect()
    }

    /// Item definitions declared as cases of `class_id`, sorted.
    pub fn case_items(&self, source_schema: &str, class_id: &str) -> Vec<&str> {
        self.records_for(source_schema)
            .filter(|record| record.case_of.iter().any(|base| base == class_id))
            .map(|record| record.definition_id.as_str())
            .collect()
    }

    /// The manual review queue.
    pub fn low_confidence<'a>(
        &'a self,
        source_schema: &str,
    ) -> impl Iterator<Item = &'a ClassificationRecord> {
        self.records_for(source_schema)
            .filter(|record| record.confidence_source == ConfidenceSource::LowConfidence)
    }

    /// Replace every row of `source_schema` with the rows of `other`.
    ///
    /// Rows of other sources are untouched, so a shared table can hold one
    /// regenerated source at a time.
    pub fn replace_source(&mut self, source_schema: &str, other: ClassificationTable) {
        self.records
            .retain(|key, _| key.source_schema != source_schema);
        for record in other.records.into_values() {
            if record.source_schema == source_schema {
                self.insert(record);
            }
        }
    }

    /// Digest over the rows in key order.
    pub fn digest(&self) -> Result<ContentHash, serde_json::Error> {
        let mut builder = ContentHash::builder();
        for record in self.records.values() {
            builder = builder.line(&serde_json::to_string(record)?);
        }
        Ok(builder.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, id: &str, category: PartCategory) -> ClassificationRecord {
        ClassificationRecord {
            source_schema: source.to_string(),
            definition_id: id.to_string(),
            category,
            confidence_source: ConfidenceSource::Heuristic,
            evidence: BTreeSet::new(),
            case_of: Vec::new(),
        }
    }

    #[test]
    fn queries_are_scoped_by_source() {
        let mut low = record("ECLASS", "C3", PartCategory::Structural);
        low.confidence_source = ConfidenceSource::LowConfidence;
        let mut item = record("ECLASS", "I1", PartCategory::Sensor);
        item.case_of = vec!["C1".to_string()];
        let table = ClassificationTable::from_records([
            record("ECLASS", "C2", PartCategory::Sensor),
            record("ECLASS", "C1", PartCategory::Sensor),
            record("ISA-95", "C1", PartCategory::Actuator),
            low,
            item,
        ]);

        assert_eq!(
            table.class_ids_for("ECLASS", PartCategory::Sensor),
            vec!["C1", "C2", "I1"]
        );
        assert_eq!(
            table.get("ISA-95", "C1").map(|r| r.category),
            Some(PartCategory::Actuator)
        );
        assert_eq!(table.case_items("ECLASS", "C1"), vec!["I1"]);
        assert!(table.case_items("ISA-95", "C1").is_empty());
        let queue: Vec<&str> = table
            .low_confidence("ECLASS")
            .map(|r| r.definition_id.as_str())
            .collect();
        assert_eq!(queue, vec!["C3"]);
        assert_eq!(table.sources().into_iter().collect::<Vec<_>>(), vec!["ECLASS", "ISA-95"]);
    }

    #[test]
    fn replace_source_leaves_other_sources_alone() {
        let mut table = ClassificationTable::from_records([
            record("ECLASS", "old", PartCategory::Protection),
            record("ISA-95", "keep", PartCategory::Actuator),
        ]);
        table.replace_source(
            "ECLASS",
            ClassificationTable::from_records([record("ECLASS", "new", PartCategory::Sensor)]),
        );
        assert!(table.get("ECLASS", "old").is_none());
        assert!(table.get("ECLASS", "new").is_some());
        assert!(table.get("ISA-95", "keep").is_some());
    }

    #[test]
    fn digest_is_insertion_order_independent() {
        let a = ClassificationTable::from_records([
            record("S", "1", PartCategory::Sensor),
            record("S", "2", PartCategory::Thermal),
        ]);
        let b = ClassificationTable::from_records([
            record("S", "2", PartCategory::Thermal),
            record("S", "1", PartCategory::Sensor),
        ]);
        assert_eq!(a.digest().expect("digest"), b.digest().expect("digest"));
    }

    #[test]
    fn record_row_shape() {
        let mut row = record("ECLASS", "0173-1#01-AGZ376#002", PartCategory::Sensor);
        row.evidence = ["sensor".to_string(), "temperature".to_string()].into();
        insta::assert_json_snapshot!(row, @r###"
        {
          "sourceSchema": "ECLASS",
          "definitionId": "0173-1#01-AGZ376#002",
          "category": "Sensor",
          "confidenceSource": "heuristic",
          "evidence": [
            "sensor",
            "temperature"
          ]
        }
        "###);
    }
}
