//! Integration tests: the canonical exchange format.
//!
//! Fixtures in tests/fixtures/ are passports in the nested six-layer JSON
//! form. Loading and re-serializing a fixture must reproduce it exactly.

use dpp_model::{PartCategory, Passport, StructuralError};
use serde_json::Value;
use std::path::PathBuf;

fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()))
}

#[test]
fn full_passport_survives_exchange_round_trip() {
    let raw = fixture("pump_passport.json");
    let passport: Passport = serde_json::from_value(raw.clone()).expect("fixture is a passport");
    passport.validate().expect("fixture is structurally valid");

    let written = serde_json::to_value(&passport).expect("serialize passport");
    assert_eq!(
        written,
        raw,
        "\n\nGot:\n{}\n",
        serde_json::to_string_pretty(&written).expect("pretty")
    );
}

#[test]
fn parts_are_reachable_by_identifier() {
    let passport: Passport =
        serde_json::from_value(fixture("pump_passport.json")).expect("fixture is a passport");

    let categories: Vec<PartCategory> = passport.parts().iter().map(|p| p.category()).collect();
    assert_eq!(
        categories,
        vec![
            PartCategory::Actuator,
            PartCategory::ControlUnit,
            PartCategory::Structural
        ]
    );
    let motor = passport.part("motor").expect("motor part");
    assert_eq!(motor.supported_ontologies(), vec!["ECLASS"]);
    assert!(passport.part("impeller").is_none());
    assert_eq!(
        passport.identity.as_ref().and_then(|i| i.primary_id()),
        Some(("gtin", "04012345000017"))
    );
}

#[test]
fn cyclic_hierarchy_loads_but_fails_validation() {
    let passport: Passport =
        serde_json::from_value(fixture("cyclic_structure.json")).expect("fixture is a passport");
    assert_eq!(
        passport.validate(),
        Err(StructuralError::HierarchyCycle {
            node: "A".to_string()
        })
    );
}

#[test]
fn unknown_attribute_in_exchange_document_is_rejected() {
    let mut raw = fixture("pump_passport.json");
    raw["structure"]["parts"][0]["attributes"]["values"]["colour"] = Value::from("blue");
    let result: Result<Passport, _> = serde_json::from_value(raw);
    assert!(result.is_err(), "closed attribute records refuse extra names");
}
