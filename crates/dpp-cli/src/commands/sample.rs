use crate::support::{exit_with, print_json, registry_or_exit};
use chrono::{DateTime, NaiveDate, Utc};
use dpp_classify::ClassificationTable;
use dpp_model::{
    ActuatorAttributes, CriticalityLevel, EndOfLife, FmeaEntry, IdentityLayer, Interface,
    InterfaceKind, LifecycleEvent, LifecycleLayer, ManufactureRecord, Material, OntologyBinding,
    PartAttributes, PartClass, Passport, PowerConversionAttributes, ProvenanceLayer, RiskLayer,
    SensorAttributes, ServicePlan, Signature, StructureLayer, SustainabilityLayer,
};
use serde_json::json;

pub fn run(schema: Option<String>) {
    let passport = sample_passport().unwrap_or_else(|e| exit_with(format!("sample passport: {e}")));
    match schema {
        Some(schema) => {
            let registry = registry_or_exit(ClassificationTable::new(), None);
            let document = registry
                .map_to(&schema, &passport)
                .unwrap_or_else(|e| exit_with(e));
            print_json(&document);
        }
        None => print_json(&passport),
    }
}

fn utc(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
}

/// A small drive unit: motor, temperature sensor and power supply.
pub fn sample_passport() -> Result<Passport, chrono::ParseError> {
    let mut identity = IdentityLayer::with_global_id("gtin", "0987654321");
    identity.global_ids.insert("serial".into(), "SN1245".into());
    identity.make_model.brand = Some("Acme".into());
    identity.make_model.model = Some("UnitX".into());
    identity.make_model.hardware_revision = Some("A".into());
    identity.make_model.firmware_revision = Some("2.0".into());
    identity.ownership.manufacturer = Some("Acme Ltd".into());
    identity.ownership.owner = Some("BuyerOrg".into());
    identity.ownership.operator = Some("MaintainerX".into());
    identity.ownership.location = Some("Berlin".into());
    identity.conformity = ["CE", "RoHS", "UKCA"].map(String::from).into();

    let mut motor_binding = OntologyBinding::new("ISA-95");
    motor_binding.class_ids.insert("DriveUnit".into());
    let motor = PartClass::new(
        "A001",
        "Drive Motor",
        PartAttributes::Actuator(ActuatorAttributes {
            torque: Some(2.1),
            speed: Some(1750.0),
            duty_cycle: Some(0.7),
            voltage: Some(48.0),
            actuation_type: Some("electric".into()),
        }),
    )
    .with_binding(motor_binding);

    let mut sensor_binding = OntologyBinding::new("ECLASS");
    sensor_binding.class_ids.insert("0173-1#01-AGZ376#002".into());
    let sensor = PartClass::new(
        "S003",
        "Temp Sensor",
        PartAttributes::Sensor(SensorAttributes {
            sensor_type: Some("temperature".into()),
            range_min: Some(-40.0),
            range_max: Some(120.0),
            accuracy: Some(0.25),
            drift: Some(0.01),
            response_time: Some(7.0),
        }),
    )
    .with_binding(sensor_binding);

    let psu = PartClass::new(
        "P001",
        "PSU",
        PartAttributes::PowerConversion(PowerConversionAttributes {
            input_voltage: Some(230.0),
            output_voltage: Some(48.0),
            power_rating: Some(350.0),
            efficiency: Some(0.92),
        }),
    );

    let mut structure = StructureLayer {
        parts: vec![motor, sensor, psu],
        interfaces: vec![
            Interface {
                kind: InterfaceKind::Electrical,
                details: [("voltage".to_string(), json!(48)), ("connector".to_string(), json!("XT60"))].into(),
            },
            Interface {
                kind: InterfaceKind::Data,
                details: [("protocol".to_string(), json!("CAN"))].into(),
            },
        ],
        materials: vec![Material {
            substance: "iron".into(),
            cas_number: Some("7439-89-6".into()),
            mass_fraction: 0.7,
            recyclable: Some(true),
        }],
        bom_refs: vec!["XWZ-002".into()],
        ..Default::default()
    };
    structure.hierarchy.insert(
        "UnitX".into(),
        vec!["A001".into(), "S003".into(), "P001".into()],
    );

    let mut lifecycle = LifecycleLayer {
        manufacture: Some(ManufactureRecord {
            lot: Some("Batch77".into()),
            factory: Some("ACMEPlant".into()),
            date: NaiveDate::from_ymd_opt(2025, 3, 18),
            process: Some("injection".into()),
            co2e_kg: Some(27.3),
            ..Default::default()
        }),
        serviceability: ServicePlan {
            schedule: [("interval".to_string(), "1Y".to_string())].into(),
            repair_steps: vec!["Open housing".into(), "Replace motor".into()],
            repairability_score: Some(6.0),
            ..Default::default()
        },
        events: vec![LifecycleEvent {
            event_type: "install".into(),
            timestamp: utc("2025-04-01T00:00:00Z")?,
            details: Default::default(),
        }],
        end_of_life: EndOfLife {
            disassembly: vec!["Unplug connectors".into()],
            hazards: Vec::new(),
            recovery_routes: vec!["Recycle".into(), "Landfill".into()],
        },
        ..Default::default()
    };
    lifecycle.usage.counters.insert("hours".into(), 143.0);

    let mut risk = RiskLayer::default();
    risk.criticality.level = Some(CriticalityLevel::Safety);
    risk.criticality.life_limited = Some(false);
    risk.criticality.mtbf_hours = Some(20000.0);
    risk.fmea.push(FmeaEntry {
        failure_mode: "overheat".into(),
        effect: "shutdown".into(),
        mitigation: "cooling upgrade".into(),
    });
    risk.security.signing_keys.push("pubkey-xyz".into());
    risk.security.update_policy = Some("signed-only".into());

    let mut sustainability = SustainabilityLayer {
        mass_kg: Some(5.0),
        energy: [("standby".to_string(), 2.0), ("active".to_string(), 15.0)].into(),
        recycled_content: [("pcr_percent".to_string(), 39.0)].into(),
        ..Default::default()
    };
    sustainability.remanufacture.eligible = Some(true);
    sustainability.remanufacture.grade = Some("A".into());

    let provenance = ProvenanceLayer {
        signatures: vec![Signature {
            signer: "manufacturer".into(),
            certificate: "certABC".into(),
            timestamp: utc("2025-03-18T12:00:00Z")?,
        }],
        trace_links: vec!["EPCIS:event1".into(), "NFC:TAG773".into()],
    };

    Ok(Passport::new()
        .with_identity(identity)
        .with_structure(structure)
        .with_lifecycle(lifecycle)
        .with_risk(risk)
        .with_sustainability(sustainability)
        .with_provenance(provenance))
}
