//! Wire shapes of topology records

use gridmodel_core::{
    AcBus, AcBusType, Arc, Area, Bus, Component, DcBus, Example, LoadZone, Record, Shared,
    TopologyKind, Unit, ViolationKind,
};
use serde_json::json;

#[test]
fn dc_bus_emits_kind_free_flat_record() {
    let value = serde_json::to_value(DcBus::example()).unwrap();
    assert_eq!(value["name"], json!("ExampleBus"));
    assert_eq!(value["number"], json!(1));
    assert_eq!(value["bustype"], json!("PV"));
    assert_eq!(
        value["base_voltage"],
        json!({"magnitude": 20.0, "units": "kV"})
    );
    assert_eq!(value["area"]["name"], json!("New York"));
    assert!(value.get("kind").is_none());
    assert!(value.get("angle").is_none());
}

#[test]
fn bus_enum_is_tagged_by_kind() {
    let dc = serde_json::to_value(Bus::from(DcBus::example())).unwrap();
    let ac = serde_json::to_value(Bus::from(AcBus::example())).unwrap();
    assert_eq!(dc["kind"], json!("DCBus"));
    assert_eq!(ac["kind"], json!("ACBus"));
    assert_eq!(ac["voltage_limits"], json!({"min": 0.9, "max": 1.1}));

    let parsed: Bus = serde_json::from_value(ac).unwrap();
    assert_eq!(parsed.kind(), TopologyKind::AcBus);
    assert_eq!(parsed, Bus::from(AcBus::example()));
}

#[test]
fn untagged_bus_with_angle_is_ac() {
    let bus = Bus::from_value(json!({"number": 4, "angle": 0.2})).unwrap();
    assert!(bus.as_ac().is_some());
    let bus = Bus::from_value(json!({"number": 4})).unwrap();
    assert!(bus.as_dc().is_some());
}

#[test]
fn unknown_bus_kind_rejected() {
    let err = Bus::from_value(json!({"kind": "HVDCBus", "number": 4})).unwrap_err();
    assert!(matches!(
        err.violation("kind").unwrap().kind,
        ViolationKind::InvalidChoice { .. }
    ));
}

#[test]
fn dc_bus_rejects_angle() {
    let err = DcBus::from_value(json!({"number": 4, "angle": 0.2})).unwrap_err();
    assert_eq!(err.violation("angle").unwrap().kind, ViolationKind::UnknownField);
}

#[test]
fn base_voltage_input_forms() {
    let forms = [
        json!(13.8),
        json!("13.8 kV"),
        json!("13800 V"),
        json!({"magnitude": 13.8, "units": "kV"}),
    ];
    for form in forms {
        let bus = AcBus::from_value(json!({"number": 1, "base_voltage": form})).unwrap();
        let kv = bus.fields().base_voltage().unwrap().to_kilovolts();
        assert!((kv.value() - 13.8).abs() < 1e-9, "{:?}", form);
    }
}

#[test]
fn base_voltage_wrong_dimension_rejected() {
    let err = AcBus::from_value(json!({"number": 1, "base_voltage": "100 MW"})).unwrap_err();
    assert!(matches!(
        err.violation("base_voltage").unwrap().kind,
        ViolationKind::UnitMismatch { .. }
    ));

    let err = AcBus::from_value(json!({"number": 1, "base_voltage": "100 furlongs"})).unwrap_err();
    assert!(matches!(
        err.violation("base_voltage").unwrap().kind,
        ViolationKind::UnknownUnit { .. }
    ));
}

#[test]
fn voltage_limits_input_forms() {
    let bus = DcBus::from_value(json!({"number": 1, "voltage_limits": [0.95, 1.05]})).unwrap();
    let limits = bus.fields().voltage_limits().unwrap();
    assert_eq!((limits.min(), limits.max()), (0.95, 1.05));

    let err = DcBus::from_value(json!({
        "number": 1,
        "voltage_limits": {"min": 1.1, "max": 0.9}
    }))
    .unwrap_err();
    assert!(err.paths().any(|p| p.starts_with("voltage_limits")));
}

#[test]
fn bustype_tags_are_closed() {
    let bus = AcBus::from_value(json!({"number": 1, "bustype": "slack"})).unwrap();
    assert_eq!(bus.fields().bustype(), Some(AcBusType::Slack));

    let err = AcBus::from_value(json!({"number": 1, "bustype": "SWING"})).unwrap_err();
    match &err.violation("bustype").unwrap().kind {
        ViolationKind::InvalidChoice { allowed } => assert!(allowed.contains(&"PV")),
        other => panic!("unexpected violation: {:?}", other),
    }
}

#[test]
fn every_violation_is_reported_at_once() {
    let err = AcBus::from_value(json!({
        "number": 0,
        "bustype": "XX",
        "magnitude": -1.0,
        "angle": 2.0,
        "colour": "red"
    }))
    .unwrap_err();
    let mut paths: Vec<_> = err.paths().collect();
    paths.sort_unstable();
    assert_eq!(
        paths,
        vec!["angle", "bustype", "colour", "magnitude", "number"]
    );
    assert_eq!(err.entity(), "ACBus");
    assert!(err.to_string().starts_with("5 validation errors for ACBus"));
}

#[test]
fn strict_number_types() {
    let err = DcBus::from_value(json!({"number": "7"})).unwrap_err();
    assert!(matches!(
        err.violation("number").unwrap().kind,
        ViolationKind::TypeMismatch { .. }
    ));
    let err = DcBus::from_value(json!({"number": 1.5})).unwrap_err();
    assert!(err.violation("number").is_some());
}

#[test]
fn nested_membership_is_validated() {
    let err = DcBus::from_value(json!({
        "number": 1,
        "area": {"name": "North", "peak_active_power": -5.0}
    }))
    .unwrap_err();
    assert!(err.violation("area.peak_active_power").is_some());
}

#[test]
fn shared_membership_survives_serialization() {
    let area = Shared::new(Area::builder("North").peak_active_power(10.0).build().unwrap());
    let zone = Shared::new(LoadZone::builder("Zone A").build().unwrap());
    let a = DcBus::builder(1)
        .area(area.clone())
        .load_zone(zone.clone())
        .base_voltage(230.0 * Unit::KILOVOLT)
        .build()
        .unwrap();
    let b = DcBus::builder(2).area(area.clone()).build().unwrap();
    assert!(Shared::ptr_eq(a.fields().area().unwrap(), b.fields().area().unwrap()));

    let text = serde_json::to_string(&a).unwrap();
    let parsed: DcBus = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, a);
}

#[test]
fn arc_round_trip_keeps_direction() {
    let arc = Arc::new(
        Bus::from(DcBus::builder(3).build().unwrap()),
        Bus::from(AcBus::builder(8).angle(-0.3).build().unwrap()),
    );
    let value = serde_json::to_value(&arc).unwrap();
    assert_eq!(value["from"]["number"], json!(3));
    assert_eq!(value["to"]["number"], json!(8));

    let parsed = Arc::from_value(value).unwrap();
    assert_eq!(parsed, arc);
    assert_eq!(parsed.kind(), TopologyKind::Arc);
}

#[test]
fn non_mapping_input_rejected() {
    for value in [json!(null), json!(3), json!("Area"), json!([1, 2])] {
        let err = Area::from_value(value).unwrap_err();
        assert_eq!(err.entity(), "Area");
        assert_eq!(err.violations().len(), 1);
    }
}

#[test]
fn aggregation_kinds() {
    assert!(Area::example().kind().is_aggregation());
    assert!(LoadZone::example().kind().is_aggregation());
    assert!(DcBus::example().kind().is_bus());
    assert!(!Arc::example().kind().is_aggregation());
}
