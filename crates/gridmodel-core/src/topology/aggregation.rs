//! Grouping records: areas and load zones.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{AggregationTopology, Component, Example, Record, Topology, TopologyKind};
use crate::units::{Megavars, Megawatts};
use crate::validation::{FieldReader, ValidationError, Violations};

const NON_NEGATIVE: &str = "finite and greater than or equal to 0";
const FINITE: &str = "finite";

/// Both peak powers must be finite and non-negative; NaN fails.
fn check_peaks(violations: &mut Violations, active: f64, reactive: f64) -> bool {
    let active_ok = violations.check(
        active.is_finite() && active >= 0.0,
        "peak_active_power",
        active,
        NON_NEGATIVE,
    );
    let reactive_ok = violations.check(
        reactive.is_finite() && reactive >= 0.0,
        "peak_reactive_power",
        reactive,
        NON_NEGATIVE,
    );
    active_ok && reactive_ok
}

/// Collection of buses in a given region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Area {
    name: String,
    peak_active_power: Megawatts,
    peak_reactive_power: Megavars,
    load_response: f64,
}

impl Area {
    pub fn builder(name: impl Into<String>) -> AreaBuilder {
        AreaBuilder {
            name: name.into(),
            ..AreaBuilder::default()
        }
    }

    /// Load-frequency damping in MW/Hz: how much the area's load moves with
    /// frequency. Either sign is accepted.
    pub fn load_response(&self) -> f64 {
        self.load_response
    }
}

/// Builder for [`Area`]; unset powers default to zero.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct AreaBuilder {
    name: String,
    peak_active_power: f64,
    peak_reactive_power: f64,
    load_response: f64,
}

impl AreaBuilder {
    pub fn peak_active_power(mut self, mw: f64) -> Self {
        self.peak_active_power = mw;
        self
    }

    pub fn peak_reactive_power(mut self, mvar: f64) -> Self {
        self.peak_reactive_power = mvar;
        self
    }

    pub fn load_response(mut self, mw_per_hz: f64) -> Self {
        self.load_response = mw_per_hz;
        self
    }

    pub fn build(self) -> Result<Area, ValidationError> {
        let mut violations = Violations::default();
        let area = self.check(&mut violations);
        violations.finish(Area::TYPE_NAME, area)
    }

    fn check(self, violations: &mut Violations) -> Option<Area> {
        let peaks_ok = check_peaks(violations, self.peak_active_power, self.peak_reactive_power);
        let response_ok = violations.check(
            self.load_response.is_finite(),
            "load_response",
            self.load_response,
            FINITE,
        );
        (peaks_ok && response_ok).then(|| Area {
            name: self.name,
            peak_active_power: Megawatts(self.peak_active_power),
            peak_reactive_power: Megavars(self.peak_reactive_power),
            load_response: self.load_response,
        })
    }
}

impl Component for Area {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TopologyKind {
        TopologyKind::Area
    }
}

impl Topology for Area {}

impl AggregationTopology for Area {
    fn peak_active_power(&self) -> Megawatts {
        self.peak_active_power
    }

    fn peak_reactive_power(&self) -> Megavars {
        self.peak_reactive_power
    }
}

impl Record for Area {
    const TYPE_NAME: &'static str = "Area";

    fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut reader = FieldReader::new(fields);
        let builder = AreaBuilder {
            name: reader.text("name").unwrap_or_default(),
            peak_active_power: reader.real("peak_active_power").unwrap_or_default(),
            peak_reactive_power: reader.real("peak_reactive_power").unwrap_or_default(),
            load_response: reader.real("load_response").unwrap_or_default(),
        };
        let mut violations = reader.finish();
        let area = builder.check(&mut violations);
        violations.finish(Self::TYPE_NAME, area)
    }
}

impl_record_deserialize!(Area);

impl Example for Area {
    fn example() -> Self {
        Area {
            name: "New York".to_string(),
            peak_active_power: Megawatts(0.0),
            peak_reactive_power: Megavars(0.0),
            load_response: 0.0,
        }
    }
}

/// Collection of buses for electricity price analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadZone {
    name: String,
    peak_active_power: Megawatts,
    peak_reactive_power: Megavars,
}

impl LoadZone {
    pub fn builder(name: impl Into<String>) -> LoadZoneBuilder {
        LoadZoneBuilder {
            name: name.into(),
            ..LoadZoneBuilder::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
#[must_use]
pub struct LoadZoneBuilder {
    name: String,
    peak_active_power: f64,
    peak_reactive_power: f64,
}

impl LoadZoneBuilder {
    pub fn peak_active_power(mut self, mw: f64) -> Self {
        self.peak_active_power = mw;
        self
    }

    pub fn peak_reactive_power(mut self, mvar: f64) -> Self {
        self.peak_reactive_power = mvar;
        self
    }

    pub fn build(self) -> Result<LoadZone, ValidationError> {
        let mut violations = Violations::default();
        let zone = self.check(&mut violations);
        violations.finish(LoadZone::TYPE_NAME, zone)
    }

    fn check(self, violations: &mut Violations) -> Option<LoadZone> {
        check_peaks(violations, self.peak_active_power, self.peak_reactive_power).then(|| {
            LoadZone {
                name: self.name,
                peak_active_power: Megawatts(self.peak_active_power),
                peak_reactive_power: Megavars(self.peak_reactive_power),
            }
        })
    }
}

impl Component for LoadZone {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TopologyKind {
        TopologyKind::LoadZone
    }
}

impl Topology for LoadZone {}

impl AggregationTopology for LoadZone {
    fn peak_active_power(&self) -> Megawatts {
        self.peak_active_power
    }

    fn peak_reactive_power(&self) -> Megavars {
        self.peak_reactive_power
    }
}

impl Record for LoadZone {
    const TYPE_NAME: &'static str = "LoadZone";

    fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut reader = FieldReader::new(fields);
        let builder = LoadZoneBuilder {
            name: reader.text("name").unwrap_or_default(),
            peak_active_power: reader.real("peak_active_power").unwrap_or_default(),
            peak_reactive_power: reader.real("peak_reactive_power").unwrap_or_default(),
        };
        let mut violations = reader.finish();
        let zone = builder.check(&mut violations);
        violations.finish(Self::TYPE_NAME, zone)
    }
}

impl_record_deserialize!(LoadZone);

impl Example for LoadZone {
    fn example() -> Self {
        LoadZone {
            name: "ExampleLoadZone".to_string(),
            peak_active_power: Megawatts(0.0),
            peak_reactive_power: Megavars(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ViolationKind;
    use serde_json::json;

    #[test]
    fn test_area_defaults() {
        let area = Area::builder("North").build().unwrap();
        assert_eq!(area.name(), "North");
        assert_eq!(area.peak_active_power(), Megawatts(0.0));
        assert_eq!(area.peak_reactive_power(), Megavars(0.0));
        assert_eq!(area.load_response(), 0.0);
    }

    #[test]
    fn test_area_negative_load_response_allowed() {
        let area = Area::builder("North").load_response(-12.5).build().unwrap();
        assert_eq!(area.load_response(), -12.5);
    }

    #[test]
    fn test_area_reports_both_peaks() {
        let err = Area::builder("North")
            .peak_active_power(-1.0)
            .peak_reactive_power(-2.0)
            .build()
            .unwrap_err();
        assert_eq!(err.entity(), "Area");
        let paths: Vec<_> = err.paths().collect();
        assert_eq!(paths, vec!["peak_active_power", "peak_reactive_power"]);
        assert_eq!(err.violations()[1].value, json!(-2.0));
    }

    #[test]
    fn test_area_nan_peak_rejected() {
        assert!(Area::builder("North")
            .peak_active_power(f64::NAN)
            .build()
            .is_err());
    }

    #[test]
    fn test_area_non_finite_values_rejected() {
        let err = Area::builder("North")
            .peak_active_power(f64::INFINITY)
            .load_response(f64::NEG_INFINITY)
            .build()
            .unwrap_err();
        let paths: Vec<_> = err.paths().collect();
        assert_eq!(paths, vec!["peak_active_power", "load_response"]);
        assert!(matches!(
            err.violation("load_response").unwrap().kind,
            ViolationKind::OutOfRange { .. }
        ));
    }

    #[test]
    fn test_area_from_fields() {
        let area = Area::from_value(json!({
            "name": "North",
            "peak_active_power": 120,
            "peak_reactive_power": 40.5,
            "load_response": -3.0
        }))
        .unwrap();
        assert_eq!(area.peak_active_power(), Megawatts(120.0));
        assert_eq!(area.peak_reactive_power(), Megavars(40.5));
        assert_eq!(area.load_response(), -3.0);
    }

    #[test]
    fn test_area_rejects_unknown_and_mistyped_fields() {
        let err = Area::from_value(json!({
            "name": "North",
            "peak_active_power": "lots",
            "peak_active_pwr": 3.0
        }))
        .unwrap_err();
        assert_eq!(
            err.violation("peak_active_power").unwrap().kind,
            ViolationKind::TypeMismatch { expected: "number" }
        );
        assert_eq!(
            err.violation("peak_active_pwr").unwrap().kind,
            ViolationKind::UnknownField
        );
    }

    #[test]
    fn test_load_zone_has_no_load_response() {
        let err = LoadZone::from_value(json!({"name": "Zone A", "load_response": 1.0}))
            .unwrap_err();
        assert_eq!(err.entity(), "LoadZone");
        assert_eq!(
            err.violation("load_response").unwrap().kind,
            ViolationKind::UnknownField
        );
    }

    #[test]
    fn test_load_zone_negative_peak_rejected() {
        let err = LoadZone::builder("Zone A")
            .peak_reactive_power(-0.1)
            .build()
            .unwrap_err();
        assert!(err.violation("peak_reactive_power").is_some());
        assert!(err.violation("peak_active_power").is_none());
    }

    #[test]
    fn test_load_zone_infinite_peak_rejected() {
        let err = LoadZone::builder("Zone A")
            .peak_reactive_power(f64::INFINITY)
            .build()
            .unwrap_err();
        assert!(matches!(
            err.violation("peak_reactive_power").unwrap().kind,
            ViolationKind::OutOfRange { .. }
        ));
    }

    #[test]
    fn test_accepted_records_survive_round_trip() {
        let area = Area::builder("North")
            .peak_active_power(1.0e300)
            .peak_reactive_power(f64::MIN_POSITIVE)
            .load_response(-2.5)
            .build()
            .unwrap();
        assert!(area.validate().is_ok());
        let parsed: Area = serde_json::from_value(serde_json::to_value(&area).unwrap()).unwrap();
        assert_eq!(parsed, area);
    }

    #[test]
    fn test_examples_validate() {
        assert_eq!(Area::example().name(), "New York");
        assert!(Area::example().validate().is_ok());
        assert_eq!(LoadZone::example().name(), "ExampleLoadZone");
        assert!(LoadZone::example().validate().is_ok());
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(Area::builder("North").build().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "North",
                "peak_active_power": 0.0,
                "peak_reactive_power": 0.0,
                "load_response": 0.0
            })
        );
    }

    #[test]
    fn test_deserialize_goes_through_validation() {
        let parsed: Result<LoadZone, _> =
            serde_json::from_str(r#"{"name": "Zone A", "peak_active_power": -4}"#);
        assert!(parsed.is_err());
        let parsed: LoadZone = serde_json::from_str(r#"{"name": "Zone A"}"#).unwrap();
        assert_eq!(parsed.name(), "Zone A");
    }
}
