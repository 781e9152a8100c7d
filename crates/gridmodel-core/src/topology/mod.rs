//! Topology records: areas, load zones, buses and the arcs between them.
//!
//! Every record is built in one step and is read-only afterwards. There are
//! two ways in:
//!
//! - typed builders (`Area::builder("North").peak_active_power(120.0).build()`)
//! - mappings, through [`Record::from_fields`] / [`Record::from_value`] or
//!   plain `serde` deserialization, which takes the same path.
//!
//! Both collect every violated constraint before failing with a
//! [`ValidationError`](crate::ValidationError).
//!
//! Records refer to each other through [`Shared`] handles: a bus does not own
//! its area, an arc does not own its buses.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::units::{Megavars, Megawatts};
use crate::validation::{expect_object, ValidationError, ViolationKind};

/// Implements `Deserialize` by routing through [`Record::from_value`] so that
/// deserialization can never skip validation.
macro_rules! impl_record_deserialize {
    ($type:ty) => {
        impl<'de> serde::Deserialize<'de> for $type {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                <$type as $crate::topology::Record>::from_value(value)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

mod aggregation;
mod arc;
mod bus;

pub use aggregation::{Area, AreaBuilder, LoadZone, LoadZoneBuilder};
pub use arc::Arc;
pub use bus::{AcBus, Bus, BusBuilder, BusFields, BusNumber, DcBus, ANGLE_LIMIT_RAD};

/// Shared, read-only handle between records.
pub type Shared<T> = std::sync::Arc<T>;

/// Concrete record type, for capability checks without downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TopologyKind {
    Area,
    LoadZone,
    #[serde(rename = "DCBus")]
    DcBus,
    #[serde(rename = "ACBus")]
    AcBus,
    Arc,
}

impl TopologyKind {
    pub const ALL: [TopologyKind; 5] = [
        TopologyKind::Area,
        TopologyKind::LoadZone,
        TopologyKind::DcBus,
        TopologyKind::AcBus,
        TopologyKind::Arc,
    ];

    /// External type name, as used in error messages and `kind` tags.
    pub fn type_name(self) -> &'static str {
        match self {
            TopologyKind::Area => "Area",
            TopologyKind::LoadZone => "LoadZone",
            TopologyKind::DcBus => "DCBus",
            TopologyKind::AcBus => "ACBus",
            TopologyKind::Arc => "Arc",
        }
    }

    /// Grouping records (areas and load zones).
    pub fn is_aggregation(self) -> bool {
        matches!(self, TopologyKind::Area | TopologyKind::LoadZone)
    }

    pub fn is_bus(self) -> bool {
        matches!(self, TopologyKind::DcBus | TopologyKind::AcBus)
    }
}

impl std::fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Identity shared by every record.
pub trait Component {
    /// Name within the containing collection. May be empty.
    fn name(&self) -> &str;

    fn kind(&self) -> TopologyKind;
}

/// A record describing network structure.
pub trait Topology: Component {}

/// A record grouping buses for aggregation (regional or price analysis).
pub trait AggregationTopology: Topology {
    fn peak_active_power(&self) -> Megawatts;

    fn peak_reactive_power(&self) -> Megavars;
}

/// Construction from a field mapping.
pub trait Record: Component + Serialize + Sized {
    /// Name reported in [`ValidationError::entity`].
    const TYPE_NAME: &'static str;

    /// Builds the record from `fields`, rejecting unknown keys.
    fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError>;

    fn from_json(value: &Value) -> Result<Self, ValidationError> {
        Self::from_fields(expect_object(Self::TYPE_NAME, value)?)
    }

    fn from_value(value: Value) -> Result<Self, ValidationError> {
        Self::from_json(&value)
    }

    /// Re-checks an existing record by feeding its external representation
    /// back through [`Record::from_value`].
    fn validate(&self) -> Result<(), ValidationError> {
        let value = serde_json::to_value(self).map_err(|_| {
            ValidationError::single(
                Self::TYPE_NAME,
                "",
                Value::Null,
                ViolationKind::TypeMismatch {
                    expected: "JSON-representable record",
                },
            )
        })?;
        Self::from_value(value).map(|_| ())
    }
}

/// A canonical, fully valid instance for tests and documentation.
pub trait Example {
    fn example() -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_capabilities() {
        let aggregations: Vec<_> = TopologyKind::ALL
            .into_iter()
            .filter(|kind| kind.is_aggregation())
            .collect();
        assert_eq!(aggregations, vec![TopologyKind::Area, TopologyKind::LoadZone]);

        let buses: Vec<_> = TopologyKind::ALL
            .into_iter()
            .filter(|kind| kind.is_bus())
            .collect();
        assert_eq!(buses, vec![TopologyKind::DcBus, TopologyKind::AcBus]);
        assert!(!TopologyKind::Arc.is_bus());
    }

    #[test]
    fn test_kind_serializes_as_type_name() {
        for kind in TopologyKind::ALL {
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::json!(kind.type_name())
            );
        }
    }

    #[test]
    fn test_components_through_trait_objects() {
        let records: Vec<Box<dyn Component>> = vec![
            Box::new(Area::example()),
            Box::new(LoadZone::example()),
            Box::new(DcBus::example()),
            Box::new(AcBus::example()),
            Box::new(Arc::example()),
        ];
        let kinds: Vec<_> = records.iter().map(|record| record.kind()).collect();
        assert_eq!(kinds, TopologyKind::ALL.to_vec());
        assert_eq!(records[4].name(), "");
    }

    #[test]
    fn test_aggregation_capability() {
        fn total_peak(groups: &[&dyn AggregationTopology]) -> Megawatts {
            groups
                .iter()
                .fold(Megawatts(0.0), |sum, group| sum + group.peak_active_power())
        }

        let area = Area::builder("North").peak_active_power(120.0).build().unwrap();
        let zone = LoadZone::builder("Zone A")
            .peak_active_power(30.0)
            .build()
            .unwrap();
        assert_eq!(total_peak(&[&area, &zone]), Megawatts(150.0));
    }
}
