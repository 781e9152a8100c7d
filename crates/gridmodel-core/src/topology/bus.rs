//! Buses: electrical nodes with identity, role, group membership and
//! voltage characteristics.
//!
//! [`BusFields`] holds what every bus carries; [`DcBus`] and [`AcBus`] embed
//! it, and [`Bus`] is the closed sum used wherever either variant may appear
//! (arc endpoints).

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde_json::{json, Map, Number, Value};

use super::{Area, Component, Example, LoadZone, Record, Shared, Topology, TopologyKind};
use crate::enums::AcBusType;
use crate::limits::MinMax;
use crate::units::{PerUnit, Quantity, Radians, Unit, UnitError, Voltage};
use crate::validation::{FieldReader, ValidationError, ViolationKind, Violations};

/// Exclusive bound on `|angle|` for AC buses, in radians (just above π/2).
pub const ANGLE_LIMIT_RAD: f64 = 1.571;

const NON_NEGATIVE: &str = "finite and greater than or equal to 0";
const POSITIVE: &str = "greater than 0";
const FINITE_POSITIVE: &str = "finite and greater than 0";
const ANGLE_RANGE: &str = "strictly between -1.571 and 1.571";

/// Bus identification number; always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BusNumber(u64);

impl BusNumber {
    /// `None` for zero and negative numbers.
    #[inline]
    pub fn new(value: i64) -> Option<Self> {
        u64::try_from(value).ok().and_then(Self::from_u64)
    }

    /// `None` for zero; covers the numbers above `i64::MAX`.
    #[inline]
    pub fn from_u64(value: u64) -> Option<Self> {
        (value > 0).then_some(BusNumber(value))
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BusNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attributes common to every bus. Optional fields stay `None` when not
/// supplied; absence means "unknown", never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusFields {
    name: String,
    number: BusNumber,
    bustype: Option<AcBusType>,
    area: Option<Shared<Area>>,
    load_zone: Option<Shared<LoadZone>>,
    voltage_limits: Option<MinMax>,
    base_voltage: Option<Voltage>,
    magnitude: Option<PerUnit>,
}

impl BusFields {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> BusNumber {
        self.number
    }

    pub fn bustype(&self) -> Option<AcBusType> {
        self.bustype
    }

    pub fn area(&self) -> Option<&Shared<Area>> {
        self.area.as_ref()
    }

    pub fn load_zone(&self) -> Option<&Shared<LoadZone>> {
        self.load_zone.as_ref()
    }

    /// Per-unit voltage limits.
    pub fn voltage_limits(&self) -> Option<MinMax> {
        self.voltage_limits
    }

    pub fn base_voltage(&self) -> Option<Voltage> {
        self.base_voltage
    }

    /// Voltage magnitude as a multiple of `base_voltage`.
    pub fn magnitude(&self) -> Option<PerUnit> {
        self.magnitude
    }
}

/// Unchecked inputs for [`BusFields`].
#[derive(Debug, Clone, Default)]
struct BusSpec {
    name: String,
    /// `None` only on the mapping path, where the reader has already
    /// reported the problem.
    number: Option<Number>,
    bustype: Option<AcBusType>,
    area: Option<Shared<Area>>,
    load_zone: Option<Shared<LoadZone>>,
    voltage_limits: Option<(f64, f64)>,
    base_voltage: Option<Quantity>,
    magnitude: Option<f64>,
}

impl BusSpec {
    fn read(reader: &mut FieldReader<'_>) -> BusSpec {
        BusSpec {
            name: reader.text("name").unwrap_or_default(),
            number: reader.required_integer("number"),
            bustype: reader.choice("bustype", AcBusType::available(), |tag| tag.parse().ok()),
            area: reader.nested("area", Area::from_json).map(Shared::new),
            load_zone: reader
                .nested("load_zone", LoadZone::from_json)
                .map(Shared::new),
            voltage_limits: reader
                .nested("voltage_limits", MinMax::from_json)
                .map(|limits| (limits.min(), limits.max())),
            base_voltage: reader.quantity("base_voltage", Unit::KILOVOLT),
            magnitude: reader.real("magnitude"),
        }
    }

    fn check(self, violations: &mut Violations) -> Option<BusFields> {
        let before = violations.len();

        let number = self.number.and_then(|raw| {
            let number = raw.as_u64().and_then(BusNumber::from_u64);
            violations.check(number.is_some(), "number", Value::Number(raw), POSITIVE);
            number
        });
        let voltage_limits = self.voltage_limits.and_then(|(min, max)| {
            MinMax::new(min, max)
                .map_err(|err| violations.nest("voltage_limits", err))
                .ok()
        });
        let base_voltage = self
            .base_voltage
            .and_then(|quantity| check_base_voltage(violations, quantity));
        if let Some(magnitude) = self.magnitude {
            violations.check(
                magnitude.is_finite() && magnitude >= 0.0,
                "magnitude",
                magnitude,
                NON_NEGATIVE,
            );
        }

        let number = number?;
        if violations.len() > before {
            return None;
        }
        Some(BusFields {
            name: self.name,
            number,
            bustype: self.bustype,
            area: self.area,
            load_zone: self.load_zone,
            voltage_limits,
            base_voltage,
            magnitude: self.magnitude.map(PerUnit),
        })
    }
}

/// Must be a voltage-dimension quantity with a finite, positive magnitude.
fn check_base_voltage(violations: &mut Violations, quantity: Quantity) -> Option<Voltage> {
    let value = json!({
        "magnitude": quantity.magnitude(),
        "units": quantity.unit().symbol(),
    });
    match Voltage::try_from(quantity) {
        Ok(voltage) => violations
            .check(
                voltage.magnitude().is_finite() && voltage.magnitude() > 0.0,
                "base_voltage",
                value,
                FINITE_POSITIVE,
            )
            .then_some(voltage),
        Err(UnitError::DimensionMismatch { expected, found }) => {
            violations.push(
                "base_voltage",
                value,
                ViolationKind::UnitMismatch { expected, found },
            );
            None
        }
        Err(_) => {
            violations.push(
                "base_voltage",
                value,
                ViolationKind::TypeMismatch {
                    expected: "voltage quantity",
                },
            );
            None
        }
    }
}

fn finish_dc(spec: BusSpec, mut violations: Violations) -> Result<DcBus, ValidationError> {
    let fields = spec.check(&mut violations);
    violations.finish(DcBus::TYPE_NAME, fields.map(|fields| DcBus { fields }))
}

fn finish_ac(
    spec: BusSpec,
    angle: Option<f64>,
    mut violations: Violations,
) -> Result<AcBus, ValidationError> {
    let fields = spec.check(&mut violations);
    let angle_ok = angle.map_or(true, |angle| {
        violations.check(
            -ANGLE_LIMIT_RAD < angle && angle < ANGLE_LIMIT_RAD,
            "angle",
            angle,
            ANGLE_RANGE,
        )
    });
    let bus = fields.filter(|_| angle_ok).map(|fields| AcBus {
        fields,
        angle: angle.map(Radians),
    });
    violations.finish(AcBus::TYPE_NAME, bus)
}

/// Builder shared by [`DcBus`] and [`AcBus`]; `T` selects which one
/// [`build`](BusBuilder::build) produces.
#[derive(Debug, Clone)]
#[must_use]
pub struct BusBuilder<T> {
    spec: BusSpec,
    angle: Option<f64>,
    record: PhantomData<fn() -> T>,
}

impl<T> BusBuilder<T> {
    fn new(number: i64) -> Self {
        Self {
            spec: BusSpec {
                number: Some(Number::from(number)),
                ..BusSpec::default()
            },
            angle: None,
            record: PhantomData,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.spec.name = name.into();
        self
    }

    pub fn bustype(mut self, bustype: AcBusType) -> Self {
        self.spec.bustype = Some(bustype);
        self
    }

    pub fn area(mut self, area: impl Into<Shared<Area>>) -> Self {
        self.spec.area = Some(area.into());
        self
    }

    pub fn load_zone(mut self, load_zone: impl Into<Shared<LoadZone>>) -> Self {
        self.spec.load_zone = Some(load_zone.into());
        self
    }

    /// Per-unit limits; checked for `min <= max` on build.
    pub fn voltage_limits(mut self, min: f64, max: f64) -> Self {
        self.spec.voltage_limits = Some((min, max));
        self
    }

    /// Any registry quantity; must be a positive voltage on build.
    pub fn base_voltage(mut self, base_voltage: Quantity) -> Self {
        self.spec.base_voltage = Some(base_voltage);
        self
    }

    pub fn magnitude(mut self, per_unit: f64) -> Self {
        self.spec.magnitude = Some(per_unit);
        self
    }
}

impl BusBuilder<DcBus> {
    pub fn build(self) -> Result<DcBus, ValidationError> {
        finish_dc(self.spec, Violations::default())
    }
}

impl BusBuilder<AcBus> {
    /// Voltage angle in radians.
    pub fn angle(mut self, radians: f64) -> Self {
        self.angle = Some(radians);
        self
    }

    pub fn build(self) -> Result<AcBus, ValidationError> {
        finish_ac(self.spec, self.angle, Violations::default())
    }
}

/// Power-system DC bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcBus {
    #[serde(flatten)]
    fields: BusFields,
}

impl DcBus {
    pub fn builder(number: i64) -> BusBuilder<DcBus> {
        BusBuilder::new(number)
    }

    pub fn fields(&self) -> &BusFields {
        &self.fields
    }
}

impl Component for DcBus {
    fn name(&self) -> &str {
        &self.fields.name
    }

    fn kind(&self) -> TopologyKind {
        TopologyKind::DcBus
    }
}

impl Topology for DcBus {}

impl Record for DcBus {
    const TYPE_NAME: &'static str = "DCBus";

    fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut reader = FieldReader::new(fields);
        let spec = BusSpec::read(&mut reader);
        finish_dc(spec, reader.finish())
    }
}

impl_record_deserialize!(DcBus);

impl Example for DcBus {
    fn example() -> Self {
        DcBus {
            fields: BusFields {
                name: "ExampleBus".to_string(),
                number: BusNumber(1),
                bustype: Some(AcBusType::Pv),
                area: Some(Shared::new(Area::example())),
                load_zone: Some(Shared::new(LoadZone::example())),
                voltage_limits: None,
                base_voltage: Some(Voltage::kilovolts(20.0)),
                magnitude: None,
            },
        }
    }
}

/// Power-system AC bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcBus {
    #[serde(flatten)]
    fields: BusFields,
    angle: Option<Radians>,
}

impl AcBus {
    pub fn builder(number: i64) -> BusBuilder<AcBus> {
        BusBuilder::new(number)
    }

    pub fn fields(&self) -> &BusFields {
        &self.fields
    }

    /// Voltage angle, inside `(-ANGLE_LIMIT_RAD, ANGLE_LIMIT_RAD)`.
    pub fn angle(&self) -> Option<Radians> {
        self.angle
    }
}

impl Component for AcBus {
    fn name(&self) -> &str {
        &self.fields.name
    }

    fn kind(&self) -> TopologyKind {
        TopologyKind::AcBus
    }
}

impl Topology for AcBus {}

impl Record for AcBus {
    const TYPE_NAME: &'static str = "ACBus";

    fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut reader = FieldReader::new(fields);
        let spec = BusSpec::read(&mut reader);
        let angle = reader.real("angle");
        finish_ac(spec, angle, reader.finish())
    }
}

impl_record_deserialize!(AcBus);

impl Example for AcBus {
    fn example() -> Self {
        AcBus {
            fields: BusFields {
                name: "ExampleBus".to_string(),
                number: BusNumber(1),
                bustype: Some(AcBusType::Pv),
                area: Some(Shared::new(Area::example())),
                load_zone: Some(Shared::new(LoadZone::example())),
                voltage_limits: MinMax::new(0.9, 1.1).ok(),
                base_voltage: Some(Voltage::kilovolts(13.0)),
                magnitude: None,
            },
            angle: None,
        }
    }
}

/// Either bus variant. Emitted with a `"kind"` tag (`"DCBus"` / `"ACBus"`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Bus {
    #[serde(rename = "DCBus")]
    Dc(DcBus),
    #[serde(rename = "ACBus")]
    Ac(AcBus),
}

impl Bus {
    pub fn fields(&self) -> &BusFields {
        match self {
            Bus::Dc(bus) => &bus.fields,
            Bus::Ac(bus) => &bus.fields,
        }
    }

    pub fn number(&self) -> BusNumber {
        self.fields().number
    }

    /// Always `None` for DC buses.
    pub fn angle(&self) -> Option<Radians> {
        match self {
            Bus::Dc(_) => None,
            Bus::Ac(bus) => bus.angle,
        }
    }

    pub fn as_ac(&self) -> Option<&AcBus> {
        match self {
            Bus::Ac(bus) => Some(bus),
            Bus::Dc(_) => None,
        }
    }

    pub fn as_dc(&self) -> Option<&DcBus> {
        match self {
            Bus::Dc(bus) => Some(bus),
            Bus::Ac(_) => None,
        }
    }
}

impl From<DcBus> for Bus {
    fn from(bus: DcBus) -> Self {
        Bus::Dc(bus)
    }
}

impl From<AcBus> for Bus {
    fn from(bus: AcBus) -> Self {
        Bus::Ac(bus)
    }
}

impl Component for Bus {
    fn name(&self) -> &str {
        &self.fields().name
    }

    fn kind(&self) -> TopologyKind {
        match self {
            Bus::Dc(_) => TopologyKind::DcBus,
            Bus::Ac(_) => TopologyKind::AcBus,
        }
    }
}

impl Topology for Bus {}

impl Record for Bus {
    const TYPE_NAME: &'static str = "Bus";

    /// Dispatches on `"kind"`; without it, a mapping carrying `angle` is an
    /// AC bus and anything else a DC bus.
    fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let has_angle = fields.get("angle").is_some_and(|angle| !angle.is_null());
        let kind = match fields.get("kind") {
            None | Some(Value::Null) if has_angle => TopologyKind::AcBus,
            None | Some(Value::Null) => TopologyKind::DcBus,
            Some(Value::String(tag)) if tag == "ACBus" => TopologyKind::AcBus,
            Some(Value::String(tag)) if tag == "DCBus" => TopologyKind::DcBus,
            Some(other) => {
                return Err(ValidationError::single(
                    Self::TYPE_NAME,
                    "kind",
                    other.clone(),
                    ViolationKind::InvalidChoice {
                        allowed: vec!["ACBus", "DCBus"],
                    },
                ))
            }
        };
        let mut rest = fields.clone();
        rest.remove("kind");
        match kind {
            TopologyKind::AcBus => AcBus::from_fields(&rest).map(Bus::Ac),
            _ => DcBus::from_fields(&rest).map(Bus::Dc),
        }
    }
}

impl_record_deserialize!(Bus);
