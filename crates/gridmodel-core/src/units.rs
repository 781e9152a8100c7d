//! Unit safety for topology quantities.
//!
//! Two layers live here:
//!
//! - Fixed-unit newtypes ([`Megawatts`], [`Megavars`], [`Kilovolts`],
//!   [`PerUnit`], [`Radians`], [`Degrees`]) used for record fields whose unit
//!   is settled by the schema. Mixing them is a compile error.
//! - A closed unit registry ([`Unit`], [`Dimension`], [`Quantity`]) for inputs
//!   whose unit is only known at runtime, such as a base voltage that may
//!   arrive as `"13.8 kV"` or `"13800 V"`. [`Voltage`] is a quantity whose
//!   dimension has been checked.
//!
//! # Usage
//!
//! ```
//! use gridmodel_core::units::{Megawatts, Quantity, Unit, Voltage};
//!
//! let p = Megawatts(100.0) + Megawatts(20.0);
//! assert_eq!(p.value(), 120.0);
//!
//! let base = Voltage::try_from(13.8 * Unit::KILOVOLT).unwrap();
//! assert!((base.to_kilovolts().value() - 13.8).abs() < 1e-12);
//!
//! let q: Quantity = "13800 V".parse().unwrap();
//! assert!((q.to(Unit::KILOVOLT).unwrap().magnitude() - 13.8).abs() < 1e-12);
//! assert!(Voltage::try_from(5.0 * Unit::MEGAWATT).is_err());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Macro to implement common arithmetic operations for unit types
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            /// Create a new value
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Check if value is finite
            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }
    };
}

// =============================================================================
// Fixed-unit newtypes
// =============================================================================

/// Active power in megawatts (MW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

/// Reactive power in megavolt-amperes reactive (Mvar)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[repr(transparent)]
pub struct Megavars(pub f64);

impl_unit_ops!(Megavars, "Mvar");

/// Voltage magnitude as a multiple of the bus base voltage (pu)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[repr(transparent)]
pub struct PerUnit(pub f64);

impl_unit_ops!(PerUnit, "pu");

/// Voltage in kilovolts (kV)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[repr(transparent)]
pub struct Kilovolts(pub f64);

impl_unit_ops!(Kilovolts, "kV");

impl PerUnit {
    /// Convert to kilovolts given base voltage
    #[inline]
    pub fn to_kilovolts(self, base_kv: Kilovolts) -> Kilovolts {
        Kilovolts(self.0 * base_kv.0)
    }
}

/// Angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[repr(transparent)]
pub struct Radians(pub f64);

impl_unit_ops!(Radians, "rad");

/// Angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[repr(transparent)]
pub struct Degrees(pub f64);

impl_unit_ops!(Degrees, "°");

impl Radians {
    #[inline]
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0.to_degrees())
    }
}

impl Degrees {
    #[inline]
    pub fn to_radians(self) -> Radians {
        Radians(self.0.to_radians())
    }
}

// =============================================================================
// Unit registry
// =============================================================================

/// Physical dimension of a unit. Conversion is only defined within a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Voltage,
    ActivePower,
    ReactivePower,
    ApparentPower,
    Current,
    Frequency,
    Angle,
    Dimensionless,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Voltage => "voltage",
            Dimension::ActivePower => "active power",
            Dimension::ReactivePower => "reactive power",
            Dimension::ApparentPower => "apparent power",
            Dimension::Current => "current",
            Dimension::Frequency => "frequency",
            Dimension::Angle => "angle",
            Dimension::Dimensionless => "dimensionless",
        };
        f.write_str(name)
    }
}

/// Errors from parsing or converting quantities
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("expected a {expected} quantity, found {found}")]
    DimensionMismatch {
        expected: Dimension,
        found: Dimension,
    },

    #[error("malformed quantity '{0}'")]
    Malformed(String),
}

/// A unit from the closed registry: symbol, dimension and scale to the
/// dimension's base unit (V, W, var, VA, A, Hz, rad).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    symbol: &'static str,
    dimension: Dimension,
    scale: f64,
}

impl Unit {
    const fn new(symbol: &'static str, dimension: Dimension, scale: f64) -> Self {
        Self {
            symbol,
            dimension,
            scale,
        }
    }

    pub const VOLT: Unit = Unit::new("V", Dimension::Voltage, 1.0);
    pub const KILOVOLT: Unit = Unit::new("kV", Dimension::Voltage, 1e3);
    pub const MEGAVOLT: Unit = Unit::new("MV", Dimension::Voltage, 1e6);
    pub const WATT: Unit = Unit::new("W", Dimension::ActivePower, 1.0);
    pub const KILOWATT: Unit = Unit::new("kW", Dimension::ActivePower, 1e3);
    pub const MEGAWATT: Unit = Unit::new("MW", Dimension::ActivePower, 1e6);
    pub const VAR: Unit = Unit::new("var", Dimension::ReactivePower, 1.0);
    pub const KILOVAR: Unit = Unit::new("kvar", Dimension::ReactivePower, 1e3);
    pub const MEGAVAR: Unit = Unit::new("Mvar", Dimension::ReactivePower, 1e6);
    pub const VOLT_AMPERE: Unit = Unit::new("VA", Dimension::ApparentPower, 1.0);
    pub const KILOVOLT_AMPERE: Unit = Unit::new("kVA", Dimension::ApparentPower, 1e3);
    pub const MEGAVOLT_AMPERE: Unit = Unit::new("MVA", Dimension::ApparentPower, 1e6);
    pub const AMPERE: Unit = Unit::new("A", Dimension::Current, 1.0);
    pub const KILOAMPERE: Unit = Unit::new("kA", Dimension::Current, 1e3);
    pub const HERTZ: Unit = Unit::new("Hz", Dimension::Frequency, 1.0);
    pub const RADIAN: Unit = Unit::new("rad", Dimension::Angle, 1.0);
    pub const DEGREE: Unit = Unit::new("deg", Dimension::Angle, std::f64::consts::PI / 180.0);
    pub const PER_UNIT: Unit = Unit::new("pu", Dimension::Dimensionless, 1.0);

    /// Every registered unit, by canonical symbol.
    pub const ALL: [Unit; 18] = [
        Unit::VOLT,
        Unit::KILOVOLT,
        Unit::MEGAVOLT,
        Unit::WATT,
        Unit::KILOWATT,
        Unit::MEGAWATT,
        Unit::VAR,
        Unit::KILOVAR,
        Unit::MEGAVAR,
        Unit::VOLT_AMPERE,
        Unit::KILOVOLT_AMPERE,
        Unit::MEGAVOLT_AMPERE,
        Unit::AMPERE,
        Unit::KILOAMPERE,
        Unit::HERTZ,
        Unit::RADIAN,
        Unit::DEGREE,
        Unit::PER_UNIT,
    ];

    /// Resolves a symbol or long name (`"kV"`, `"kilovolts"`).
    pub fn lookup(name: &str) -> Result<Unit, UnitError> {
        REGISTRY
            .get(name.trim())
            .copied()
            .ok_or_else(|| UnitError::UnknownUnit(name.trim().to_string()))
    }

    pub fn symbol(self) -> &'static str {
        self.symbol
    }

    pub fn dimension(self) -> Dimension {
        self.dimension
    }

    pub fn is_compatible(self, other: Unit) -> bool {
        self.dimension == other.dimension
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol)
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol)
    }
}

static REGISTRY: Lazy<HashMap<&'static str, Unit>> = Lazy::new(|| {
    let aliases = [
        (Unit::VOLT, "volt"),
        (Unit::VOLT, "volts"),
        (Unit::KILOVOLT, "kilovolt"),
        (Unit::KILOVOLT, "kilovolts"),
        (Unit::MEGAVOLT, "megavolt"),
        (Unit::MEGAVOLT, "megavolts"),
        (Unit::WATT, "watt"),
        (Unit::WATT, "watts"),
        (Unit::KILOWATT, "kilowatt"),
        (Unit::KILOWATT, "kilowatts"),
        (Unit::MEGAWATT, "megawatt"),
        (Unit::MEGAWATT, "megawatts"),
        (Unit::VAR, "VAr"),
        (Unit::KILOVAR, "kVAr"),
        (Unit::MEGAVAR, "MVAr"),
        (Unit::MEGAVAR, "MVAR"),
        (Unit::VOLT_AMPERE, "volt_ampere"),
        (Unit::KILOVOLT_AMPERE, "kilovolt_ampere"),
        (Unit::MEGAVOLT_AMPERE, "megavolt_ampere"),
        (Unit::AMPERE, "ampere"),
        (Unit::AMPERE, "amperes"),
        (Unit::KILOAMPERE, "kiloampere"),
        (Unit::KILOAMPERE, "kiloamperes"),
        (Unit::HERTZ, "hertz"),
        (Unit::RADIAN, "radian"),
        (Unit::RADIAN, "radians"),
        (Unit::DEGREE, "degree"),
        (Unit::DEGREE, "degrees"),
        (Unit::DEGREE, "°"),
        (Unit::PER_UNIT, "p.u."),
        (Unit::PER_UNIT, "per_unit"),
    ];
    Unit::ALL
        .iter()
        .map(|unit| (unit.symbol, *unit))
        .chain(aliases.into_iter().map(|(unit, alias)| (alias, unit)))
        .collect()
});

/// A magnitude tagged with a registry unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quantity {
    magnitude: f64,
    #[serde(rename = "units")]
    unit: Unit,
}

impl Quantity {
    pub const fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    pub fn magnitude(self) -> f64 {
        self.magnitude
    }

    pub fn unit(self) -> Unit {
        self.unit
    }

    pub fn dimension(self) -> Dimension {
        self.unit.dimension
    }

    /// Converts to `target`, failing when the dimensions differ.
    pub fn to(self, target: Unit) -> Result<Quantity, UnitError> {
        if !self.unit.is_compatible(target) {
            return Err(UnitError::DimensionMismatch {
                expected: target.dimension,
                found: self.unit.dimension,
            });
        }
        Ok(Quantity::new(
            self.magnitude * self.unit.scale / target.scale,
            target,
        ))
    }

    /// Reads a bare number (in `default_unit`), a `"13.8 kV"` string, or a
    /// `{"magnitude": 13.8, "units": "kV"}` object.
    pub(crate) fn from_json(value: &Value, default_unit: Unit) -> Result<Quantity, UnitError> {
        match value {
            Value::Number(number) => number
                .as_f64()
                .map(|magnitude| Quantity::new(magnitude, default_unit))
                .ok_or_else(|| UnitError::Malformed(value.to_string())),
            Value::String(text) => text.parse(),
            Value::Object(fields) => {
                let magnitude = fields.get("magnitude").and_then(Value::as_f64);
                let units = fields.get("units").and_then(Value::as_str);
                match (magnitude, units, fields.len()) {
                    (Some(magnitude), Some(units), 2) => {
                        Ok(Quantity::new(magnitude, Unit::lookup(units)?))
                    }
                    _ => Err(UnitError::Malformed(value.to_string())),
                }
            }
            _ => Err(UnitError::Malformed(value.to_string())),
        }
    }
}

impl FromStr for Quantity {
    type Err = UnitError;

    /// Splits at the longest numeric prefix: `"13.8 kV"`, `"1e3kV"`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let split = (1..=text.len())
            .rev()
            .filter(|&i| text.is_char_boundary(i))
            .find_map(|i| {
                let magnitude = text[..i].trim_end().parse::<f64>().ok()?;
                Some((magnitude, text[i..].trim()))
            });
        match split {
            Some((magnitude, symbol)) if !symbol.is_empty() => {
                Ok(Quantity::new(magnitude, Unit::lookup(symbol)?))
            }
            _ => Err(UnitError::Malformed(text.to_string())),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit.symbol)
    }
}

impl Mul<Unit> for f64 {
    type Output = Quantity;
    fn mul(self, rhs: Unit) -> Self::Output {
        Quantity::new(self, rhs)
    }
}

/// A quantity known to carry the voltage dimension.
///
/// The unit it was supplied in is kept so that the record emits what it was
/// given; use [`Voltage::to_kilovolts`] for arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Voltage(Quantity);

impl Voltage {
    pub fn kilovolts(value: f64) -> Self {
        Voltage(Quantity::new(value, Unit::KILOVOLT))
    }

    pub fn quantity(self) -> Quantity {
        self.0
    }

    pub fn magnitude(self) -> f64 {
        self.0.magnitude
    }

    pub fn to_kilovolts(self) -> Kilovolts {
        Kilovolts(self.0.magnitude * self.0.unit.scale / Unit::KILOVOLT.scale)
    }
}

impl TryFrom<Quantity> for Voltage {
    type Error = UnitError;

    fn try_from(quantity: Quantity) -> Result<Self, Self::Error> {
        if quantity.dimension() != Dimension::Voltage {
            return Err(UnitError::DimensionMismatch {
                expected: Dimension::Voltage,
                found: quantity.dimension(),
            });
        }
        Ok(Voltage(quantity))
    }
}

impl fmt::Display for Voltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Tests
// =============================================================================
