//! Bounded numeric pairs.

use serde::Serialize;
use serde_json::{json, Value};

use crate::validation::{FieldReader, ValidationError, Violations, ViolationKind};

/// A `min <= max` pair, e.g. per-unit voltage limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinMax {
    min: f64,
    max: f64,
}

impl MinMax {
    pub const TYPE_NAME: &'static str = "MinMax";

    pub fn new(min: f64, max: f64) -> Result<Self, ValidationError> {
        let mut violations = Violations::default();
        // NaN on either side fails the comparison
        let ordered = violations.check(
            min.is_finite() && max.is_finite() && min <= max,
            "",
            json!({ "min": min, "max": max }),
            "finite and ordered with min <= max",
        );
        violations.finish(Self::TYPE_NAME, ordered.then_some(MinMax { min, max }))
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Inclusive on both ends.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Accepts `{"min": a, "max": b}` or `[a, b]`.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(fields) => {
                let mut reader = FieldReader::new(fields);
                let min = reader.real("min");
                let max = reader.real("max");
                let mut violations = reader.finish();
                for key in ["min", "max"] {
                    if fields.get(key).map_or(true, Value::is_null) {
                        violations.push(key, Value::Null, ViolationKind::Missing);
                    }
                }
                match (min, max) {
                    (Some(min), Some(max)) if violations.is_empty() => MinMax::new(min, max),
                    _ => violations.finish(Self::TYPE_NAME, None),
                }
            }
            Value::Array(items) => match items.as_slice() {
                [min, max] => match (min.as_f64(), max.as_f64()) {
                    (Some(min), Some(max)) => MinMax::new(min, max),
                    _ => Err(pair_mismatch(value)),
                },
                _ => Err(pair_mismatch(value)),
            },
            _ => Err(pair_mismatch(value)),
        }
    }
}

fn pair_mismatch(value: &Value) -> ValidationError {
    ValidationError::single(
        MinMax::TYPE_NAME,
        "",
        value.clone(),
        ViolationKind::TypeMismatch {
            expected: "{\"min\", \"max\"} object or [min, max] pair",
        },
    )
}
