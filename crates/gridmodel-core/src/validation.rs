//! Field-level validation for topology records.
//!
//! Every constructor in this crate funnels through the same two pieces:
//!
//! - `Violations`, an accumulator that collects every failed constraint
//!   before deciding whether a record may be produced, and
//! - `FieldReader`, a strict reader over a JSON mapping that records type
//!   mismatches and, on `FieldReader::finish`, every key nobody asked for.
//!
//! The public face is [`ValidationError`]: the record's type name plus one
//! [`FieldViolation`] per offending field.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::{debug, trace};

use crate::units::{Dimension, Quantity, Unit, UnitError};

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required field was not supplied
    Missing,
    /// The field is not part of the record's schema
    UnknownField,
    /// The value has the wrong JSON shape
    TypeMismatch { expected: &'static str },
    /// The value is of the right type but violates a numeric constraint
    OutOfRange { constraint: String },
    /// A quantity was expressed in a unit of the wrong dimension
    UnitMismatch {
        expected: Dimension,
        found: Dimension,
    },
    /// A quantity named a unit outside the registry
    UnknownUnit { symbol: String },
    /// A categorical value outside its closed set
    InvalidChoice { allowed: Vec<&'static str> },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Missing => write!(f, "field required"),
            ViolationKind::UnknownField => write!(f, "extra field not permitted"),
            ViolationKind::TypeMismatch { expected } => write!(f, "expected {}", expected),
            ViolationKind::OutOfRange { constraint } => write!(f, "must be {}", constraint),
            ViolationKind::UnitMismatch { expected, found } => {
                write!(f, "expected a {} quantity, found {}", expected, found)
            }
            ViolationKind::UnknownUnit { symbol } => write!(f, "unknown unit '{}'", symbol),
            ViolationKind::InvalidChoice { allowed } => {
                write!(f, "expected one of {}", allowed.join(", "))
            }
        }
    }
}

/// One rejected field: where it sits, what was supplied, and why it failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    /// Dotted path from the record root (`area.peak_active_power`); empty
    /// when the record itself is at fault.
    pub path: String,
    /// The rejected input (`null` for missing fields)
    pub value: Value,
    pub kind: ViolationKind,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() {
            "(record)"
        } else {
            self.path.as_str()
        };
        match self.kind {
            ViolationKind::Missing => write!(f, "{}: {}", path, self.kind),
            _ => write!(f, "{}: {} (got {})", path, self.kind, self.value),
        }
    }
}

/// Construction of a record failed; lists every offending field.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{}", render(.entity, .violations))]
pub struct ValidationError {
    entity: &'static str,
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub(crate) fn single(
        entity: &'static str,
        path: impl Into<String>,
        value: Value,
        kind: ViolationKind,
    ) -> Self {
        Self {
            entity,
            violations: vec![FieldViolation {
                path: path.into(),
                value,
                kind,
            }],
        }
    }

    /// Type name of the record that failed (`"Area"`, `"ACBus"`, ...).
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// First violation recorded at exactly `path`.
    pub fn violation(&self, path: &str) -> Option<&FieldViolation> {
        self.violations.iter().find(|v| v.path == path)
    }

    /// Paths of all offending fields, in the order they were checked.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.path.as_str())
    }
}

/// `N validation error(s) for Entity: a; b`
fn render(entity: &str, violations: &[FieldViolation]) -> String {
    let count = violations.len();
    let listed: Vec<String> = violations.iter().map(ToString::to_string).collect();
    format!(
        "{} validation error{} for {}: {}",
        count,
        if count == 1 { "" } else { "s" },
        entity,
        listed.join("; ")
    )
}

/// Returns the mapping inside `value`, or a record-level type mismatch.
pub(crate) fn expect_object<'v>(
    entity: &'static str,
    value: &'v Value,
) -> Result<&'v Map<String, Value>, ValidationError> {
    value.as_object().ok_or_else(|| {
        ValidationError::single(
            entity,
            "",
            value.clone(),
            ViolationKind::TypeMismatch { expected: "object" },
        )
    })
}

fn join_path(prefix: &str, inner: &str) -> String {
    match (prefix.is_empty(), inner.is_empty()) {
        (true, _) => inner.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}.{}", prefix, inner),
    }
}

/// Accumulates violations while a record is being checked.
#[derive(Debug, Default)]
pub(crate) struct Violations {
    items: Vec<FieldViolation>,
}

impl Violations {
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn push(&mut self, path: impl Into<String>, value: Value, kind: ViolationKind) {
        self.items.push(FieldViolation {
            path: path.into(),
            value,
            kind,
        });
    }

    /// Records an out-of-range violation unless `ok`; returns `ok`.
    pub(crate) fn check(
        &mut self,
        ok: bool,
        path: &str,
        value: impl Into<Value>,
        constraint: &str,
    ) -> bool {
        if !ok {
            self.push(
                path,
                value.into(),
                ViolationKind::OutOfRange {
                    constraint: constraint.to_string(),
                },
            );
        }
        ok
    }

    /// Re-roots the violations of a nested record under `prefix`.
    pub(crate) fn nest(&mut self, prefix: &str, err: ValidationError) {
        for violation in err.violations {
            self.items.push(FieldViolation {
                path: join_path(prefix, &violation.path),
                ..violation
            });
        }
    }

    /// Yields the record only when nothing was violated.
    pub(crate) fn finish<T>(
        self,
        entity: &'static str,
        record: Option<T>,
    ) -> Result<T, ValidationError> {
        match record {
            Some(record) if self.items.is_empty() => {
                trace!(entity, "accepted topology record");
                Ok(record)
            }
            _ => {
                debug!(
                    entity,
                    violations = self.items.len(),
                    "rejected topology record"
                );
                Err(ValidationError {
                    entity,
                    violations: self.items,
                })
            }
        }
    }
}

/// Strict reader over the mapping handed to a record constructor.
///
/// Absent keys and explicit `null` both read as `None`. Every key looked up
/// (or explicitly discarded) is remembered so that [`FieldReader::finish`]
/// can reject the rest as unknown.
pub(crate) struct FieldReader<'a> {
    fields: &'a Map<String, Value>,
    consumed: BTreeSet<&'static str>,
    violations: Violations,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(fields: &'a Map<String, Value>) -> Self {
        Self {
            fields,
            consumed: BTreeSet::new(),
            violations: Violations::default(),
        }
    }

    fn get(&mut self, key: &'static str) -> Option<&'a Value> {
        self.consumed.insert(key);
        self.fields.get(key).filter(|value| !value.is_null())
    }

    fn mismatch(&mut self, key: &'static str, value: &Value, expected: &'static str) {
        self.violations
            .push(key, value.clone(), ViolationKind::TypeMismatch { expected });
    }

    /// Accepts `key` without reading it.
    pub(crate) fn discard(&mut self, key: &'static str) {
        self.consumed.insert(key);
    }

    pub(crate) fn text(&mut self, key: &'static str) -> Option<String> {
        let value = self.get(key)?;
        match value.as_str() {
            Some(text) => Some(text.to_string()),
            None => {
                self.mismatch(key, value, "string");
                None
            }
        }
    }

    pub(crate) fn real(&mut self, key: &'static str) -> Option<f64> {
        let value = self.get(key)?;
        match value.as_f64() {
            Some(number) => Some(number),
            None => {
                self.mismatch(key, value, "number");
                None
            }
        }
    }

    /// Reads a JSON integer of either sign, recording `Missing` when the key
    /// is absent. Range checks are left to the caller.
    pub(crate) fn required_integer(&mut self, key: &'static str) -> Option<Number> {
        let Some(value) = self.get(key) else {
            self.violations.push(key, Value::Null, ViolationKind::Missing);
            return None;
        };
        match value {
            Value::Number(number) if number.is_i64() || number.is_u64() => Some(number.clone()),
            _ => {
                self.mismatch(key, value, "integer");
                None
            }
        }
    }

    /// Reads a tag from a closed set via `parse`.
    pub(crate) fn choice<T>(
        &mut self,
        key: &'static str,
        allowed: Vec<&'static str>,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Option<T> {
        let value = self.get(key)?;
        let Some(text) = value.as_str() else {
            self.mismatch(key, value, "string");
            return None;
        };
        let parsed = parse(text);
        if parsed.is_none() {
            self.violations
                .push(key, value.clone(), ViolationKind::InvalidChoice { allowed });
        }
        parsed
    }

    /// Reads a quantity; bare numbers are taken in `default_unit`.
    pub(crate) fn quantity(&mut self, key: &'static str, default_unit: Unit) -> Option<Quantity> {
        let value = self.get(key)?;
        match Quantity::from_json(value, default_unit) {
            Ok(quantity) => Some(quantity),
            Err(UnitError::UnknownUnit(symbol)) => {
                self.violations
                    .push(key, value.clone(), ViolationKind::UnknownUnit { symbol });
                None
            }
            Err(UnitError::DimensionMismatch { expected, found }) => {
                self.violations.push(
                    key,
                    value.clone(),
                    ViolationKind::UnitMismatch { expected, found },
                );
                None
            }
            Err(UnitError::Malformed(_)) => {
                self.mismatch(key, value, "quantity");
                None
            }
        }
    }

    /// Builds a nested record, re-rooting its violations under `key`.
    pub(crate) fn nested<T>(
        &mut self,
        key: &'static str,
        build: impl FnOnce(&'a Value) -> Result<T, ValidationError>,
    ) -> Option<T> {
        let value = self.get(key)?;
        match build(value) {
            Ok(record) => Some(record),
            Err(err) => {
                self.violations.nest(key, err);
                None
            }
        }
    }

    /// Like [`FieldReader::nested`] but records `Missing` when absent.
    pub(crate) fn required_nested<T>(
        &mut self,
        key: &'static str,
        build: impl FnOnce(&'a Value) -> Result<T, ValidationError>,
    ) -> Option<T> {
        if self.fields.get(key).map_or(true, Value::is_null) {
            self.consumed.insert(key);
            self.violations.push(key, Value::Null, ViolationKind::Missing);
            return None;
        }
        self.nested(key, build)
    }

    /// Rejects every key that was neither read nor discarded.
    pub(crate) fn finish(mut self) -> Violations {
        for (key, value) in self.fields {
            if !self.consumed.contains(key.as_str()) {
                self.violations
                    .push(key.clone(), value.clone(), ViolationKind::UnknownField);
            }
        }
        self.violations
    }
}
