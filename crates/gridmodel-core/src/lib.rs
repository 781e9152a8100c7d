//! # gridmodel-core: Validated Topology Records
//!
//! Typed building blocks for translating grid models between tools: the
//! regions buses belong to, the buses themselves, and the directed arcs that
//! join them.
//!
//! ## Design Philosophy
//!
//! Records are **validated at construction** and **immutable afterwards**:
//! - **Aggregations**: [`Area`], [`LoadZone`] carry non-negative peak demand
//! - **Buses**: [`DcBus`], [`AcBus`] (the latter with an optional voltage angle)
//! - **Edges**: [`Arc`] joins two buses, the way the model graph sees them
//!
//! A record either exists and satisfies every constraint, or construction
//! fails with a [`ValidationError`] listing every violated field. Nothing is
//! clamped or silently repaired.
//!
//! ## Quick Start
//!
//! ```rust
//! use gridmodel_core::*;
//! use serde_json::json;
//!
//! let area = Shared::new(Area::builder("North").peak_active_power(120.0).build()?);
//!
//! let from = AcBus::builder(1)
//!     .name("B1")
//!     .area(area.clone())
//!     .base_voltage(13.8 * Unit::KILOVOLT)
//!     .voltage_limits(0.9, 1.1)
//!     .angle(0.1)
//!     .build()?;
//!
//! // Mappings take the same validation path as builders.
//! let to = AcBus::from_value(json!({
//!     "number": 2,
//!     "name": "B2",
//!     "base_voltage": "13.8 kV",
//!     "bustype": "PQ"
//! }))?;
//!
//! let arc = Arc::new(Bus::from(from), Bus::from(to));
//! assert_eq!(arc.from_to().number().value(), 1);
//! assert_eq!(arc.name(), "");
//! # Ok::<(), ModelError>(())
//! ```
//!
//! ## Core Data Structures
//!
//! - [`Record`] - Construction from mappings plus re-validation
//! - [`Bus`] - Either bus variant, tagged `DCBus` / `ACBus` on the wire
//! - [`Quantity`] / [`Unit`] - Magnitudes with physical units
//! - [`MinMax`] - Ordered value limits
//! - [`ArcGraph`] - Read-only directed view over a set of arcs
//!
//! ## Modules
//!
//! - [`topology`] - The record types and their traits
//! - [`validation`] - Violation reporting
//! - [`units`] - Unit registry and strongly-typed unit newtypes
//! - [`diagnostics`] - Batch construction with per-record issues
//! - [`config`] - TOML configuration and tracing setup

pub mod config;
pub mod diagnostics;
pub mod enums;
pub mod error;
pub mod graph;
pub mod limits;
pub mod topology;
pub mod units;
pub mod validation;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use enums::AcBusType;
pub use error::{ModelError, ModelResult};
pub use graph::ArcGraph;
pub use limits::MinMax;
pub use topology::{
    AcBus, AggregationTopology, Arc, Area, AreaBuilder, Bus, BusBuilder, BusFields, BusNumber,
    Component, DcBus, Example, LoadZone, LoadZoneBuilder, Record, Shared, Topology,
    TopologyKind, ANGLE_LIMIT_RAD,
};
pub use units::{
    Degrees, Dimension, Kilovolts, Megavars, Megawatts, PerUnit, Quantity, Radians, Unit,
    UnitError, Voltage,
};
pub use validation::{FieldViolation, ValidationError, ViolationKind};
