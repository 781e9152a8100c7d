//! Diagnostics for batches of records.
//!
//! Constructors never skip or repair a record: they either produce it or
//! return a [`ValidationError`]. Callers that translate whole tables and
//! prefer to keep going past bad rows can route failures into a
//! [`Diagnostics`] collection instead, one issue per violated field.
//!
//! Arc sets that built fine can still be suspicious as a network: those
//! findings are reported as warnings by [`Diagnostics::add_arc_graph_warnings`].
//!
//! # Example
//!
//! ```
//! use gridmodel_core::diagnostics::construct_batch;
//! use gridmodel_core::Area;
//! use serde_json::json;
//!
//! let rows = vec![
//!     json!({"name": "North", "peak_active_power": 120.0}),
//!     json!({"name": "South", "peak_active_power": -3.0}),
//! ];
//! let (areas, diag) = construct_batch::<Area>(rows);
//!
//! assert_eq!(areas.len(), 1);
//! assert_eq!(diag.error_count(), 1);
//! assert_eq!(diag.issues[0].index, Some(1));
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::graph::ArcGraph;
use crate::topology::{Arc, Record};
use crate::validation::ValidationError;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but nothing was rejected
    Warning,
    /// The record was rejected
    Error,
}

/// A single diagnostic issue
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g., "validation")
    pub category: String,
    pub message: String,
    /// Position of the record within its batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Record reference (e.g., "ACBus 'B1'")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Dotted path of the offending field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            index: None,
            entity: None,
            field: None,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        if let Some(index) = self.index {
            write!(f, " at record {}", index)?;
        }

        Ok(())
    }
}

/// Collection of diagnostic issues
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    /// One `validation` error per violated field of `err`.
    pub fn add_validation_error(&mut self, entity: &str, err: &ValidationError) {
        self.push_violations(entity, err, None);
    }

    fn push_violations(&mut self, entity: &str, err: &ValidationError, index: Option<usize>) {
        for violation in err.violations() {
            let mut issue = DiagnosticIssue::new(
                Severity::Error,
                "validation",
                violation.to_string(),
            )
            .with_entity(entity)
            .with_field(violation.path.clone());
            issue.index = index;
            self.issues.push(issue);
        }
    }

    /// One `topology` warning per self-loop and per bus number that two
    /// different buses claim, tagged with the arc's position.
    pub fn add_arc_graph_warnings(&mut self, graph: &ArcGraph) {
        for position in graph.self_loops() {
            self.issues.push(
                DiagnosticIssue::new(Severity::Warning, "topology", "arc joins a bus to itself")
                    .with_entity(Arc::TYPE_NAME)
                    .with_index(position),
            );
        }
        for &(position, number) in graph.number_conflicts() {
            self.issues.push(
                DiagnosticIssue::new(
                    Severity::Warning,
                    "topology",
                    format!("bus number {} already used by a different bus", number),
                )
                .with_entity(Arc::TYPE_NAME)
                .with_index(position),
            );
        }
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();
        let plural = |n: usize| if n == 1 { "" } else { "s" };

        match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, plural(w)),
            (0, e) => format!("{} error{}", e, plural(e)),
            (w, e) => format!("{} warning{}, {} error{}", w, plural(w), e, plural(e)),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

/// Constructs every mapping in `values`, keeping the accepted records and
/// turning each rejection into diagnostics tagged with the record's index.
pub fn construct_batch<T: Record>(
    values: impl IntoIterator<Item = Value>,
) -> (Vec<T>, Diagnostics) {
    let mut records = Vec::new();
    let mut diag = Diagnostics::new();
    for (index, value) in values.into_iter().enumerate() {
        let label = record_label::<T>(&value);
        match T::from_value(value) {
            Ok(record) => records.push(record),
            Err(err) => diag.push_violations(&label, &err, Some(index)),
        }
    }
    (records, diag)
}

fn record_label<T: Record>(value: &Value) -> String {
    match value.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => format!("{} '{}'", T::TYPE_NAME, name),
        _ => T::TYPE_NAME.to_string(),
    }
}
