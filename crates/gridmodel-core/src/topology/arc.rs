//! Directed edges between buses.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{AcBus, Bus, Component, DcBus, Example, Record, Shared, Topology, TopologyKind};
use crate::validation::{FieldReader, ValidationError};

/// Topological directed edge connecting two buses.
///
/// Endpoints are emitted as `"from"` / `"to"`. An arc has no name of its
/// own: [`Component::name`] is always empty and nothing is serialized for it.
/// Self-loops are not rejected here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arc {
    #[serde(rename = "from")]
    from_to: Shared<Bus>,
    #[serde(rename = "to")]
    to_from: Shared<Bus>,
}

impl Arc {
    /// Buses are valid by construction, so joining two of them cannot fail.
    pub fn new(from: impl Into<Shared<Bus>>, to: impl Into<Shared<Bus>>) -> Self {
        Self {
            from_to: from.into(),
            to_from: to.into(),
        }
    }

    /// The initial bus.
    pub fn from_to(&self) -> &Shared<Bus> {
        &self.from_to
    }

    /// The terminal bus.
    pub fn to_from(&self) -> &Shared<Bus> {
        &self.to_from
    }

    pub fn is_self_loop(&self) -> bool {
        self.from_to.number() == self.to_from.number()
    }
}

impl Component for Arc {
    fn name(&self) -> &str {
        ""
    }

    fn kind(&self) -> TopologyKind {
        TopologyKind::Arc
    }
}

impl Topology for Arc {}

impl Record for Arc {
    const TYPE_NAME: &'static str = "Arc";

    /// Both endpoints are required and validated recursively; an incoming
    /// `name` is accepted and dropped.
    fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut reader = FieldReader::new(fields);
        reader.discard("name");
        let from_to = reader.required_nested("from", Bus::from_json);
        let to_from = reader.required_nested("to", Bus::from_json);
        let arc = from_to.zip(to_from).map(|(from, to)| Arc::new(from, to));
        reader.finish().finish(Self::TYPE_NAME, arc)
    }
}

impl_record_deserialize!(Arc);

impl Example for Arc {
    fn example() -> Self {
        Arc::new(Bus::from(DcBus::example()), Bus::from(AcBus::example()))
    }
}
