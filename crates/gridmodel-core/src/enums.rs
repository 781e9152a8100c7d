//! Categorical tags shared by topology records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Electrical role of a bus in power-flow studies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AcBusType {
    /// Load bus: active and reactive injections specified
    Pq,
    /// Voltage-controlled bus: active injection and voltage magnitude specified
    Pv,
    /// Angle reference bus
    Ref,
    /// Slack bus absorbing the power mismatch
    Slack,
    /// Disconnected from the rest of the network
    Isolated,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown bus type '{0}'; supported values: PQ, PV, REF, SLACK, ISOLATED")]
pub struct ParseBusTypeError(String);

impl AcBusType {
    pub const ALL: [AcBusType; 5] = [
        AcBusType::Pq,
        AcBusType::Pv,
        AcBusType::Ref,
        AcBusType::Slack,
        AcBusType::Isolated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AcBusType::Pq => "PQ",
            AcBusType::Pv => "PV",
            AcBusType::Ref => "REF",
            AcBusType::Slack => "SLACK",
            AcBusType::Isolated => "ISOLATED",
        }
    }

    pub fn available() -> Vec<&'static str> {
        Self::ALL.iter().map(|kind| kind.as_str()).collect()
    }
}

impl FromStr for AcBusType {
    type Err = ParseBusTypeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(input.trim()))
            .ok_or_else(|| ParseBusTypeError(input.to_string()))
    }
}

impl fmt::Display for AcBusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
