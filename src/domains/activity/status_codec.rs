// src/domains/activity/status_codec.rs
//
// Binary in-progress concept <-> backend wire representation.

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Wire values recognized as "in progress" besides `true` and `1`
const IN_PROGRESS_WIRE_STRINGS: [&str; 2] = ["EM_ANDAMENTO", "IN_PROGRESS"];

pub const ENUM_IN_PROGRESS: &str = "EM_ANDAMENTO";
pub const ENUM_NOT_IN_PROGRESS: &str = "PENDENTE";

/// Canonical status used for backend interchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalStatus {
    InProgress,
    NotInProgress,
}

impl CanonicalStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, CanonicalStatus::InProgress)
    }
}

impl From<bool> for CanonicalStatus {
    fn from(in_progress: bool) -> Self {
        if in_progress {
            CanonicalStatus::InProgress
        } else {
            CanonicalStatus::NotInProgress
        }
    }
}

/// Backend-agreed encoding of the canonical status.
/// Must match the backend at deploy time; there is no runtime negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WireMode {
    #[default]
    Boolean,
    Enum,
}

impl WireMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireMode::Boolean => "boolean",
            WireMode::Enum => "enum",
        }
    }
}

impl FromStr for WireMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "boolean" => Ok(WireMode::Boolean),
            "enum" => Ok(WireMode::Enum),
            other => Err(ValidationError::invalid_value(
                "status_wire_mode",
                &format!("expected 'boolean' or 'enum', got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for WireMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Total decode: anything not recognized as in progress is "not in progress".
pub fn decode(raw: &Value) -> CanonicalStatus {
    let in_progress = match raw {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => IN_PROGRESS_WIRE_STRINGS.contains(&s.as_str()),
        _ => false,
    };
    CanonicalStatus::from(in_progress)
}

pub fn encode(status: CanonicalStatus, mode: WireMode) -> Value {
    match mode {
        WireMode::Boolean => Value::Bool(status.is_in_progress()),
        WireMode::Enum => Value::String(
            if status.is_in_progress() { ENUM_IN_PROGRESS } else { ENUM_NOT_IN_PROGRESS }.to_string(),
        ),
    }
}

/// Codec bound to the wire mode validated at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCodec {
    mode: WireMode,
}

impl StatusCodec {
    pub fn new(mode: WireMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> WireMode {
        self.mode
    }

    pub fn decode(&self, raw: &Value) -> CanonicalStatus {
        decode(raw)
    }

    pub fn encode(&self, status: CanonicalStatus) -> Value {
        encode(status, self.mode)
    }
}
