use crate::domain::errors::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Immutable identifier for a supported index-futures instrument. Carries no
/// data by itself — calibration and candles are looked up by this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    #[serde(rename = "ES")]
    Es,
    #[serde(rename = "NQ")]
    Nq,
}

impl Instrument {
    pub fn root(&self) -> &'static str {
        match self {
            Instrument::Es => "ES",
            Instrument::Nq => "NQ",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root())
    }
}

impl FromStr for Instrument {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ES" => Ok(Instrument::Es),
            "NQ" => Ok(Instrument::Nq),
            other => Err(CoreError::InvalidInstrument {
                root: other.to_string(),
            }),
        }
    }
}

/// An opaque front-month contract string, e.g. `/ESH25`. Produced only by the
/// Contract Resolver and consumed only by the external `CandleSource`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
