use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a code string does not name a known variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognised {kind} '{value}'")]
pub struct ParseCodeError {
    pub kind: &'static str,
    pub value: String,
}

/// Coarse vehicle tier that selects the base commission percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CarClass {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
}

impl CarClass {
    pub const ALL: [CarClass; 3] = [CarClass::A, CarClass::B, CarClass::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    /// Dashboard label, e.g. `A-Class`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::A => "A-Class",
            Self::B => "B-Class",
            Self::C => "C-Class",
        }
    }

    /// Accepts the bare code (`A`) or the dashboard label (`A-Class`),
    /// ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        let code = trimmed
            .strip_suffix("-Class")
            .or_else(|| trimmed.strip_suffix("-class"))
            .unwrap_or(trimmed);
        match code.to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            _ => None,
        }
    }
}

impl fmt::Display for CarClass {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarClass {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseCodeError {
            kind: "car class",
            value: s.to_string(),
        })
    }
}
