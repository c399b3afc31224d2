//! Display colors for tracked tasks.
//!
//! Each slot gets a deterministic default so overlapping route lines stay
//! distinguishable without any configuration; the panel lets players
//! override the color per task, and overrides round-trip through the
//! settings blob as `#RRGGBBAA` strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::SLOT_COUNT;

/// RGBA color used for route lines, minimap markers, and panel accents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TaskColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Default colors assigned to slots 0..[`SLOT_COUNT`], in order.
pub const SLOT_PALETTE: [TaskColor; SLOT_COUNT as usize] = [
    TaskColor::opaque(0x2E, 0x86, 0xDE), // harbor blue
    TaskColor::opaque(0xE6, 0x7E, 0x22), // buoy orange
    TaskColor::opaque(0x27, 0xAE, 0x60), // channel green
    TaskColor::opaque(0x8E, 0x44, 0xAD), // storm violet
    TaskColor::opaque(0xC0, 0x39, 0x2B), // signal red
];

impl TaskColor {
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// Default color for a slot. Out-of-range slots wrap around the palette.
    #[must_use]
    pub const fn for_slot(slot: u8) -> Self {
        SLOT_PALETTE[(slot % SLOT_COUNT) as usize]
    }
}

impl fmt::Display for TaskColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

/// Errors raised when parsing a stored color string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color must start with '#' (got {0:?})")]
    MissingHash(String),
    #[error("color must be #RRGGBB or #RRGGBBAA (got {0} hex digits)")]
    BadLength(usize),
    #[error("color contains a non-hex digit")]
    BadDigit,
}

impl FromStr for TaskColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(trimmed.to_string()))?;
        if hex.len() != 6 && hex.len() != 8 {
            return Err(ColorParseError::BadLength(hex.len()));
        }
        let byte = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ColorParseError::BadDigit)
        };
        Ok(Self {
            r: byte(0..2)?,
            g: byte(2..4)?,
            b: byte(4..6)?,
            a: if hex.len() == 8 { byte(6..8)? } else { 0xFF },
        })
    }
}

impl From<TaskColor> for String {
    fn from(value: TaskColor) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for TaskColor {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
