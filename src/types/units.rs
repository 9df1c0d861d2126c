//! Measurement units and the unit header of a line record file
//!
//! ODB++ files carry their unit in one of two forms depending on the format
//! era:
//!
//! - post 8.0: the first line of the `Header` section reads `UNITS=<NAME>`
//! - pre 8.0: a `Units` section holds exactly one line `U <NAME>`
//!
//! All conversions go through millimetres.

use crate::error::{OdbError, Result};
use crate::io::LineRecords;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static UNITS_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^UNITS=([A-Za-z]+)").unwrap());
static UNITS_LINE_V7: Lazy<Regex> = Lazy::new(|| Regex::new(r"^U\s+([A-Za-z]+)").unwrap());

/// A length unit recognised in ODB++ headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Millimeter,
    Micrometer,
    Inch,
    Mil,
}

impl Unit {
    /// Look up a unit by its header name (`MM`, `UM`, `IN`, `INCH`, `MIL`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "MM" => Some(Unit::Millimeter),
            "UM" => Some(Unit::Micrometer),
            "IN" | "INCH" => Some(Unit::Inch),
            "MIL" => Some(Unit::Mil),
            _ => None,
        }
    }

    /// Length of one unit in millimetres
    pub fn mm_factor(&self) -> f64 {
        match self {
            Unit::Millimeter => 1.0,
            Unit::Micrometer => 0.001,
            Unit::Inch => 25.4,
            Unit::Mil => 0.0254,
        }
    }

    /// Convert `value` given in this unit into `target`
    pub fn convert(&self, value: f64, target: Unit) -> f64 {
        value * self.mm_factor() / target.mm_factor()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Millimeter => write!(f, "MM"),
            Unit::Micrometer => write!(f, "UM"),
            Unit::Inch => write!(f, "INCH"),
            Unit::Mil => write!(f, "MIL"),
        }
    }
}

/// Convert a value in `from` to millimetres
pub fn to_mm(value: f64, from: Unit) -> f64 {
    value * from.mm_factor()
}

/// Convert a value in `from` to mil
pub fn to_mil(value: f64, from: Unit) -> f64 {
    to_mm(value, from) / Unit::Mil.mm_factor()
}

/// Convert a value in `from` to micrometres
pub fn to_micrometers(value: f64, from: Unit) -> f64 {
    to_mm(value, from) / Unit::Micrometer.mm_factor()
}

/// Convert a value in `from` to inches
pub fn to_inch(value: f64, from: Unit) -> f64 {
    to_mm(value, from) / Unit::Inch.mm_factor()
}

fn unit_from_capture(name: &str, line: &str) -> Result<Unit> {
    Unit::from_name(name)
        .ok_or_else(|| OdbError::Unit(format!("unknown unit '{}' in line '{}'", name, line)))
}

/// Extract the unit from a line record file, failing if no header form is present.
pub fn unit_from_line_records(records: &LineRecords) -> Result<Unit> {
    if let Some(header) = records.section("Header") {
        let first = header
            .first()
            .ok_or_else(|| OdbError::Unit("empty Header section".to_string()))?;
        let caps = UNITS_LINE
            .captures(first)
            .ok_or_else(|| OdbError::Unit(format!("invalid unit line: '{}'", first)))?;
        return unit_from_capture(&caps[1], first);
    }

    if let Some(units) = records.section("Units") {
        if units.len() != 1 {
            return Err(OdbError::Unit(format!(
                "expected exactly one unit line, found {}",
                units.len()
            )));
        }
        let line = &units[0];
        let caps = UNITS_LINE_V7
            .captures(line)
            .ok_or_else(|| OdbError::Unit(format!("invalid unit line: '{}'", line)))?;
        return unit_from_capture(&caps[1], line);
    }

    Err(OdbError::Unit(
        "neither a Header nor a Units section is present".to_string(),
    ))
}

/// Like [`unit_from_line_records`], but a file without any unit header yields `None`.
///
/// A `Header` section whose first line does not start with `UNITS=` counts as
/// absent; netlists use that section for other records.
pub fn detect_unit(records: &LineRecords) -> Result<Option<Unit>> {
    let has_units_line = records
        .section("Header")
        .and_then(|h| h.first())
        .map_or(false, |l| l.starts_with("UNITS="));
    if has_units_line || records.contains("Units") {
        unit_from_line_records(records).map(Some)
    } else {
        Ok(None)
    }
}
