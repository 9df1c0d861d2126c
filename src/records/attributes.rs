//! Attribute suffixes of feature records.
//!
//! A feature line may end with `;<entries>` and an optional `;ID=<n>`:
//!
//! ```text
//! P -35.7225 2.064 0 P 0 8 0;0=2,1=0,4;ID=1187
//! ```
//!
//! Entry keys are indices into the layer's `@<n>` attribute name table.
//! A bare key is a boolean flag.

use indexmap::IndexMap;
use std::fmt;

/// Value of one attribute entry
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Key present without a value
    Flag,
    Int(i64),
    Float(f64),
    /// Text, or an index into the `&<n>` attribute text table
    Text(String),
}

impl AttributeValue {
    /// Interpret a raw value the way ODB++ writers produce them.
    ///
    /// A value with a leading zero (other than `0` itself or `0.`-prefixed
    /// decimals) is kept as text, e.g. part numbers like `0805`.
    pub fn parse(raw: &str) -> AttributeValue {
        let raw = raw.trim();
        if raw.starts_with('0') && raw != "0" && !raw.starts_with("0.") {
            return AttributeValue::Text(raw.to_string());
        }
        if let Ok(value) = raw.parse::<i64>() {
            return AttributeValue::Int(value);
        }
        if raw.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(value) = raw.parse::<f64>() {
                return AttributeValue::Float(value);
            }
        }
        AttributeValue::Text(raw.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Flag => write!(f, "true"),
            AttributeValue::Int(v) => write!(f, "{}", v),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Attribute index to value, in file order
pub type Attributes = IndexMap<u32, AttributeValue>;

/// Everything carried by an attribute suffix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSuffix {
    /// Feature id from the `ID=<n>` segment
    pub id: Option<u64>,
    pub attributes: Attributes,
}

/// Parse an attribute suffix such as `;0=2,1=0;ID=5`.
///
/// `None` (no suffix on the line) yields an empty result. The error string
/// names the offending entry.
pub fn parse_attribute_suffix(suffix: Option<&str>) -> Result<AttributeSuffix, String> {
    let mut parsed = AttributeSuffix::default();
    let Some(suffix) = suffix else {
        return Ok(parsed);
    };

    for segment in suffix.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if let Some(id) = segment.strip_prefix("ID=") {
            let id = id
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("invalid feature id '{}'", id))?;
            parsed.id = Some(id);
            continue;
        }
        for entry in segment.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (key, value) = match entry.split_once('=') {
                Some((key, value)) => (key, AttributeValue::parse(value)),
                None => (entry, AttributeValue::Flag),
            };
            let key = key
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid attribute key '{}'", key))?;
            parsed.attributes.insert(key, value);
        }
    }

    Ok(parsed)
}
