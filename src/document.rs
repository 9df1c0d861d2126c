//! Decoded feature files
//!
//! A `features` file (of a layer or a user symbol) carries a unit header,
//! three lookup tables and the `Layer features` record stream. [`LayerFeatures`]
//! holds all of them after decoding.

use crate::decoder::{capture_parse, BuildResult, DecodeMode, Decoder, DecoderRule};
use crate::error::Result;
use crate::io::LineRecords;
use crate::notification::{NotificationCollection, NotificationType};
use crate::records::{decode_features, Feature, Surface, LAYER_FEATURES_SECTION};
use crate::symbols::{parse_symbol_name, Symbol};
use crate::types::units::unit_from_line_records;
use crate::types::{SymbolReference, Unit};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const SYMBOL_NAMES_SECTION: &str = "Feature symbol names";
pub const ATTRIBUTE_NAMES_SECTION: &str = "Feature attribute names";
pub const ATTRIBUTE_TEXTS_SECTION: &str = "Feature attribute text strings";

// ---------------------------------------------------------------------------
// Index tables
// ---------------------------------------------------------------------------

fn build_entry(caps: &Captures<'_>) -> BuildResult<(u32, String)> {
    let index = capture_parse(caps, 1, "table index")?;
    let value = caps.get(2).map_or("", |m| m.as_str()).to_string();
    Ok(Some((index, value)))
}

static SYMBOL_TABLE_RULES: Lazy<Vec<DecoderRule<(u32, String)>>> = Lazy::new(|| {
    vec![DecoderRule::new(
        "symbol name",
        Regex::new(r"^\$(\d+)\s+(\S.*)$").unwrap(),
        build_entry,
    )]
});

static ATTRIBUTE_NAME_RULES: Lazy<Vec<DecoderRule<(u32, String)>>> = Lazy::new(|| {
    vec![DecoderRule::new(
        "attribute name",
        Regex::new(r"^@(\d+)\s+(\S.*)$").unwrap(),
        build_entry,
    )]
});

// Text strings may be empty
static ATTRIBUTE_TEXT_RULES: Lazy<Vec<DecoderRule<(u32, String)>>> = Lazy::new(|| {
    vec![DecoderRule::new(
        "attribute text",
        Regex::new(r"^&(\d+)(?:\s+(.*))?$").unwrap(),
        build_entry,
    )]
});

/// Decode an index table strictly; a malformed line is a `LineFormat` error
fn read_table(
    records: &LineRecords,
    section: &str,
    rules: &[DecoderRule<(u32, String)>],
) -> Result<IndexMap<u32, String>> {
    Decoder::new(rules)
        .with_section(section)
        .decode(records.lines(section))
        .records()
        .collect()
}

// ---------------------------------------------------------------------------
// LayerFeatures
// ---------------------------------------------------------------------------

/// Contents of a layer or symbol `features` file
#[derive(Debug, Clone, PartialEq)]
pub struct LayerFeatures {
    pub unit: Unit,
    /// `$<n>` symbol table, resolved
    pub symbols: IndexMap<u32, Symbol>,
    /// `@<n>` attribute names
    pub attribute_names: IndexMap<u32, String>,
    /// `&<n>` attribute text strings
    pub attribute_texts: IndexMap<u32, String>,
    pub features: Vec<Feature>,
    pub notifications: NotificationCollection,
}

impl LayerFeatures {
    /// Decode a `features` file already split into sections
    pub fn from_line_records(records: &LineRecords, mode: DecodeMode) -> Result<Self> {
        let unit = unit_from_line_records(records)?;

        let symbols = read_table(records, SYMBOL_NAMES_SECTION, &SYMBOL_TABLE_RULES)?
            .into_iter()
            .map(|(index, name)| (index, parse_symbol_name(&name)))
            .collect();
        let attribute_names = read_table(records, ATTRIBUTE_NAMES_SECTION, &ATTRIBUTE_NAME_RULES)?;
        let attribute_texts = read_table(records, ATTRIBUTE_TEXTS_SECTION, &ATTRIBUTE_TEXT_RULES)?;

        let decoded = decode_features(records.lines(LAYER_FEATURES_SECTION), mode)?;
        let mut notifications = NotificationCollection::new();
        if let Some((line_number, line)) = &decoded.first_unmatched {
            notifications.notify(
                NotificationType::Discarded,
                format!(
                    "{} unrecognised feature lines skipped, first at line {}: '{}'",
                    decoded.unmatched, line_number, line
                ),
            );
        }

        Ok(Self {
            unit,
            symbols,
            attribute_names,
            attribute_texts,
            features: decoded.features,
            notifications,
        })
    }

    /// Symbol a feature refers to
    pub fn symbol(&self, reference: &SymbolReference) -> Option<&Symbol> {
        self.symbols.get(&reference.index)
    }

    pub fn attribute_name(&self, index: u32) -> Option<&str> {
        self.attribute_names.get(&index).map(String::as_str)
    }

    pub fn attribute_text(&self, index: u32) -> Option<&str> {
        self.attribute_texts.get(&index).map(String::as_str)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.features.iter().filter_map(|f| match f {
            Feature::Surface(surface) => Some(surface),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
