//! Pad, line, arc and text records of the `Layer features` section.
//!
//! Grammar (ODB++ 7.0, features file):
//!
//! ```text
//! P x y apt_def P|N dcode orient_def [;attrs]
//! L xs ys xe ye sym P|N dcode [;attrs]
//! A xs ys xe ye xc yc sym P|N dcode Y|N [;attrs]
//! T x y font P|N orient_def xsize ysize width_factor 'text' version [;attrs]
//! ```
//!
//! Two legacy spellings are expanded before a record is built:
//! - a bare aperture index `5` means `-1 5 1.0`
//! - an orientation code `0..=7` means one of the `<8|9> <angle>` pairs

use super::surface::{build_features, surface_rules, Feature, FEATURE_TREEIFY_RULES};
use super::{parse_attribute_suffix, Arc, FeatureRecord, Line, Pad, Text};
use crate::decoder::{capture_parse, BuildResult, Builder, DecodeMode, Decoder, DecoderRule};
use crate::error::Result;
use crate::treeifier::Treeifier;
use crate::types::{CircleDirection, Mirror, Point, Polarity, SymbolReference};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Section holding the feature records of a features file
pub const LAYER_FEATURES_SECTION: &str = "Layer features";

/// Canonical `<class> <angle>` form of each legacy orientation code
const LEGACY_ORIENTATION: [&str; 8] = [
    "8 0", "8 90", "8 180", "8 270", "9 0", "9 90", "9 180", "9 270",
];

type FieldResult<T> = std::result::Result<T, String>;

/// Expand an aperture definition to a symbol reference.
///
/// Accepts the short form `<index>` and the long form `-1 <index> <resize>`.
pub fn expand_aperture(definition: &str) -> FieldResult<SymbolReference> {
    let long;
    let definition = if definition.contains(char::is_whitespace) {
        definition
    } else {
        long = format!("-1 {} 1.0", definition);
        long.as_str()
    };

    let fields: Vec<&str> = definition.split_whitespace().collect();
    let [_, index, resize] = fields.as_slice() else {
        return Err(format!("invalid aperture definition '{}'", definition));
    };
    let index = index
        .parse::<u32>()
        .map_err(|_| format!("invalid symbol index '{}'", index))?;
    let resize = resize
        .parse::<f64>()
        .map_err(|_| format!("invalid resize factor '{}'", resize))?;
    Ok(SymbolReference::new(index, resize))
}

/// Expand an orientation definition to its mirror mode and angle in degrees.
///
/// Accepts a legacy code `0..=7` and the current `<8|9> <angle>` form.
pub fn expand_orientation(definition: &str) -> FieldResult<(Mirror, f64)> {
    let definition = if definition.contains(char::is_whitespace) {
        definition
    } else {
        definition
            .parse::<usize>()
            .ok()
            .and_then(|code| LEGACY_ORIENTATION.get(code).copied())
            .ok_or_else(|| format!("invalid orientation code '{}'", definition))?
    };

    let mut fields = definition.split_whitespace();
    let class = fields
        .next()
        .and_then(|c| c.parse::<u8>().ok())
        .and_then(Mirror::from_orientation_class)
        .ok_or_else(|| format!("invalid orientation '{}'", definition))?;
    let angle = fields
        .next()
        .and_then(|a| a.parse::<f64>().ok())
        .ok_or_else(|| format!("invalid orientation angle in '{}'", definition))?;
    Ok((class, angle))
}

fn point(caps: &Captures<'_>, x: usize, y: usize, what: &str) -> FieldResult<Point> {
    Ok(Point::new(
        capture_parse(caps, x, &format!("{} x", what))?,
        capture_parse(caps, y, &format!("{} y", what))?,
    ))
}

fn polarity(caps: &Captures<'_>, group: usize) -> FieldResult<Polarity> {
    Polarity::from_token(&caps[group]).ok_or_else(|| format!("invalid polarity '{}'", &caps[group]))
}

fn suffix(caps: &Captures<'_>, group: usize) -> FieldResult<super::AttributeSuffix> {
    parse_attribute_suffix(caps.get(group).map(|m| m.as_str()))
}

fn build_pad(caps: &Captures<'_>) -> BuildResult<FeatureRecord> {
    let (mirror, angle) = expand_orientation(&caps[6])?;
    let suffix = suffix(caps, 7)?;
    Ok(Some(FeatureRecord::Pad(Pad {
        position: point(caps, 1, 2, "pad")?,
        symbol: expand_aperture(&caps[3])?,
        polarity: polarity(caps, 4)?,
        dcode: capture_parse(caps, 5, "dcode")?,
        mirror,
        angle,
        id: suffix.id,
        attributes: suffix.attributes,
    })))
}

fn build_line(caps: &Captures<'_>) -> BuildResult<FeatureRecord> {
    let suffix = suffix(caps, 8)?;
    Ok(Some(FeatureRecord::Line(Line {
        start: point(caps, 1, 2, "start")?,
        end: point(caps, 3, 4, "end")?,
        symbol: SymbolReference::unscaled(capture_parse(caps, 5, "symbol index")?),
        polarity: polarity(caps, 6)?,
        dcode: capture_parse(caps, 7, "dcode")?,
        id: suffix.id,
        attributes: suffix.attributes,
    })))
}

fn build_arc(caps: &Captures<'_>) -> BuildResult<FeatureRecord> {
    let direction = CircleDirection::from_token(&caps[10])
        .ok_or_else(|| format!("invalid direction '{}'", &caps[10]))?;
    let suffix = suffix(caps, 11)?;
    Ok(Some(FeatureRecord::Arc(Arc {
        start: point(caps, 1, 2, "start")?,
        end: point(caps, 3, 4, "end")?,
        center: point(caps, 5, 6, "center")?,
        symbol: SymbolReference::unscaled(capture_parse(caps, 7, "symbol index")?),
        polarity: polarity(caps, 8)?,
        dcode: capture_parse(caps, 9, "dcode")?,
        direction,
        id: suffix.id,
        attributes: suffix.attributes,
    })))
}

fn build_text(caps: &Captures<'_>) -> BuildResult<FeatureRecord> {
    let (mirror, angle) = expand_orientation(&caps[5])?;
    let version = match caps.get(10) {
        Some(_) => Some(capture_parse(caps, 10, "version")?),
        None => None,
    };
    let suffix = suffix(caps, 11)?;
    Ok(Some(FeatureRecord::Text(Text {
        position: point(caps, 1, 2, "text")?,
        font: caps[3].to_string(),
        polarity: polarity(caps, 4)?,
        mirror,
        angle,
        xsize: capture_parse(caps, 6, "xsize")?,
        ysize: capture_parse(caps, 7, "ysize")?,
        width_factor: capture_parse(caps, 8, "width factor")?,
        text: caps[9].to_string(),
        version,
        id: suffix.id,
        attributes: suffix.attributes,
    })))
}

fn rule(name: &'static str, pattern: &str, build: Builder<FeatureRecord>) -> DecoderRule<FeatureRecord> {
    DecoderRule::new(name, Regex::new(pattern).unwrap(), build)
}

/// Rules of the `Layer features` section, in match order
pub static FEATURE_RULES: Lazy<Vec<DecoderRule<FeatureRecord>>> = Lazy::new(|| {
    let mut rules = vec![
        rule(
            "pad",
            r"^P\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(\d+|-1\s+\d+\s+-?[\.\d]+)\s+([PN])\s+(\d+)\s+([0-7]|[8-9]\s+-?[\.\d]+)(;\s*.+?)?$",
            build_pad,
        ),
        rule(
            "line",
            r"^L\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(\d+)\s+([PN])\s+(\d+)(;\s*.+?)?$",
            build_line,
        ),
        rule(
            "arc",
            r"^A\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(\d+)\s+([PN])\s+(\d+)\s+([YN])(;\s*.+?)?$",
            build_arc,
        ),
        rule(
            "text",
            r"^T\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(\S+)\s+([PN])\s+([0-7]|[8-9]\s+-?[\.\d]+)\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+'(.*)'(?:\s+(\d+))?(;\s*.+?)?$",
            build_text,
        ),
    ];
    rules.extend(surface_rules());
    rules
});

/// Features of one section plus decoding statistics
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFeatures {
    pub features: Vec<Feature>,
    /// Lines no rule matched (only non-zero in lenient mode)
    pub unmatched: usize,
    /// Line number and text of the first unmatched line
    pub first_unmatched: Option<(usize, String)>,
}

/// Decode and treeify the lines of a `Layer features` section in one pass
pub fn decode_features<I>(lines: I, mode: DecodeMode) -> Result<DecodedFeatures>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let decoder = Decoder::new(&FEATURE_RULES)
        .with_mode(mode)
        .with_section(LAYER_FEATURES_SECTION);
    let mut decode = decoder.decode(lines);
    let forest = Treeifier::new(FEATURE_TREEIFY_RULES)
        .with_section(LAYER_FEATURES_SECTION)
        .try_treeify(std::iter::from_fn(|| decode.next_located()))?;

    Ok(DecodedFeatures {
        features: build_features(forest)?,
        unmatched: decode.unmatched(),
        first_unmatched: decode.first_unmatched().map(|(n, line)| (n, line.to_string())),
    })
}
