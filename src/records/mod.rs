//! Record families decoded from ODB++ line record sections
//!
//! - [`features`]: pads, lines, arcs and text of a `features` file
//! - [`surface`]: surfaces and their polygons, plus the typed feature tree
//! - [`netlist`]: points of a `cadnet` netlist
//! - [`attributes`]: the `;…` suffix shared by feature records

pub mod attributes;
pub mod features;
pub mod netlist;
pub mod surface;

pub use attributes::{parse_attribute_suffix, AttributeSuffix, AttributeValue, Attributes};
pub use features::{
    decode_features, expand_aperture, expand_orientation, DecodedFeatures, FEATURE_RULES,
    LAYER_FEATURES_SECTION,
};
pub use netlist::{
    assign_net_name, decode_netlist, group_by_net, parse_net_names, parse_netlist_header, Netlist,
    NetlistHeader, NetlistPoint, NetlistPointFlags, PointLocation, PointSide, SolderMaskExposure,
    Staggered, NETLIST_POINTS_SECTION, NETLIST_RULES,
};
pub use surface::{
    build_features, Feature, FeatureNode, Polygon, Segment, Surface, FEATURE_TREEIFY_RULES,
};

use crate::treeifier::Classify;
use crate::types::{CircleDirection, Mirror, Point, Polarity, PolygonKind, SymbolReference};

/// A pad: one symbol stamped at a position
#[derive(Debug, Clone, PartialEq)]
pub struct Pad {
    pub position: Point,
    pub symbol: SymbolReference,
    pub polarity: Polarity,
    pub dcode: u32,
    pub mirror: Mirror,
    /// Rotation in degrees
    pub angle: f64,
    pub id: Option<u64>,
    pub attributes: Attributes,
}

/// A straight line drawn with a symbol
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: Point,
    pub end: Point,
    pub symbol: SymbolReference,
    pub polarity: Polarity,
    pub dcode: u32,
    pub id: Option<u64>,
    pub attributes: Attributes,
}

/// A circular arc drawn with a symbol
#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    pub start: Point,
    pub end: Point,
    pub center: Point,
    pub symbol: SymbolReference,
    pub polarity: Polarity,
    pub dcode: u32,
    pub direction: CircleDirection,
    pub id: Option<u64>,
    pub attributes: Attributes,
}

/// A text string placed on the layer
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub position: Point,
    pub font: String,
    pub polarity: Polarity,
    pub mirror: Mirror,
    pub angle: f64,
    pub xsize: f64,
    pub ysize: f64,
    pub width_factor: f64,
    pub text: String,
    pub version: Option<u32>,
    pub id: Option<u64>,
    pub attributes: Attributes,
}

/// Opening record of a surface (`S P 0;…`)
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceStart {
    pub polarity: Polarity,
    pub dcode: u32,
    pub id: Option<u64>,
    pub attributes: Attributes,
}

/// Opening record of a polygon (`OB x y I`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonStart {
    pub start: Point,
    pub kind: PolygonKind,
}

/// One record of a `Layer features` section
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureRecord {
    Pad(Pad),
    Line(Line),
    Arc(Arc),
    Text(Text),
    BeginSurface(SurfaceStart),
    EndSurface,
    BeginPolygon(PolygonStart),
    /// `OS`: straight segment to `end`
    LineSegment { end: Point },
    /// `OC`: arc segment to `end` around `center`
    ArcSegment {
        end: Point,
        center: Point,
        direction: CircleDirection,
    },
    EndPolygon,
}

/// Discriminant of [`FeatureRecord`], used to look up treeify rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Pad,
    Line,
    Arc,
    Text,
    BeginSurface,
    EndSurface,
    BeginPolygon,
    LineSegment,
    ArcSegment,
    EndPolygon,
}

impl Classify for FeatureRecord {
    type Kind = FeatureKind;

    fn kind(&self) -> FeatureKind {
        match self {
            FeatureRecord::Pad(_) => FeatureKind::Pad,
            FeatureRecord::Line(_) => FeatureKind::Line,
            FeatureRecord::Arc(_) => FeatureKind::Arc,
            FeatureRecord::Text(_) => FeatureKind::Text,
            FeatureRecord::BeginSurface(_) => FeatureKind::BeginSurface,
            FeatureRecord::EndSurface => FeatureKind::EndSurface,
            FeatureRecord::BeginPolygon(_) => FeatureKind::BeginPolygon,
            FeatureRecord::LineSegment { .. } => FeatureKind::LineSegment,
            FeatureRecord::ArcSegment { .. } => FeatureKind::ArcSegment,
            FeatureRecord::EndPolygon => FeatureKind::EndPolygon,
        }
    }
}

/// Containers of the feature family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureContainer {
    Surface,
    Polygon,
}
