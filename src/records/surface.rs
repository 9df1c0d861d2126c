//! Surfaces, polygons and the typed feature tree.
//!
//! ```text
//! S P 0;;ID=12      open surface
//! OB 0 0 I          open outline polygon at (0, 0)
//! OS 1 0            line segment
//! OC 0 0 0.5 0 Y    arc segment
//! OE                close polygon
//! SE                close surface
//! ```

use super::{
    parse_attribute_suffix, Arc, Attributes, FeatureContainer, FeatureKind, FeatureRecord, Line,
    Pad, PolygonStart, SurfaceStart, Text, LAYER_FEATURES_SECTION,
};
use crate::decoder::{capture_parse, BuildResult, DecoderRule, Located};
use crate::error::{OdbError, Result};
use crate::treeifier::{Classify, Container, Node, TreeifyAction, TreeifyRule};
use crate::types::{CircleDirection, Point, Polarity, PolygonKind};
use regex::{Captures, Regex};

/// Treeify rules of the feature family
pub static FEATURE_TREEIFY_RULES: &[TreeifyRule<FeatureKind, FeatureContainer>] = &[
    TreeifyRule::new(FeatureKind::BeginSurface, TreeifyAction::Push(FeatureContainer::Surface)),
    TreeifyRule::new(FeatureKind::BeginPolygon, TreeifyAction::Push(FeatureContainer::Polygon)),
    TreeifyRule::new(FeatureKind::LineSegment, TreeifyAction::Leaf(SEGMENTS)),
    TreeifyRule::new(FeatureKind::ArcSegment, TreeifyAction::Leaf(SEGMENTS)),
    TreeifyRule::new(FeatureKind::EndPolygon, TreeifyAction::Pop(POLYGONS)),
    TreeifyRule::new(FeatureKind::EndSurface, TreeifyAction::Pop(FEATURES)),
];

const SEGMENTS: &str = "segments";
const POLYGONS: &str = "polygons";
const FEATURES: &str = "features";

// ---------------------------------------------------------------------------
// Decoder rules
// ---------------------------------------------------------------------------

fn point(caps: &Captures<'_>, x: usize, y: usize, what: &str) -> std::result::Result<Point, String> {
    Ok(Point::new(
        capture_parse(caps, x, &format!("{} x", what))?,
        capture_parse(caps, y, &format!("{} y", what))?,
    ))
}

fn direction(caps: &Captures<'_>, group: usize) -> std::result::Result<CircleDirection, String> {
    CircleDirection::from_token(&caps[group])
        .ok_or_else(|| format!("invalid direction '{}'", &caps[group]))
}

fn build_surface_start(caps: &Captures<'_>) -> BuildResult<FeatureRecord> {
    let polarity = Polarity::from_token(&caps[1])
        .ok_or_else(|| format!("invalid polarity '{}'", &caps[1]))?;
    let suffix = parse_attribute_suffix(caps.get(3).map(|m| m.as_str()))?;
    Ok(Some(FeatureRecord::BeginSurface(SurfaceStart {
        polarity,
        dcode: capture_parse(caps, 2, "dcode")?,
        id: suffix.id,
        attributes: suffix.attributes,
    })))
}

fn build_surface_end(_: &Captures<'_>) -> BuildResult<FeatureRecord> {
    Ok(Some(FeatureRecord::EndSurface))
}

fn build_polygon_start(caps: &Captures<'_>) -> BuildResult<FeatureRecord> {
    let kind = PolygonKind::from_token(&caps[3])
        .ok_or_else(|| format!("invalid polygon type '{}'", &caps[3]))?;
    Ok(Some(FeatureRecord::BeginPolygon(PolygonStart {
        start: point(caps, 1, 2, "start")?,
        kind,
    })))
}

fn build_line_segment(caps: &Captures<'_>) -> BuildResult<FeatureRecord> {
    Ok(Some(FeatureRecord::LineSegment {
        end: point(caps, 1, 2, "end")?,
    }))
}

fn build_arc_segment(caps: &Captures<'_>) -> BuildResult<FeatureRecord> {
    Ok(Some(FeatureRecord::ArcSegment {
        end: point(caps, 1, 2, "end")?,
        center: point(caps, 3, 4, "center")?,
        direction: direction(caps, 5)?,
    }))
}

fn build_polygon_end(_: &Captures<'_>) -> BuildResult<FeatureRecord> {
    Ok(Some(FeatureRecord::EndPolygon))
}

fn rule(
    name: &'static str,
    pattern: &str,
    build: crate::decoder::Builder<FeatureRecord>,
) -> DecoderRule<FeatureRecord> {
    DecoderRule::new(name, Regex::new(pattern).unwrap(), build)
}

/// Rules for `S`/`SE` and `OB`/`OS`/`OC`/`OE` records, in match order
pub(crate) fn surface_rules() -> Vec<DecoderRule<FeatureRecord>> {
    vec![
        rule("surface", r"^S\s+([PN])\s+(\d+)(;\s*.*?)?$", build_surface_start),
        rule("surface end", r"^SE$", build_surface_end),
        rule(
            "polygon",
            r"^OB\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+([IH])$",
            build_polygon_start,
        ),
        rule("line segment", r"^OS\s+(-?[\.\d]+)\s+(-?[\.\d]+)$", build_line_segment),
        rule(
            "arc segment",
            r"^OC\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+(-?[\.\d]+)\s+([YN])$",
            build_arc_segment,
        ),
        rule("polygon end", r"^OE$", build_polygon_end),
    ]
}

// ---------------------------------------------------------------------------
// Typed feature tree
// ---------------------------------------------------------------------------

/// One edge of a polygon contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line {
        end: Point,
    },
    Arc {
        end: Point,
        center: Point,
        direction: CircleDirection,
    },
}

impl Segment {
    pub fn end(&self) -> Point {
        match self {
            Segment::Line { end } | Segment::Arc { end, .. } => *end,
        }
    }
}

/// A closed contour of a surface
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub kind: PolygonKind,
    pub start: Point,
    pub segments: Vec<Segment>,
}

/// A filled region: one or more outlines, each followed by its holes
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub polarity: Polarity,
    pub dcode: u32,
    pub id: Option<u64>,
    pub attributes: Attributes,
    pub polygons: Vec<Polygon>,
}

impl Surface {
    pub fn outlines(&self) -> impl Iterator<Item = &Polygon> {
        self.polygons.iter().filter(|p| p.kind == PolygonKind::Outline)
    }

    pub fn holes(&self) -> impl Iterator<Item = &Polygon> {
        self.polygons.iter().filter(|p| p.kind == PolygonKind::Hole)
    }
}

/// A top-level feature of a layer
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Pad(Pad),
    Line(Line),
    Arc(Arc),
    Text(Text),
    Surface(Surface),
}

/// A treeified feature record, still carrying its source line
pub type FeatureNode = Node<Located<FeatureRecord>, FeatureContainer>;

fn misplaced(source: &Located<FeatureRecord>, depth: usize, reason: impl Into<String>) -> OdbError {
    OdbError::Hierarchy {
        section: LAYER_FEATURES_SECTION.to_string(),
        line_number: source.line_number,
        line: source.line.clone(),
        depth,
        reason: reason.into(),
    }
}

/// Record a node was built from: the leaf itself or the opening record
fn node_source(node: &FeatureNode) -> &Located<FeatureRecord> {
    match node {
        Node::Leaf(record) => record,
        Node::Container(container) => container.opening(),
    }
}

fn build_polygon(node: FeatureNode) -> Result<Polygon> {
    let container = match node {
        Node::Container(c) if *c.kind() == FeatureContainer::Polygon => c,
        other => {
            return Err(misplaced(
                node_source(&other),
                1,
                "surface holds something other than a polygon",
            ))
        }
    };
    let (_, opening, fields) = container.into_parts();
    let start = match opening.record {
        FeatureRecord::BeginPolygon(start) => start,
        _ => return Err(misplaced(&opening, 2, "polygon container without a polygon start")),
    };

    let mut segments = Vec::new();
    for (field, children) in fields {
        for child in children {
            if field != SEGMENTS {
                return Err(misplaced(
                    node_source(&child),
                    2,
                    format!("polygon holds unexpected '{}'", field),
                ));
            }
            let segment = match child {
                Node::Leaf(Located {
                    record: FeatureRecord::LineSegment { end },
                    ..
                }) => Segment::Line { end },
                Node::Leaf(Located {
                    record:
                        FeatureRecord::ArcSegment {
                            end,
                            center,
                            direction,
                        },
                    ..
                }) => Segment::Arc {
                    end,
                    center,
                    direction,
                },
                other => {
                    return Err(misplaced(
                        node_source(&other),
                        2,
                        "polygon holds a non-segment record",
                    ))
                }
            };
            segments.push(segment);
        }
    }

    Ok(Polygon {
        kind: start.kind,
        start: start.start,
        segments,
    })
}

fn build_surface(container: Container<Located<FeatureRecord>, FeatureContainer>) -> Result<Surface> {
    let (_, opening, fields) = container.into_parts();
    let start = match opening.record {
        FeatureRecord::BeginSurface(start) => start,
        _ => return Err(misplaced(&opening, 1, "surface container without a surface start")),
    };

    let mut polygons = Vec::new();
    for (field, children) in fields {
        for child in children {
            if field != POLYGONS {
                return Err(misplaced(
                    node_source(&child),
                    1,
                    format!("surface holds '{}' outside of a polygon", field),
                ));
            }
            polygons.push(build_polygon(child)?);
        }
    }

    Ok(Surface {
        polarity: start.polarity,
        dcode: start.dcode,
        id: start.id,
        attributes: start.attributes,
        polygons,
    })
}

/// Convert a treeified feature forest into typed features.
///
/// Polygons must sit inside a surface and segments inside a polygon;
/// anything else is an [`OdbError::Hierarchy`] naming the offending line.
pub fn build_features(forest: Vec<FeatureNode>) -> Result<Vec<Feature>> {
    let mut features = Vec::with_capacity(forest.len());
    for node in forest {
        let feature = match node {
            Node::Leaf(located) => match located.record {
                FeatureRecord::Pad(pad) => Feature::Pad(pad),
                FeatureRecord::Line(line) => Feature::Line(line),
                FeatureRecord::Arc(arc) => Feature::Arc(arc),
                FeatureRecord::Text(text) => Feature::Text(text),
                ref record => {
                    let reason = format!("{:?} record outside of a polygon", record.kind());
                    return Err(misplaced(&located, 0, reason));
                }
            },
            Node::Container(c) if *c.kind() == FeatureContainer::Surface => {
                Feature::Surface(build_surface(c)?)
            }
            Node::Container(c) => {
                return Err(misplaced(c.opening(), 0, "polygon outside of a surface"));
            }
        };
        features.push(feature);
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Decoder;
    use crate::treeifier::Treeifier;

    fn forest(lines: &[&str]) -> Result<Vec<FeatureNode>> {
        let rules = surface_rules();
        let decoder = Decoder::new(&rules).with_section(LAYER_FEATURES_SECTION);
        let mut decode = decoder.decode(lines.iter());
        Treeifier::new(FEATURE_TREEIFY_RULES)
            .with_section(LAYER_FEATURES_SECTION)
            .try_treeify(std::iter::from_fn(|| decode.next_located()))
    }

    fn hierarchy_location(err: OdbError) -> (String, usize, String) {
        match err {
            OdbError::Hierarchy {
                section,
                line_number,
                line,
                ..
            } => (section, line_number, line),
            other => panic!("expected a hierarchy error, got {other:?}"),
        }
    }

    #[test]
    fn test_surface_with_outline_and_hole() {
        let nodes = forest(&[
            "S P 0;;ID=12",
            "OB 0 0 I",
            "OS 2 0",
            "OS 2 2",
            "OE",
            "OB 1 1 H",
            "OC 1 1 1.5 1 Y",
            "OE",
            "SE",
        ])
        .unwrap();
        let features = build_features(nodes).unwrap();
        assert_eq!(features.len(), 1);

        let Feature::Surface(surface) = &features[0] else {
            panic!("expected a surface");
        };
        assert_eq!(surface.id, Some(12));
        assert_eq!(surface.polygons.len(), 2);
        assert_eq!(surface.outlines().count(), 1);
        assert_eq!(surface.holes().count(), 1);
        assert_eq!(surface.polygons[0].segments.len(), 2);
        assert_eq!(surface.polygons[0].segments[1].end(), Point::new(2.0, 2.0));
        assert_eq!(
            surface.polygons[1].segments[0],
            Segment::Arc {
                end: Point::new(1.0, 1.0),
                center: Point::new(1.5, 1.0),
                direction: CircleDirection::Clockwise,
            }
        );
    }

    #[test]
    fn test_polygon_outside_surface() {
        let nodes = forest(&["OB 0 0 I", "OS 1 1", "OE"]).unwrap();
        let err = build_features(nodes).unwrap_err();
        assert!(err.to_string().contains("polygon outside of a surface"));
    }

    #[test]
    fn test_segment_outside_polygon() {
        let nodes = forest(&["OS 1 1"]).unwrap();
        assert!(matches!(build_features(nodes), Err(OdbError::Hierarchy { .. })));

        let nodes = forest(&["S N 3", "OS 1 1", "SE"]).unwrap();
        let err = build_features(nodes).unwrap_err();
        assert!(err.to_string().contains("outside of a polygon"));
    }

    #[test]
    fn test_lone_polygon_end() {
        let err = forest(&["OE"]).unwrap_err();
        assert!(matches!(err, OdbError::Hierarchy { depth: 0, .. }));
    }

    #[test]
    fn test_unterminated_surface() {
        let err = forest(&["S P 0", "OB 0 0 I", "OS 1 0", "OE"]).unwrap_err();
        assert!(matches!(err, OdbError::Hierarchy { depth: 1, .. }));
    }

    #[test]
    fn test_misplaced_records_name_their_line() {
        let nodes = forest(&["S P 0", "OB 0 0 I", "OE", "SE", "OB 5 5 I", "OS 6 6", "OE"]).unwrap();
        let err = build_features(nodes).unwrap_err();
        assert_eq!(
            hierarchy_location(err),
            ("Layer features".to_string(), 5, "OB 5 5 I".to_string())
        );

        let nodes = forest(&["S N 3", "OB 0 0 I", "OE", "OS 1 1", "SE"]).unwrap();
        let err = build_features(nodes).unwrap_err();
        assert_eq!(hierarchy_location(err).1, 4);

        let err = forest(&["S P 0", "OB 0 0 I", "OE", "SE", "SE"]).unwrap_err();
        assert_eq!(hierarchy_location(err), ("Layer features".to_string(), 5, "SE".to_string()));

        let err = forest(&["S P 0", "OB 0 0 I", "OS 1 0", "OE"]).unwrap_err();
        assert_eq!(hierarchy_location(err), ("Layer features".to_string(), 1, "S P 0".to_string()));
    }
}
