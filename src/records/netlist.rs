//! Netlist files (`steps/<step>/netlists/cadnet/netlist`).
//!
//! ```text
//! H optimize n staggered n
//! $0 GND
//! $1 VCC
//! #
//! #Netlist points
//! #
//! 0 0.0118 1.25 3.5 T e e
//! 1 0.0118 2.5 3.5 B 0.02 0.03 m c v t
//! ```
//!
//! The header lines and the `$<id> <name>` table sit before the first
//! section marker. Points reference nets by id and are grouped per net.

use crate::decoder::{capture_parse, BuildResult, DecodeMode, Decoder, DecoderRule};
use crate::error::Result;
use crate::io::LineRecords;
use crate::notification::{NotificationCollection, NotificationType};
use crate::types::units::detect_unit;
use crate::types::{Point, Unit};
use bitflags::bitflags;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

/// Section holding the netlist points
pub const NETLIST_POINTS_SECTION: &str = "Netlist points";
const HEADER_SECTION: &str = "Header";

/// Side of the board a netlist point is accessible from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointSide {
    Top,
    /// `D`: down
    Bottom,
    Both,
    /// `I`: inner layer only
    Inner,
}

impl PointSide {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "T" => Some(PointSide::Top),
            "D" => Some(PointSide::Bottom),
            "B" => Some(PointSide::Both),
            "I" => Some(PointSide::Inner),
            _ => None,
        }
    }
}

/// Whether the point is the end of a net branch or a mid point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointLocation {
    End,
    Middle,
}

/// Solder mask state over the point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolderMaskExposure {
    Exposed,
    Covered,
    /// Covered on the primary side only
    CoveredPrimary,
    /// Covered on the secondary side only
    CoveredSecondary,
}

impl SolderMaskExposure {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "e" => Some(SolderMaskExposure::Exposed),
            "c" => Some(SolderMaskExposure::Covered),
            "p" => Some(SolderMaskExposure::CoveredPrimary),
            "s" => Some(SolderMaskExposure::CoveredSecondary),
            _ => None,
        }
    }
}

bitflags! {
    /// Single-letter markers trailing a netlist point.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NetlistPointFlags: u8 {
        /// `c`: commented point
        const COMMENT = 0x1;
        /// `v`: via
        const VIA = 0x2;
        /// `f`: fiducial
        const FIDUCIAL = 0x4;
        /// `t`: test point
        const TEST_POINT = 0x8;
    }
}

/// Staggered probe position of a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Staggered {
    pub position: Point,
    pub radius: f64,
}

/// One point of a net
#[derive(Debug, Clone, PartialEq)]
pub struct NetlistPoint {
    pub net_id: u32,
    /// Filled from the `$<id>` table when the id is known
    pub net_name: Option<String>,
    pub radius: f64,
    pub position: Point,
    pub side: PointSide,
    /// Width and height of a non-round point
    pub size: Option<(f64, f64)>,
    pub location: PointLocation,
    pub exposure: SolderMaskExposure,
    pub flags: NetlistPointFlags,
    pub staggered: Option<Staggered>,
    /// Trailing tokens with no known meaning, in file order
    pub extra: Vec<String>,
}

/// Options from the `H` line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetlistHeader {
    pub optimized: bool,
    pub staggered: Option<bool>,
}

/// A decoded netlist
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Netlist {
    /// Unit of the coordinates, when the file declares one
    pub unit: Option<Unit>,
    pub header: Option<NetlistHeader>,
    /// Net id to net name
    pub net_names: IndexMap<u32, String>,
    /// Points per net id, file order within each net
    pub nets: BTreeMap<u32, Vec<NetlistPoint>>,
    pub notifications: NotificationCollection,
}

impl Netlist {
    /// Points of the net called `name`
    pub fn net_by_name(&self, name: &str) -> Option<&[NetlistPoint]> {
        let id = self.net_names.iter().find(|(_, n)| n.as_str() == name)?.0;
        self.nets.get(id).map(|v| v.as_slice())
    }

    pub fn point_count(&self) -> usize {
        self.nets.values().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Point records
// ---------------------------------------------------------------------------

type FieldResult<T> = std::result::Result<T, String>;

fn parse_trailing(tokens: &str, point: &mut NetlistPoint) -> FieldResult<()> {
    let mut tokens = tokens.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            "c" => point.flags |= NetlistPointFlags::COMMENT,
            "v" => point.flags |= NetlistPointFlags::VIA,
            "f" => point.flags |= NetlistPointFlags::FIDUCIAL,
            "t" => point.flags |= NetlistPointFlags::TEST_POINT,
            "staggered" => {
                let mut number = || -> FieldResult<f64> {
                    let raw = tokens.next().ok_or("staggered needs three values")?;
                    raw.parse::<f64>()
                        .map_err(|_| format!("invalid staggered value '{}'", raw))
                };
                let x = number()?;
                let y = number()?;
                let radius = number()?;
                point.staggered = Some(Staggered {
                    position: Point::new(x, y),
                    radius,
                });
            }
            other => point.extra.push(other.to_string()),
        }
    }
    Ok(())
}

fn build_point(caps: &Captures<'_>) -> BuildResult<NetlistPoint> {
    let side = PointSide::from_token(&caps[5]).ok_or_else(|| format!("invalid side '{}'", &caps[5]))?;
    let size = match (caps.get(6), caps.get(7)) {
        (Some(_), Some(_)) => Some((capture_parse(caps, 6, "width")?, capture_parse(caps, 7, "height")?)),
        _ => None,
    };
    let location = if &caps[8] == "m" {
        PointLocation::Middle
    } else {
        PointLocation::End
    };
    let exposure = SolderMaskExposure::from_token(&caps[9])
        .ok_or_else(|| format!("invalid exposure '{}'", &caps[9]))?;

    let mut point = NetlistPoint {
        net_id: capture_parse(caps, 1, "net id")?,
        net_name: None,
        radius: capture_parse(caps, 2, "radius")?,
        position: Point::new(capture_parse(caps, 3, "x")?, capture_parse(caps, 4, "y")?),
        side,
        size,
        location,
        exposure,
        flags: NetlistPointFlags::empty(),
        staggered: None,
        extra: Vec::new(),
    };
    parse_trailing(caps.get(10).map_or("", |m| m.as_str()), &mut point)?;
    Ok(Some(point))
}

/// Rules of the `Netlist points` section
pub static NETLIST_RULES: Lazy<Vec<DecoderRule<NetlistPoint>>> = Lazy::new(|| {
    vec![DecoderRule::new(
        "netlist point",
        Regex::new(
            r"^(\d+)\s+(-?[\d.]+)\s+(-?[\d.]+)\s+(-?[\d.]+)\s+([TDBI])(?:\s+(-?[\d.]+)\s+(-?[\d.]+))?\s+([em])\s+([ecps])(\s.*)?$",
        )
        .unwrap(),
        build_point,
    )]
});

// ---------------------------------------------------------------------------
// Header records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum HeaderRecord {
    Options(NetlistHeader),
    NetName(u32, String),
}

fn build_options(caps: &Captures<'_>) -> BuildResult<HeaderRecord> {
    Ok(Some(HeaderRecord::Options(NetlistHeader {
        optimized: &caps[1] == "y",
        staggered: caps.get(2).map(|m| m.as_str() == "y"),
    })))
}

fn build_net_name(caps: &Captures<'_>) -> BuildResult<HeaderRecord> {
    Ok(Some(HeaderRecord::NetName(
        capture_parse(caps, 1, "net id")?,
        caps[2].trim().to_string(),
    )))
}

static HEADER_RULES: Lazy<Vec<DecoderRule<HeaderRecord>>> = Lazy::new(|| {
    vec![
        DecoderRule::new(
            "netlist options",
            Regex::new(r"^H\s+optimize\s+([yn])(?:\s+staggered\s+([yn]))?$").unwrap(),
            build_options,
        ),
        DecoderRule::new("net name", Regex::new(r"^\$(\d+)\s+(\S.*)$").unwrap(), build_net_name),
    ]
});

/// The `H` options line and the net name table of a netlist
pub fn parse_netlist_header(
    records: &LineRecords,
    mode: DecodeMode,
) -> Result<(Option<NetlistHeader>, IndexMap<u32, String>)> {
    let decoder = Decoder::new(&HEADER_RULES)
        .with_mode(mode)
        .with_section(HEADER_SECTION);

    let mut header = None;
    let mut names = IndexMap::new();
    // UNITS= and ID= lines share this section
    let lines = records
        .lines(HEADER_SECTION)
        .iter()
        .filter(|l| !l.starts_with("UNITS=") && !l.starts_with("ID="));
    for record in decoder.decode(lines).records() {
        match record? {
            HeaderRecord::Options(options) => header = Some(options),
            HeaderRecord::NetName(id, name) => {
                names.insert(id, name);
            }
        }
    }
    Ok((header, names))
}

/// Net id to net name table of a netlist
pub fn parse_net_names(records: &LineRecords) -> Result<IndexMap<u32, String>> {
    parse_netlist_header(records, DecodeMode::Lenient).map(|(_, names)| names)
}

/// Fill `net_name` from the net name table
pub fn assign_net_name(names: &IndexMap<u32, String>, mut point: NetlistPoint) -> NetlistPoint {
    point.net_name = names.get(&point.net_id).cloned();
    point
}

/// Group points by net id, keeping file order within each net
pub fn group_by_net<I>(points: I) -> BTreeMap<u32, Vec<NetlistPoint>>
where
    I: IntoIterator<Item = NetlistPoint>,
{
    let mut nets: BTreeMap<u32, Vec<NetlistPoint>> = BTreeMap::new();
    for point in points {
        nets.entry(point.net_id).or_default().push(point);
    }
    nets
}

/// Decode a whole netlist file.
///
/// Points are decoded lazily and grouped as they stream by.
pub fn decode_netlist(records: &LineRecords, mode: DecodeMode) -> Result<Netlist> {
    let mut notifications = NotificationCollection::new();

    let unit = detect_unit(records)?;
    if unit.is_none() {
        notifications.notify(NotificationType::Fallback, "netlist declares no unit");
    }
    let (header, net_names) = parse_netlist_header(records, mode)?;

    let decoder = Decoder::new(&NETLIST_RULES)
        .with_mode(mode)
        .with_section(NETLIST_POINTS_SECTION);
    let mut decode = decoder.decode(records.lines(NETLIST_POINTS_SECTION));
    let mut nets: BTreeMap<u32, Vec<NetlistPoint>> = BTreeMap::new();
    for point in decode.by_ref().filter_map(|item| item.transpose()) {
        let point = assign_net_name(&net_names, point?);
        nets.entry(point.net_id).or_default().push(point);
    }

    if decode.unmatched() > 0 {
        let first = decode
            .first_unmatched()
            .map(|(n, line)| format!(", first at line {}: '{}'", n, line))
            .unwrap_or_default();
        notifications.notify(
            NotificationType::Discarded,
            format!("{} unrecognised netlist lines skipped{}", decode.unmatched(), first),
        );
    }

    Ok(Netlist {
        unit,
        header,
        net_names,
        nets,
        notifications,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OdbError;

    const NETLIST: &str = "H optimize n staggered y
$0 GND
$1 VCC
$3 Net With Spaces
#
#Netlist points
#
3 0.0118 1.25 3.5 T e e
3 0.0118 2.5 3.5 B 0.02 0.03 m c v t
1 0.01 0 0 D e p staggered 0.5 0.25 0.01 x7
";

    fn point(line: &str) -> NetlistPoint {
        Decoder::new(&NETLIST_RULES).decode_line(1, line).unwrap().unwrap()
    }

    #[test]
    fn test_point_fields() {
        let p = point("3 0.0118 2.5 3.5 B 0.02 0.03 m c v t");
        assert_eq!(p.net_id, 3);
        assert_eq!(p.position, Point::new(2.5, 3.5));
        assert_eq!(p.side, PointSide::Both);
        assert_eq!(p.size, Some((0.02, 0.03)));
        assert_eq!(p.location, PointLocation::Middle);
        assert_eq!(p.exposure, SolderMaskExposure::Covered);
        assert_eq!(p.flags, NetlistPointFlags::VIA | NetlistPointFlags::TEST_POINT);
        assert!(p.extra.is_empty());
    }

    #[test]
    fn test_staggered_and_extra_tokens() {
        let p = point("1 0.01 0 0 D e p staggered 0.5 0.25 0.01 x7");
        assert_eq!(
            p.staggered,
            Some(Staggered {
                position: Point::new(0.5, 0.25),
                radius: 0.01
            })
        );
        assert_eq!(p.extra, ["x7"]);
        assert_eq!(p.size, None);
    }

    #[test]
    fn test_truncated_staggered_is_error() {
        let err = Decoder::new(&NETLIST_RULES)
            .decode_line(4, "1 0.01 0 0 D e e staggered 0.5")
            .unwrap_err();
        assert!(matches!(err, OdbError::LineFormat { line_number: 4, .. }));
    }

    #[test]
    fn test_header_and_names() {
        let records = LineRecords::from_lines(NETLIST.lines());
        let (header, names) = parse_netlist_header(&records, DecodeMode::Strict).unwrap();
        assert_eq!(
            header,
            Some(NetlistHeader {
                optimized: false,
                staggered: Some(true)
            })
        );
        assert_eq!(names.get(&3).map(String::as_str), Some("Net With Spaces"));
        assert_eq!(parse_net_names(&records).unwrap().len(), 3);
    }

    #[test]
    fn test_group_by_net_keeps_order() {
        let a = point("3 0.1 1 1 T e e");
        let b = point("3 0.1 2 2 T e e");
        let c = point("1 0.1 3 3 T e e");
        let nets = group_by_net(vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(nets.keys().copied().collect::<Vec<_>>(), [1, 3]);
        assert_eq!(nets[&1], [c]);
        assert_eq!(nets[&3], [a, b]);
    }

    #[test]
    fn test_decode_netlist() {
        let text = format!("{}garbage line\n", NETLIST);
        let records = LineRecords::from_lines(text.lines());
        let netlist = decode_netlist(&records, DecodeMode::Lenient).unwrap();

        assert_eq!(netlist.unit, None);
        assert_eq!(netlist.point_count(), 3);
        assert_eq!(netlist.nets[&3].len(), 2);
        assert_eq!(netlist.nets[&1][0].net_name.as_deref(), Some("VCC"));
        assert_eq!(netlist.net_by_name("Net With Spaces").map(|p| p.len()), Some(2));
        assert!(netlist.notifications.has_type(NotificationType::Discarded));
        assert!(netlist.notifications.has_type(NotificationType::Fallback));
    }

    #[test]
    fn test_decode_netlist_strict_rejects_garbage() {
        let text = format!("{}garbage line\n", NETLIST);
        let records = LineRecords::from_lines(text.lines());
        assert!(decode_netlist(&records, DecodeMode::Strict).is_err());
    }

    #[test]
    fn test_netlist_with_units_header() {
        let records = LineRecords::from_lines(
            "UNITS=INCH\nH optimize y\n$0 A\n#\n#Netlist points\n#\n0 0.01 0 0 T e e\n".lines(),
        );
        let netlist = decode_netlist(&records, DecodeMode::Strict).unwrap();
        assert_eq!(netlist.unit, Some(Unit::Inch));
        assert_eq!(netlist.header.map(|h| h.optimized), Some(true));
        assert!(netlist.notifications.is_empty());
    }
}
