//! Grammar table of the ODB++ standard symbols.
//!
//! Standard symbol names encode their geometry, e.g. `r120` (round, 120
//! diameter) or `rect60x30xr5x13` (rectangle with corners 1 and 3 rounded
//! by 5). The table is tried in order and the first grammar that matches
//! wins.

use crate::dispatch::Matcher;
use once_cell::sync::Lazy;
use regex::Regex;

/// Corner numbers of a rounded or chamfered shape (1 = top right, counter-clockwise)
pub type Corners = Vec<u8>;

fn all_corners() -> Corners {
    vec![1, 2, 3, 4]
}

fn parse_corners(group: &str) -> Corners {
    group
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| d as u8)
        .collect()
}

/// Geometry of a standard symbol
#[derive(Debug, Clone, PartialEq)]
pub enum StandardShape {
    Round { diameter: f64 },
    Square { side: f64 },
    Rectangle { width: f64, height: f64 },
    RoundedRectangle { width: f64, height: f64, corner_radius: f64, corners: Corners },
    ChamferedRectangle { width: f64, height: f64, chamfer: f64, corners: Corners },
    Oval { width: f64, height: f64 },
    Diamond { width: f64, height: f64 },
    Octagon { width: f64, height: f64, corner_size: f64 },
    RoundDonut { outer_diameter: f64, inner_diameter: f64 },
    SquareDonut { outer_size: f64, inner_size: f64 },
    SquareRoundDonut { outer_size: f64, inner_diameter: f64 },
    RoundedSquareDonut { outer_size: f64, inner_size: f64, corner_radius: f64, corners: Corners },
    RectangleDonut { outer_width: f64, outer_height: f64, line_width: f64 },
    RoundedRectangleDonut {
        outer_width: f64,
        outer_height: f64,
        line_width: f64,
        corner_radius: f64,
        corners: Corners,
    },
    OvalDonut { outer_width: f64, outer_height: f64, line_width: f64 },
    HorizontalHexagon { width: f64, height: f64, corner_size: f64 },
    VerticalHexagon { width: f64, height: f64, corner_size: f64 },
    Butterfly { diameter: f64 },
    SquareButterfly { size: f64 },
    Triangle { base: f64, height: f64 },
    HalfOval { width: f64, height: f64 },
    RoundThermalRounded { outer_diameter: f64, inner_diameter: f64, angle: f64, spokes: u32, gap: f64 },
    RoundThermalSquared { outer_diameter: f64, inner_diameter: f64, angle: f64, spokes: u32, gap: f64 },
    SquareThermal { outer_size: f64, inner_size: f64, angle: f64, spokes: u32, gap: f64 },
    SquareThermalOpenCorners { outer_size: f64, inner_size: f64, angle: f64, spokes: u32, gap: f64 },
    SquareRoundThermal { outer_size: f64, inner_diameter: f64, angle: f64, spokes: u32, gap: f64 },
    RectangularThermal {
        outer_width: f64,
        outer_height: f64,
        angle: f64,
        spokes: u32,
        gap: f64,
        air_gap: f64,
    },
    RectangularThermalOpenCorners {
        outer_width: f64,
        outer_height: f64,
        angle: f64,
        spokes: u32,
        gap: f64,
        air_gap: f64,
    },
    RoundedSquareThermal {
        outer_size: f64,
        inner_size: f64,
        angle: f64,
        spokes: u32,
        gap: f64,
        corner_radius: f64,
        corners: Corners,
    },
    RoundedSquareThermalOpenCorners {
        outer_size: f64,
        inner_size: f64,
        angle: f64,
        spokes: u32,
        gap: f64,
        corner_radius: f64,
        corners: Corners,
    },
    RoundedRectangleThermal {
        outer_width: f64,
        outer_height: f64,
        angle: f64,
        spokes: u32,
        gap: f64,
        air_gap: f64,
        corner_radius: f64,
        corners: Corners,
    },
    RoundedRectangleThermalOpenCorners {
        outer_width: f64,
        outer_height: f64,
        angle: f64,
        spokes: u32,
        gap: f64,
        air_gap: f64,
        corner_radius: f64,
        corners: Corners,
    },
    OvalThermal {
        outer_width: f64,
        outer_height: f64,
        angle: f64,
        spokes: u32,
        gap: f64,
        line_width: f64,
    },
    OvalThermalOpenCorners {
        outer_width: f64,
        outer_height: f64,
        angle: f64,
        spokes: u32,
        gap: f64,
        line_width: f64,
    },
    Ellipse { width: f64, height: f64 },
    Moire {
        ring_width: f64,
        ring_gap: f64,
        rings: u32,
        line_width: f64,
        line_length: f64,
        line_angle: f64,
    },
}

type ShapeBuilder = fn(&[f64], Corners) -> StandardShape;

/// One entry of the grammar table
pub struct SymbolGrammar {
    name: &'static str,
    pattern: Regex,
    /// Last capture group is an optional `x<digits>` corner list
    has_corners: bool,
    /// Numbers that are counts (spokes, rings) and must be whole
    counts: &'static [usize],
    build: ShapeBuilder,
}

impl SymbolGrammar {
    fn new(name: &'static str, pattern: &str, has_corners: bool, build: ShapeBuilder) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            has_corners,
            counts: &[],
            build,
        }
    }

    fn with_counts(mut self, counts: &'static [usize]) -> Self {
        self.counts = counts;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Matcher for SymbolGrammar {
    type Output = StandardShape;

    /// A matching name whose numbers do not parse counts as no match
    fn try_match(&self, input: &str) -> Option<StandardShape> {
        let caps = self.pattern.captures(input)?;
        let groups = caps.len() - 1;
        let numeric = if self.has_corners { groups - 1 } else { groups };

        let mut values = Vec::with_capacity(numeric);
        for group in 1..=numeric {
            values.push(caps.get(group)?.as_str().parse::<f64>().ok()?);
        }
        if !self.counts.iter().all(|&i| is_count(values[i])) {
            return None;
        }
        let corners = match caps.get(groups) {
            Some(m) if self.has_corners => parse_corners(m.as_str()),
            _ => all_corners(),
        };
        Some((self.build)(&values, corners))
    }
}

/// A whole, non-negative number that fits a `u32`
fn is_count(value: f64) -> bool {
    value.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&value)
}

const N: &str = r"([\.\d]+)";
const CORNERS: &str = r"(x[\.\d]+)?";

/// `^<prefix><n>x<n>...$` with `count` numbers
fn numbers(prefix: &str, count: usize) -> String {
    format!("^{}{}$", prefix, vec![N; count].join("x"))
}

/// Like [`numbers`], followed by `xr<n>` (or `xc<n>`) and an optional corner list
fn with_corners(prefix: &str, count: usize, marker: &str) -> String {
    format!("^{}{}x{}{}{}$", prefix, vec![N; count].join("x"), marker, N, CORNERS)
}

/// All standard symbol grammars, in match order
pub static STANDARD_GRAMMARS: Lazy<Vec<SymbolGrammar>> = Lazy::new(|| {
    use StandardShape::*;
    vec![
        SymbolGrammar::new("round", &numbers("r", 1), false, |v, _| Round { diameter: v[0] }),
        SymbolGrammar::new("square", &numbers("s", 1), false, |v, _| Square { side: v[0] }),
        SymbolGrammar::new("rectangle", &numbers("rect", 2), false, |v, _| Rectangle {
            width: v[0],
            height: v[1],
        }),
        SymbolGrammar::new("rounded rectangle", &with_corners("rect", 2, "r"), true, |v, c| {
            RoundedRectangle {
                width: v[0],
                height: v[1],
                corner_radius: v[2],
                corners: c,
            }
        }),
        SymbolGrammar::new("chamfered rectangle", &with_corners("rect", 2, "c"), true, |v, c| {
            ChamferedRectangle {
                width: v[0],
                height: v[1],
                chamfer: v[2],
                corners: c,
            }
        }),
        SymbolGrammar::new("oval", &numbers("oval", 2), false, |v, _| Oval {
            width: v[0],
            height: v[1],
        }),
        SymbolGrammar::new("diamond", &numbers("di", 2), false, |v, _| Diamond {
            width: v[0],
            height: v[1],
        }),
        SymbolGrammar::new("octagon", &numbers("oct", 3), false, |v, _| Octagon {
            width: v[0],
            height: v[1],
            corner_size: v[2],
        }),
        SymbolGrammar::new("round donut", &numbers("donut_r", 2), false, |v, _| RoundDonut {
            outer_diameter: v[0],
            inner_diameter: v[1],
        }),
        SymbolGrammar::new("square donut", &numbers("donut_s", 2), false, |v, _| SquareDonut {
            outer_size: v[0],
            inner_size: v[1],
        }),
        SymbolGrammar::new("square round donut", &numbers("donut_sr", 2), false, |v, _| {
            SquareRoundDonut {
                outer_size: v[0],
                inner_diameter: v[1],
            }
        }),
        SymbolGrammar::new("rounded square donut", &with_corners("donut_s", 2, "r"), true, |v, c| {
            RoundedSquareDonut {
                outer_size: v[0],
                inner_size: v[1],
                corner_radius: v[2],
                corners: c,
            }
        }),
        SymbolGrammar::new("rectangle donut", &numbers("donut_rc", 3), false, |v, _| {
            RectangleDonut {
                outer_width: v[0],
                outer_height: v[1],
                line_width: v[2],
            }
        }),
        SymbolGrammar::new(
            "rounded rectangle donut",
            &with_corners("donut_rc", 3, "r"),
            true,
            |v, c| RoundedRectangleDonut {
                outer_width: v[0],
                outer_height: v[1],
                line_width: v[2],
                corner_radius: v[3],
                corners: c,
            },
        ),
        SymbolGrammar::new("oval donut", &numbers("donut_o", 3), false, |v, _| OvalDonut {
            outer_width: v[0],
            outer_height: v[1],
            line_width: v[2],
        }),
        SymbolGrammar::new("horizontal hexagon", &numbers("hex_l", 3), false, |v, _| {
            HorizontalHexagon {
                width: v[0],
                height: v[1],
                corner_size: v[2],
            }
        }),
        SymbolGrammar::new("vertical hexagon", &numbers("hex_s", 3), false, |v, _| {
            VerticalHexagon {
                width: v[0],
                height: v[1],
                corner_size: v[2],
            }
        }),
        SymbolGrammar::new("butterfly", &numbers("bfr", 1), false, |v, _| Butterfly {
            diameter: v[0],
        }),
        SymbolGrammar::new("square butterfly", &numbers("bfs", 1), false, |v, _| {
            SquareButterfly { size: v[0] }
        }),
        SymbolGrammar::new("triangle", &numbers("tri", 2), false, |v, _| Triangle {
            base: v[0],
            height: v[1],
        }),
        SymbolGrammar::new("half oval", &numbers("oval_h", 2), false, |v, _| HalfOval {
            width: v[0],
            height: v[1],
        }),
        SymbolGrammar::new("round thermal rounded", &numbers("thr", 5), false, |v, _| {
            RoundThermalRounded {
                outer_diameter: v[0],
                inner_diameter: v[1],
                angle: v[2],
                spokes: v[3] as u32,
                gap: v[4],
            }
        })
        .with_counts(&[3]),
        SymbolGrammar::new("round thermal squared", &numbers("ths", 5), false, |v, _| {
            RoundThermalSquared {
                outer_diameter: v[0],
                inner_diameter: v[1],
                angle: v[2],
                spokes: v[3] as u32,
                gap: v[4],
            }
        })
        .with_counts(&[3]),
        SymbolGrammar::new("square thermal", &numbers("s_ths", 5), false, |v, _| SquareThermal {
            outer_size: v[0],
            inner_size: v[1],
            angle: v[2],
            spokes: v[3] as u32,
            gap: v[4],
        })
        .with_counts(&[3]),
        SymbolGrammar::new("square thermal open corners", &numbers("s_tho", 5), false, |v, _| {
            SquareThermalOpenCorners {
                outer_size: v[0],
                inner_size: v[1],
                angle: v[2],
                spokes: v[3] as u32,
                gap: v[4],
            }
        })
        .with_counts(&[3]),
        SymbolGrammar::new("square round thermal", &numbers("sr_ths", 5), false, |v, _| {
            SquareRoundThermal {
                outer_size: v[0],
                inner_diameter: v[1],
                angle: v[2],
                spokes: v[3] as u32,
                gap: v[4],
            }
        })
        .with_counts(&[3]),
        SymbolGrammar::new("rectangular thermal", &numbers("rc_ths", 6), false, |v, _| {
            RectangularThermal {
                outer_width: v[0],
                outer_height: v[1],
                angle: v[2],
                spokes: v[3] as u32,
                gap: v[4],
                air_gap: v[5],
            }
        })
        .with_counts(&[3]),
        SymbolGrammar::new(
            "rectangular thermal open corners",
            &numbers("rc_tho", 6),
            false,
            |v, _| RectangularThermalOpenCorners {
                outer_width: v[0],
                outer_height: v[1],
                angle: v[2],
                spokes: v[3] as u32,
                gap: v[4],
                air_gap: v[5],
            },
        )
        .with_counts(&[3]),
        SymbolGrammar::new(
            "rounded square thermal",
            &with_corners("s_ths", 5, "r"),
            true,
            |v, c| RoundedSquareThermal {
                outer_size: v[0],
                inner_size: v[1],
                angle: v[2],
                spokes: v[3] as u32,
                gap: v[4],
                corner_radius: v[5],
                corners: c,
            },
        )
        .with_counts(&[3]),
        SymbolGrammar::new(
            "rounded square thermal open corners",
            &with_corners("s_tho", 5, "r"),
            true,
            |v, c| RoundedSquareThermalOpenCorners {
                outer_size: v[0],
                inner_size: v[1],
                angle: v[2],
                spokes: v[3] as u32,
                gap: v[4],
                corner_radius: v[5],
                corners: c,
            },
        )
        .with_counts(&[3]),
        SymbolGrammar::new(
            "rounded rectangle thermal",
            &with_corners("rc_ths", 6, "r"),
            true,
            |v, c| RoundedRectangleThermal {
                outer_width: v[0],
                outer_height: v[1],
                angle: v[2],
                spokes: v[3] as u32,
                gap: v[4],
                air_gap: v[5],
                corner_radius: v[6],
                corners: c,
            },
        )
        .with_counts(&[3]),
        SymbolGrammar::new(
            "rounded rectangle thermal open corners",
            &with_corners("rc_tho", 6, "r"),
            true,
            |v, c| RoundedRectangleThermalOpenCorners {
                outer_width: v[0],
                outer_height: v[1],
                angle: v[2],
                spokes: v[3] as u32,
                gap: v[4],
                air_gap: v[5],
                corner_radius: v[6],
                corners: c,
            },
        )
        .with_counts(&[3]),
        SymbolGrammar::new("oval thermal", &numbers("o_ths", 6), false, |v, _| OvalThermal {
            outer_width: v[0],
            outer_height: v[1],
            angle: v[2],
            spokes: v[3] as u32,
            gap: v[4],
            line_width: v[5],
        })
        .with_counts(&[3]),
        SymbolGrammar::new("oval thermal open corners", &numbers("o_tho", 6), false, |v, _| {
            OvalThermalOpenCorners {
                outer_width: v[0],
                outer_height: v[1],
                angle: v[2],
                spokes: v[3] as u32,
                gap: v[4],
                line_width: v[5],
            }
        })
        .with_counts(&[3]),
        SymbolGrammar::new("ellipse", &numbers("el", 2), false, |v, _| Ellipse {
            width: v[0],
            height: v[1],
        }),
        SymbolGrammar::new("moire", &numbers("moire", 6), false, |v, _| Moire {
            ring_width: v[0],
            ring_gap: v[1],
            rings: v[2] as u32,
            line_width: v[3],
            line_length: v[4],
            line_angle: v[5],
        })
        .with_counts(&[2]),
    ]
});
