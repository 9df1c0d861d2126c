//! Symbol names of the `Feature symbol names` table.
//!
//! Every feature references a symbol by index; the table maps the index to
//! a name such as `r120`, `rect20x10 I` or `my_pad`. A name is resolved by
//! first-match dispatch over the standard grammars, then the `hole` grammar,
//! and finally falls back to a user-defined symbol.

pub mod standard;

pub use standard::{Corners, StandardShape, SymbolGrammar, STANDARD_GRAMMARS};

use crate::dispatch::Dispatcher;
use crate::types::HolePlating;
use once_cell::sync::Lazy;
use regex::Regex;

static HOLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^hole([\.\d]+)x([pnv])x([\.\d]+)x([\.\d]+)$").unwrap());

/// Drill hole symbol (`hole<d>x<p|n|v>x<tol+>x<tol->`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hole {
    pub diameter: f64,
    pub plating: HolePlating,
    pub tolerance_plus: f64,
    pub tolerance_minus: f64,
}

impl Hole {
    pub fn parse(name: &str) -> Option<Hole> {
        let caps = HOLE.captures(name)?;
        Some(Hole {
            diameter: caps[1].parse().ok()?,
            plating: HolePlating::from_token(&caps[2])?,
            tolerance_plus: caps[3].parse().ok()?,
            tolerance_minus: caps[4].parse().ok()?,
        })
    }
}

/// A resolved symbol name
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// One of the standard geometries, with the unit token if present
    Standard {
        shape: StandardShape,
        unit: Option<String>,
    },
    /// A drill hole, with the unit token if present
    Hole { hole: Hole, unit: Option<String> },
    /// A symbol defined under `symbols/<name>`
    User { name: String, unit: Option<String> },
}

impl Symbol {
    pub fn unit(&self) -> Option<&str> {
        match self {
            Symbol::Standard { unit, .. }
            | Symbol::Hole { unit, .. }
            | Symbol::User { unit, .. } => unit.as_deref(),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Symbol::User { .. })
    }
}

/// Split `name unit` at the first space
fn split_unit(name: &str) -> (&str, Option<String>) {
    match name.split_once(' ') {
        Some((head, unit)) if !unit.is_empty() => (head, Some(unit.to_string())),
        Some((head, _)) => (head, None),
        None => (name, None),
    }
}

/// Resolve a symbol name
pub fn parse_symbol_name(name: &str) -> Symbol {
    let (head, unit) = split_unit(name);
    if let Some(shape) = Dispatcher::new(&STANDARD_GRAMMARS).dispatch(head) {
        return Symbol::Standard { shape, unit };
    }
    if let Some(hole) = Hole::parse(head) {
        return Symbol::Hole { hole, unit };
    }
    Symbol::User {
        name: head.to_string(),
        unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_with_unit() {
        assert_eq!(
            parse_symbol_name("r120 I"),
            Symbol::Standard {
                shape: StandardShape::Round { diameter: 120.0 },
                unit: Some("I".to_string()),
            }
        );
        assert_eq!(parse_symbol_name("s50").unit(), None);
    }

    #[test]
    fn test_hole() {
        assert_eq!(
            parse_symbol_name("hole50xpx4x5"),
            Symbol::Hole {
                hole: Hole {
                    diameter: 50.0,
                    plating: HolePlating::Plated,
                    tolerance_plus: 4.0,
                    tolerance_minus: 5.0,
                },
                unit: None,
            }
        );
        assert!(matches!(
            parse_symbol_name("hole50xvx4x5"),
            Symbol::Hole {
                hole: Hole { plating: HolePlating::Via, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_hole_with_unit() {
        let symbol = parse_symbol_name("hole30xpx1x1 I");
        assert_eq!(symbol.unit(), Some("I"));
        match symbol {
            Symbol::Hole { hole, .. } => {
                assert_eq!(hole.diameter, 30.0);
                assert_eq!(hole.plating, HolePlating::Plated);
            }
            other => panic!("expected a hole, got {other:?}"),
        }
        assert!(matches!(parse_symbol_name("hole30xnx1x1 M"), Symbol::Hole { .. }));
    }

    #[test]
    fn test_user_symbol_fallback() {
        assert_eq!(
            parse_symbol_name("my_pad M"),
            Symbol::User {
                name: "my_pad".to_string(),
                unit: Some("M".to_string()),
            }
        );
        let sym = parse_symbol_name("rect1x2x3");
        assert!(sym.is_user());
    }
}
