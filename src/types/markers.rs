//! Single-letter markers used across ODB++ line records
//!
//! Each marker type parses from the exact token found in the file and keeps
//! no trace of the legacy spelling.

use std::fmt;

/// Positive features add material, negative ones remove it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Polarity {
    #[default]
    Positive,
    Negative,
}

impl Polarity {
    /// Parse the `P` / `N` token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "P" => Some(Polarity::Positive),
            "N" => Some(Polarity::Negative),
            _ => None,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Positive => write!(f, "P"),
            Polarity::Negative => write!(f, "N"),
        }
    }
}

/// Mirroring applied to a placed symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mirror {
    #[default]
    None,
    /// Reflection about the X axis
    MirrorX,
}

impl Mirror {
    /// Map an orientation class (`8` or `9`) to its mirror mode
    pub fn from_orientation_class(class: u8) -> Option<Self> {
        match class {
            8 => Some(Mirror::None),
            9 => Some(Mirror::MirrorX),
            _ => None,
        }
    }
}

/// Travel direction of an arc
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircleDirection {
    Clockwise,
    CounterClockwise,
}

impl CircleDirection {
    /// Parse the `Y` (clockwise) / `N` token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Y" => Some(CircleDirection::Clockwise),
            "N" => Some(CircleDirection::CounterClockwise),
            _ => None,
        }
    }
}

/// Plating of a drill hole symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HolePlating {
    Plated,
    NonPlated,
    Via,
}

impl HolePlating {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "p" => Some(HolePlating::Plated),
            "n" => Some(HolePlating::NonPlated),
            "v" => Some(HolePlating::Via),
            _ => None,
        }
    }
}

/// Role of a polygon inside a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonKind {
    /// Island: the outer contour
    Outline,
    /// Subtracts from the enclosing outline
    Hole,
}

impl PolygonKind {
    /// Parse the `I` / `H` token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "I" => Some(PolygonKind::Outline),
            "H" => Some(PolygonKind::Hole),
            _ => None,
        }
    }
}

/// Reference from a feature into the layer's symbol table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolReference {
    /// Index into the `$<n>` symbol name table
    pub index: u32,
    /// Scale applied to the symbol
    pub resize_factor: f64,
}

impl SymbolReference {
    pub const fn new(index: u32, resize_factor: f64) -> Self {
        SymbolReference {
            index,
            resize_factor,
        }
    }

    /// Reference with the default resize factor of 1.0
    pub const fn unscaled(index: u32) -> Self {
        SymbolReference::new(index, 1.0)
    }
}
