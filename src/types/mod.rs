//! Core value types shared by records, symbols and documents

mod markers;
mod point;
pub mod units;

pub use markers::{CircleDirection, HolePlating, Mirror, Polarity, PolygonKind, SymbolReference};
pub use point::Point;
pub use units::Unit;
