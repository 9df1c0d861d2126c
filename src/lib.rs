//! # odbrust
//!
//! A pure Rust library for reading ODB++ PCB fabrication data.
//!
//! An ODB++ job is a tree of line record text files, stored either as a
//! directory or packed into a tar, gzip or zip archive, with some members
//! individually compressed by Unix `compress` (`.Z`).
//!
//! ## Features
//!
//! - One logical file view over directories, `.tgz`/`.tar`, `.gz` and `.zip`
//! - Legacy LZW (`.Z`) decompression
//! - UTF-8 decoding with Latin-1 fallback
//! - Layer features (pads, lines, arcs, text, surfaces) with symbol resolution
//! - Netlists grouped by net
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use odbrust::OdbReader;
//!
//! let reader = OdbReader::from_path("job.tgz")?;
//! let top = reader.read_layer_features("pcb", "top")?;
//! for feature in &top.features {
//!     println!("Feature: {:?}", feature);
//! }
//!
//! let netlist = reader.read_netlist("pcb")?;
//! println!("{} nets", netlist.nets.len());
//! # Ok::<(), odbrust::error::OdbError>(())
//! ```
//!
//! ## Architecture
//!
//! Every record family is decoded by the same three pieces:
//!
//! - [`Decoder`] - first-match line grammar dispatch
//! - [`Treeifier`] - turns a flat record stream with open/close markers into a forest
//! - [`Dispatcher`] - the first-match idiom, also used for symbol names

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod decoder;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod io;
pub mod notification;
pub mod records;
pub mod symbols;
pub mod treeifier;
pub mod types;

// Re-export commonly used types
pub use error::{OdbError, Result};
pub use notification::{Notification, NotificationCollection, NotificationType};
pub use types::{
    CircleDirection, HolePlating, Mirror, Point, Polarity, PolygonKind, SymbolReference, Unit,
};

// Re-export the engines
pub use decoder::{DecodeMode, Decoder, DecoderRule, Located};
pub use dispatch::{Dispatcher, Matcher};
pub use treeifier::{treeify, Container, Node, Treeifier, TreeifyAction, TreeifyRule};

// Re-export record and symbol types
pub use records::{Feature, FeatureRecord, Netlist, NetlistPoint, Polygon, Segment, Surface};
pub use symbols::{parse_symbol_name, Hole, StandardShape, Symbol};

// Re-export document
pub use document::LayerFeatures;

// Re-export I/O types
pub use io::{open_container, open_logical_file, LineRecords, LogicalFile, OdbReader, ReaderConfiguration};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compiles the README usage example
#[cfg(doctest)]
#[doc = include_str!("../README.md")]
pub struct ReadmeDoctests;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_reader_configuration_default() {
        let config = ReaderConfiguration::default();
        assert_eq!(config.feature_mode, DecodeMode::Strict);
    }
}
