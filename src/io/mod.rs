//! I/O module for reading ODB++ jobs from directories and archives
//!
//! - [`container`]: resolves a job path and opens logical files in it
//! - [`compression`]: `.Z` and gzip member payloads
//! - [`logical_file`]: text decoding of one member
//! - [`line_records`]: section splitting of a decoded file
//! - [`reader`]: [`OdbReader`], the entry point tying these together

pub mod compression;
pub mod container;
pub mod line_records;
pub mod logical_file;
pub mod reader;

pub use compression::Compression;
pub use container::{open_container, open_logical_file, ContainerKind, JobContainer};
pub use line_records::LineRecords;
pub use logical_file::{LogicalFile, TextEncoding};
pub use reader::{OdbReader, ReaderConfiguration};
