//! Decompression layers found on ODB++ archive members.
//!
//! Two layers occur in practice:
//! - **Unix compress** (`.Z`, magic `1F 9D`): legacy LZW, see [`lzw`]
//! - **gzip** (magic `1F 8B`): see [`gzip`]
//!
//! Zip single-entry containers are unwrapped by the container layer, not here.

pub mod gzip;
pub mod lzw;

use crate::error::Result;

pub use gzip::GzipDecompressor;
pub use lzw::UnixLzwDecompressor;

/// Trait for decompressing a complete in-memory payload.
pub trait Decompressor {
    /// Expand `source` into a new buffer
    fn decompress(&self, source: &[u8]) -> Result<Vec<u8>>;
}

/// Compression layer removed while reading a logical file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Zip,
    UnixLzw,
}

impl Compression {
    /// Identify the layer from the leading magic bytes.
    ///
    /// Only gzip and Unix compress are recognisable this way; plain text
    /// never starts with `0x1F`.
    pub fn sniff(bytes: &[u8]) -> Compression {
        match bytes {
            [0x1f, 0x9d, ..] => Compression::UnixLzw,
            [0x1f, 0x8b, ..] => Compression::Gzip,
            [b'P', b'K', 0x03, 0x04, ..] => Compression::Zip,
            _ => Compression::None,
        }
    }
}

/// Remove a gzip or Unix compress layer if `bytes` carries one.
///
/// Zip payloads are returned untouched; they need the container layer.
pub fn unwrap_payload(bytes: Vec<u8>) -> Result<(Vec<u8>, Compression)> {
    match Compression::sniff(&bytes) {
        Compression::UnixLzw => Ok((UnixLzwDecompressor.decompress(&bytes)?, Compression::UnixLzw)),
        Compression::Gzip => Ok((GzipDecompressor.decompress(&bytes)?, Compression::Gzip)),
        _ => Ok((bytes, Compression::None)),
    }
}
