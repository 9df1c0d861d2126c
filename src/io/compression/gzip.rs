//! gzip payloads (single-file containers and gzipped members)

use super::Decompressor;
use crate::error::{OdbError, Result};
use flate2::read::MultiGzDecoder;
use std::io::Read;

/// Decompressor for gzip streams, including concatenated members.
pub struct GzipDecompressor;

impl Decompressor for GzipDecompressor {
    fn decompress(&self, source: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = MultiGzDecoder::new(source);
        let mut buffer = Vec::with_capacity(source.len() * 4);
        decoder
            .read_to_end(&mut buffer)
            .map_err(|e| OdbError::Decompression(format!("gzip: {}", e)))?;
        Ok(buffer)
    }
}
