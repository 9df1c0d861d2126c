//! Decoded text of one logical file

use super::compression::Compression;
use crate::error::{OdbError, Result};
use std::borrow::Cow;

/// Text encoding that successfully decoded a logical file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1, used when the bytes are not valid UTF-8
    Latin1,
}

/// Decode raw bytes as UTF-8, falling back to Latin-1.
///
/// Latin-1 maps every byte, so the only content rejected is content with NUL
/// bytes, which is binary rather than text.
pub fn decode_text<'a>(name: &str, bytes: &'a [u8]) -> Result<(Cow<'a, str>, TextEncoding)> {
    if bytes.contains(&0) {
        return Err(OdbError::Encoding {
            name: name.to_string(),
            reason: "content contains NUL bytes".to_string(),
        });
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok((Cow::Borrowed(text), TextEncoding::Utf8)),
        Err(_) => Ok((encoding_rs::mem::decode_latin1(bytes), TextEncoding::Latin1)),
    }
}

/// The ordered lines of one named file inside a job.
///
/// Line order is physical file order. Lines have trailing whitespace
/// (including `\r`) removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalFile {
    name: String,
    lines: Vec<String>,
    encoding: TextEncoding,
    compression: Compression,
}

impl LogicalFile {
    /// Build a logical file from already decoded text
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            lines: text.lines().map(|l| l.trim_end().to_string()).collect(),
            encoding: TextEncoding::Utf8,
            compression: Compression::None,
        }
    }

    /// Decode raw bytes, recording which encoding and compression layer applied
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8], compression: Compression) -> Result<Self> {
        let name = name.into();
        let (text, encoding) = decode_text(&name, bytes)?;
        let mut file = Self::from_text(name, &text);
        file.encoding = encoding;
        file.compression = compression;
        Ok(file)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Compression layer that was removed to obtain the text
    pub fn compression(&self) -> Compression {
        self.compression
    }
}
