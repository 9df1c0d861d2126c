//! Plain directory jobs

use super::{member_path, ContainerKind, JobContainer, MemberBytes};
use crate::error::{OdbError, Result};
use crate::io::compression::{unwrap_payload, Decompressor, UnixLzwDecompressor, Compression};
use std::fs;
use std::path::{Path, PathBuf};

/// A job unpacked on disk.
///
/// Members may still carry a gzip or `.Z` layer; both are detected from the
/// payload. A missing `<name>` falls back to `<name>.Z`.
#[derive(Debug, Clone)]
pub struct DirectoryContainer {
    root: PathBuf,
}

impl DirectoryContainer {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl JobContainer for DirectoryContainer {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Directory
    }

    fn path(&self) -> &Path {
        &self.root
    }

    fn read_member(&self, logical_name: &str) -> Result<MemberBytes> {
        let plain = member_path(&self.root, logical_name);
        if plain.is_file() {
            let (bytes, compression) = unwrap_payload(fs::read(&plain)?)?;
            return Ok(MemberBytes::new(bytes, compression));
        }

        let compressed = member_path(&self.root, &format!("{}.Z", logical_name));
        if compressed.is_file() {
            let bytes = UnixLzwDecompressor.decompress(&fs::read(&compressed)?)?;
            return Ok(MemberBytes::new(bytes, Compression::UnixLzw));
        }

        Err(OdbError::resolution(
            &plain,
            format!("no member '{}' or '{}.Z'", logical_name, logical_name),
        ))
    }
}
