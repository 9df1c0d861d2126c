//! Job containers: one "open logical file" capability over every storage kind.
//!
//! An ODB++ job is stored as one of:
//! - a plain directory tree
//! - a tar archive (`.tgz`, `.tar.gz`, `.tar`, or a `.gz` that unpacks to tar)
//! - a gzip single-file container (`.gz` that is not a tar)
//! - a zip container holding exactly one entry (`.zip`)
//!
//! [`open_container`] picks the strategy from the path. Every strategy
//! implements [`JobContainer`], so callers never branch on the storage kind.

mod directory;
mod single;
mod archive;

pub use directory::DirectoryContainer;
pub use single::{GzipFileContainer, ZipFileContainer};
pub use archive::TarContainer;

use super::compression::Compression;
use super::logical_file::LogicalFile;
use crate::error::{OdbError, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Offset of the `ustar` magic inside a tar header block
const USTAR_OFFSET: usize = 257;
const USTAR_MAGIC: &[u8] = b"ustar";

/// Physical storage kind of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Directory,
    /// gzip single-file container
    Gzip,
    /// zip container with one entry
    Zip,
    Tar { gzipped: bool },
}

/// Raw bytes of a member with any compression layer already removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberBytes {
    pub bytes: Vec<u8>,
    /// Layer that was removed to produce `bytes`
    pub compression: Compression,
}

impl MemberBytes {
    pub fn new(bytes: Vec<u8>, compression: Compression) -> Self {
        Self { bytes, compression }
    }
}

/// A storage strategy able to serve the logical files of one job.
pub trait JobContainer {
    /// Storage kind of this container
    fn kind(&self) -> ContainerKind;

    /// Path the container was opened from
    fn path(&self) -> &Path;

    /// Read the decompressed bytes of `logical_name`.
    ///
    /// Logical names use `/` separators relative to the job root, e.g.
    /// `steps/pcb/layers/top/features`.
    fn read_member(&self, logical_name: &str) -> Result<MemberBytes>;

    /// Read `logical_name` and decode it into ordered text lines
    fn open_logical_file(&self, logical_name: &str) -> Result<LogicalFile> {
        let member = self.read_member(logical_name)?;
        LogicalFile::from_bytes(logical_name, &member.bytes, member.compression)
    }
}

/// Determine how the job at `path` is stored.
pub fn detect_kind(path: &Path) -> Result<ContainerKind> {
    if path.is_dir() {
        return Ok(ContainerKind::Directory);
    }
    if !path.is_file() {
        return Err(OdbError::resolution(path, "not found"));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if name.ends_with(".tgz") || name.ends_with(".tar.gz") {
        Ok(ContainerKind::Tar { gzipped: true })
    } else if name.ends_with(".tar") {
        Ok(ContainerKind::Tar { gzipped: false })
    } else if name.ends_with(".gz") {
        if gzip_holds_tar(path)? {
            Ok(ContainerKind::Tar { gzipped: true })
        } else {
            Ok(ContainerKind::Gzip)
        }
    } else if name.ends_with(".zip") {
        Ok(ContainerKind::Zip)
    } else {
        Err(OdbError::resolution(path, "unsupported container type"))
    }
}

/// Peek at the first decompressed block of a `.gz` file for the tar magic
fn gzip_holds_tar(path: &Path) -> Result<bool> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(512);
    MultiGzDecoder::new(file)
        .take(512)
        .read_to_end(&mut head)
        .map_err(|e| OdbError::Decompression(format!("gzip: {}", e)))?;
    Ok(head.len() >= USTAR_OFFSET + USTAR_MAGIC.len()
        && &head[USTAR_OFFSET..USTAR_OFFSET + USTAR_MAGIC.len()] == USTAR_MAGIC)
}

/// Open the job at `path` with the matching storage strategy
pub fn open_container<P: AsRef<Path>>(path: P) -> Result<Box<dyn JobContainer>> {
    let path = path.as_ref();
    let container: Box<dyn JobContainer> = match detect_kind(path)? {
        ContainerKind::Directory => Box::new(DirectoryContainer::new(path)),
        ContainerKind::Gzip => Box::new(GzipFileContainer::new(path)),
        ContainerKind::Zip => Box::new(ZipFileContainer::open(path)?),
        ContainerKind::Tar { gzipped } => Box::new(TarContainer::open(path, gzipped)?),
    };
    Ok(container)
}

/// Read one logical file of the job at `job_path`
pub fn open_logical_file<P: AsRef<Path>>(job_path: P, logical_name: &str) -> Result<LogicalFile> {
    open_container(job_path)?.open_logical_file(logical_name)
}

/// `<path>/<name>` for a `/`-separated logical name
pub(crate) fn member_path(root: &Path, logical_name: &str) -> PathBuf {
    logical_name
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}
