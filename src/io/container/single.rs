//! Containers that hold exactly one logical file.
//!
//! A lone `features` file is commonly shipped as `features.gz` or
//! `features.zip`. These containers serve that one file whatever logical name
//! is requested.

use super::{ContainerKind, JobContainer, MemberBytes};
use crate::error::{OdbError, Result};
use crate::io::compression::{unwrap_payload, Compression, Decompressor, GzipDecompressor};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

// ---------------------------------------------------------------------------
// gzip
// ---------------------------------------------------------------------------

/// A single file compressed with gzip
#[derive(Debug, Clone)]
pub struct GzipFileContainer {
    path: PathBuf,
}

impl GzipFileContainer {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl JobContainer for GzipFileContainer {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Gzip
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn read_member(&self, _logical_name: &str) -> Result<MemberBytes> {
        let raw = fs::read(&self.path)?;
        let bytes = GzipDecompressor.decompress(&raw)?;
        nested_payload(bytes, Compression::Gzip)
    }
}

/// Expand a `.Z` (or gzip) file stored inside the container's own layer.
/// The innermost layer removed is the one reported.
fn nested_payload(bytes: Vec<u8>, layer: Compression) -> Result<MemberBytes> {
    let (bytes, inner) = unwrap_payload(bytes)?;
    let compression = if inner == Compression::None { layer } else { inner };
    Ok(MemberBytes::new(bytes, compression))
}

// ---------------------------------------------------------------------------
// zip
// ---------------------------------------------------------------------------

/// Upper bound on the buffer reserved from an entry's declared size
const PREALLOCATION_LIMIT: u64 = 1 << 20;

/// A zip archive holding exactly one entry
#[derive(Debug, Clone)]
pub struct ZipFileContainer {
    path: PathBuf,
}

impl ZipFileContainer {
    /// Open and validate that the archive holds a single entry
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let container = Self {
            path: path.as_ref().to_path_buf(),
        };
        container.archive()?;
        Ok(container)
    }

    fn archive(&self) -> Result<ZipArchive<BufReader<File>>> {
        let archive = ZipArchive::new(BufReader::new(File::open(&self.path)?))?;
        if archive.len() != 1 {
            return Err(OdbError::resolution(
                &self.path,
                format!("zip container must hold exactly one entry, found {}", archive.len()),
            ));
        }
        Ok(archive)
    }
}

impl JobContainer for ZipFileContainer {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Zip
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn read_member(&self, _logical_name: &str) -> Result<MemberBytes> {
        let mut archive = self.archive()?;
        let mut entry = archive.by_index(0)?;
        // The declared size is untrusted header data
        let capacity = entry.size().min(PREALLOCATION_LIMIT) as usize;
        let mut bytes = Vec::with_capacity(capacity);
        entry.read_to_end(&mut bytes)?;
        nested_payload(bytes, Compression::Zip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_gzip_serves_any_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.gz");
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"UNITS=MM\n#\n#Layer features\n").unwrap();
        fs::write(&path, enc.finish().unwrap()).unwrap();

        let job = GzipFileContainer::new(&path);
        let a = job.open_logical_file("features").unwrap();
        let b = job.open_logical_file("anything/else").unwrap();
        assert_eq!(a.lines(), b.lines());
        assert_eq!(a.compression(), Compression::Gzip);
    }

    #[test]
    fn test_zip_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.zip");
        write_zip(&path, &[("features", "UNITS=MM\nP 0 0 0 P 0 0\n")]);

        let job = ZipFileContainer::open(&path).unwrap();
        let file = job.open_logical_file("features").unwrap();
        assert_eq!(file.lines(), ["UNITS=MM", "P 0 0 0 P 0 0"]);
        assert_eq!(file.compression(), Compression::Zip);
    }

    #[test]
    fn test_lzw_file_inside_single_file_containers() {
        let dir = tempfile::tempdir().unwrap();
        // 'a' 'b' '\n' as 9-bit literal codes
        let packed: &[u8] = &[0x1f, 0x9d, 0x90, 0x61, 0xc4, 0x28, 0x00];

        let gz = dir.path().join("info.gz");
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(packed).unwrap();
        fs::write(&gz, enc.finish().unwrap()).unwrap();
        let file = GzipFileContainer::new(&gz).open_logical_file("info").unwrap();
        assert_eq!(file.lines(), ["ab"]);
        assert_eq!(file.compression(), Compression::UnixLzw);

        let zip_path = dir.path().join("info.zip");
        let mut writer = ZipWriter::new(File::create(&zip_path).unwrap());
        writer.start_file("info.Z", SimpleFileOptions::default()).unwrap();
        writer.write_all(packed).unwrap();
        writer.finish().unwrap();
        let file = ZipFileContainer::open(&zip_path).unwrap().open_logical_file("info").unwrap();
        assert_eq!(file.lines(), ["ab"]);
        assert_eq!(file.compression(), Compression::UnixLzw);
    }

    #[test]
    fn test_zip_with_two_entries_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.zip");
        write_zip(&path, &[("a", "1"), ("b", "2")]);

        let err = ZipFileContainer::open(&path).unwrap_err();
        assert!(matches!(err, OdbError::ContainerResolution { .. }));
        assert!(err.to_string().contains("found 2"));
    }

    /// Overwrite the uncompressed size in the local and central headers
    fn forge_uncompressed_size(bytes: &mut [u8], size: u32) {
        for (signature, offset) in [([0x50, 0x4b, 0x03, 0x04], 22), ([0x50, 0x4b, 0x01, 0x02], 24)] {
            let start = bytes
                .windows(4)
                .position(|w| w == signature)
                .expect("zip header present");
            bytes[start + offset..start + offset + 4].copy_from_slice(&size.to_le_bytes());
        }
    }

    #[test]
    fn test_declared_size_does_not_drive_allocation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forged.zip");
        write_zip(&path, &[("features", "UNITS=MM\n")]);
        let mut bytes = fs::read(&path).unwrap();
        forge_uncompressed_size(&mut bytes, 0xFFFF_FFF0);
        fs::write(&path, bytes).unwrap();

        // Reading may fail on the size mismatch, but must not reserve 4 GiB
        if let Ok(job) = ZipFileContainer::open(&path) {
            if let Ok(file) = job.open_logical_file("features") {
                assert_eq!(file.lines(), ["UNITS=MM"]);
            }
        }
    }

    #[test]
    fn test_empty_zip_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.zip");
        write_zip(&path, &[]);
        assert!(ZipFileContainer::open(&path).is_err());
    }
}
