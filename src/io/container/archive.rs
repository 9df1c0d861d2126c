//! Tar archive jobs (`.tgz`, `.tar.gz`, `.tar`)
//!
//! Exported jobs are tarred with their job directory as the top level, e.g.
//! `demo/matrix/matrix`. The common leading directory of all members is
//! computed once and prepended to every logical name.

use super::{ContainerKind, JobContainer, MemberBytes};
use crate::error::{OdbError, Result};
use crate::io::compression::{unwrap_payload, Compression, Decompressor, UnixLzwDecompressor};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tar::Archive;

/// A job stored as a (possibly gzipped) tar archive
#[derive(Debug, Clone)]
pub struct TarContainer {
    path: PathBuf,
    gzipped: bool,
    prefix: Vec<String>,
}

/// Member name without a leading `./` or trailing `/`
fn normalize(name: &str) -> &str {
    let name = name.strip_prefix("./").unwrap_or(name);
    name.trim_end_matches('/')
}

fn components(name: &str) -> Vec<String> {
    name.split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .map(str::to_string)
        .collect()
}

/// Longest run of leading components shared by every directory
fn common_prefix(directories: &[Vec<String>]) -> Vec<String> {
    let Some((first, rest)) = directories.split_first() else {
        return Vec::new();
    };
    let mut len = first.len();
    for dir in rest {
        len = len.min(
            first
                .iter()
                .zip(dir.iter())
                .take_while(|(a, b)| a == b)
                .count(),
        );
    }
    first[..len].to_vec()
}

impl TarContainer {
    /// Open the archive and compute the job prefix
    pub fn open<P: AsRef<Path>>(path: P, gzipped: bool) -> Result<Self> {
        let mut container = Self {
            path: path.as_ref().to_path_buf(),
            gzipped,
            prefix: Vec::new(),
        };

        let mut directories = Vec::new();
        let mut archive = container.archive()?;
        for entry in archive.entries()? {
            let entry = entry?;
            let name = entry.path()?.to_string_lossy().into_owned();
            let mut parts = components(normalize(&name));
            if !entry.header().entry_type().is_dir() {
                parts.pop();
            }
            directories.push(parts);
        }

        container.prefix = common_prefix(&directories);
        Ok(container)
    }

    fn archive(&self) -> Result<Archive<Box<dyn Read>>> {
        let file = BufReader::new(File::open(&self.path)?);
        let reader: Box<dyn Read> = if self.gzipped {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(Archive::new(reader))
    }

    /// Common leading directory of all members, `/`-joined
    pub fn prefix(&self) -> String {
        self.prefix.join("/")
    }

    fn member_name(&self, logical_name: &str) -> String {
        let mut parts = self.prefix.clone();
        parts.extend(components(logical_name));
        parts.join("/")
    }
}

impl JobContainer for TarContainer {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Tar {
            gzipped: self.gzipped,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn read_member(&self, logical_name: &str) -> Result<MemberBytes> {
        let target = self.member_name(logical_name);
        let target_z = format!("{}.Z", target);

        let mut compressed = None;
        let mut archive = self.archive()?;
        for entry in archive.entries()? {
            let mut entry = entry?;
            if entry.header().entry_type().is_dir() {
                continue;
            }
            let name = entry.path()?.to_string_lossy().into_owned();
            let name = normalize(&name);
            if name == target {
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes)?;
                let (bytes, compression) = unwrap_payload(bytes)?;
                return Ok(MemberBytes::new(bytes, compression));
            }
            if name == target_z && compressed.is_none() {
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes)?;
                compressed = Some(bytes);
            }
        }

        match compressed {
            Some(bytes) => Ok(MemberBytes::new(
                UnixLzwDecompressor.decompress(&bytes)?,
                Compression::UnixLzw,
            )),
            None => Err(OdbError::resolution(
                &self.path,
                format!("archive has no member '{}' or '{}'", target, target_z),
            )),
        }
    }
}
