//! Shared test utilities for odbrust integration tests.
//!
//! Builds one small ODB++ job and writes it in every container kind the
//! reader accepts, under a `tempfile::TempDir`.

#![allow(dead_code)]

use odbrust::io::ContainerKind;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::{Builder, EntryType, Header};
use tempfile::TempDir;

// ===========================================================================
// Job content
// ===========================================================================

pub const LAYER_FEATURES: &str = "steps/pcb/layers/top/features";
pub const NETLIST: &str = "steps/pcb/netlists/cadnet/netlist";
pub const SYMBOL_FEATURES: &str = "symbols/my_pad/features";
pub const MISC_INFO: &str = "misc/info";
pub const ATTRLIST: &str = "misc/attrlist";

pub const TOP_FEATURES: &str = "UNITS=MM
ID=7
#
#Feature symbol names
#
$0 r120
$1 rect20x10xr2x13 M
$2 hole30xpx1x1
$3 my_pad
#
#Feature attribute names
#
@0 .smd
@1 .geometry
#
#Feature attribute text strings
#
&0 pad_geom
#
#Layer features
#
P 10.0 20.0 0 P 0 0;0,1=0
P 11.0 20.0 -1 1 2.5 P 0 9 45;ID=12
L 0 0 10 0 0 P 0
A 5 0 -5 0 0 0 0 N 0 Y
T 1 1 standard P 0 1 1 0.5 'REF1' 1
S P 0;0
OB 0 0 I
OS 10 0
OS 10 10
OC 0 0 5 5 Y
OE
OB 2 2 H
OS 3 2
OS 3 3
OE
SE
";

pub const CADNET: &str = "H optimize n staggered n
$0 GND
$1 VCC
#
#Netlist points
#
0 0.01 1.0 2.0 T e e
1 0.01 3.0 4.0 B 0.02 0.03 m c v
0 0.02 5.0 6.0 D e p t
";

pub const PAD_SYMBOL: &str = "UNITS=INCH
#
#Layer features
#
P 0 0 0 P 0 0
";

/// Short enough for [`compress_z`]
pub const INFO: &str = "UNITS=MM\nJOB_NAME=demo\n";

/// `JOB_NAME=démo` in Latin-1, stored as the `misc/attrlist` member
pub const LATIN1_ATTRLIST: &[u8] = b"JOB_NAME=d\xe9mo\n";

/// Every member of the demo job
pub fn job_files() -> Vec<(&'static str, &'static str)> {
    vec![
        (LAYER_FEATURES, TOP_FEATURES),
        (NETLIST, CADNET),
        (SYMBOL_FEATURES, PAD_SYMBOL),
        (MISC_INFO, INFO),
    ]
}

// ===========================================================================
// Unix compress encoder
// ===========================================================================

/// Encode `input` as a `.Z` stream of 9-bit literal codes.
///
/// The dictionary never fills past 9 bits for inputs under 250 bytes, so no
/// width change happens.
pub fn compress_z(input: &[u8]) -> Vec<u8> {
    assert!(input.len() < 250, "literal encoder only supports short inputs");
    let mut out = vec![0x1f, 0x9d, 0x90];
    let mut acc: u32 = 0;
    let mut nbits = 0;
    for &byte in input {
        acc |= (byte as u32) << nbits;
        nbits += 9;
        while nbits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            nbits -= 8;
        }
    }
    if nbits > 0 {
        out.push(acc as u8);
    }
    out
}

pub fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

// ===========================================================================
// Container writers
// ===========================================================================

/// Write the job as a directory tree; `misc/info` is stored as `misc/info.Z`
pub fn write_directory_job(root: &Path) {
    for (name, content) in job_files() {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        if name == MISC_INFO {
            fs::write(root.join(format!("{}.Z", name)), compress_z(content.as_bytes())).unwrap();
        } else {
            fs::write(path, content).unwrap();
        }
    }
    fs::write(root.join(ATTRLIST), LATIN1_ATTRLIST).unwrap();
}

fn append_file(builder: &mut Builder<Vec<u8>>, name: &str, data: &[u8]) {
    let mut header = Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(EntryType::Regular);
    builder.append_data(&mut header, name, data).unwrap();
}

fn append_dir(builder: &mut Builder<Vec<u8>>, name: &str) {
    let mut header = Header::new_gnu();
    header.set_size(0);
    header.set_mode(0o755);
    header.set_entry_type(EntryType::Directory);
    builder.append_data(&mut header, name, std::io::empty()).unwrap();
}

/// Tar bytes of the job under `<prefix>/`, with `misc/info` as a `.Z` member
pub fn job_tar_bytes(prefix: &str) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    append_dir(&mut builder, &format!("{}/", prefix));
    for (name, content) in job_files() {
        let member = format!("{}/{}", prefix, name);
        if name == MISC_INFO {
            append_file(&mut builder, &format!("{}.Z", member), &compress_z(content.as_bytes()));
        } else {
            append_file(&mut builder, &member, content.as_bytes());
        }
    }
    append_file(&mut builder, &format!("{}/{}", prefix, ATTRLIST), LATIN1_ATTRLIST);
    builder.into_inner().unwrap()
}

pub fn write_tgz_job(path: &Path, prefix: &str) {
    fs::write(path, gzip_bytes(&job_tar_bytes(prefix))).unwrap();
}

pub fn write_tar_job(path: &Path, prefix: &str) {
    fs::write(path, job_tar_bytes(prefix)).unwrap();
}

/// A gzip single-file container holding `content`
pub fn write_gzip_file(path: &Path, content: &str) {
    fs::write(path, gzip_bytes(content.as_bytes())).unwrap();
}

/// A zip container with the given entries
pub fn write_zip_file(path: &Path, entries: &[(&str, &str)]) {
    let entries: Vec<(&str, &[u8])> = entries.iter().map(|(n, c)| (*n, c.as_bytes())).collect();
    write_zip_bytes(path, &entries);
}

pub fn write_zip_bytes(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

// ===========================================================================
// Fixtures
// ===========================================================================

/// A job written in one container kind, kept alive with its temp dir
pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

pub fn directory_fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("demo");
    write_directory_job(&path);
    Fixture { dir, path }
}

pub fn tgz_fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("demo.tgz");
    write_tgz_job(&path, "demo");
    Fixture { dir, path }
}

pub fn tar_fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("demo.tar");
    write_tar_job(&path, "demo");
    Fixture { dir, path }
}

/// A `.gz` that unpacks to a tar
pub fn tar_in_gz_fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("demo.gz");
    write_tgz_job(&path, "demo");
    Fixture { dir, path }
}

/// A `.gz` single-file container holding `content`
pub fn gzip_fixture(content: &[u8]) -> Fixture {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("single.gz");
    fs::write(&path, gzip_bytes(content)).unwrap();
    Fixture { dir, path }
}

/// A `.zip` single-file container holding `content`
pub fn zip_fixture(content: &[u8]) -> Fixture {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("single.zip");
    write_zip_bytes(&path, &[("member", content)]);
    Fixture { dir, path }
}

/// The demo job in every multi-file container kind
pub fn job_fixtures() -> Vec<(Fixture, ContainerKind)> {
    vec![
        (directory_fixture(), ContainerKind::Directory),
        (tgz_fixture(), ContainerKind::Tar { gzipped: true }),
        (tar_fixture(), ContainerKind::Tar { gzipped: false }),
        (tar_in_gz_fixture(), ContainerKind::Tar { gzipped: true }),
    ]
}

/// Every container kind, with single-file containers holding `content`
pub fn all_fixtures(content: &[u8]) -> Vec<(Fixture, ContainerKind)> {
    let mut fixtures = job_fixtures();
    fixtures.push((gzip_fixture(content), ContainerKind::Gzip));
    fixtures.push((zip_fixture(content), ContainerKind::Zip));
    fixtures
}
