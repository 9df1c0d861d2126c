//! ODB++ job reader

use super::compression::Compression;
use super::container::{open_container, ContainerKind, JobContainer};
use super::line_records::LineRecords;
use super::logical_file::{LogicalFile, TextEncoding};
use crate::decoder::DecodeMode;
use crate::document::LayerFeatures;
use crate::error::Result;
use crate::notification::{NotificationCollection, NotificationType};
use crate::records::{decode_netlist, Netlist};
use std::path::Path;

/// Configuration for the job reader.
#[derive(Debug, Clone)]
pub struct ReaderConfiguration {
    /// How unmatched lines of a `features` file are treated.
    ///
    /// Default: `Strict` (an unknown record aborts the read).
    pub feature_mode: DecodeMode,
    /// How unmatched netlist lines are treated.
    ///
    /// Default: `Lenient` (unknown lines are skipped and counted).
    pub netlist_mode: DecodeMode,
}

impl Default for ReaderConfiguration {
    fn default() -> Self {
        Self {
            feature_mode: DecodeMode::Strict,
            netlist_mode: DecodeMode::Lenient,
        }
    }
}

/// Reads logical files of one ODB++ job
pub struct OdbReader {
    container: Box<dyn JobContainer>,
    config: ReaderConfiguration,
}

impl OdbReader {
    /// Open the job at `path` (directory or archive)
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_container(open_container(path)?))
    }

    /// Read through an already opened container
    pub fn from_container(container: Box<dyn JobContainer>) -> Self {
        Self {
            container,
            config: ReaderConfiguration::default(),
        }
    }

    /// Set the reader configuration.
    pub fn with_configuration(mut self, config: ReaderConfiguration) -> Self {
        self.config = config;
        self
    }

    pub fn configuration(&self) -> &ReaderConfiguration {
        &self.config
    }

    pub fn kind(&self) -> ContainerKind {
        self.container.kind()
    }

    pub fn path(&self) -> &Path {
        self.container.path()
    }

    /// Decoded lines of one logical file, e.g. `misc/info`
    pub fn open_logical_file(&self, logical_name: &str) -> Result<LogicalFile> {
        self.container.open_logical_file(logical_name)
    }

    /// Section split of one logical file
    pub fn read_line_records(&self, logical_name: &str) -> Result<LineRecords> {
        self.read_records(logical_name).map(|(records, _)| records)
    }

    /// Features of `steps/<step>/layers/<layer>/features`
    pub fn read_layer_features(&self, step: &str, layer: &str) -> Result<LayerFeatures> {
        self.read_features(&format!("steps/{}/layers/{}/features", step, layer))
    }

    /// Features of the user symbol `symbols/<name>/features`
    pub fn read_symbol_features(&self, name: &str) -> Result<LayerFeatures> {
        self.read_features(&format!("symbols/{}/features", name))
    }

    /// Netlist of `steps/<step>/netlists/cadnet/netlist`
    pub fn read_netlist(&self, step: &str) -> Result<Netlist> {
        let (records, notes) = self.read_records(&format!("steps/{}/netlists/cadnet/netlist", step))?;
        let mut netlist = decode_netlist(&records, self.config.netlist_mode)?;
        netlist.notifications = merge(notes, netlist.notifications);
        Ok(netlist)
    }

    fn read_features(&self, logical_name: &str) -> Result<LayerFeatures> {
        let (records, notes) = self.read_records(logical_name)?;
        let mut features = LayerFeatures::from_line_records(&records, self.config.feature_mode)?;
        features.notifications = merge(notes, features.notifications);
        Ok(features)
    }

    fn read_records(&self, logical_name: &str) -> Result<(LineRecords, NotificationCollection)> {
        let file = self.open_logical_file(logical_name)?;
        let notes = file_notifications(&file);
        Ok((LineRecords::from_lines(file.lines()), notes))
    }
}

/// File level events come first
fn merge(mut first: NotificationCollection, then: NotificationCollection) -> NotificationCollection {
    first.extend(then);
    first
}

fn file_notifications(file: &LogicalFile) -> NotificationCollection {
    let mut notes = NotificationCollection::new();
    if file.encoding() == TextEncoding::Latin1 {
        notes.notify(
            NotificationType::Fallback,
            format!("'{}' is not valid UTF-8, decoded as Latin-1", file.name()),
        );
    }
    let layer = match file.compression() {
        Compression::None => None,
        Compression::Gzip => Some("gzip"),
        Compression::Zip => Some("zip"),
        Compression::UnixLzw => Some("Unix compress"),
    };
    if let Some(layer) = layer {
        notes.notify(
            NotificationType::Warning,
            format!("'{}' was stored with {} compression", file.name(), layer),
        );
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OdbError;
    use std::fs;
    use tempfile::TempDir;

    fn job() -> TempDir {
        let dir = TempDir::new().unwrap();
        let layer = dir.path().join("steps/pcb/layers/top");
        fs::create_dir_all(&layer).unwrap();
        fs::write(
            layer.join("features"),
            "UNITS=MM\n#Feature symbol names\n$0 r10\n#Layer features\nP 0 0 0 P 0 0\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_default_configuration() {
        let config = ReaderConfiguration::default();
        assert_eq!(config.feature_mode, DecodeMode::Strict);
        assert_eq!(config.netlist_mode, DecodeMode::Lenient);
    }

    #[test]
    fn test_read_layer_features_from_directory() {
        let dir = job();
        let reader = OdbReader::from_path(dir.path()).unwrap();
        assert_eq!(reader.kind(), ContainerKind::Directory);
        let layer = reader.read_layer_features("pcb", "top").unwrap();
        assert_eq!(layer.len(), 1);
        assert!(layer.notifications.is_empty());
    }

    #[test]
    fn test_latin1_file_is_notified() {
        let dir = job();
        let path = dir.path().join("steps/pcb/layers/top/features");
        fs::write(&path, b"UNITS=MM\n#Feature symbol names\n$0 pad_\xe9\n").unwrap();
        let reader = OdbReader::from_path(dir.path()).unwrap();
        let layer = reader.read_layer_features("pcb", "top").unwrap();
        assert!(layer.notifications.has_type(NotificationType::Fallback));
    }

    #[test]
    fn test_lenient_feature_mode() {
        let dir = job();
        let path = dir.path().join("steps/pcb/layers/top/features");
        fs::write(&path, "UNITS=MM\n#Layer features\nZ 1 2\nP 0 0 0 P 0 0\n").unwrap();

        let strict = OdbReader::from_path(dir.path()).unwrap();
        assert!(matches!(
            strict.read_layer_features("pcb", "top"),
            Err(OdbError::LineFormat { line_number: 1, .. })
        ));

        let lenient = OdbReader::from_path(dir.path()).unwrap().with_configuration(ReaderConfiguration {
            feature_mode: DecodeMode::Lenient,
            ..Default::default()
        });
        let layer = lenient.read_layer_features("pcb", "top").unwrap();
        assert_eq!(layer.len(), 1);
        assert!(layer.notifications.has_type(NotificationType::Discarded));
    }

    #[test]
    fn test_missing_member() {
        let dir = job();
        let reader = OdbReader::from_path(dir.path()).unwrap();
        assert!(matches!(
            reader.read_netlist("pcb"),
            Err(OdbError::ContainerResolution { .. })
        ));
    }
}
