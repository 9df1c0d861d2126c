//! Error types for odbrust library

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for odbrust operations
#[derive(Debug, Error)]
pub enum OdbError {
    /// IO error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error reported by the zip reader
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The job path or a member inside it could not be resolved
    #[error("Cannot resolve {}: {reason}", path.display())]
    ContainerResolution { path: PathBuf, reason: String },

    /// Content is not text under UTF-8 nor Latin-1
    #[error("Encoding error in '{name}': {reason}")]
    Encoding { name: String, reason: String },

    /// A line matched no decoder rule, or a matched line had malformed fields
    #[error("Line format error in '{section}' at line {line_number}: {reason}: '{line}'")]
    LineFormat {
        section: String,
        line_number: usize,
        line: String,
        reason: String,
    },

    /// Container nesting is broken (pop on empty stack, unterminated container)
    #[error("Hierarchy error in '{section}' at line {line_number} (stack depth {depth}): {reason}: '{line}'")]
    Hierarchy {
        section: String,
        line_number: usize,
        line: String,
        depth: usize,
        reason: String,
    },

    /// Missing or malformed unit header
    #[error("Unit error: {0}")]
    Unit(String),

    /// Error while expanding a compressed payload
    #[error("Decompression error: {0}")]
    Decompression(String),
}

impl OdbError {
    pub(crate) fn resolution(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        OdbError::ContainerResolution {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for odbrust operations
pub type Result<T> = std::result::Result<T, OdbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format_display() {
        let err = OdbError::LineFormat {
            section: "Layer features".to_string(),
            line_number: 12,
            line: "Q 1 2".to_string(),
            reason: "no rule matches".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("Layer features"));
        assert!(text.contains("line 12"));
        assert!(text.contains("'Q 1 2'"));
    }

    #[test]
    fn test_hierarchy_display() {
        let err = OdbError::Hierarchy {
            section: "Layer features".to_string(),
            line_number: 3,
            line: "OE".to_string(),
            depth: 0,
            reason: "pop with no open container".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Hierarchy error in 'Layer features' at line 3 (stack depth 0): pop with no open container: 'OE'"
        );
    }

    #[test]
    fn test_resolution_display() {
        let err = OdbError::resolution("/tmp/job.rar", "unsupported container type");
        assert_eq!(
            err.to_string(),
            "Cannot resolve /tmp/job.rar: unsupported container type"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let odb_err: OdbError = io_err.into();
        assert!(matches!(odb_err, OdbError::Io(_)));
    }
}
