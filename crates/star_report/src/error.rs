//! Error types for report emission.

use std::path::PathBuf;

/// Errors that can occur while writing or reading report artifacts.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// An I/O error occurred while creating or writing an output file.
    #[error("output I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A handoff document could not be parsed or converted.
    #[error("malformed handoff document at line {line}: {reason}")]
    Format {
        /// One-based line number, or 0 when the problem is structural.
        line: usize,
        /// Description of the problem.
        reason: String,
    },

    /// The output directory holds one of the run's inputs and cannot be cleaned.
    #[error("refusing to clean output directory {dir}: it contains input {input}")]
    OverlapsInput {
        /// The output directory.
        dir: PathBuf,
        /// The input found inside it.
        input: PathBuf,
    },

    /// The publisher could not be launched or exited unsuccessfully.
    #[error("publisher '{command}' failed: {reason}")]
    Publish {
        /// The publisher command.
        command: String,
        /// Description of the failure.
        reason: String,
    },
}

impl EmitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EmitError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        EmitError::Format {
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = EmitError::io(
            "/tmp/out/handoff/timingInfo.yaml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("output I/O error"));
        assert!(msg.contains("timingInfo.yaml"));
    }

    #[test]
    fn format_error_display() {
        let err = EmitError::format(12, "indent is not a multiple of two spaces");
        assert_eq!(
            err.to_string(),
            "malformed handoff document at line 12: indent is not a multiple of two spaces"
        );
    }

    #[test]
    fn overlap_error_display() {
        let err = EmitError::OverlapsInput {
            dir: "/run/out".into(),
            input: "/run/out/dumps".into(),
        };
        assert_eq!(
            err.to_string(),
            "refusing to clean output directory /run/out: it contains input /run/out/dumps"
        );
    }

    #[test]
    fn publish_error_display() {
        let err = EmitError::Publish {
            command: "star_pub".into(),
            reason: "exit status 2".into(),
        };
        assert!(err.to_string().contains("star_pub"));
    }
}
