//! Snapshot encoding errors.

use std::fmt;
use thiserror::Error;

/// Wire format a snapshot was being written to or read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Bincode,
}

impl fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("JSON"),
            Self::Bincode => f.write_str("bincode"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to encode snapshot as {format}: {message}")]
    SerializationFailed {
        format: SnapshotFormat,
        message: String,
    },

    #[error("Failed to decode {format} snapshot: {message}")]
    DeserializationFailed {
        format: SnapshotFormat,
        message: String,
    },

    /// The snapshot was written by an incompatible release.
    #[error("Snapshot version {found} cannot be resumed, expected version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

impl CheckpointError {
    pub(crate) fn encode(format: SnapshotFormat, err: impl fmt::Display) -> Self {
        Self::SerializationFailed {
            format,
            message: err.to_string(),
        }
    }

    pub(crate) fn decode(format: SnapshotFormat, err: impl fmt::Display) -> Self {
        Self::DeserializationFailed {
            format,
            message: err.to_string(),
        }
    }

    /// Format involved in an encoding failure, if any.
    pub fn format(&self) -> Option<SnapshotFormat> {
        match self {
            Self::SerializationFailed { format, .. } | Self::DeserializationFailed { format, .. } => {
                Some(*format)
            }
            Self::UnsupportedVersion { .. } => None,
        }
    }
}
