//! Snapshots of a machine's runtime status.
//!
//! A snapshot records where a machine is and how it got there: the active
//! state and the transition history. It does not include states, hooks,
//! transitions or timeouts; a snapshot is resumed into a builder that
//! registers those again.

use crate::core::StateHistory;
use crate::engine::Status;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::{CheckpointError, SnapshotFormat};

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable runtime status of a machine.
///
/// # Example
///
/// ```rust
/// use tantamount::builder::MachineBuilder;
/// use tantamount::checkpoint::Snapshot;
/// use tantamount::core::HookState;
///
/// let machine = MachineBuilder::<String, String>::new()
///     .add_state("idle".to_string(), HookState::new())
///     .set_start_state("idle".to_string())
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let json = machine.snapshot().to_json().unwrap();
/// let restored: Snapshot<String, String> = Snapshot::from_json(&json).unwrap();
/// assert_eq!(restored.active_state, "idle");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot<S, E> {
    /// Snapshot format version
    pub version: u32,

    /// Unique snapshot identifier
    pub id: Uuid,

    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Name of the machine the snapshot was taken from
    pub machine: String,

    /// Lifecycle status at the time of the snapshot
    pub status: Status,

    /// State that was active
    pub active_state: S,

    /// Retained transition history
    pub history: StateHistory<S, E>,
}

impl<S, E> Snapshot<S, E> {
    pub(crate) fn new(
        machine: &str,
        status: Status,
        active_state: S,
        history: StateHistory<S, E>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            machine: machine.to_string(),
            status,
            active_state,
            history,
        }
    }

    fn check_version(self) -> Result<Self, CheckpointError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(self)
    }
}

impl<S: Serialize, E: Serialize> Snapshot<S, E> {
    /// Encode as human-readable JSON.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::encode(SnapshotFormat::Json, e))
    }

    /// Encode in the compact binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::encode(SnapshotFormat::Bincode, e))
    }
}

impl<S: DeserializeOwned, E: DeserializeOwned> Snapshot<S, E> {
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str::<Self>(json)
            .map_err(|e| CheckpointError::decode(SnapshotFormat::Json, e))?
            .check_version()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize::<Self>(bytes)
            .map_err(|e| CheckpointError::decode(SnapshotFormat::Bincode, e))?
            .check_version()
    }
}
