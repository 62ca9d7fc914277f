//! Tiered writer and latest-version resolver.

pub mod clock;
pub mod resolver;
pub mod writer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use resolver::{read_latest, read_snapshot, resolve_latest, Stamped};
pub use writer::{SnapshotWriter, WriteReceipt};

use crate::codec::CodecError;
use crate::domain::TableLocation;
use crate::storage::StorageError;
use crate::table::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The table has no snapshot in any format. Never treated as empty data.
    #[error("no snapshots found for {location}")]
    NotFound { location: TableLocation },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("schema mismatch: {0}")]
    Schema(#[from] SchemaError),
}

impl SnapshotError {
    /// Storage faults that are not about a specific snapshot: the store itself
    /// is unavailable.
    pub fn is_io(&self) -> bool {
        matches!(self, SnapshotError::Storage(StorageError::Io { .. }))
    }
}
