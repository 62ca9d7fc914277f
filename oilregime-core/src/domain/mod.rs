//! Domain types: tiers, table locations, snapshot identities, and the records
//! that flow bronze → silver → gold → sink.

pub mod records;
pub mod snapshot;
pub mod tier;

pub use records::{AlignedRecord, Domain, FeatureRecord, LongFeatureRow, RawRecord};
pub use snapshot::{SnapshotFormat, SnapshotId, SnapshotIdError, SnapshotRef};
pub use tier::{TableLocation, Tier};
