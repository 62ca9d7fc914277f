//! Tiered writer: every call appends one new, immutable snapshot.

use super::clock::Clock;
use super::SnapshotError;
use crate::codec::{self, ColumnarEncoder};
use crate::domain::{SnapshotFormat, SnapshotId, SnapshotRef, TableLocation};
use crate::storage::SnapshotStore;
use crate::table::Table;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// What a write produced.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReceipt {
    pub snapshot: SnapshotRef,
    /// Store-specific location (a path for the filesystem store).
    pub location: String,
    /// Format actually used; CSV when the columnar encoding was unavailable.
    pub format: SnapshotFormat,
    pub rows: usize,
    /// Content hash of the business columns (audit column excluded).
    pub fingerprint: String,
    pub ingested_at: DateTime<Utc>,
}

pub struct SnapshotWriter<'a> {
    store: &'a dyn SnapshotStore,
    clock: &'a dyn Clock,
    columnar: Option<ColumnarEncoder>,
}

impl<'a> SnapshotWriter<'a> {
    pub fn new(store: &'a dyn SnapshotStore, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            clock,
            columnar: codec::columnar_encoder(),
        }
    }

    /// Replace the columnar encoder; `None` writes CSV only.
    pub fn with_columnar(mut self, columnar: Option<ColumnarEncoder>) -> Self {
        self.columnar = columnar;
        self
    }

    /// Stamp `table` with the audit column and append it under `location`.
    ///
    /// Never modifies or removes an earlier snapshot. Storage faults
    /// propagate; a columnar encoding failure degrades to CSV instead.
    pub fn write<T: Table>(
        &self,
        table: &T,
        location: &TableLocation,
    ) -> Result<WriteReceipt, SnapshotError> {
        let now = self.clock.now();
        let batch = table.to_batch();
        let fingerprint = batch.fingerprint();
        let rows = batch.height();

        let encoded = codec::encode_preferred_with(&batch.with_audit(now)?, self.columnar)?;
        if let Some(reason) = &encoded.degraded {
            warn!(table = %location, %reason, "columnar encoding unavailable, writing csv");
        }

        let snapshot = SnapshotRef {
            location: location.clone(),
            id: self.next_id(location, now)?,
            format: encoded.format,
        };
        self.store.append(&snapshot, &encoded.bytes)?;

        let receipt = WriteReceipt {
            location: self.store.describe(&snapshot),
            format: snapshot.format,
            snapshot,
            rows,
            fingerprint,
            ingested_at: now,
        };
        info!(
            table = %location,
            snapshot = %receipt.snapshot.id,
            format = %receipt.format,
            rows,
            "snapshot written"
        );
        Ok(receipt)
    }

    /// Id for the current second, moved past the newest existing snapshot of
    /// the table if the clock has not advanced beyond it. Keeps ids strictly
    /// increasing in write order for a single writer.
    fn next_id(
        &self,
        location: &TableLocation,
        now: DateTime<Utc>,
    ) -> Result<SnapshotId, SnapshotError> {
        let candidate = SnapshotId::from_datetime(now);
        let newest = self.store.list(location)?.into_iter().map(|s| s.id).max();
        Ok(match newest {
            Some(newest) if newest >= candidate => newest.next_after(),
            _ => candidate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawRecord, Tier};
    use crate::snapshot::clock::FixedClock;
    use crate::storage::MemoryStore;
    use crate::table::BronzeTable;
    use chrono::TimeZone;

    fn table() -> BronzeTable {
        BronzeTable::new(vec![RawRecord {
            date: "20240105".into(),
            series_id: "PET.RWTC.D".into(),
            value: "72.5".into(),
            source_type: "prices".into(),
        }])
    }

    #[test]
    fn id_comes_from_clock() {
        let store = MemoryStore::new();
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 1, 5, 15, 30, 45).unwrap());
        let writer = SnapshotWriter::new(&store, &clock);
        let loc = TableLocation::new(Tier::Bronze, "bronze_eia_prices");

        let receipt = writer.write(&table(), &loc).unwrap();
        assert_eq!(receipt.snapshot.id.as_str(), "20240105T153045Z");
        assert_eq!(receipt.rows, 1);
        assert!(receipt.location.starts_with("memory://bronze/bronze_eia_prices/"));
    }

    #[test]
    fn same_second_writes_get_distinct_increasing_ids() {
        let store = MemoryStore::new();
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 1, 5, 15, 30, 45).unwrap());
        let writer = SnapshotWriter::new(&store, &clock);
        let loc = TableLocation::new(Tier::Bronze, "bronze_eia_prices");

        let a = writer.write(&table(), &loc).unwrap();
        let b = writer.write(&table(), &loc).unwrap();
        let c = writer.write(&table(), &loc).unwrap();
        assert!(a.snapshot.id < b.snapshot.id);
        assert!(b.snapshot.id < c.snapshot.id);
        assert_eq!(store.list(&loc).unwrap().len(), 3);
        assert_eq!(a.fingerprint, c.fingerprint);
    }

    #[test]
    fn clock_behind_existing_snapshot_still_moves_forward() {
        let store = MemoryStore::new();
        let loc = TableLocation::new(Tier::Silver, "silver_eia_prices");
        let late = FixedClock::at(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let early = FixedClock::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        let first = SnapshotWriter::new(&store, &late).write(&table(), &loc).unwrap();
        let second = SnapshotWriter::new(&store, &early).write(&table(), &loc).unwrap();
        assert!(second.snapshot.id > first.snapshot.id);
    }
}
