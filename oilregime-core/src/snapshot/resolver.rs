//! Latest-version resolution.
//!
//! Columnar snapshots are considered first; delimited-text snapshots only
//! when a table has no columnar snapshot at all. Within the chosen format the
//! lexicographically greatest id wins, which is the most recent write given
//! the timestamp id scheme. Listing order does not matter.

use super::SnapshotError;
use crate::codec;
use crate::domain::{SnapshotFormat, SnapshotRef, TableLocation};
use crate::storage::SnapshotStore;
use crate::table::{stored_schema, Table};
use chrono::{DateTime, Utc};
use tracing::debug;

/// A table read back from a snapshot, with its capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<T> {
    pub snapshot: SnapshotRef,
    pub table: T,
    /// Audit stamp written with the snapshot. `None` for an empty snapshot or
    /// one written without the audit column.
    pub ingested_at: Option<DateTime<Utc>>,
}

pub fn resolve_latest(
    store: &dyn SnapshotStore,
    location: &TableLocation,
) -> Result<SnapshotRef, SnapshotError> {
    let listed = store.list(location)?;
    for format in SnapshotFormat::PREFERENCE {
        let latest = listed
            .iter()
            .filter(|s| s.format == format)
            .max_by(|a, b| a.id.cmp(&b.id));
        if let Some(latest) = latest {
            debug!(table = %location, snapshot = %latest.id, format = %format, "resolved latest");
            return Ok(latest.clone());
        }
    }
    Err(SnapshotError::NotFound {
        location: location.clone(),
    })
}

/// Decode one snapshot and validate it against `T`'s declared schema.
pub fn read_snapshot<T: Table>(
    store: &dyn SnapshotStore,
    snapshot: &SnapshotRef,
) -> Result<Stamped<T>, SnapshotError> {
    let bytes = store.read(snapshot)?;
    let batch = codec::decode(snapshot.format, &bytes, stored_schema::<T>)?;
    let (batch, stamps) = batch.split_audit()?;
    let table = T::from_batch(&batch)?;
    Ok(Stamped {
        snapshot: snapshot.clone(),
        table,
        ingested_at: stamps.and_then(|s| s.first().copied()),
    })
}

/// Resolve the latest snapshot of a table and read it.
pub fn read_latest<T: Table>(
    store: &dyn SnapshotStore,
    location: &TableLocation,
) -> Result<Stamped<T>, SnapshotError> {
    let snapshot = resolve_latest(store, location)?;
    read_snapshot(store, &snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tier;
    use crate::storage::MemoryStore;
    use crate::table::{AlignedTable, BronzeTable, SchemaError};

    fn loc() -> TableLocation {
        TableLocation::new(Tier::Bronze, "bronze_eia_prices")
    }

    fn put(store: &MemoryStore, id: &str, format: SnapshotFormat) -> SnapshotRef {
        let s = SnapshotRef {
            location: loc(),
            id: id.parse().unwrap(),
            format,
        };
        store.append(&s, b"").unwrap();
        s
    }

    #[test]
    fn empty_table_is_not_found() {
        let store = MemoryStore::new();
        let err = resolve_latest(&store, &loc()).unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound { .. }));
    }

    #[test]
    fn picks_max_id_regardless_of_listing_order() {
        let store = MemoryStore::new();
        put(&store, "20240103T000000Z", SnapshotFormat::Parquet);
        let newest = put(&store, "20240110T000000Z", SnapshotFormat::Parquet);
        put(&store, "20240101T000000Z", SnapshotFormat::Parquet);
        assert_eq!(resolve_latest(&store, &loc()).unwrap(), newest);
    }

    #[test]
    fn parquet_list_wins_over_newer_csv() {
        let store = MemoryStore::new();
        let parquet = put(&store, "20240101T000000Z", SnapshotFormat::Parquet);
        put(&store, "20240201T000000Z", SnapshotFormat::Csv);
        assert_eq!(resolve_latest(&store, &loc()).unwrap(), parquet);
    }

    #[test]
    fn csv_used_when_no_parquet_exists() {
        let store = MemoryStore::new();
        put(&store, "20240101T000000Z", SnapshotFormat::Csv);
        let newest = put(&store, "20240201T000000Z", SnapshotFormat::Csv);
        assert_eq!(resolve_latest(&store, &loc()).unwrap(), newest);
    }

    #[test]
    fn reading_with_wrong_table_type_is_schema_mismatch() {
        let store = MemoryStore::new();
        let s = SnapshotRef {
            location: loc(),
            id: "20240101T000000Z".parse().unwrap(),
            format: SnapshotFormat::Csv,
        };
        store
            .append(&s, b"date,series_id,value,source_type,ingested_at\n")
            .unwrap();

        let bronze: Stamped<BronzeTable> = read_snapshot(&store, &s).unwrap();
        assert!(bronze.table.is_empty());
        assert!(bronze.ingested_at.is_none());

        // Bronze text that silver cannot type.
        let s2 = SnapshotRef {
            id: "20240102T000000Z".parse().unwrap(),
            ..s
        };
        store
            .append(
                &s2,
                b"date,series_id,value,source_type,ingested_at\n20240105,x,abc,prices,2024-01-01T00:00:00.000000Z\n",
            )
            .unwrap();
        let err = read_snapshot::<AlignedTable>(&store, &s2).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::Codec(crate::codec::CodecError::Schema(SchemaError::InvalidValue { .. }))
        ));
    }
}
