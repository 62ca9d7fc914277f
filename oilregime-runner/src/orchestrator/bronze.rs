//! Bronze ingest: source adapter → raw snapshot.

use super::{run_tables, PipelineError, RunSummary, Stage, WriteReport};
use crate::config::PipelineConfig;
use oilregime_core::domain::RawRecord;
use oilregime_core::snapshot::{Clock, SnapshotWriter};
use oilregime_core::source::SourceAdapter;
use oilregime_core::storage::SnapshotStore;
use oilregime_core::table::BronzeTable;
use tracing::debug;

/// Fetch every configured series and write each as a new bronze snapshot.
/// Values are kept exactly as the provider sent them.
pub fn run_bronze(
    source: &dyn SourceAdapter,
    store: &dyn SnapshotStore,
    clock: &dyn Clock,
    config: &PipelineConfig,
) -> Result<RunSummary, PipelineError> {
    let writer = SnapshotWriter::new(store, clock);
    run_tables(Stage::Bronze, config, |src, table| {
        debug!(source = source.name(), series_id = %src.series_id, "fetching");
        let rows = source.fetch(&src.series_id)?;
        let bronze = BronzeTable::new(
            rows.into_iter()
                .map(|row| RawRecord {
                    date: row.date,
                    series_id: row.series_id,
                    value: row.value,
                    source_type: src.name.clone(),
                })
                .collect(),
        );
        Ok(WriteReport::Snapshot(writer.write(&bronze, table)?))
    })
}
