//! Silver clean: latest bronze → weekly alignment → silver snapshot.

use super::{run_tables, PipelineError, RunSummary, Stage, WriteReport};
use crate::config::PipelineConfig;
use oilregime_core::domain::Tier;
use oilregime_core::snapshot::{read_latest, Clock, SnapshotWriter};
use oilregime_core::storage::SnapshotStore;
use oilregime_core::table::BronzeTable;
use oilregime_core::transform::align;
use tracing::info;

pub fn run_silver(
    store: &dyn SnapshotStore,
    clock: &dyn Clock,
    config: &PipelineConfig,
) -> Result<RunSummary, PipelineError> {
    let writer = SnapshotWriter::new(store, clock);
    run_tables(Stage::Silver, config, |src, table| {
        let upstream = read_latest::<BronzeTable>(store, &src.table(Tier::Bronze))?;
        let aligned = align(&upstream.table, config.invalid_dates)?;
        info!(
            %table,
            from = %upstream.snapshot.id,
            input_rows = upstream.table.records.len(),
            weeks = aligned.table.records.len(),
            dropped_dates = aligned.dropped_dates,
            dropped_values = aligned.dropped_values,
            "aligned to weekly grid"
        );
        Ok(WriteReport::Snapshot(writer.write(&aligned.table, table)?))
    })
}
