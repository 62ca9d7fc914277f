//! Gold features: latest silver → derived columns → gold snapshot.

use super::{run_tables, PipelineError, RunSummary, Stage, WriteReport};
use crate::config::PipelineConfig;
use oilregime_core::domain::Tier;
use oilregime_core::snapshot::{read_latest, Clock, SnapshotWriter};
use oilregime_core::storage::SnapshotStore;
use oilregime_core::table::AlignedTable;
use oilregime_core::transform::derive;

pub fn run_gold(
    store: &dyn SnapshotStore,
    clock: &dyn Clock,
    config: &PipelineConfig,
) -> Result<RunSummary, PipelineError> {
    let writer = SnapshotWriter::new(store, clock);
    run_tables(Stage::Gold, config, |src, table| {
        let upstream = read_latest::<AlignedTable>(store, &src.table(Tier::Silver))?;
        let features = derive(&upstream.table, src.domain)?;
        Ok(WriteReport::Snapshot(writer.write(&features, table)?))
    })
}
