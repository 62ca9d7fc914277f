//! Sink load: latest gold → long format → relational sink.

use super::{run_tables, PipelineError, RunSummary, Stage, WriteReport};
use crate::config::PipelineConfig;
use crate::sink::FeatureSink;
use oilregime_core::domain::LongFeatureRow;
use oilregime_core::snapshot::read_latest;
use oilregime_core::storage::SnapshotStore;
use oilregime_core::table::FeatureTable;
use oilregime_core::transform::to_long;

/// Append the latest gold snapshot of every source to the sink.
///
/// Every source has a `value` column, so in the sink it is named after the
/// source (`prices_value`, `storage_value`, ...) to keep
/// (commodity, week, feature_name) unambiguous. Derived names are already
/// distinct across domains.
pub fn run_sink(
    store: &dyn SnapshotStore,
    sink: &mut dyn FeatureSink,
    config: &PipelineConfig,
) -> Result<RunSummary, PipelineError> {
    run_tables(Stage::Load, config, |src, table| {
        let gold = read_latest::<FeatureTable>(store, table)?;
        if gold.table.domain != src.domain {
            return Err(PipelineError::DomainMismatch {
                table: table.clone(),
                expected: src.domain,
                found: gold.table.domain,
            });
        }
        let rows: Vec<LongFeatureRow> = to_long(&gold.table, &config.commodity)
            .into_iter()
            .map(|mut row| {
                if row.feature_name == "value" {
                    row.feature_name = format!("{}_value", src.name);
                }
                row
            })
            .collect();
        let rows = sink.append_features(&rows)?;
        Ok(WriteReport::Sink {
            from: gold.snapshot,
            rows,
        })
    })
}
