//! Tier orchestrators.
//!
//! Each stage walks the configured sources in order and runs one table path
//! per source: resolve upstream → transform → write. Table paths share no
//! transactional scope; a failed table is recorded and the stage moves on.
//! Only a storage I/O fault stops the run.

pub mod bronze;
pub mod gold;
pub mod load;
pub mod silver;

pub use bronze::run_bronze;
pub use gold::run_gold;
pub use load::run_sink;
pub use silver::run_silver;

use crate::config::{PipelineConfig, SourceConfig};
use crate::sink::{FeatureSink, SinkError};
use oilregime_core::domain::{Domain, SnapshotRef, TableLocation, Tier};
use oilregime_core::snapshot::{Clock, SnapshotError, WriteReceipt};
use oilregime_core::source::{SourceAdapter, SourceError};
use oilregime_core::storage::SnapshotStore;
use oilregime_core::transform::{AlignError, FeatureError};
use std::fmt;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("alignment failed: {0}")]
    Align(#[from] AlignError),

    #[error("feature derivation failed: {0}")]
    Features(#[from] FeatureError),

    #[error("{table} holds {found} features, expected {expected}")]
    DomainMismatch {
        table: TableLocation,
        expected: Domain,
        found: Domain,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl PipelineError {
    /// Storage unavailable: terminates the whole run instead of one table.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Snapshot(e) if e.is_io())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Bronze,
    Silver,
    Gold,
    Load,
}

impl Stage {
    /// Table a stage's outcome is reported under: the table it writes, or for
    /// the sink load, the gold table it reads.
    pub fn table_for(&self, source: &SourceConfig) -> TableLocation {
        match self {
            Stage::Bronze => source.table(Tier::Bronze),
            Stage::Silver => source.table(Tier::Silver),
            Stage::Gold | Stage::Load => source.table(Tier::Gold),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Bronze => "bronze",
            Stage::Silver => "silver",
            Stage::Gold => "gold",
            Stage::Load => "load",
        })
    }
}

/// What one successful table path produced.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteReport {
    /// A new snapshot in a tier.
    Snapshot(WriteReceipt),
    /// Long-format rows appended to the relational sink.
    Sink { from: SnapshotRef, rows: usize },
}

impl WriteReport {
    pub fn rows(&self) -> usize {
        match self {
            WriteReport::Snapshot(receipt) => receipt.rows,
            WriteReport::Sink { rows, .. } => *rows,
        }
    }

    /// Where the rows went.
    pub fn target(&self) -> String {
        match self {
            WriteReport::Snapshot(receipt) => receipt.location.clone(),
            WriteReport::Sink { from, .. } => format!("gold_features (from {})", from.id),
        }
    }
}

#[derive(Debug)]
pub struct TableOutcome {
    pub table: TableLocation,
    pub result: Result<WriteReport, PipelineError>,
}

impl fmt::Display for TableOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(report) => write!(
                f,
                "  OK: {}: {} rows -> {}",
                self.table,
                report.rows(),
                report.target()
            ),
            Err(e) => write!(f, "  FAIL: {}: {e}", self.table),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub stage: Stage,
    pub outcomes: Vec<TableOutcome>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> Vec<&TableOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err()).collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn outcome(&self, table: &str) -> Option<&TableOutcome> {
        self.outcomes.iter().find(|o| o.table.table == table)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{outcome}")?;
        }
        write!(
            f,
            "{} complete: {}/{} tables succeeded, {} failed",
            self.stage,
            self.succeeded(),
            self.outcomes.len(),
            self.outcomes.len() - self.succeeded()
        )
    }
}

/// Run `path` once per configured source, isolating failures per table.
pub(crate) fn run_tables<F>(
    stage: Stage,
    config: &PipelineConfig,
    mut path: F,
) -> Result<RunSummary, PipelineError>
where
    F: FnMut(&SourceConfig, &TableLocation) -> Result<WriteReport, PipelineError>,
{
    let mut outcomes = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        let table = stage.table_for(source);
        match path(source, &table) {
            Ok(report) => {
                info!(%stage, %table, rows = report.rows(), dest = %report.target(), "table complete");
                outcomes.push(TableOutcome {
                    table,
                    result: Ok(report),
                });
            }
            Err(e) if e.is_fatal() => {
                error!(%stage, %table, error = %e, "storage failure, aborting run");
                return Err(e);
            }
            Err(e) => {
                warn!(%stage, %table, error = %e, "table failed, continuing");
                outcomes.push(TableOutcome {
                    table,
                    result: Err(e),
                });
            }
        }
    }
    Ok(RunSummary { stage, outcomes })
}

/// Full chain: bronze → silver → gold → sink. A stage runs even when some
/// tables of the previous stage failed; those tables then read whatever
/// upstream snapshot already exists, or fail with NotFound.
pub fn run_all(
    source: &dyn SourceAdapter,
    store: &dyn SnapshotStore,
    clock: &dyn Clock,
    sink: &mut dyn FeatureSink,
    config: &PipelineConfig,
) -> Result<Vec<RunSummary>, PipelineError> {
    Ok(vec![
        run_bronze(source, store, clock, config)?,
        run_silver(store, clock, config)?,
        run_gold(store, clock, config)?,
        run_sink(store, sink, config)?,
    ])
}
