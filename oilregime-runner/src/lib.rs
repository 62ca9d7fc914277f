//! OilRegime Runner: tier orchestration, configuration, relational sink.
//!
//! This crate builds on `oilregime-core` to provide:
//! - TOML pipeline configuration with environment-sourced credentials
//! - Bronze, silver, gold and sink-load orchestrators with per-table isolation
//! - Run summaries for user-visible reporting
//! - SQLite sink for long-format features, regimes and forecasts

pub mod config;
pub mod orchestrator;
pub mod sink;

pub use config::{database_url, ConfigError, PipelineConfig, SourceConfig, DATABASE_URL_VAR};
pub use orchestrator::{
    run_all, run_bronze, run_gold, run_silver, run_sink, PipelineError, RunSummary, Stage,
    TableOutcome, WriteReport,
};
pub use sink::{FeatureSink, Forecast, RegimeState, SinkError, SqliteSink};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
    }

    #[test]
    fn summaries_are_send() {
        assert_send::<RunSummary>();
        assert_send::<PipelineError>();
        assert_send::<SqliteSink>();
    }
}
