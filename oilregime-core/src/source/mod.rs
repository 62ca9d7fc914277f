//! Source adapters: external producers of `(date, series_id, value)` rows.
//!
//! The bronze orchestrator talks to a `SourceAdapter`, so the EIA client can
//! be swapped for a fixture in tests.

pub mod eia;

pub use eia::EiaClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One provider observation. Both fields stay in the provider's text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    pub date: String,
    pub series_id: String,
    pub value: String,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("missing credential: {0} is required")]
    MissingCredential(&'static str),

    #[error("no data returned for series {series_id}")]
    NoData { series_id: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("response format changed: {0}")]
    ResponseFormat(String),
}

pub trait SourceAdapter: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch every observation of one series. No retries.
    fn fetch(&self, series_id: &str) -> Result<Vec<SourceRow>, SourceError>;
}
