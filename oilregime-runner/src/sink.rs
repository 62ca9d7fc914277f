//! Relational sink for long-format feature rows.
//!
//! Append-only: rows are inserted, never updated or deleted. The schema is
//! created on open if absent, including the regime and forecast tables the
//! read API serves, with indexes that make "latest per commodity" and
//! "latest per (commodity, horizon)" index lookups.

use chrono::{NaiveDate, SecondsFormat, Utc};
use oilregime_core::domain::LongFeatureRow;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS gold_features (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    commodity TEXT NOT NULL,
    week TEXT NOT NULL,
    feature_name TEXT NOT NULL,
    feature_value REAL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_gold_features_commodity_week
    ON gold_features(commodity, week);
CREATE INDEX IF NOT EXISTS idx_gold_features_feature_name
    ON gold_features(feature_name);

CREATE TABLE IF NOT EXISTS regime_states (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    commodity TEXT NOT NULL,
    week TEXT NOT NULL,
    regime_label TEXT NOT NULL,
    regime_score REAL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_regime_states_commodity_week
    ON regime_states(commodity, week);

CREATE TABLE IF NOT EXISTS forecasts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    commodity TEXT NOT NULL,
    week TEXT NOT NULL,
    horizon_weeks INTEGER NOT NULL,
    forecast_value REAL NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_forecasts_commodity_horizon_week
    ON forecasts(commodity, horizon_weeks, week);
"#;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("unsupported database url {0:?} (expected sqlite://<path>, sqlite::memory: or a file path)")]
    UnsupportedUrl(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored row is malformed: {0}")]
    Malformed(String),
}

/// Latest regime classification for a commodity.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeState {
    pub commodity: String,
    pub week: NaiveDate,
    pub regime_label: String,
    pub regime_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub commodity: String,
    pub week: NaiveDate,
    pub horizon_weeks: u32,
    pub forecast_value: f64,
}

/// Write target for long-format feature rows.
pub trait FeatureSink {
    /// Append rows in one transaction. Returns the number inserted.
    fn append_features(&mut self, rows: &[LongFeatureRow]) -> Result<usize, SinkError>;
}

pub struct SqliteSink {
    conn: Connection,
}

fn created_at() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_week(raw: &str) -> Result<NaiveDate, SinkError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| SinkError::Malformed(format!("week {raw:?}: {e}")))
}

impl SqliteSink {
    /// Open by connection string: `sqlite://<path>`, `sqlite:<path>`,
    /// `sqlite::memory:`, or a bare file path.
    pub fn open(url: &str) -> Result<Self, SinkError> {
        let url = url.trim();
        if url == "sqlite::memory:" || url == ":memory:" {
            return Self::from_connection(Connection::open_in_memory()?);
        }
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        if path.is_empty() || path.contains("://") {
            return Err(SinkError::UnsupportedUrl(url.to_string()));
        }
        Self::open_path(Path::new(path))
    }

    pub fn open_path(path: &Path) -> Result<Self, SinkError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, SinkError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, SinkError> {
        conn.execute_batch(SCHEMA)?;
        debug!("sink schema ready");
        Ok(Self { conn })
    }

    /// Newest feature rows for a commodity, newest week first.
    pub fn recent_features(
        &self,
        commodity: &str,
        limit: usize,
    ) -> Result<Vec<LongFeatureRow>, SinkError> {
        let mut stmt = self.conn.prepare(
            "SELECT commodity, week, feature_name, feature_value FROM gold_features \
             WHERE commodity = ?1 ORDER BY week DESC, id DESC LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let raw = stmt
            .query_map(params![commodity, limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(commodity, week, feature_name, feature_value)| {
                Ok(LongFeatureRow {
                    commodity,
                    week: parse_week(&week)?,
                    feature_name,
                    feature_value,
                })
            })
            .collect()
    }

    pub fn latest_regime(&self, commodity: &str) -> Result<Option<RegimeState>, SinkError> {
        let raw = self
            .conn
            .query_row(
                "SELECT commodity, week, regime_label, regime_score FROM regime_states \
                 WHERE commodity = ?1 ORDER BY week DESC, id DESC LIMIT 1",
                params![commodity],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                    ))
                },
            )
            .optional()?;
        raw.map(|(commodity, week, regime_label, regime_score)| {
            Ok(RegimeState {
                commodity,
                week: parse_week(&week)?,
                regime_label,
                regime_score,
            })
        })
        .transpose()
    }

    pub fn latest_forecast(
        &self,
        commodity: &str,
        horizon_weeks: u32,
    ) -> Result<Option<Forecast>, SinkError> {
        let raw = self
            .conn
            .query_row(
                "SELECT commodity, week, forecast_value FROM forecasts \
                 WHERE commodity = ?1 AND horizon_weeks = ?2 ORDER BY week DESC, id DESC LIMIT 1",
                params![commodity, horizon_weeks],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                    ))
                },
            )
            .optional()?;
        raw.map(|(commodity, week, forecast_value)| {
            Ok(Forecast {
                commodity,
                week: parse_week(&week)?,
                horizon_weeks,
                forecast_value,
            })
        })
        .transpose()
    }

    pub fn append_regime(&mut self, state: &RegimeState) -> Result<(), SinkError> {
        self.conn.execute(
            "INSERT INTO regime_states (commodity, week, regime_label, regime_score, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                state.commodity,
                state.week.to_string(),
                state.regime_label,
                state.regime_score,
                created_at()
            ],
        )?;
        Ok(())
    }

    pub fn append_forecast(&mut self, forecast: &Forecast) -> Result<(), SinkError> {
        self.conn.execute(
            "INSERT INTO forecasts (commodity, week, horizon_weeks, forecast_value, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                forecast.commodity,
                forecast.week.to_string(),
                forecast.horizon_weeks,
                forecast.forecast_value,
                created_at()
            ],
        )?;
        Ok(())
    }

    pub fn feature_count(&self) -> Result<usize, SinkError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM gold_features", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

impl FeatureSink for SqliteSink {
    fn append_features(&mut self, rows: &[LongFeatureRow]) -> Result<usize, SinkError> {
        let stamp = created_at();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO gold_features (commodity, week, feature_name, feature_value, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.commodity,
                    row.week.to_string(),
                    row.feature_name,
                    row.feature_value,
                    stamp
                ])?;
            }
        }
        tx.commit()?;
        info!(rows = rows.len(), "appended feature rows");
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(i: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap() + chrono::Duration::weeks(i)
    }

    fn row(i: i64, name: &str, value: Option<f64>) -> LongFeatureRow {
        LongFeatureRow {
            commodity: "wti".into(),
            week: week(i),
            feature_name: name.into(),
            feature_value: value,
        }
    }

    #[test]
    fn append_is_additive_and_keeps_nulls() {
        let mut sink = SqliteSink::in_memory().unwrap();
        let rows = vec![row(0, "return_1w", None), row(1, "return_1w", Some(0.1))];
        assert_eq!(sink.append_features(&rows).unwrap(), 2);
        assert_eq!(sink.append_features(&rows).unwrap(), 2);
        assert_eq!(sink.feature_count().unwrap(), 4);

        let recent = sink.recent_features("wti", 3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].week, week(1));
        assert_eq!(recent[0].feature_value, Some(0.1));
        assert_eq!(recent[2].week, week(0));
        assert_eq!(recent[2].feature_value, None);
        assert!(sink.recent_features("brent", 10).unwrap().is_empty());
    }

    #[test]
    fn latest_regime_and_forecast_per_key() {
        let mut sink = SqliteSink::in_memory().unwrap();
        assert_eq!(sink.latest_regime("wti").unwrap(), None);

        for (i, label) in [(0, "contango"), (2, "backwardation"), (1, "neutral")] {
            sink.append_regime(&RegimeState {
                commodity: "wti".into(),
                week: week(i),
                regime_label: label.into(),
                regime_score: if i == 2 { None } else { Some(0.5) },
            })
            .unwrap();
        }
        let regime = sink.latest_regime("wti").unwrap().unwrap();
        assert_eq!(regime.regime_label, "backwardation");
        assert_eq!(regime.regime_score, None);

        for (i, horizon, value) in [(0, 4, 70.0), (1, 4, 71.5), (2, 8, 75.0)] {
            sink.append_forecast(&Forecast {
                commodity: "wti".into(),
                week: week(i),
                horizon_weeks: horizon,
                forecast_value: value,
            })
            .unwrap();
        }
        assert_eq!(sink.latest_forecast("wti", 4).unwrap().unwrap().forecast_value, 71.5);
        assert_eq!(sink.latest_forecast("wti", 8).unwrap().unwrap().week, week(2));
        assert_eq!(sink.latest_forecast("wti", 12).unwrap(), None);
    }

    #[test]
    fn url_forms() {
        assert!(SqliteSink::open("sqlite::memory:").is_ok());
        assert!(matches!(
            SqliteSink::open("postgres://localhost/oil"),
            Err(SinkError::UnsupportedUrl(_))
        ));
        assert!(matches!(SqliteSink::open("sqlite://"), Err(SinkError::UnsupportedUrl(_))));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oil.db");
        let url = format!("sqlite://{}", path.display());
        let mut sink = SqliteSink::open(&url).unwrap();
        sink.append_features(&[row(0, "value", Some(72.0))]).unwrap();
        drop(sink);
        let reopened = SqliteSink::open(&url).unwrap();
        assert_eq!(reopened.feature_count().unwrap(), 1);
    }
}
