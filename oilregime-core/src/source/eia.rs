//! EIA series API client.
//!
//! `GET https://api.eia.gov/series/?api_key=..&series_id=..` returns
//! `{"series": [{"series_id": .., "data": [[date, value], ..]}]}`. Only the
//! first series entry is used. Dates and values are passed through as text;
//! numeric JSON values keep their JSON spelling.

use super::{SourceAdapter, SourceError, SourceRow};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const API_KEY_VAR: &str = "EIA_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.eia.gov/series/";

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    #[serde(default)]
    series: Vec<SeriesData>,
}

#[derive(Debug, Deserialize)]
struct SeriesData {
    series_id: Option<String>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

pub struct EiaClient {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl std::fmt::Debug for EiaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EiaClient")
            .field("base_url", &DEFAULT_BASE_URL)
            .finish_non_exhaustive()
    }
}

impl EiaClient {
    /// Build a client. Falls back to `EIA_API_KEY` when `api_key` is `None`;
    /// an absent or blank key is `MissingCredential`.
    pub fn new(api_key: Option<String>) -> Result<Self, SourceError> {
        let api_key = api_key
            .or_else(|| std::env::var(API_KEY_VAR).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or(SourceError::MissingCredential(API_KEY_VAR))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
        })
    }

    pub fn from_env() -> Result<Self, SourceError> {
        Self::new(None)
    }

    fn parse_response(series_id: &str, resp: SeriesResponse) -> Result<Vec<SourceRow>, SourceError> {
        let series = resp
            .series
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NoData {
                series_id: series_id.to_string(),
            })?;
        let id = series.series_id.unwrap_or_else(|| series_id.to_string());

        let mut rows = Vec::with_capacity(series.data.len());
        for (i, point) in series.data.iter().enumerate() {
            let [date, value] = point.as_slice() else {
                return Err(SourceError::ResponseFormat(format!(
                    "data point {i} of {id} has {} fields, expected 2",
                    point.len()
                )));
            };
            rows.push(SourceRow {
                date: text(date),
                series_id: id.clone(),
                value: text(value),
            });
        }

        if rows.is_empty() {
            return Err(SourceError::NoData { series_id: id });
        }
        Ok(rows)
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SourceAdapter for EiaClient {
    fn name(&self) -> &str {
        "eia"
    }

    fn fetch(&self, series_id: &str) -> Result<Vec<SourceRow>, SourceError> {
        debug!(series_id, "requesting EIA series");
        let resp = self
            .client
            .get(DEFAULT_BASE_URL)
            .query(&[("api_key", self.api_key.as_str()), ("series_id", series_id)])
            .send()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Http(format!("HTTP {status} for {series_id}")));
        }

        let body: SeriesResponse = resp.json().map_err(|e| {
            SourceError::ResponseFormat(format!("failed to parse response for {series_id}: {e}"))
        })?;
        Self::parse_response(series_id, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<SourceRow>, SourceError> {
        let resp: SeriesResponse = serde_json::from_str(json).unwrap();
        EiaClient::parse_response("PET.RWTC.D", resp)
    }

    #[test]
    fn rows_keep_source_text() {
        let rows = parse(
            r#"{"series": [{"series_id": "PET.RWTC.D", "data": [
                ["20240105", 73.81], ["20240104", "72.19"], ["20240103", null]
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, "20240105");
        assert_eq!(rows[0].value, "73.81");
        assert_eq!(rows[1].value, "72.19");
        assert_eq!(rows[2].value, "");
        assert!(rows.iter().all(|r| r.series_id == "PET.RWTC.D"));
    }

    #[test]
    fn empty_series_is_no_data() {
        assert!(matches!(parse(r#"{"series": []}"#), Err(SourceError::NoData { .. })));
        assert!(matches!(parse(r#"{}"#), Err(SourceError::NoData { .. })));
        assert!(matches!(
            parse(r#"{"series": [{"series_id": "X", "data": []}]}"#),
            Err(SourceError::NoData { series_id }) if series_id == "X"
        ));
    }

    #[test]
    fn malformed_point_is_format_error() {
        assert!(matches!(
            parse(r#"{"series": [{"data": [["20240105"]]}]}"#),
            Err(SourceError::ResponseFormat(_))
        ));
    }

    #[test]
    fn explicit_blank_key_is_missing_credential() {
        assert!(matches!(
            EiaClient::new(Some("  ".into())),
            Err(SourceError::MissingCredential(API_KEY_VAR))
        ));
    }
}
