//! Weekly alignment.
//!
//! Heterogeneous source dates (daily prices, weekly reports) are mapped onto
//! one calendar of week-ending Fridays. Each week takes the last observation
//! on or before its Friday; weeks without a new observation repeat the
//! previous week's row. No interpolation, no backward fill.

use crate::domain::{AlignedRecord, RawRecord};
use crate::table::{AlignedTable, BronzeTable};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// What to do with a bronze row whose date cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidDatePolicy {
    /// Treat the date as missing: the row never enters the grid.
    #[default]
    Drop,
    /// Fail the whole table.
    Reject,
}

#[derive(Debug, Error, PartialEq)]
pub enum AlignError {
    #[error("no rows with a usable date and value")]
    Empty,

    #[error("row {row}: unparseable date {value:?}")]
    InvalidDate { row: usize, value: String },
}

/// Silver output plus what was left out on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Aligned {
    pub table: AlignedTable,
    /// Rows excluded because the date was unparseable.
    pub dropped_dates: usize,
    /// Rows excluded because the value was not numeric.
    pub dropped_values: usize,
}

/// Parse a provider date: `YYYY-MM-DD`, `YYYYMMDD`, or an RFC 3339 datetime.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// The Friday on or after `date`.
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let ahead = (Weekday::Fri.num_days_from_monday() + 7
        - date.weekday().num_days_from_monday())
        % 7;
    date + Duration::days(i64::from(ahead))
}

fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

struct Observation<'a> {
    date: NaiveDate,
    value: f64,
    record: &'a RawRecord,
}

/// Align bronze rows onto the weekly Friday grid.
///
/// Output has one row per week from the week containing the first observation
/// through the week containing the last, regardless of how many input rows
/// there were.
pub fn align(bronze: &BronzeTable, policy: InvalidDatePolicy) -> Result<Aligned, AlignError> {
    let mut observations = Vec::with_capacity(bronze.records.len());
    let mut dropped_dates = 0;
    let mut dropped_values = 0;

    for (row, record) in bronze.records.iter().enumerate() {
        let Some(date) = parse_date(&record.date) else {
            match policy {
                InvalidDatePolicy::Drop => {
                    dropped_dates += 1;
                    continue;
                }
                InvalidDatePolicy::Reject => {
                    return Err(AlignError::InvalidDate {
                        row,
                        value: record.date.clone(),
                    })
                }
            }
        };
        let Some(value) = parse_value(&record.value) else {
            dropped_values += 1;
            continue;
        };
        observations.push(Observation {
            date,
            value,
            record,
        });
    }

    if dropped_dates > 0 {
        warn!(rows = dropped_dates, "dropped rows with unparseable dates");
    }
    if dropped_values > 0 {
        debug!(rows = dropped_values, "skipped rows with non-numeric values");
    }

    // Stable: among equal dates the later input row stays later and wins.
    observations.sort_by_key(|o| o.date);
    let (Some(first), Some(last)) = (observations.first(), observations.last()) else {
        return Err(AlignError::Empty);
    };

    let end = week_ending(last.date);
    let mut label = week_ending(first.date);
    let mut records = Vec::new();
    let mut next = 0;
    let mut current: Option<&Observation> = None;
    while label <= end {
        while next < observations.len() && observations[next].date <= label {
            current = Some(&observations[next]);
            next += 1;
        }
        // The first label is on or after the first date, so `current` is set.
        if let Some(obs) = current {
            records.push(AlignedRecord {
                date: label,
                series_id: obs.record.series_id.clone(),
                value: obs.value,
                source_type: obs.record.source_type.clone(),
            });
        }
        label += Duration::days(7);
    }

    Ok(Aligned {
        table: AlignedTable::new(records),
        dropped_dates,
        dropped_values,
    })
}
