//! Derived columns for the gold tier.
//!
//! Every helper works over plain slices and returns `None` where a value is
//! undefined (leading rows, division by zero). Undefined never becomes zero.
//!
//! - price: `return_1w` = fractional change vs the previous week,
//!   `vol_4w` = sample standard deviation (divide by n-1) of the trailing four
//!   `return_1w` values. The first four rows of `vol_4w` are undefined.
//! - supply: `supply_delta` = first difference.
//! - storage: `inventory_delta` = first difference.

use crate::domain::{Domain, FeatureRecord};
use crate::table::{AlignedTable, FeatureTable};
use chrono::{Datelike, NaiveDate, Weekday};
use thiserror::Error;

/// Trailing window for `vol_4w`.
pub const VOL_WINDOW: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("row {row}: {date} does not continue the weekly Friday grid after {previous:?}")]
    NotWeekly {
        row: usize,
        date: NaiveDate,
        previous: Option<NaiveDate>,
    },
}

/// Fractional change vs the previous element. `None` at index 0 and where the
/// previous value is zero.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 || values[i - 1] == 0.0 {
            out.push(None);
        } else {
            out.push(Some((values[i] - values[i - 1]) / values[i - 1]));
        }
    }
    out
}

/// First difference. `None` at index 0.
pub fn diff(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        out.push(if i == 0 {
            None
        } else {
            Some(values[i] - values[i - 1])
        });
    }
    out
}

/// Trailing sample standard deviation. Defined only where the whole window is
/// defined. A window under 2 has no sample deviation, so every row is `None`.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window < 2 {
        return out;
    }
    for end in window..=values.len() {
        let slice = &values[end - window..end];
        let defined: Option<Vec<f64>> = slice.iter().copied().collect();
        let Some(xs) = defined else { continue };
        let n = xs.len() as f64;
        let mean = xs.iter().sum::<f64>() / n;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        out[end - 1] = Some(var.sqrt());
    }
    out
}

fn check_weekly(aligned: &AlignedTable) -> Result<(), FeatureError> {
    let mut previous: Option<NaiveDate> = None;
    for (row, record) in aligned.records.iter().enumerate() {
        let on_grid = record.date.weekday() == Weekday::Fri
            && previous.map_or(true, |p| (record.date - p).num_days() == 7);
        if !on_grid {
            return Err(FeatureError::NotWeekly {
                row,
                date: record.date,
                previous,
            });
        }
        previous = Some(record.date);
    }
    Ok(())
}

/// Add the domain's derived columns to aligned rows.
///
/// Input must already be on the weekly grid; this never resamples.
pub fn derive(aligned: &AlignedTable, domain: Domain) -> Result<FeatureTable, FeatureError> {
    check_weekly(aligned)?;
    let values: Vec<f64> = aligned.records.iter().map(|r| r.value).collect();

    let columns: Vec<Vec<Option<f64>>> = match domain {
        Domain::Price => {
            let returns = pct_change(&values);
            let vol = rolling_std(&returns, VOL_WINDOW);
            vec![returns, vol]
        }
        Domain::Supply | Domain::Storage => vec![diff(&values)],
    };

    let records = aligned
        .records
        .iter()
        .enumerate()
        .map(|(i, r)| FeatureRecord {
            date: r.date,
            value: r.value,
            features: columns.iter().map(|col| col[i]).collect(),
        })
        .collect();
    Ok(FeatureTable::new(domain, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AlignedRecord;
    use chrono::Duration;

    fn weekly(values: &[f64]) -> AlignedTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        AlignedTable::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| AlignedRecord {
                    date: start + Duration::weeks(i as i64),
                    series_id: "S".into(),
                    value: *v,
                    source_type: "prices".into(),
                })
                .collect(),
        )
    }

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn price_returns_and_short_history_vol() {
        let t = derive(&weekly(&[100.0, 110.0, 121.0]), Domain::Price).unwrap();
        let ret = t.feature_values("return_1w").unwrap();
        assert_eq!(ret[0], None);
        assert!(close(ret[1], 0.10));
        assert!(close(ret[2], 0.10));
        let vol = t.feature_values("vol_4w").unwrap();
        assert_eq!(vol, vec![None, None, None]);
    }

    #[test]
    fn vol_is_sample_std_of_four_returns() {
        // Returns: +10%, -10%, +10%, -10%. Mean 0, sample var 0.04 / 3.
        let t = derive(
            &weekly(&[100.0, 110.0, 99.0, 108.9, 98.01, 98.01]),
            Domain::Price,
        )
        .unwrap();
        let vol = t.feature_values("vol_4w").unwrap();
        assert!(vol[..4].iter().all(Option::is_none));
        assert!(close(vol[4], (0.04f64 / 3.0).sqrt()));
        assert!(vol[5].is_some());
    }

    #[test]
    fn zero_previous_value_has_no_return() {
        assert_eq!(pct_change(&[0.0, 5.0]), vec![None, None]);
    }

    #[test]
    fn undefined_return_blocks_vol_window() {
        let returns = vec![None, Some(0.1), Some(0.2), None, Some(0.1), Some(0.2), Some(0.3), Some(0.1)];
        let vol = rolling_std(&returns, 4);
        assert!(vol[..7].iter().all(Option::is_none));
        assert!(vol[7].is_some());
    }

    #[test]
    fn short_window_vol_is_undefined() {
        let returns = vec![Some(0.1), Some(0.2), Some(0.3)];
        assert_eq!(rolling_std(&returns, 1), vec![None, None, None]);
        assert_eq!(rolling_std(&returns, 0), vec![None, None, None]);
    }

    #[test]
    fn supply_and_storage_deltas() {
        let t = derive(&weekly(&[12_000.0, 12_100.0, 11_900.0]), Domain::Supply).unwrap();
        assert_eq!(
            t.feature_values("supply_delta").unwrap(),
            vec![None, Some(100.0), Some(-200.0)]
        );
        let t = derive(&weekly(&[430.0, 425.5]), Domain::Storage).unwrap();
        assert_eq!(
            t.feature_values("inventory_delta").unwrap(),
            vec![None, Some(-4.5)]
        );
    }

    #[test]
    fn rejects_non_weekly_input() {
        let mut table = weekly(&[1.0, 2.0, 3.0]);
        table.records[2].date = table.records[1].date + Duration::days(14);
        assert!(matches!(
            derive(&table, Domain::Storage).unwrap_err(),
            FeatureError::NotWeekly { row: 2, .. }
        ));

        let mut table = weekly(&[1.0]);
        table.records[0].date = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        assert!(derive(&table, Domain::Price).is_err());
    }

    #[test]
    fn empty_input_is_empty_output() {
        let t = derive(&AlignedTable::default(), Domain::Price).unwrap();
        assert!(t.records.is_empty());
    }
}
