//! Wide → long projection for the relational sink.

use crate::domain::LongFeatureRow;
use crate::table::FeatureTable;

/// One row per (feature column, week). Columns are the domain's
/// `feature_columns()` (`value` first), each emitted for every week in date
/// order before the next column starts. Undefined values stay `None`.
pub fn to_long(features: &FeatureTable, commodity: &str) -> Vec<LongFeatureRow> {
    let columns = features.domain.feature_columns();
    let mut rows = Vec::with_capacity(columns.len() * features.records.len());
    for name in columns {
        let values = features.feature_values(name).unwrap_or_default();
        for (record, value) in features.records.iter().zip(values) {
            rows.push(LongFeatureRow {
                commodity: commodity.to_string(),
                week: record.date,
                feature_name: name.to_string(),
                feature_value: value,
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Domain, FeatureRecord};
    use chrono::NaiveDate;

    #[test]
    fn row_count_is_weeks_times_columns() {
        let week = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let table = FeatureTable::new(
            Domain::Price,
            vec![
                FeatureRecord {
                    date: week,
                    value: 70.0,
                    features: vec![None, None],
                },
                FeatureRecord {
                    date: week + chrono::Duration::weeks(1),
                    value: 77.0,
                    features: vec![Some(0.1), None],
                },
            ],
        );
        let rows = to_long(&table, "wti");
        assert_eq!(rows.len(), 2 * 3);
        assert!(rows.iter().all(|r| r.commodity == "wti"));
        assert_eq!(rows[0].feature_name, "value");
        assert_eq!(rows[0].feature_value, Some(70.0));
        assert_eq!(rows[3].feature_name, "return_1w");
        assert_eq!(rows[3].feature_value, Some(0.1));
        assert_eq!(rows[5].feature_name, "vol_4w");
        assert_eq!(rows[5].feature_value, None);
    }
}
