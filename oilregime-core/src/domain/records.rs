//! Row shapes for each tier.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source domain of a series. Decides which derived columns the gold tier adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Price,
    Supply,
    Storage,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Price, Domain::Supply, Domain::Storage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Price => "price",
            Domain::Supply => "supply",
            Domain::Storage => "storage",
        }
    }

    /// Columns the feature transform adds for this domain, in output order.
    pub fn derived_columns(&self) -> &'static [&'static str] {
        match self {
            Domain::Price => &["return_1w", "vol_4w"],
            Domain::Supply => &["supply_delta"],
            Domain::Storage => &["inventory_delta"],
        }
    }

    /// Columns projected into long format: the aligned value plus every
    /// derived column.
    pub fn feature_columns(&self) -> Vec<&'static str> {
        let mut cols = vec!["value"];
        cols.extend_from_slice(self.derived_columns());
        cols
    }

    /// Identify a domain from the derived columns present in a gold table,
    /// in any order.
    pub fn from_derived_columns<S: AsRef<str>>(columns: &[S]) -> Option<Self> {
        Self::ALL.into_iter().find(|domain| {
            let derived = domain.derived_columns();
            derived.len() == columns.len()
                && derived
                    .iter()
                    .all(|want| columns.iter().any(|have| have.as_ref() == *want))
        })
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bronze row. Date and value stay exactly as the provider sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: String,
    pub series_id: String,
    pub value: String,
    /// Which source produced the row (`prices`, `supply`, `storage`).
    pub source_type: String,
}

/// Silver row: one per week-ending Friday, numeric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRecord {
    pub date: NaiveDate,
    pub series_id: String,
    pub value: f64,
    pub source_type: String,
}

/// Gold row. `features` lines up with `Domain::derived_columns`; `None`
/// marks an undefined leading value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub date: NaiveDate,
    pub value: f64,
    pub features: Vec<Option<f64>>,
}

/// Sink-bound projection, one row per (week, feature).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongFeatureRow {
    pub commodity: String,
    pub week: NaiveDate,
    pub feature_name: String,
    pub feature_value: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_columns_lead_with_value() {
        assert_eq!(
            Domain::Price.feature_columns(),
            vec!["value", "return_1w", "vol_4w"]
        );
        assert_eq!(Domain::Storage.feature_columns(), vec!["value", "inventory_delta"]);
    }

    #[test]
    fn domain_from_columns() {
        assert_eq!(
            Domain::from_derived_columns(&["return_1w", "vol_4w"]),
            Some(Domain::Price)
        );
        assert_eq!(Domain::from_derived_columns(&["supply_delta"]), Some(Domain::Supply));
        assert_eq!(Domain::from_derived_columns(&["vol_4w"]), None);
        assert_eq!(
            Domain::from_derived_columns(&["vol_4w", "return_1w"]),
            Some(Domain::Price)
        );
        assert_eq!(Domain::from_derived_columns(&["return_1w", "return_1w"]), None);
    }
}
