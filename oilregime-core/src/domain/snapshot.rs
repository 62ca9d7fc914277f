//! Snapshot identity.
//!
//! A snapshot is named by its creation instant in UTC, formatted as
//! `YYYYMMDDTHHMMSSZ`. The format is fixed-width and zero-padded, so string
//! order equals chronological order and "latest" is a plain lexicographic max.

use super::tier::TableLocation;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ID_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const ID_LEN: usize = 16;

#[derive(Debug, Error, PartialEq)]
#[error("invalid snapshot id '{0}' (expected YYYYMMDDTHHMMSSZ)")]
pub struct SnapshotIdError(pub String);

/// Timestamp-sortable snapshot identifier, one-second resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Identifier for an instant, truncated to the second.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format(ID_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The instant this identifier encodes.
    pub fn datetime(&self) -> DateTime<Utc> {
        // Construction always goes through a validated parse or a format of a
        // real instant, so this cannot fail.
        NaiveDateTime::parse_from_str(&self.0, ID_FORMAT)
            .map(|naive| naive.and_utc())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// The identifier one second after this one.
    pub fn next_after(&self) -> Self {
        Self::from_datetime(self.datetime() + Duration::seconds(1))
    }
}

impl FromStr for SnapshotId {
    type Err = SnapshotIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID_LEN {
            return Err(SnapshotIdError(s.to_string()));
        }
        let naive = NaiveDateTime::parse_from_str(s, ID_FORMAT)
            .map_err(|_| SnapshotIdError(s.to_string()))?;
        // Reject non-canonical spellings so the string order stays chronological.
        let canonical = Self::from_datetime(naive.and_utc());
        if canonical.0 != s {
            return Err(SnapshotIdError(s.to_string()));
        }
        Ok(canonical)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialization actually used for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    /// Preferred compact columnar encoding.
    Parquet,
    /// Plain delimited-text fallback.
    Csv,
}

impl SnapshotFormat {
    /// Resolution order: columnar first, delimited text only if no columnar
    /// snapshot exists.
    pub const PREFERENCE: [SnapshotFormat; 2] = [SnapshotFormat::Parquet, SnapshotFormat::Csv];

    pub fn extension(&self) -> &'static str {
        match self {
            SnapshotFormat::Parquet => "parquet",
            SnapshotFormat::Csv => "csv",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "parquet" => Some(SnapshotFormat::Parquet),
            "csv" => Some(SnapshotFormat::Csv),
            _ => None,
        }
    }
}

impl fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A handle to one immutable snapshot of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotRef {
    pub location: TableLocation,
    pub id: SnapshotId,
    pub format: SnapshotFormat,
}

impl SnapshotRef {
    /// File name within the table directory: `{timestamp}.{ext}`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.format.extension())
    }

    /// Parse a `{timestamp}.{ext}` file name. Anything else is not a snapshot.
    pub fn parse_file_name(location: &TableLocation, name: &str) -> Option<Self> {
        let (stem, ext) = name.rsplit_once('.')?;
        let format = SnapshotFormat::from_extension(ext)?;
        let id = stem.parse().ok()?;
        Some(Self {
            location: location.clone(),
            id,
            format,
        })
    }
}

impl fmt::Display for SnapshotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.location, self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tier;
    use chrono::TimeZone;

    #[test]
    fn id_is_fixed_width_utc() {
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 15, 30, 45).unwrap();
        let id = SnapshotId::from_datetime(at);
        assert_eq!(id.as_str(), "20240105T153045Z");
        assert_eq!(id.datetime(), at);
    }

    #[test]
    fn string_order_is_chronological() {
        let early = SnapshotId::from_datetime(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap());
        let late = SnapshotId::from_datetime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(early < late);
        assert!(early.as_str() < late.as_str());
    }

    #[test]
    fn next_after_rolls_over() {
        let id: SnapshotId = "20241231T235959Z".parse().unwrap();
        assert_eq!(id.next_after().as_str(), "20250101T000000Z");
    }

    #[test]
    fn rejects_non_canonical_ids() {
        assert!("2024-01-05T15:30:45Z".parse::<SnapshotId>().is_err());
        assert!("20240105T153045".parse::<SnapshotId>().is_err());
        assert!("20241305T153045Z".parse::<SnapshotId>().is_err());
    }

    #[test]
    fn file_name_roundtrip() {
        let loc = TableLocation::new(Tier::Bronze, "bronze_eia_prices");
        let r = SnapshotRef::parse_file_name(&loc, "20240105T153045Z.parquet").unwrap();
        assert_eq!(r.format, SnapshotFormat::Parquet);
        assert_eq!(r.file_name(), "20240105T153045Z.parquet");

        assert!(SnapshotRef::parse_file_name(&loc, "20240105T153045Z.parquet.tmp").is_none());
        assert!(SnapshotRef::parse_file_name(&loc, "meta.json").is_none());
        assert!(SnapshotRef::parse_file_name(&loc, "latest.csv").is_none());
    }
}
