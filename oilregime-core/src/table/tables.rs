//! Tier tables: bronze (raw strings), silver (aligned), gold (features).

use super::batch::{Batch, Column, ColumnData, DataType, Field};
use super::schema::{expect_columns, validate, SchemaError, Table};
use crate::domain::{AlignedRecord, Domain, FeatureRecord, RawRecord};

fn column_names(batch: &Batch) -> Vec<String> {
    batch.column_names().iter().map(|s| s.to_string()).collect()
}

/// Bronze rows, exactly as the source adapter returned them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BronzeTable {
    pub records: Vec<RawRecord>,
}

impl BronzeTable {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn schema() -> Vec<Field> {
        vec![
            Field::new("date", DataType::Utf8),
            Field::new("series_id", DataType::Utf8),
            Field::new("value", DataType::Utf8),
            Field::new("source_type", DataType::Utf8),
        ]
    }
}

impl Table for BronzeTable {
    fn read_schema(columns: &[String]) -> Result<Vec<Field>, SchemaError> {
        expect_columns(columns, &Self::schema())
    }

    fn to_batch(&self) -> Batch {
        let r = &self.records;
        Batch::new(vec![
            Column::new("date", ColumnData::Utf8(r.iter().map(|x| x.date.clone()).collect())),
            Column::new(
                "series_id",
                ColumnData::Utf8(r.iter().map(|x| x.series_id.clone()).collect()),
            ),
            Column::new("value", ColumnData::Utf8(r.iter().map(|x| x.value.clone()).collect())),
            Column::new(
                "source_type",
                ColumnData::Utf8(r.iter().map(|x| x.source_type.clone()).collect()),
            ),
        ])
        .unwrap_or_else(|_| unreachable!("columns built from one slice have equal length"))
    }

    fn from_batch(batch: &Batch) -> Result<Self, SchemaError> {
        validate(batch, &Self::read_schema(&column_names(batch))?)?;
        let dates = batch.utf8("date")?;
        let series = batch.utf8("series_id")?;
        let values = batch.utf8("value")?;
        let sources = batch.utf8("source_type")?;
        let records = (0..batch.height())
            .map(|i| RawRecord {
                date: dates[i].clone(),
                series_id: series[i].clone(),
                value: values[i].clone(),
                source_type: sources[i].clone(),
            })
            .collect();
        Ok(Self { records })
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Silver rows on the weekly grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedTable {
    pub records: Vec<AlignedRecord>,
}

impl AlignedTable {
    pub fn new(records: Vec<AlignedRecord>) -> Self {
        Self { records }
    }

    pub fn schema() -> Vec<Field> {
        vec![
            Field::new("date", DataType::Date),
            Field::new("series_id", DataType::Utf8),
            Field::new("value", DataType::Float64),
            Field::new("source_type", DataType::Utf8),
        ]
    }
}

impl Table for AlignedTable {
    fn read_schema(columns: &[String]) -> Result<Vec<Field>, SchemaError> {
        expect_columns(columns, &Self::schema())
    }

    fn to_batch(&self) -> Batch {
        let r = &self.records;
        Batch::new(vec![
            Column::new("date", ColumnData::Date(r.iter().map(|x| x.date).collect())),
            Column::new(
                "series_id",
                ColumnData::Utf8(r.iter().map(|x| x.series_id.clone()).collect()),
            ),
            Column::new("value", ColumnData::Float64(r.iter().map(|x| Some(x.value)).collect())),
            Column::new(
                "source_type",
                ColumnData::Utf8(r.iter().map(|x| x.source_type.clone()).collect()),
            ),
        ])
        .unwrap_or_else(|_| unreachable!("columns built from one slice have equal length"))
    }

    fn from_batch(batch: &Batch) -> Result<Self, SchemaError> {
        validate(batch, &Self::read_schema(&column_names(batch))?)?;
        let dates = batch.date("date")?;
        let series = batch.utf8("series_id")?;
        let values = batch.float64("value")?;
        let sources = batch.utf8("source_type")?;
        let mut records = Vec::with_capacity(batch.height());
        for i in 0..batch.height() {
            let value = values[i].ok_or_else(|| SchemaError::InvalidValue {
                column: "value".into(),
                row: i,
                reason: "aligned value is null".into(),
            })?;
            records.push(AlignedRecord {
                date: dates[i],
                series_id: series[i].clone(),
                value,
                source_type: sources[i].clone(),
            });
        }
        Ok(Self { records })
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Gold rows for one domain.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub domain: Domain,
    pub records: Vec<FeatureRecord>,
}

impl FeatureTable {
    pub fn new(domain: Domain, records: Vec<FeatureRecord>) -> Self {
        Self { domain, records }
    }

    pub fn schema(domain: Domain) -> Vec<Field> {
        let mut fields = vec![
            Field::new("date", DataType::Date),
            Field::new("value", DataType::Float64),
        ];
        fields.extend(
            domain
                .derived_columns()
                .iter()
                .map(|name| Field::new(*name, DataType::Float64)),
        );
        fields
    }

    /// Values of one feature column (`value` or a derived column), row order.
    pub fn feature_values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        if name == "value" {
            return Some(self.records.iter().map(|r| Some(r.value)).collect());
        }
        let idx = self
            .domain
            .derived_columns()
            .iter()
            .position(|c| *c == name)?;
        Some(
            self.records
                .iter()
                .map(|r| r.features.get(idx).copied().flatten())
                .collect(),
        )
    }
}

impl Table for FeatureTable {
    fn read_schema(columns: &[String]) -> Result<Vec<Field>, SchemaError> {
        let derived: Vec<&String> = columns
            .iter()
            .filter(|c| c.as_str() != "date" && c.as_str() != "value")
            .collect();
        let domain = Domain::from_derived_columns(&derived).ok_or_else(|| {
            match derived.first() {
                Some(name) => SchemaError::UnexpectedColumn((*name).clone()),
                None => SchemaError::MissingColumn("derived feature column".into()),
            }
        })?;
        expect_columns(columns, &Self::schema(domain))
    }

    fn to_batch(&self) -> Batch {
        let r = &self.records;
        let mut columns = vec![
            Column::new("date", ColumnData::Date(r.iter().map(|x| x.date).collect())),
            Column::new("value", ColumnData::Float64(r.iter().map(|x| Some(x.value)).collect())),
        ];
        for (idx, name) in self.domain.derived_columns().iter().enumerate() {
            columns.push(Column::new(
                *name,
                ColumnData::Float64(r.iter().map(|x| x.features.get(idx).copied().flatten()).collect()),
            ));
        }
        Batch::new(columns)
            .unwrap_or_else(|_| unreachable!("columns built from one slice have equal length"))
    }

    fn from_batch(batch: &Batch) -> Result<Self, SchemaError> {
        let names = column_names(batch);
        validate(batch, &Self::read_schema(&names)?)?;
        let derived: Vec<&String> = names
            .iter()
            .filter(|c| c.as_str() != "date" && c.as_str() != "value")
            .collect();
        let domain = Domain::from_derived_columns(&derived)
            .ok_or_else(|| SchemaError::MissingColumn("derived feature column".into()))?;

        let dates = batch.date("date")?;
        let values = batch.float64("value")?;
        let feature_cols = domain
            .derived_columns()
            .iter()
            .map(|name| batch.float64(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(batch.height());
        for i in 0..batch.height() {
            let value = values[i].ok_or_else(|| SchemaError::InvalidValue {
                column: "value".into(),
                row: i,
                reason: "feature base value is null".into(),
            })?;
            records.push(FeatureRecord {
                date: dates[i],
                value,
                features: feature_cols.iter().map(|col| col[i]).collect(),
            });
        }
        Ok(Self { domain, records })
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
