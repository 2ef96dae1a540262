//! Arrest dataset loading.
//!
//! Reads the source parquet file into `ArrestRecord`s. Column extraction is
//! tolerant about physical types — identifiers may be stored as strings or
//! integers, dates as Date32 or timestamps, ages as any integer width — but
//! a missing required column is a hard error.

use std::fs::File;
use std::path::Path;

use arrow::array::{
    Array, ArrayRef, Date32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    LargeStringArray, StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::{Result, StudyError};
use crate::models::ArrestRecord;

/// Batch size for parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Column names in the source arrest dataset
pub mod columns {
    pub const DEFENDANT_ID: &str = "DefendantId";
    pub const ARREST_DATE: &str = "ArrestDate";
    pub const GEOID: &str = "DefendantAddressGEOID10";
    pub const CRIME_CATEGORY: &str = "Arrest_crime_category";
    pub const AGE: &str = "Age_years";
    pub const GENDER: &str = "Gender";
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| StudyError::MissingColumn(name.to_string()))
}

/// String value at `row`, accepting Utf8, LargeUtf8, and integer identifiers
fn string_value(array: &ArrayRef, row: usize, name: &str) -> Result<Option<String>> {
    if array.is_null(row) {
        return Ok(None);
    }
    if let Some(strings) = array.as_any().downcast_ref::<StringArray>() {
        return Ok(Some(strings.value(row).to_string()));
    }
    if let Some(strings) = array.as_any().downcast_ref::<LargeStringArray>() {
        return Ok(Some(strings.value(row).to_string()));
    }
    if let Some(ints) = array.as_any().downcast_ref::<Int64Array>() {
        return Ok(Some(ints.value(row).to_string()));
    }
    if let Some(ints) = array.as_any().downcast_ref::<Int32Array>() {
        return Ok(Some(ints.value(row).to_string()));
    }
    Err(StudyError::ColumnType {
        column: name.to_string(),
        expected: "string or integer".to_string(),
    })
}

/// Date value at `row`, accepting Date32, any timestamp unit, and ISO strings
fn date_value(array: &ArrayRef, row: usize, name: &str) -> Result<Option<NaiveDate>> {
    if array.is_null(row) {
        return Ok(None);
    }
    let date = match array.data_type() {
        DataType::Date32 => array
            .as_any()
            .downcast_ref::<Date32Array>()
            .and_then(|a| a.value_as_date(row)),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => array
            .as_any()
            .downcast_ref::<TimestampNanosecondArray>()
            .and_then(|a| a.value_as_datetime(row))
            .map(|dt| dt.date()),
        DataType::Timestamp(TimeUnit::Microsecond, _) => array
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .and_then(|a| a.value_as_datetime(row))
            .map(|dt| dt.date()),
        DataType::Timestamp(TimeUnit::Millisecond, _) => array
            .as_any()
            .downcast_ref::<TimestampMillisecondArray>()
            .and_then(|a| a.value_as_datetime(row))
            .map(|dt| dt.date()),
        DataType::Utf8 | DataType::LargeUtf8 => string_value(array, row, name)?
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        _ => {
            return Err(StudyError::ColumnType {
                column: name.to_string(),
                expected: "date, timestamp, or ISO date string".to_string(),
            });
        }
    };
    Ok(date)
}

/// Integer value at `row`, accepting the common integer widths and floats
fn int_value(array: &ArrayRef, row: usize, name: &str) -> Result<Option<i32>> {
    if array.is_null(row) {
        return Ok(None);
    }
    if let Some(ints) = array.as_any().downcast_ref::<Int16Array>() {
        return Ok(Some(i32::from(ints.value(row))));
    }
    if let Some(ints) = array.as_any().downcast_ref::<Int32Array>() {
        return Ok(Some(ints.value(row)));
    }
    if let Some(ints) = array.as_any().downcast_ref::<Int64Array>() {
        return Ok(Some(ints.value(row) as i32));
    }
    if let Some(floats) = array.as_any().downcast_ref::<Float64Array>() {
        let value = floats.value(row);
        return Ok(if value.is_finite() {
            Some(value.round() as i32)
        } else {
            None
        });
    }
    Err(StudyError::ColumnType {
        column: name.to_string(),
        expected: "integer or float".to_string(),
    })
}

/// Convert one record batch into arrest records. Rows missing a defendant
/// id, date, or geographic identifier are skipped and counted.
fn records_from_batch(batch: &RecordBatch, skipped: &mut usize) -> Result<Vec<ArrestRecord>> {
    let defendant_ids = column(batch, columns::DEFENDANT_ID)?;
    let dates = column(batch, columns::ARREST_DATE)?;
    let geoids = column(batch, columns::GEOID)?;
    let categories = column(batch, columns::CRIME_CATEGORY)?;
    let ages = column(batch, columns::AGE)?;
    let genders = column(batch, columns::GENDER)?;

    let mut records = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let defendant_id = string_value(defendant_ids, row, columns::DEFENDANT_ID)?;
        let arrest_date = date_value(dates, row, columns::ARREST_DATE)?;
        let geoid = string_value(geoids, row, columns::GEOID)?;
        let (Some(defendant_id), Some(arrest_date), Some(geoid)) =
            (defendant_id, arrest_date, geoid)
        else {
            *skipped += 1;
            continue;
        };
        records.push(ArrestRecord {
            defendant_id,
            arrest_date,
            geoid,
            crime_category: string_value(categories, row, columns::CRIME_CATEGORY)?
                .unwrap_or_default(),
            age: int_value(ages, row, columns::AGE)?,
            gender: string_value(genders, row, columns::GENDER)?,
        });
    }
    Ok(records)
}

/// Read the arrest dataset from a parquet file
pub fn load_arrests(path: &Path) -> Result<Vec<ArrestRecord>> {
    info!("Loading arrest data from {}", path.display());
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .build()?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for batch in reader {
        let batch = batch?;
        records.extend(records_from_batch(&batch, &mut skipped)?);
    }

    if skipped > 0 {
        warn!("Skipped {skipped} arrest rows with missing id, date, or geography");
    }
    if records.is_empty() {
        return Err(StudyError::EmptyDataset);
    }
    info!("Loaded {} arrests", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{Date32Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};

    fn test_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new(columns::DEFENDANT_ID, DataType::Utf8, false),
            Field::new(columns::ARREST_DATE, DataType::Date32, true),
            Field::new(columns::GEOID, DataType::Int64, true),
            Field::new(columns::CRIME_CATEGORY, DataType::Utf8, true),
            Field::new(columns::AGE, DataType::Int64, true),
            Field::new(columns::GENDER, DataType::Utf8, true),
        ]));
        // 2015-06-01 is 16587 days after the epoch
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["d1", "d2", "d3"])) as ArrayRef,
                Arc::new(Date32Array::from(vec![Some(16587), Some(16600), None])),
                Arc::new(Int64Array::from(vec![
                    Some(450190001001001),
                    Some(450150002002002),
                    Some(450190001001001),
                ])),
                Arc::new(StringArray::from(vec![
                    Some("Drug Poss"),
                    Some("Assault"),
                    None,
                ])),
                Arc::new(Int64Array::from(vec![Some(24), None, Some(31)])),
                Arc::new(StringArray::from(vec![Some("Male"), Some("Female"), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn decodes_mixed_column_types() {
        let mut skipped = 0;
        let records = records_from_batch(&test_batch(), &mut skipped).unwrap();

        // Third row has a null date and is skipped
        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 1);

        let first = &records[0];
        assert_eq!(first.defendant_id, "d1");
        assert_eq!(
            first.arrest_date,
            NaiveDate::from_ymd_opt(2015, 6, 1).unwrap()
        );
        assert_eq!(first.geoid, "450190001001001");
        assert_eq!(first.crime_category, "Drug Poss");
        assert_eq!(first.age, Some(24));
        assert_eq!(first.gender.as_deref(), Some("Male"));

        assert_eq!(records[1].age, None);
    }

    #[test]
    fn missing_column_is_an_error() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            columns::DEFENDANT_ID,
            DataType::Utf8,
            false,
        )]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec!["d1"])) as ArrayRef],
        )
        .unwrap();
        let mut skipped = 0;
        assert!(matches!(
            records_from_batch(&batch, &mut skipped),
            Err(StudyError::MissingColumn(_))
        ));
    }
}
