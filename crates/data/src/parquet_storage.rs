use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use optionset_core::{DatasetSink, PanelRow, SyntheticRecord};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::schema::{panel_columns, synthetic_columns, Column, ColumnValues};

/// Writes output tables as Parquet files, `<dir>/<table>.parquet`.
#[derive(Debug, Clone)]
pub struct ParquetStorage {
    dir: PathBuf,
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as i32
}

fn to_field_and_array(column: &Column) -> (Field, ArrayRef) {
    match &column.values {
        ColumnValues::Date(v) => (
            Field::new(&column.name, DataType::Date32, false),
            Arc::new(Date32Array::from(
                v.iter().copied().map(days_since_epoch).collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
        ColumnValues::Int(v) => (
            Field::new(&column.name, DataType::Int64, false),
            Arc::new(Int64Array::from(v.clone())) as ArrayRef,
        ),
        ColumnValues::Float(v) => (
            Field::new(&column.name, DataType::Float64, true),
            Arc::new(Float64Array::from(v.clone())) as ArrayRef,
        ),
        ColumnValues::Text(v) => (
            Field::new(&column.name, DataType::Utf8, false),
            Arc::new(StringArray::from(v.clone())) as ArrayRef,
        ),
    }
}

impl ParquetStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes columns to a Parquet file as a single record batch.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or if writing to the Parquet file fails.
    pub fn write_columns(path: &Path, columns: &[Column]) -> Result<()> {
        let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) =
            columns.iter().map(to_field_and_array).unzip();
        let schema = Arc::new(Schema::new(fields));

        let batch = RecordBatch::try_new(schema.clone(), arrays)?;

        let file = File::create(path)
            .with_context(|| format!("Failed to create Parquet file: {}", path.display()))?;
        let props = WriterProperties::builder()
            .set_compression(parquet::basic::Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;

        writer.write(&batch)?;
        writer.close()?;

        Ok(())
    }

    fn path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.parquet"))
    }
}

impl DatasetSink for ParquetStorage {
    fn write_panel(
        &mut self,
        table: &str,
        rows: &[PanelRow],
        fundamental_columns: &[String],
    ) -> Result<()> {
        Self::write_columns(&self.path(table), &panel_columns(rows, fundamental_columns))
    }

    fn write_synthetic(
        &mut self,
        table: &str,
        rows: &[SyntheticRecord],
        auxiliary_columns: &[String],
    ) -> Result<()> {
        Self::write_columns(&self.path(table), &synthetic_columns(rows, auxiliary_columns))
    }
}
