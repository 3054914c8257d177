use polars::datatypes::DataType;
use polars::frame::DataFrame;
use polars::io::SerWriter;
use polars::prelude::{col, lit, CsvWriter, IntoLazy, ParquetWriter};
use std::fmt;
use std::fmt::Display;
use std::fs::create_dir_all;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Declares the shape of a published table: column names, primitive types,
/// nullability, and optionally a pattern non-null values must match.
pub struct TableSchema {
    pub columns: Vec<ColumnSpec>,
}

pub struct ColumnSpec {
    pub name: &'static str,
    pub dtype: DataType,
    pub required: bool,
    pub pattern: Option<&'static str>,
}

impl TableSchema {
    /// Checks a frame against this schema. Any violation aborts the publish;
    /// nothing may be written for a frame that fails here.
    pub fn validate(&self, frame: &DataFrame) -> Result<(), SinkError> {
        if frame.width() != self.columns.len() {
            return Err(SinkError::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: frame.width(),
            });
        }

        for spec in &self.columns {
            let column = frame.column(spec.name)
                .map_err(|_| SinkError::MissingColumn(spec.name))?;

            if column.dtype() != &spec.dtype {
                return Err(SinkError::TypeMismatch {
                    column: spec.name,
                    expected: spec.dtype.clone(),
                    actual: column.dtype().clone(),
                });
            }

            if spec.required && column.null_count() > 0 {
                return Err(SinkError::NullInRequiredColumn {
                    column: spec.name,
                    nulls: column.null_count(),
                });
            }

            if let Some(pattern) = spec.pattern {
                let offending = frame.clone().lazy()
                    .filter(
                        col(spec.name).is_not_null()
                            .and(col(spec.name).str().contains(lit(pattern), true).not())
                    )
                    .collect()?
                    .height();
                if offending > 0 {
                    return Err(SinkError::PatternMismatch {
                        column: spec.name,
                        pattern,
                        rows: offending,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Destination for the published table. `replace` discards whatever the
/// destination held before; the swap is all-or-nothing from the caller's
/// point of view.
pub trait WarehouseSink {
    fn replace(&self, frame: DataFrame, schema: &TableSchema) -> Result<(), SinkError>;
}

pub struct ParquetSink {
    pub path: PathBuf,
}

impl WarehouseSink for ParquetSink {
    fn replace(&self, mut frame: DataFrame, schema: &TableSchema) -> Result<(), SinkError> {
        schema.validate(&frame)?;

        // Write next to the destination and rename over it, so a failed
        // write never clobbers the previous contents.
        let mut staged = staging_file(&self.path)?;
        ParquetWriter::new(staged.as_file_mut()).finish(&mut frame)?;
        staged.persist(&self.path)?;

        Ok(())
    }
}

pub struct CsvSink {
    pub path: PathBuf,
}

impl WarehouseSink for CsvSink {
    fn replace(&self, mut frame: DataFrame, schema: &TableSchema) -> Result<(), SinkError> {
        schema.validate(&frame)?;

        let mut staged = staging_file(&self.path)?;
        CsvWriter::new(staged.as_file_mut()).finish(&mut frame)?;
        staged.persist(&self.path)?;

        Ok(())
    }
}

fn staging_file(path: &PathBuf) -> Result<NamedTempFile, SinkError> {
    let parent = match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
        Some(parent) => {
            create_dir_all(parent)?;
            parent.to_path_buf()
        }
        None => PathBuf::from("."),
    };

    Ok(NamedTempFile::new_in(parent)?)
}

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    MissingColumn(&'static str),
    ColumnCountMismatch { expected: usize, actual: usize },
    TypeMismatch { column: &'static str, expected: DataType, actual: DataType },
    NullInRequiredColumn { column: &'static str, nulls: usize },
    PatternMismatch { column: &'static str, pattern: &'static str, rows: usize },
    Polars(#[from] polars::error::PolarsError),
    File(#[from] std::io::Error),
    Persist(#[from] tempfile::PersistError),
}

impl Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SinkError::MissingColumn(column) =>
                write!(f, "Column '{}' is missing from the published table", column),
            SinkError::ColumnCountMismatch { expected, actual } =>
                write!(f, "Published table has {} columns, schema expects {}", actual, expected),
            SinkError::TypeMismatch { column, expected, actual } =>
                write!(f, "Column '{}' has type {}, schema expects {}", column, actual, expected),
            SinkError::NullInRequiredColumn { column, nulls } =>
                write!(f, "Required column '{}' contains {} null value(s)", column, nulls),
            SinkError::PatternMismatch { column, pattern, rows } =>
                write!(f, "{} row(s) in column '{}' do not match '{}'", rows, column, pattern),
            SinkError::Polars(err) => write!(f, "{}", err),
            SinkError::File(err) => write!(f, "{}", err),
            SinkError::Persist(err) => write!(f, "{}", err),
        }
    }
}
