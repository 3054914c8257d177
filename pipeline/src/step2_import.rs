use crate::step1_fetch::{FetchStepOutput, FetchedTable};
use polars::datatypes::{DataType, Field};
use polars::prelude::{col, LazyCsvReader, LazyFileListReader, LazyFrame, Schema};
use std::fmt;
use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

/// Reads both raw CSV tables lazily, forcing the column types the pipeline
/// relies on over whatever the reader would infer. `postcode` in particular
/// must never become numeric, or leading zeros are lost and a `.0` suffix
/// appears once the value is rendered back to text.
pub async fn import(
    FetchStepOutput { stations, connections }: FetchStepOutput
) -> Result<ImportStepOutput, ImportError> {
    let stations = read_csv(&stations, [
        Field::new("name".into(), DataType::String),
        Field::new("latitude".into(), DataType::Float64),
        Field::new("longitude".into(), DataType::Float64),
        Field::new("postcode".into(), DataType::String),
    ])?
    .select([
        col("name"),
        col("latitude"),
        col("longitude"),
        col("postcode"),
    ]);

    let connections = read_csv(&connections, [
        Field::new("point1".into(), DataType::String),
        Field::new("point2".into(), DataType::String),
        Field::new("line".into(), DataType::String),
    ])?
    .select([
        col("point1"),
        col("point2"),
        col("line"),
    ]);

    Ok(ImportStepOutput { stations, connections })
}

fn read_csv<const N: usize>(
    table: &FetchedTable,
    expected_fields: [Field; N],
) -> Result<LazyFrame, ImportError> {
    let reader = LazyCsvReader::new(table.path.canonicalize()?);

    // Merge the expected fields over the inferred schema so that extra
    // columns in the source survive untouched while the ones we consume get
    // a fixed type.
    let mut schema = reader.clone().finish()?.collect_schema()?.deref().clone();
    let expected_schema = Schema::from_iter(expected_fields);
    schema.merge(expected_schema);

    let frame = reader
        .with_schema(Some(Arc::new(schema)))
        .finish()?;

    Ok(frame)
}

pub struct ImportStepOutput {
    pub stations: LazyFrame,
    pub connections: LazyFrame,
}

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    File(#[from] std::io::Error),
    Polars(#[from] polars::error::PolarsError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            ImportError::File(err) => err,
            ImportError::Polars(err) => err,
        };
        write!(f, "{}", err)
    }
}
