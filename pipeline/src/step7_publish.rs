use crate::lookup::DISTRICTS;
use crate::sink::{ColumnSpec, SinkError, TableSchema, WarehouseSink};
use crate::step6_clean::{CleanStepOutput, LINE_PATTERN};
use log::info;
use polars::datatypes::DataType;
use polars::prelude::{col, lit, when, Expr, IntoLazy, NULL};
use std::fmt;
use std::fmt::Display;

/// Final stage: derive the district key, shape the table into the published
/// schema, and hand it to the sink as a full replacement of the prior
/// contents. A district name without a key is a data-quality error and stops
/// the publish; so does any schema violation. With `dry_run` the frame is
/// validated but nothing is written.
pub async fn publish<S: WarehouseSink + ?Sized>(
    CleanStepOutput { cleaned }: CleanStepOutput,
    sink: &S,
    dry_run: bool,
) -> Result<PublishStepOutput, PublishError> {
    // The enrichment passes name their columns after what they extract;
    // the published table uses the warehouse naming, where `neighborhood`
    // is the sub-district and `district` the administrative district.
    let frame = cleaned
        .select([
            col("station"),
            col("line"),
            col("latitude"),
            col("longitude"),
            col("postcode"),
            col("stadtteil").alias("neighborhood"),
            col("neighborhood").alias("district"),
        ])
        .with_column(district_id_of(col("district")))
        .collect()?;

    let unmapped = frame.clone().lazy()
        .filter(col("district_id").is_null().and(col("district").is_not_null()))
        .select([col("district").unique()])
        .collect()?;
    if unmapped.height() > 0 {
        let names = unmapped.column("district")?
            .as_materialized_series()
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        return Err(PublishError::UnmappedDistricts(names));
    }

    let schema = published_schema();
    let rows = frame.height();

    if dry_run {
        schema.validate(&frame)?;
        info!(target: "publish", "Dry run: {} rows validated, nothing written", rows);
    } else {
        sink.replace(frame, &schema)?;
        info!(target: "publish", "Published {} rows", rows);
    }

    Ok(PublishStepOutput { rows })
}

// The key is a pure function of the district name; anything not in the
// table stays null and is caught above.
fn district_id_of(district: Expr) -> Expr {
    let mut id = lit(NULL).cast(DataType::String);
    for (name, district_id) in DISTRICTS {
        id = when(district.clone().eq(lit(name)))
            .then(lit(district_id.as_code()))
            .otherwise(id);
    }
    id.alias("district_id")
}

/// The exact column contract of the published table.
pub fn published_schema() -> TableSchema {
    TableSchema {
        columns: vec![
            ColumnSpec { name: "station", dtype: DataType::String, required: true, pattern: None },
            ColumnSpec { name: "line", dtype: DataType::String, required: true, pattern: Some(LINE_PATTERN) },
            ColumnSpec { name: "latitude", dtype: DataType::Float64, required: true, pattern: None },
            ColumnSpec { name: "longitude", dtype: DataType::Float64, required: true, pattern: None },
            ColumnSpec { name: "postcode", dtype: DataType::String, required: false, pattern: None },
            ColumnSpec { name: "neighborhood", dtype: DataType::String, required: false, pattern: None },
            ColumnSpec { name: "district", dtype: DataType::String, required: true, pattern: None },
            ColumnSpec { name: "district_id", dtype: DataType::String, required: true, pattern: Some(r"^(0[1-9]|1[0-2])$") },
        ],
    }
}

#[derive(Debug)]
pub struct PublishStepOutput {
    pub rows: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    Polars(#[from] polars::error::PolarsError),
    UnmappedDistricts(Vec<String>),
    Sink(#[from] SinkError),
}

impl Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PublishError::Polars(err) => write!(f, "{}", err),
            PublishError::UnmappedDistricts(names) =>
                write!(f, "No district key for: {}", names.join(", ")),
            PublishError::Sink(err) => write!(f, "{}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CsvSink;
    use polars::df;
    use polars::frame::DataFrame;
    use polars::prelude::IntoLazy;

    fn cleaned_frame(districts: Vec<Option<&str>>) -> CleanStepOutput {
        let n = districts.len();
        CleanStepOutput {
            cleaned: df!(
                "station" => vec!["Hermannplatz"; n],
                "line" => vec!["U7"; n],
                "latitude" => vec![52.48698; n],
                "longitude" => vec![13.42475; n],
                "postcode" => vec![Some("10967"); n],
                "stadtteil" => vec![Some("Rixdorf"); n],
                "neighborhood" => districts,
            ).unwrap().lazy()
        }
    }

    struct CollectingSink {
        written: std::sync::Mutex<Option<DataFrame>>,
    }

    impl WarehouseSink for CollectingSink {
        fn replace(&self, frame: DataFrame, schema: &TableSchema) -> Result<(), SinkError> {
            schema.validate(&frame)?;
            *self.written.lock().unwrap() = Some(frame);
            Ok(())
        }
    }

    #[tokio::test]
    async fn maps_districts_to_their_keys_and_renames_for_the_warehouse() {
        let sink = CollectingSink { written: std::sync::Mutex::new(None) };

        let out = publish(cleaned_frame(vec![Some("Neukölln"), Some("Neukölln"), Some("Mitte")]), &sink, false)
            .await
            .unwrap();
        assert_eq!(out.rows, 3);

        let written = sink.written.lock().unwrap().take().unwrap();
        let ids: Vec<_> = written.column("district_id").unwrap()
            .as_materialized_series()
            .str().unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        // Same district, same key
        assert_eq!(ids, vec![
            Some("08".to_string()),
            Some("08".to_string()),
            Some("01".to_string()),
        ]);
        let neighborhoods: Vec<_> = written.column("neighborhood").unwrap()
            .as_materialized_series()
            .str().unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        assert_eq!(neighborhoods, vec![Some("Rixdorf".to_string()); 3]);
    }

    #[tokio::test]
    async fn an_unmapped_district_stops_the_publish() {
        let sink = CollectingSink { written: std::sync::Mutex::new(None) };

        let err = publish(cleaned_frame(vec![Some("Neukölln"), Some("Atlantis")]), &sink, false)
            .await
            .unwrap_err();

        match err {
            PublishError::UnmappedDistricts(names) => assert_eq!(names, vec!["Atlantis".to_string()]),
            other => panic!("Expected unmapped district error, got {}", other),
        }
        assert!(sink.written.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn a_null_district_fails_the_required_contract() {
        let sink = CollectingSink { written: std::sync::Mutex::new(None) };

        let err = publish(cleaned_frame(vec![None]), &sink, false).await.unwrap_err();

        assert!(matches!(err, PublishError::Sink(SinkError::NullInRequiredColumn { column: "district", .. })));
        assert!(sink.written.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn dry_run_validates_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stations.csv");
        let sink = CsvSink { path: path.clone() };

        publish(cleaned_frame(vec![Some("Neukölln")]), &sink, true).await.unwrap();

        assert!(!path.exists());
    }
}
