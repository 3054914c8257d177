use crate::lookup::COORDINATE_OVERRIDES;
use crate::step3_normalize::NormalizeStepOutput;
use common::util::df::count;
use log::info;
use polars::prelude::{col, lit, when, Expr, JoinArgs, JoinType, LazyFrame, UniqueKeepStrategy};
use std::fmt;
use std::fmt::Display;

/// Joins station metadata onto the connection rows. Stations are
/// de-duplicated on the normalized name first (first occurrence wins), so a
/// connection row can match at most one station. Misses leave the copied
/// fields null; a fixed set of stations that never resolve through the join
/// gets its coordinates patched in afterwards.
pub async fn join(
    NormalizeStepOutput { stations, connections }: NormalizeStepOutput
) -> Result<JoinStepOutput, JoinError> {
    let stations = stations
        .unique_stable(Some(vec!["name_normalized".into()]), UniqueKeepStrategy::First)
        .select([
            col("name_normalized"),
            col("latitude"),
            col("longitude"),
            col("postcode"),
        ]);

    let joined = connections
        .join(
            stations,
            [col("station")],
            [col("name_normalized")],
            JoinArgs::new(JoinType::Left),
        )
        .with_columns([
            overridden("latitude", |(_, lat, _)| *lat),
            overridden("longitude", |(_, _, lon)| *lon),
        ]);

    let with_coordinates = count(
        joined.clone().filter(col("latitude").is_not_null())
    )?;
    let total = count(joined.clone())?;
    info!(target: "join", "{}/{} connection rows have coordinates after the join", with_coordinates, total);

    Ok(JoinStepOutput { joined })
}

// The override supersedes whatever the join produced, so it is applied last
// and unconditionally.
fn overridden(column: &str, value_of: fn(&(&str, f64, f64)) -> f64) -> Expr {
    let mut expr = col(column);
    for entry in &COORDINATE_OVERRIDES {
        expr = when(col("station").eq(lit(entry.0)))
            .then(lit(value_of(entry)))
            .otherwise(expr);
    }
    expr.alias(column)
}

pub struct JoinStepOutput {
    pub joined: LazyFrame,
}

#[derive(thiserror::Error, Debug)]
pub enum JoinError {
    Polars(#[from] polars::error::PolarsError),
}

impl Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            JoinError::Polars(err) => err,
        };
        write!(f, "{}", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use polars::frame::DataFrame;
    use polars::prelude::IntoLazy;

    async fn joined(stations: DataFrame, connections: DataFrame) -> DataFrame {
        let out = join(NormalizeStepOutput {
            stations: stations.lazy(),
            connections: connections.lazy(),
        }).await;
        out.unwrap().joined.collect().unwrap()
    }

    #[tokio::test]
    async fn copies_station_fields_and_leaves_misses_null() {
        let stations = df!(
            "name" => ["U-Bahnhof Hermannplatz"],
            "name_normalized" => ["Hermannplatz"],
            "latitude" => [52.48698],
            "longitude" => [13.42475],
            "postcode" => ["10967"],
        ).unwrap();
        let connections = df!(
            "point1" => ["Hermannplatz", "Nirgendwo"],
            "point2" => ["Rathaus Neukölln", "Rathaus Neukölln"],
            "line" => ["U7", "U7"],
            "station" => ["Hermannplatz", "Nirgendwo"],
        ).unwrap();

        let out = joined(stations, connections).await;

        let lat = out.column("latitude").unwrap().as_materialized_series().f64().unwrap();
        assert_eq!(lat.get(0), Some(52.48698));
        assert_eq!(lat.get(1), None);
        let postcode = out.column("postcode").unwrap().as_materialized_series().str().unwrap();
        assert_eq!(postcode.get(0), Some("10967"));
        assert_eq!(postcode.get(1), None);
    }

    #[tokio::test]
    async fn duplicate_stations_keep_first_occurrence() {
        let stations = df!(
            "name" => ["Hermannplatz", "U-Bahnhof Hermannplatz"],
            "name_normalized" => ["Hermannplatz", "Hermannplatz"],
            "latitude" => [52.48698, 99.9],
            "longitude" => [13.42475, 99.9],
            "postcode" => ["10967", "99999"],
        ).unwrap();
        let connections = df!(
            "point1" => ["Hermannplatz"],
            "point2" => ["Rathaus Neukölln"],
            "line" => ["U7"],
            "station" => ["Hermannplatz"],
        ).unwrap();

        let out = joined(stations, connections).await;

        assert_eq!(out.height(), 1);
        let lat = out.column("latitude").unwrap().as_materialized_series().f64().unwrap();
        assert_eq!(lat.get(0), Some(52.48698));
    }

    #[tokio::test]
    async fn ostkreuz_coordinates_are_overridden_regardless_of_join_outcome() {
        let stations = df!(
            "name" => ["Ostkreuz"],
            "name_normalized" => ["Ostkreuz"],
            "latitude" => [0.0],
            "longitude" => [0.0],
            "postcode" => ["10245"],
        ).unwrap();
        let connections = df!(
            "point1" => ["Ostkreuz", "Ostkreuz"],
            "point2" => ["Warschauer Straße", "Nöldnerplatz"],
            "line" => [Some("U1"), None],
            "station" => ["Ostkreuz", "Ostkreuz"],
        ).unwrap();

        let out = joined(stations, connections).await;

        let lat = out.column("latitude").unwrap().as_materialized_series().f64().unwrap();
        let lon = out.column("longitude").unwrap().as_materialized_series().f64().unwrap();
        for i in 0..out.height() {
            assert_eq!(lat.get(i), Some(52.50278));
            assert_eq!(lon.get(i), Some(13.46917));
        }
    }
}
