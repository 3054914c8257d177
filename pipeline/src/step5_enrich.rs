use crate::geocode::{AddressFields, Geocoder};
use crate::step4_join::JoinStepOutput;
use log::{info, warn};
use polars::frame::DataFrame;
use polars::prelude::Column;
use std::fmt;
use std::fmt::Display;

/// Adds the `stadtteil` and `neighborhood` columns by reverse-geocoding each
/// row's coordinates, one lookup per row per pass. The two passes stay
/// separate even though they query the same coordinate; each extracts a
/// different field chain from the address.
///
/// A failed lookup downgrades to a null value for that row and the batch
/// continues. Rows without coordinates are skipped without a lookup.
pub async fn enrich<G: Geocoder + Send>(
    JoinStepOutput { joined }: JoinStepOutput,
    geocoder: &mut G,
) -> Result<EnrichStepOutput, EnrichError> {
    let mut frame = joined.collect()?;

    let stadtteil = lookup_pass(&frame, geocoder, |address| {
        address.suburb.or(address.city_district)
    }).await?;
    report_coverage("stadtteil", &stadtteil);
    frame.with_column(Column::new("stadtteil".into(), stadtteil))?;

    let neighborhood = lookup_pass(&frame, geocoder, |address| {
        address.city_district.or(address.borough).or(address.county)
    }).await?;
    report_coverage("neighborhood", &neighborhood);
    frame.with_column(Column::new("neighborhood".into(), neighborhood))?;

    Ok(EnrichStepOutput { enriched: frame })
}

async fn lookup_pass<G: Geocoder + Send>(
    frame: &DataFrame,
    geocoder: &mut G,
    pick: fn(AddressFields) -> Option<String>,
) -> Result<Vec<Option<String>>, EnrichError> {
    let latitudes = frame.column("latitude")?.as_materialized_series().f64()?;
    let longitudes = frame.column("longitude")?.as_materialized_series().f64()?;

    let mut values = Vec::with_capacity(frame.height());
    for (latitude, longitude) in latitudes.into_iter().zip(longitudes) {
        let value = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => {
                match geocoder.reverse(latitude, longitude).await {
                    Ok(Some(address)) => pick(address),
                    Ok(None) => None,
                    Err(err) => {
                        warn!(target: "enrich", "Reverse lookup for ({}, {}) failed: {}", latitude, longitude, err);
                        None
                    }
                }
            }
            _ => None,
        };
        values.push(value);
    }

    Ok(values)
}

fn report_coverage(column: &str, values: &[Option<String>]) {
    let resolved = values.iter().filter(|v| v.is_some()).count();
    info!(target: "enrich", "Resolved {} for {}/{} rows", column, resolved, values.len());
}

pub struct EnrichStepOutput {
    pub enriched: DataFrame,
}

#[derive(thiserror::Error, Debug)]
pub enum EnrichError {
    Polars(#[from] polars::error::PolarsError),
}

impl Display for EnrichError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            EnrichError::Polars(err) => err,
        };
        write!(f, "{}", err)
    }
}
