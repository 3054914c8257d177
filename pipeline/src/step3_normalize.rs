use crate::lookup::NAME_AFFIXES;
use crate::step2_import::ImportStepOutput;
use polars::prelude::{col, lit, Expr, LazyFrame, NULL};
use std::fmt;
use std::fmt::Display;

/// Derives the normalized join key on both tables and drops placeholder
/// rows. Station names in the two sources disagree on affixes ("U-Bahnhof
/// Alexanderplatz" vs "Alexanderplatz"), so the join in the next step runs
/// on the normalized form only.
pub async fn normalize(
    ImportStepOutput { stations, connections }: ImportStepOutput
) -> Result<NormalizeStepOutput, NormalizeError> {
    let stations = stations
        .with_column(normalized_name(col("name")).alias("name_normalized"))
        .filter(is_placeholder(col("name_normalized")).not());

    // Only point1 takes part in the enrichment; point2 is carried through
    // as-is.
    let connections = connections
        .with_column(normalized_name(col("point1")).alias("station"))
        .filter(is_placeholder(col("station")).not());

    Ok(NormalizeStepOutput { stations, connections })
}

/// Strips the known affixes in fixed order, then surrounding whitespace.
/// Null names pass through unchanged. Applying this to an already-normalized
/// name is a no-op.
pub fn normalized_name(name: Expr) -> Expr {
    let mut name = name;
    for affix in NAME_AFFIXES {
        name = name.str().replace(lit(affix), lit(""), true);
    }
    name.str().strip_chars(lit(NULL))
}

// Rows whose normalized name starts with "Q" carry an external placeholder
// identifier instead of a station name.
fn is_placeholder(name: Expr) -> Expr {
    name.str().starts_with(lit("Q")).fill_null(lit(false))
}

pub struct NormalizeStepOutput {
    pub stations: LazyFrame,
    pub connections: LazyFrame,
}

#[derive(thiserror::Error, Debug)]
pub enum NormalizeError {
    Polars(#[from] polars::error::PolarsError),
}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            NormalizeError::Polars(err) => err,
        };
        write!(f, "{}", err)
    }
}
