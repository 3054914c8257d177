use crate::lookup::LINE_CORRECTIONS;
use crate::step5_enrich::EnrichStepOutput;
use polars::datatypes::DataType;
use polars::prelude::{col, lit, when, Expr, IntoLazy, LazyFrame};
use std::fmt;
use std::fmt::Display;

/// Canonical form of a line value: "U" followed by digits, nothing else.
pub const LINE_PATTERN: &str = r"^U\d+$";

/// The cleaning passes over the fully enriched table, in order: postcode
/// string repair, removal of redundant null-line rows, the line-format
/// filter, and the manual line corrections.
pub async fn clean(
    EnrichStepOutput { enriched }: EnrichStepOutput
) -> Result<CleanStepOutput, CleanError> {
    let cleaned = enriched.lazy()
        // An earlier numeric detour leaves postcodes like "10178.0". Strip
        // the suffix; on an already-clean value this is a no-op.
        .with_column(
            col("postcode")
                .cast(DataType::String)
                .str().replace(lit(r"\.0$"), lit(""), false)
                .alias("postcode")
        )
        // A null-line row is redundant once the same station also has rows
        // with a line. Stations whose rows are all null-line keep them; a
        // station must never lose every row here.
        .filter(
            col("line").is_not_null()
                .or(col("line").count().over([col("station")]).eq(lit(0)))
        )
        // Drop non-canonical line labels (free-text transit names). Stations
        // with a manual correction are exempt; their line is overwritten
        // below no matter what the source said.
        .filter(
            col("line").is_null()
                .or(col("line").str().contains(lit(LINE_PATTERN), true))
                .or(has_line_correction())
        )
        .with_column(corrected_line());

    Ok(CleanStepOutput { cleaned })
}

fn has_line_correction() -> Expr {
    LINE_CORRECTIONS.iter()
        .fold(lit(false), |acc, (station, _)| {
            acc.or(col("station").eq(lit(*station)))
        })
}

fn corrected_line() -> Expr {
    let mut line = col("line");
    for (station, corrected) in LINE_CORRECTIONS {
        line = when(col("station").eq(lit(station)))
            .then(lit(corrected))
            .otherwise(line);
    }
    line.alias("line")
}

pub struct CleanStepOutput {
    pub cleaned: LazyFrame,
}

#[derive(thiserror::Error, Debug)]
pub enum CleanError {
    Polars(#[from] polars::error::PolarsError),
}

impl Display for CleanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            CleanError::Polars(err) => err,
        };
        write!(f, "{}", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use polars::frame::DataFrame;

    async fn cleaned(frame: DataFrame) -> DataFrame {
        clean(EnrichStepOutput { enriched: frame }).await
            .unwrap()
            .cleaned
            .collect()
            .unwrap()
    }

    fn lines_of(frame: &DataFrame) -> Vec<Option<String>> {
        frame.column("line").unwrap()
            .as_materialized_series()
            .str().unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    fn frame_with_lines(station: &str, lines: Vec<Option<&str>>) -> DataFrame {
        let n = lines.len();
        df!(
            "station" => vec![station; n],
            "line" => lines,
            "postcode" => vec![Some("10178"); n],
        ).unwrap()
    }

    #[tokio::test]
    async fn postcode_loses_its_numeric_suffix_and_keeps_leading_zeros() {
        let frame = df!(
            "station" => ["Alexanderplatz", "Hermannplatz", "Altstadt"],
            "line" => ["U2", "U7", "U1"],
            "postcode" => [Some("10178.0"), None, Some("01067")],
        ).unwrap();

        let out = cleaned(frame).await;

        let postcodes = out.column("postcode").unwrap()
            .as_materialized_series()
            .str().unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect::<Vec<_>>();
        assert_eq!(postcodes, vec![
            Some("10178".to_string()),
            None,
            Some("01067".to_string()),
        ]);
    }

    #[tokio::test]
    async fn postcode_normalization_is_idempotent() {
        let frame = df!(
            "station" => ["Alexanderplatz"],
            "line" => ["U2"],
            "postcode" => ["10178.0"],
        ).unwrap();
        let once = cleaned(frame).await;
        let twice = cleaned(once.clone()).await;
        assert!(common::util::df::equivalent(&once, &twice, false, false).unwrap());
    }

    #[tokio::test]
    async fn redundant_null_line_rows_are_dropped() {
        let frame = frame_with_lines("X", vec![Some("U2"), None, None]);

        let out = cleaned(frame).await;

        assert_eq!(lines_of(&out), vec![Some("U2".to_string())]);
    }

    #[tokio::test]
    async fn all_null_stations_keep_their_rows() {
        let single = cleaned(frame_with_lines("X", vec![None])).await;
        assert_eq!(single.height(), 1);

        let multi = cleaned(frame_with_lines("X", vec![None, None, None])).await;
        assert_eq!(multi.height(), 3);
    }

    #[tokio::test]
    async fn non_canonical_lines_are_dropped() {
        let frame = df!(
            "station" => ["A", "B", "C", "D", "E"],
            "line" => [Some("U2"), Some("U15"), None, Some("S41"), Some("Tram M10")],
            "postcode" => [None::<&str>, None, None, None, None],
        ).unwrap();

        let out = cleaned(frame).await;

        assert_eq!(lines_of(&out), vec![
            Some("U2".to_string()),
            Some("U15".to_string()),
            None,
        ]);
    }

    #[tokio::test]
    async fn grenzallee_is_corrected_to_u7() {
        let frame = df!(
            "station" => ["Grenzallee", "Grenzallee"],
            "line" => [None, Some("S46")],
            "postcode" => [None::<&str>, None],
        ).unwrap();

        let out = cleaned(frame).await;

        for line in lines_of(&out) {
            assert_eq!(line, Some("U7".to_string()));
        }
    }
}
