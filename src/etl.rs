use crate::KiezbahnError;
use common::types::config::{GeocoderConfig, SinkConfig, SinkFormat};
use common::types::dataset::Dataset;
use common::util::df::{write_df_to_file, FileType};
use common::util::logging;
use log::info;
use pipeline::geocode::Nominatim;
use pipeline::sink::{CsvSink, ParquetSink, WarehouseSink};
use pipeline::step1_fetch::fetch;
use pipeline::step2_import::import;
use pipeline::step3_normalize::normalize;
use pipeline::step4_join::join;
use pipeline::step5_enrich::enrich;
use pipeline::step6_clean::clean;
use pipeline::step7_publish::{publish, PublishStepOutput};
use std::time::SystemTime;

pub(super) async fn run(
    stations: Dataset,
    connections: Dataset,
    geocoder_config: &GeocoderConfig,
    sink_config: &SinkConfig,
    dry_run: bool,
) -> Result<PublishStepOutput, KiezbahnError> {
    info!(target: "pipeline", "Starting pipeline run");
    let start_time = SystemTime::now();

    let fetched = logging::run_with_spinner_async(
        "fetch", "Fetching source tables",
        fetch(stations, connections),
    ).await?;
    let imported = import(fetched).await?;
    let normalized = normalize(imported).await?;
    let joined = join(normalized).await?;

    // One lookup per row per pass against a rate-limited service; this is
    // by far the slowest stage.
    let mut geocoder = Nominatim::new(geocoder_config)?;
    let enriched = logging::run_with_spinner_async(
        "enrich", "Reverse-geocoding station coordinates",
        enrich(joined, &mut geocoder),
    ).await?;

    // Snapshot the enriched table; re-running the cleaning stages should not
    // require another round of lookups. A dry run leaves the filesystem alone.
    if !dry_run {
        write_df_to_file(
            "./data/tmp/enrich/stations.parquet".into(),
            FileType::PARQUET,
            enriched.enriched.clone(),
        )?;
    }

    let cleaned = clean(enriched).await?;

    let sink: Box<dyn WarehouseSink> = match sink_config.format {
        SinkFormat::Parquet => Box::new(ParquetSink { path: sink_config.path.clone().into() }),
        SinkFormat::Csv => Box::new(CsvSink { path: sink_config.path.clone().into() }),
    };
    let published = publish(cleaned, sink.as_ref(), dry_run).await?;

    let elapsed = indicatif::HumanDuration(start_time.elapsed().unwrap_or_default());
    info!(target: "pipeline", "Pipeline run finished in {}", elapsed);

    Ok(published)
}
