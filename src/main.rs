mod bootstrap_config;
mod config;
mod etl;

use crate::bootstrap_config::BootstrapConfig;
use crate::config::load_config;
use common::types::config::Config;
use common::util::logging;
use log::{error, info};
use pipeline::geocode::GeocodeError;
use pipeline::step1_fetch::FetchError;
use pipeline::step2_import::ImportError;
use pipeline::step3_normalize::NormalizeError;
use pipeline::step4_join::JoinError;
use pipeline::step5_enrich::EnrichError;
use pipeline::step6_clean::CleanError;
use pipeline::step7_publish::PublishError;
use std::fmt::{Display, Formatter};

#[tokio::main]
async fn main() {
    let _ = run()
        .await
        .inspect_err(|err| error!(target: "main", "{}", err));
}

async fn run() -> Result<(), KiezbahnError> {
    let bootstrap_config = BootstrapConfig::read();

    logging::initialize_logging(bootstrap_config.log_level.clone().into());
    print_startup_message();

    let config = load_config(&bootstrap_config)?;

    match config {
        Config::Version1 { stations, connections, geocoder, sink } => {
            let published = etl::run(
                stations,
                connections,
                &geocoder,
                &sink,
                bootstrap_config.dry_run,
            ).await?;

            info!(target: "main", "Done, {} rows in the published table", published.rows);
        }
    }

    Ok(())
}

fn print_startup_message() {
    info!("\n K I E Z B A H N\n S T A T I O N   E T L\n");
}

#[derive(thiserror::Error, Debug)]
pub enum KiezbahnError {
    Config(#[from] config::ConfigError),
    Fetch(#[from] FetchError),
    Import(#[from] ImportError),
    Normalize(#[from] NormalizeError),
    Join(#[from] JoinError),
    Geocode(#[from] GeocodeError),
    Enrich(#[from] EnrichError),
    Clean(#[from] CleanError),
    Publish(#[from] PublishError),
    Polars(#[from] polars::error::PolarsError),
}

impl Display for KiezbahnError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let err: &dyn Display = match self {
            KiezbahnError::Config(err) => err,
            KiezbahnError::Fetch(err) => err,
            KiezbahnError::Import(err) => err,
            KiezbahnError::Normalize(err) => err,
            KiezbahnError::Join(err) => err,
            KiezbahnError::Geocode(err) => err,
            KiezbahnError::Enrich(err) => err,
            KiezbahnError::Clean(err) => err,
            KiezbahnError::Publish(err) => err,
            KiezbahnError::Polars(err) => err,
        };
        let prefix = match self {
            KiezbahnError::Config(_) => "Reading config file",
            KiezbahnError::Fetch(_) => "Fetching source tables",
            KiezbahnError::Import(_) => "Importing source tables",
            KiezbahnError::Normalize(_) => "Normalizing station names",
            KiezbahnError::Join(_) => "Joining stations onto connections",
            KiezbahnError::Geocode(_) => "Setting up the geocoder",
            KiezbahnError::Enrich(_) => "Reverse-geocoding stations",
            KiezbahnError::Clean(_) => "Cleaning the enriched table",
            KiezbahnError::Publish(_) => "Publishing the final table",
            KiezbahnError::Polars(_) => "Processing table data",
        };
        write!(f, "{}: {}", prefix, err)
    }
}
