use common::types::dataset::{DataSource, Dataset};
use log::{debug, info};
use std::fmt;
use std::fmt::Display;
use std::fs::{create_dir_all, File};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Resolves the two raw source tables to local files. Remote sources are
/// downloaded into a timestamped imports folder, local sources are used
/// in place.
pub async fn fetch(
    stations: Dataset,
    connections: Dataset,
) -> Result<FetchStepOutput, FetchError> {
    let stations = fetch_table(stations).await?;
    let connections = fetch_table(connections).await?;

    Ok(FetchStepOutput { stations, connections })
}

async fn fetch_table(dataset: Dataset) -> Result<FetchedTable, FetchError> {
    match dataset.clone().src {
        DataSource::URL { url, headers } => {
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis();
            let path_str = format!("./data/datasets/{}/imports/{}.csv", dataset.id, timestamp);
            let path = Path::new(&path_str);
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            let mut file = File::create(path)?;

            info!(target: "fetch", "Downloading dataset '{}' from {}", dataset.id, url);

            let mut request = reqwest::Client::new().get(url.clone());
            for (name, value) in &headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let response = request.send().await?.error_for_status()?;
            let mut content = Cursor::new(response.bytes().await?);
            std::io::copy(&mut content, &mut file)?;

            debug!(target: "fetch", "Dataset '{}' stored at {}", dataset.id, path_str);

            Ok(FetchedTable {
                dataset,
                path: path.to_path_buf(),
            })
        },
        DataSource::File { path } => {
            Ok(FetchedTable {
                dataset,
                path: PathBuf::from(path),
            })
        }
    }
}

pub struct FetchStepOutput {
    pub stations: FetchedTable,
    pub connections: FetchedTable,
}

pub struct FetchedTable {
    pub dataset: Dataset,
    pub path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    Reqwest(#[from] reqwest::Error),
    File(#[from] std::io::Error),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            FetchError::Reqwest(err) => err,
            FetchError::File(err) => err,
        };
        write!(f, "{}", err)
    }
}
