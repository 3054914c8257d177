use crate::types::dataset::Dataset;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1")]
    Version1 {
        stations: Dataset,
        connections: Dataset,
        #[serde(default)]
        geocoder: GeocoderConfig,
        sink: SinkConfig,
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderConfig {
    #[serde(default = "default_geocoder_url")]
    pub base_url: Url,
    // Minimum pause between consecutive lookups, as required by the
    // Nominatim usage policy
    #[serde(default = "default_min_delay")]
    pub min_delay_seconds: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        GeocoderConfig {
            base_url: default_geocoder_url(),
            min_delay_seconds: default_min_delay(),
        }
    }
}

fn default_geocoder_url() -> Url {
    Url::parse("https://nominatim.openstreetmap.org").unwrap()
}

fn default_min_delay() -> u64 {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct SinkConfig {
    pub path: String,
    #[serde(default)]
    pub format: SinkFormat,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub enum SinkFormat {
    #[default]
    #[serde(rename = "parquet")]
    Parquet,
    #[serde(rename = "csv")]
    Csv,
}
