use async_trait::async_trait;
use common::types::config::GeocoderConfig;
use serde::Deserialize;
use std::fmt;
use std::fmt::Display;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// The address fields of a reverse-geocode response that this pipeline cares
/// about. Every field is optional; which ones are present depends on how the
/// service classifies the surroundings of the coordinate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressFields {
    pub suburb: Option<String>,
    pub city_district: Option<String>,
    pub borough: Option<String>,
    pub county: Option<String>,
    pub postcode: Option<String>,
}

/// Resolves a coordinate to address fields. `Ok(None)` means the service
/// answered but had no address for the coordinate; errors are for transport
/// or decoding failures. Callers are expected to downgrade both to a missing
/// value rather than aborting a batch.
#[async_trait]
pub trait Geocoder {
    async fn reverse(&mut self, latitude: f64, longitude: f64) -> Result<Option<AddressFields>, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<AddressFields>,
}

/// Client for the Nominatim `/reverse` endpoint. Lookups are strictly
/// sequential, with a minimum pause between consecutive requests as required
/// by the service's usage policy.
pub struct Nominatim {
    client: reqwest::Client,
    reverse_url: Url,
    rate_limit: RateLimit,
}

impl Nominatim {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let reverse_url = config.base_url.join("reverse")?;

        Ok(Nominatim {
            client: reqwest::Client::builder()
                .user_agent(concat!("kiezbahn/", env!("CARGO_PKG_VERSION")))
                .build()?,
            reverse_url,
            rate_limit: RateLimit::new(Duration::from_secs(config.min_delay_seconds)),
        })
    }
}

/// Spaces sequential requests by a minimum delay. The first call goes through
/// immediately; every later one sleeps until the delay since the previous
/// call has fully elapsed.
struct RateLimit {
    min_delay: Duration,
    last_request: Option<Instant>,
}

impl RateLimit {
    fn new(min_delay: Duration) -> Self {
        RateLimit { min_delay, last_request: None }
    }

    async fn tick(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

#[async_trait]
impl Geocoder for Nominatim {
    async fn reverse(&mut self, latitude: f64, longitude: f64) -> Result<Option<AddressFields>, GeocodeError> {
        self.rate_limit.tick().await;

        let latitude = latitude.to_string();
        let longitude = longitude.to_string();
        let response = self.client
            .get(self.reverse_url.clone())
            .query(&[
                ("format", "jsonv2"),
                ("lat", latitude.as_str()),
                ("lon", longitude.as_str()),
                ("accept-language", "de"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<ReverseResponse>()
            .await?;

        Ok(response.address)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum GeocodeError {
    Http(#[from] reqwest::Error),
    Url(#[from] url::ParseError),
}

impl Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            GeocodeError::Http(err) => err,
            GeocodeError::Url(err) => err,
        };
        write!(f, "{}", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn consecutive_lookups_are_spaced_by_the_minimum_delay() {
        let mut limit = RateLimit::new(Duration::from_secs(1));

        let start = Instant::now();
        limit.tick().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        limit.tick().await;
        assert!(start.elapsed() >= Duration::from_secs(1));

        limit.tick().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn an_already_elapsed_delay_is_not_waited_out_again() {
        let mut limit = RateLimit::new(Duration::from_secs(1));
        limit.tick().await;

        tokio::time::advance(Duration::from_secs(5)).await;

        let resume = Instant::now();
        limit.tick().await;
        assert_eq!(resume.elapsed(), Duration::ZERO);
    }
}
