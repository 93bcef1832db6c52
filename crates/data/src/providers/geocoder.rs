//! HTTP geocoding provider.

use super::{Geocoder, UpstreamError};
use async_trait::async_trait;
use copool_domain::value_objects::coordinates::Coordinates;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Geocoder backed by an HTTP address-lookup API.
///
/// The endpoint is expected to answer
/// `GET {base_url}/geocode?query=<address>` with a JSON body containing a
/// `matches` array of `{ "lon": f64, "lat": f64 }` objects, best match
/// first.
#[derive(Clone)]
pub struct HttpGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    matches: Vec<GeocodeMatch>,
}

#[derive(Debug, Deserialize)]
struct GeocodeMatch {
    lon: f64,
    lat: f64,
}

impl HttpGeocoder {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn resolve(&self, address: &str) -> Result<Coordinates, UpstreamError> {
        let url = format!("{}/geocode", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("query", address)])
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?
            .error_for_status()?;

        let body: GeocodeResponse = response.json().await?;
        let best = body
            .matches
            .first()
            .ok_or_else(|| UpstreamError::Payload(format!("no match for address: {address}")))?;

        debug!(address = %address, lon = best.lon, lat = best.lat, "Resolved address");
        Ok(Coordinates::new(best.lon, best.lat))
    }
}
