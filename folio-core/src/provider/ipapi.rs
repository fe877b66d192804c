use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{IP_LOOKUP_TIMEOUT, LocationProvider, ProviderError, read_json, transport};

const SERVICE: &str = "ip lookup";

/// Location guessed from the public IP of the server.
///
/// Either `latitude`/`longitude` or `lat`/`lon` may be present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IpLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
    lat: Option<f64>,
    lon: Option<f64>,
    pub city: Option<String>,
}

impl IpLocation {
    pub fn new(lat: f64, lon: f64, city: Option<&str>) -> Self {
        Self {
            latitude: Some(lat),
            longitude: Some(lon),
            city: city.map(str::to_owned),
            ..Self::default()
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.or(self.lat)?;
        let lon = self.longitude.or(self.lon)?;
        Some((lat, lon))
    }

    /// City name, if the service reported a non-empty one.
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct IpApiClient {
    url: String,
    http: Client,
}

impl IpApiClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), http: Client::new() }
    }
}

#[async_trait]
impl LocationProvider for IpApiClient {
    async fn locate(&self) -> Result<IpLocation, ProviderError> {
        let res = self
            .http
            .get(&self.url)
            .timeout(IP_LOOKUP_TIMEOUT)
            .send()
            .await
            .map_err(transport(SERVICE))?;

        read_json(SERVICE, res).await
    }
}
