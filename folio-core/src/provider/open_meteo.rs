use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{
    ForecastProvider, GeocodeProvider, ProviderError, UPSTREAM_TIMEOUT, read_json, transport,
};

const FORECAST: &str = "forecast";
const REVERSE: &str = "reverse geocoding";

/// The `current_weather` section of a forecast response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct CurrentWeather {
    pub temperature: Option<f64>,
    pub weathercode: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    results: Option<Vec<Place>>,
}

#[derive(Debug, Deserialize)]
struct Place {
    name: Option<String>,
    admin1: Option<String>,
}

impl Place {
    /// Place name, falling back to the region.
    fn label(self) -> Option<String> {
        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        non_empty(self.name).or_else(|| non_empty(self.admin1))
    }
}

/// Open-Meteo forecast and reverse-geocoding client.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    forecast_url: String,
    reverse_url: String,
    http: Client,
}

impl OpenMeteoClient {
    pub fn new(forecast_url: impl Into<String>, reverse_url: impl Into<String>) -> Self {
        Self {
            forecast_url: forecast_url.into(),
            reverse_url: reverse_url.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoClient {
    async fn current_weather(&self, lat: f64, lon: f64) -> Result<CurrentWeather, ProviderError> {
        let res = self
            .http
            .get(&self.forecast_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await
            .map_err(transport(FORECAST))?;

        let parsed: ForecastResponse = read_json(FORECAST, res).await?;
        Ok(parsed.current_weather.unwrap_or_default())
    }
}

#[async_trait]
impl GeocodeProvider for OpenMeteoClient {
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Option<String>, ProviderError> {
        let res = self
            .http
            .get(&self.reverse_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("language", "en".to_string()),
            ])
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await
            .map_err(transport(REVERSE))?;

        let parsed: ReverseResponse = read_json(REVERSE, res).await?;
        Ok(parsed
            .results
            .and_then(|places| places.into_iter().next())
            .and_then(Place::label))
    }
}
