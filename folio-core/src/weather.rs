//! "Weather near me": location resolution, current conditions and a city label.

use std::sync::Arc;

use crate::{
    config::Endpoints,
    model::{LocationQuery, WeatherReport},
    provider::{
        ForecastProvider, GeocodeProvider, IpApiClient, LocationProvider, OpenMeteoClient,
        ProviderError,
    },
};

/// Label used when a code or a city cannot be resolved.
pub const UNKNOWN: &str = "Unknown";

const WEATHER_CODES: &[(i64, &str)] = &[
    (0, "Clear sky"),
    (1, "Mainly clear"),
    (2, "Partly cloudy"),
    (3, "Overcast"),
    (45, "Fog"),
    (48, "Depositing rime fog"),
    (51, "Light drizzle"),
    (53, "Moderate drizzle"),
    (55, "Dense drizzle"),
    (56, "Light freezing drizzle"),
    (57, "Dense freezing drizzle"),
    (61, "Slight rain"),
    (63, "Moderate rain"),
    (65, "Heavy rain"),
    (66, "Light freezing rain"),
    (67, "Heavy freezing rain"),
    (71, "Slight snow fall"),
    (73, "Moderate snow fall"),
    (75, "Heavy snow fall"),
    (77, "Snow grains"),
    (80, "Slight rain showers"),
    (81, "Moderate rain showers"),
    (82, "Violent rain showers"),
    (85, "Slight snow showers"),
    (86, "Heavy snow showers"),
    (95, "Thunderstorm"),
    (96, "Thunderstorm with slight hail"),
    (99, "Thunderstorm with heavy hail"),
];

/// Human-readable label for a WMO weather code.
pub fn condition_label(code: Option<i64>) -> &'static str {
    code.and_then(|c| WEATHER_CODES.iter().find(|(k, _)| *k == c))
        .map(|(_, label)| *label)
        .unwrap_or(UNKNOWN)
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Could not determine location")]
    LocationUnresolvable,

    #[error("Weather service error")]
    ServiceUnavailable,

    #[error("{0}")]
    Unexpected(String),
}

#[derive(Debug, Clone)]
pub struct WeatherService {
    locator: Arc<dyn LocationProvider>,
    forecast: Arc<dyn ForecastProvider>,
    geocoder: Arc<dyn GeocodeProvider>,
}

impl WeatherService {
    pub fn new(
        locator: Arc<dyn LocationProvider>,
        forecast: Arc<dyn ForecastProvider>,
        geocoder: Arc<dyn GeocodeProvider>,
    ) -> Self {
        Self { locator, forecast, geocoder }
    }

    /// Service backed by ipapi.co and Open-Meteo at the given endpoints.
    pub fn from_endpoints(endpoints: &Endpoints) -> Self {
        let open_meteo =
            Arc::new(OpenMeteoClient::new(&endpoints.forecast, &endpoints.reverse_geocode));
        Self::new(Arc::new(IpApiClient::new(&endpoints.ip_lookup)), open_meteo.clone(), open_meteo)
    }

    /// Current weather at the given coordinates, or near the server's IP when
    /// none are given.
    pub async fn location_weather(
        &self,
        query: LocationQuery,
    ) -> Result<WeatherReport, WeatherError> {
        let (lat, lon, mut city) = match query.coordinates() {
            Some((lat, lon)) => (lat, lon, None),
            None => self.locate().await?,
        };

        let current = self.forecast.current_weather(lat, lon).await.map_err(|e| {
            if e.is_unavailable() {
                tracing::warn!(error = %e, "Forecast lookup failed");
                WeatherError::ServiceUnavailable
            } else {
                WeatherError::Unexpected(e.to_string())
            }
        })?;

        if city.is_none() {
            city = self.reverse_geocode(lat, lon).await;
        }

        Ok(WeatherReport {
            city: city.unwrap_or_else(|| UNKNOWN.to_string()),
            temperature: current.temperature,
            condition: condition_label(current.weathercode).to_string(),
        })
    }

    async fn locate(&self) -> Result<(f64, f64, Option<String>), WeatherError> {
        let location = self.locator.locate().await.map_err(|e| match &e {
            ProviderError::Decode { .. } => WeatherError::Unexpected(e.to_string()),
            _ => {
                tracing::warn!(error = %e, "IP lookup failed");
                WeatherError::LocationUnresolvable
            }
        })?;

        let (lat, lon) = location.coordinates().ok_or_else(|| {
            tracing::warn!("IP lookup returned no coordinates");
            WeatherError::LocationUnresolvable
        })?;

        Ok((lat, lon, location.city().map(str::to_owned)))
    }

    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Option<String> {
        match self.geocoder.reverse_geocode(lat, lon).await {
            Ok(city) => city,
            Err(e) => {
                tracing::debug!(error = %e, "Reverse geocoding failed");
                None
            }
        }
    }
}
