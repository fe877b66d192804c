//! Thin clients for the third-party services the aggregators depend on.
//!
//! Every upstream concern sits behind a trait so the aggregators can be
//! exercised without a network.

use crate::config::SpotifyCredentials;
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};

pub mod ipapi;
pub mod open_meteo;
pub mod spotify;

pub use ipapi::{IpApiClient, IpLocation};
pub use open_meteo::{CurrentWeather, OpenMeteoClient};
pub use spotify::{CurrentlyPlaying, SpotifyClient};

/// Timeout for the IP geolocation lookup.
pub const IP_LOOKUP_TIMEOUT: Duration = Duration::from_secs(6);

/// Timeout for every other upstream call.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(8);

/// Failure of a single upstream call. Timeouts are transport failures.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: StatusCode },

    #[error("Failed to parse {service} response: {message}")]
    Decode { service: &'static str, message: String },
}

impl ProviderError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Transport failures and non-success statuses, as opposed to malformed bodies.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, ProviderError::Decode { .. })
    }
}

/// Resolves the caller's approximate location from its public IP.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn locate(&self) -> Result<IpLocation, ProviderError>;
}

/// Current conditions at a coordinate.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn current_weather(&self, lat: f64, lon: f64) -> Result<CurrentWeather, ProviderError>;
}

/// Coordinate to place name.
#[async_trait]
pub trait GeocodeProvider: Send + Sync + Debug {
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Option<String>, ProviderError>;
}

/// OAuth token refresh and playback state of the music service.
#[async_trait]
pub trait PlaybackProvider: Send + Sync + Debug {
    /// Exchange the refresh token for an access token. `None` when the
    /// response carries no token.
    async fn refresh_access_token(
        &self,
        creds: &SpotifyCredentials,
    ) -> Result<Option<String>, ProviderError>;

    /// `None` when nothing is playing (HTTP 204).
    async fn currently_playing(
        &self,
        access_token: &str,
    ) -> Result<Option<CurrentlyPlaying>, ProviderError>;
}

/// Check the status and decode a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    res: Response,
) -> Result<T, ProviderError> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| ProviderError::Transport { service, source })?;

    if !status.is_success() {
        tracing::warn!(service, %status, body = %truncate_body(&body), "Upstream returned an error");
        return Err(ProviderError::Status { service, status });
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::Decode {
        service,
        message: e.to_string(),
    })
}

pub(crate) fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> ProviderError {
    move |source| {
        tracing::debug!(service, error = %source, "Upstream request failed");
        ProviderError::Transport { service, source }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_body_cuts_on_char_boundaries() {
        let body = "é".repeat(250);
        let cut = truncate_body(&body);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }

    #[test]
    fn decode_errors_are_not_unavailability() {
        let err = ProviderError::Decode { service: "test", message: "bad".into() };
        assert!(!err.is_unavailable());
        assert_eq!(err.status(), None);

        let err = ProviderError::Status { service: "test", status: StatusCode::BAD_GATEWAY };
        assert!(err.is_unavailable());
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    }
}
