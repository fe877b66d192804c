//! "Currently playing" proxy over the music service.
//!
//! Internal failures never surface as errors: the caller always gets a
//! `NowPlayingOutcome` it can render.

use std::sync::Arc;

use reqwest::StatusCode;

use crate::{
    config::{Config, SpotifyCredentials},
    model::{NowPlaying, NowPlayingStatus},
    provider::{CurrentlyPlaying, PlaybackProvider, ProviderError, SpotifyClient},
};

pub const NOT_CONFIGURED: &str = "Spotify not configured";

#[derive(Debug, Clone, PartialEq)]
pub enum NowPlayingOutcome {
    /// Missing credentials or a failed token refresh.
    NotConfigured,
    /// The service reported nothing playing.
    Idle,
    /// The currently-playing call answered with a non-success status.
    Upstream(StatusCode),
    /// Anything else that went wrong, with its description.
    Failed(String),
    Playing(NowPlaying),
}

impl NowPlayingOutcome {
    /// Status code and body for the HTTP surface.
    pub fn into_parts(self) -> (StatusCode, serde_json::Value) {
        let status_body = |s: NowPlayingStatus| serde_json::to_value(s).unwrap_or_default();
        match self {
            NowPlayingOutcome::NotConfigured => {
                (StatusCode::OK, status_body(NowPlayingStatus::with_detail(NOT_CONFIGURED)))
            }
            NowPlayingOutcome::Idle => (StatusCode::OK, status_body(NowPlayingStatus::idle())),
            NowPlayingOutcome::Upstream(status) => (status, status_body(NowPlayingStatus::idle())),
            NowPlayingOutcome::Failed(msg) => {
                (StatusCode::OK, status_body(NowPlayingStatus::with_detail(msg)))
            }
            NowPlayingOutcome::Playing(track) => {
                (StatusCode::OK, serde_json::to_value(track).unwrap_or_default())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct NowPlayingService {
    credentials: Option<SpotifyCredentials>,
    playback: Arc<dyn PlaybackProvider>,
}

impl NowPlayingService {
    pub fn new(credentials: Option<SpotifyCredentials>, playback: Arc<dyn PlaybackProvider>) -> Self {
        Self { credentials, playback }
    }

    /// Service using the configured credentials and Spotify endpoints.
    pub fn from_config(config: &Config) -> Self {
        let endpoints = &config.endpoints;
        let client = SpotifyClient::new(&endpoints.spotify_token, &endpoints.spotify_now_playing);
        Self::new(config.spotify_credentials(), Arc::new(client))
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    pub async fn now_playing(&self) -> NowPlayingOutcome {
        let Some(creds) = &self.credentials else {
            return NowPlayingOutcome::NotConfigured;
        };

        let token = match self.playback.refresh_access_token(creds).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::warn!("Token response carried no access token");
                return NowPlayingOutcome::NotConfigured;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Access token refresh failed");
                return NowPlayingOutcome::NotConfigured;
            }
        };

        match self.playback.currently_playing(&token).await {
            Ok(None) => NowPlayingOutcome::Idle,
            Ok(Some(payload)) => NowPlayingOutcome::Playing(track_from(payload)),
            Err(ProviderError::Status { status, .. }) => NowPlayingOutcome::Upstream(status),
            Err(e) => {
                tracing::warn!(error = %e, "Currently-playing lookup failed");
                NowPlayingOutcome::Failed(e.to_string())
            }
        }
    }
}

fn track_from(payload: CurrentlyPlaying) -> NowPlaying {
    let item = payload.item.unwrap_or_default();
    let album = item.album.unwrap_or_default();

    // A missing artist list still renders as an empty string.
    let artists = item
        .artists
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| a.name)
        .collect::<Vec<_>>()
        .join(", ");

    let album_image_url = album
        .images
        .and_then(|images| images.into_iter().next())
        .and_then(|image| image.url);

    NowPlaying {
        is_playing: payload.is_playing.unwrap_or(false),
        name: item.name,
        artists: Some(artists),
        album: album.name,
        url: item.external_urls.and_then(|u| u.spotify),
        album_image_url,
        duration_ms: item.duration_ms,
        progress_ms: payload.progress_ms,
    }
}
