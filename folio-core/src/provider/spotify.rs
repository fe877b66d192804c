use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{PlaybackProvider, ProviderError, UPSTREAM_TIMEOUT, read_json, transport};
use crate::config::SpotifyCredentials;

const TOKEN: &str = "spotify token";
const PLAYER: &str = "spotify player";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Payload of the currently-playing endpoint. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentlyPlaying {
    pub is_playing: Option<bool>,
    pub progress_ms: Option<u64>,
    pub item: Option<Track>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Track {
    pub name: Option<String>,
    pub artists: Option<Vec<Artist>>,
    pub album: Option<Album>,
    pub external_urls: Option<ExternalUrls>,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Artist {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Album {
    pub name: Option<String>,
    pub images: Option<Vec<Image>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Image {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    token_url: String,
    now_playing_url: String,
    http: Client,
}

impl SpotifyClient {
    pub fn new(token_url: impl Into<String>, now_playing_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            now_playing_url: now_playing_url.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl PlaybackProvider for SpotifyClient {
    async fn refresh_access_token(
        &self,
        creds: &SpotifyCredentials,
    ) -> Result<Option<String>, ProviderError> {
        let res = self
            .http
            .post(&self.token_url)
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", creds.refresh_token.as_str()),
            ])
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await
            .map_err(transport(TOKEN))?;

        let parsed: TokenResponse = read_json(TOKEN, res).await?;
        Ok(parsed.access_token.filter(|t| !t.is_empty()))
    }

    async fn currently_playing(
        &self,
        access_token: &str,
    ) -> Result<Option<CurrentlyPlaying>, ProviderError> {
        let res = self
            .http
            .get(&self.now_playing_url)
            .bearer_auth(access_token)
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await
            .map_err(transport(PLAYER))?;

        if res.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        read_json(PLAYER, res).await.map(Some)
    }
}
