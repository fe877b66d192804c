use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

pub const DEFAULT_SECRET_KEY: &str = "dev-secret-key-change-me";

/// Hosts accepted when debugging with an empty allow-list.
const DEBUG_HOSTS: &[&str] = &["localhost", "127.0.0.1", "[::1]"];

/// OAuth client credentials for the playback service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Spotify section of the config file. Empty strings mean "not set".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Base URLs of every upstream service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub forecast: String,
    pub reverse_geocode: String,
    pub ip_lookup: String,
    pub spotify_token: String,
    pub spotify_now_playing: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            forecast: "https://api.open-meteo.com/v1/forecast".to_string(),
            reverse_geocode: "https://geocoding-api.open-meteo.com/v1/reverse".to_string(),
            ip_lookup: "https://ipapi.co/json/".to_string(),
            spotify_token: "https://accounts.spotify.com/api/token".to_string(),
            spotify_now_playing: "https://api.spotify.com/v1/me/player/currently-playing"
                .to_string(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at a single base URL, keeping the upstream paths.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            forecast: format!("{base}/v1/forecast"),
            reverse_geocode: format!("{base}/v1/reverse"),
            ip_lookup: format!("{base}/json/"),
            spotify_token: format!("{base}/api/token"),
            spotify_now_playing: format!("{base}/v1/me/player/currently-playing"),
        }
    }
}

/// Process-wide configuration, loaded once at startup.
///
/// Example TOML:
/// ```toml
/// debug = false
/// allowed_hosts = ["example.com"]
///
/// [spotify]
/// client_id = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub secret_key: String,
    pub allowed_hosts: Vec<String>,
    pub cors_allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub spotify: SpotifyConfig,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: true,
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            allowed_hosts: vec!["127.0.0.1".to_string(), "localhost".to_string()],
            cors_allowed_origins: vec![
                "http://127.0.0.1:5173".to_string(),
                "http://localhost:5173".to_string(),
            ],
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_url: "sqlite://folio.db".to_string(),
            spotify: SpotifyConfig::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Load the config file, then apply overrides from the process environment.
    pub fn load_with_env() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "folio", "folio")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override fields from environment-style variables provided by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DEBUG") {
            self.debug = v.trim().eq_ignore_ascii_case("true");
        }
        if let Some(v) = lookup("SECRET_KEY") {
            self.secret_key = v;
        }
        if let Some(v) = lookup("ALLOWED_HOSTS") {
            self.allowed_hosts = split_list(&v);
        }
        if let Some(v) = lookup("CORS_ALLOWED_ORIGINS") {
            let origins = split_list(&v);
            if origins.iter().any(|o| o == "*") {
                bail!("CORS_ALLOWED_ORIGINS must list explicit origins, '*' is not accepted");
            }
            self.cors_allowed_origins = origins;
        }
        if let Some(v) = lookup("HOST") {
            self.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.port = v
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got '{v}'"))?;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.database_url = v;
        }
        if let Some(v) = lookup("SPOTIFY_CLIENT_ID") {
            self.spotify.client_id = v;
        }
        if let Some(v) = lookup("SPOTIFY_CLIENT_SECRET") {
            self.spotify.client_secret = v;
        }
        if let Some(v) = lookup("SPOTIFY_REFRESH_TOKEN") {
            self.spotify.refresh_token = v;
        }
        Ok(())
    }

    /// Credentials for the playback service, if all three are set.
    pub fn spotify_credentials(&self) -> Option<SpotifyCredentials> {
        let s = &self.spotify;
        if s.client_id.is_empty() || s.client_secret.is_empty() || s.refresh_token.is_empty() {
            return None;
        }
        Some(SpotifyCredentials {
            client_id: s.client_id.clone(),
            client_secret: s.client_secret.clone(),
            refresh_token: s.refresh_token.clone(),
        })
    }

    pub fn set_spotify_credentials(&mut self, creds: SpotifyCredentials) {
        self.spotify = SpotifyConfig {
            client_id: creds.client_id,
            client_secret: creds.client_secret,
            refresh_token: creds.refresh_token,
        };
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }

    /// Whether a `Host` header value may be served.
    pub fn is_host_allowed(&self, host: &str) -> bool {
        let host = strip_port(host).to_ascii_lowercase();
        if host.is_empty() {
            return false;
        }

        let matches = |pattern: &str| {
            let pattern = pattern.to_ascii_lowercase();
            if pattern == "*" {
                true
            } else if let Some(domain) = pattern.strip_prefix('.') {
                host == domain || host.ends_with(&pattern)
            } else {
                host == pattern
            }
        };

        if self.debug && self.allowed_hosts.is_empty() {
            return DEBUG_HOSTS.iter().any(|&p| matches(p));
        }
        self.allowed_hosts.iter().any(|p| matches(p.as_str()))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 keeps its brackets.
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
