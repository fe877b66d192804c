use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use folio_core::{
    Config, LocationQuery, NewBlogPost, NowPlayingOutcome, NowPlayingService, SpotifyCredentials,
    SqlitePostStore, WeatherService, blog::slugify,
};
use inquire::{Password, Text};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Personal site backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Bind address, overriding HOST.
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overriding PORT.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show the current weather near a coordinate, or near this machine's IP.
    Weather {
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// Show the track currently playing on Spotify.
    NowPlaying,

    /// Store Spotify credentials in the config file.
    Configure,

    /// Manage blog posts.
    Post {
        #[command(subcommand)]
        command: PostCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum PostCommand {
    /// Add a post; the slug defaults to one derived from the title.
    Add {
        #[arg(long)]
        title: String,

        /// File holding the post body.
        #[arg(long)]
        content_file: PathBuf,

        #[arg(long)]
        slug: Option<String>,
    },
}

impl Cli {
    pub async fn run(self, mut config: Config) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { host, port } => {
                if let Some(host) = host {
                    config.host = host;
                }
                if let Some(port) = port {
                    config.port = port;
                }
                server::serve(config).await?;
            }
            Command::Weather { lat, lon } => {
                let service = WeatherService::from_endpoints(&config.endpoints);
                let report = service
                    .location_weather(LocationQuery { lat, lon })
                    .await
                    .context("Weather lookup failed")?;

                let temperature = report
                    .temperature
                    .map(|t| format!("{t:.1}°C"))
                    .unwrap_or_else(|| "n/a".to_string());
                println!("{}: {}, {}", report.city, temperature, report.condition);
            }
            Command::NowPlaying => {
                let service = NowPlayingService::from_config(&config);
                print_now_playing(service.now_playing().await);
            }
            Command::Configure => configure()?,
            Command::Post { command: PostCommand::Add { title, content_file, slug } } => {
                let content = std::fs::read_to_string(&content_file).with_context(|| {
                    format!("Failed to read content file: {}", content_file.display())
                })?;
                let slug = slug.unwrap_or_else(|| slugify(&title));
                if slug.is_empty() {
                    bail!("Could not derive a slug from '{title}'; pass --slug explicitly");
                }

                let store = SqlitePostStore::connect(&config.database_url)
                    .await
                    .with_context(|| format!("Failed to open database '{}'", config.database_url))?;
                let post = store
                    .insert(&NewBlogPost { title, slug, content, created_at: Utc::now() })
                    .await
                    .context("Failed to insert post")?;

                println!(
                    "Created post #{} '{}' at {}",
                    post.id,
                    post.slug,
                    post.created_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }

        Ok(())
    }
}

/// Prompt for Spotify credentials and persist them. Environment overrides are
/// not written back.
fn configure() -> anyhow::Result<()> {
    let mut file_config = Config::load()?;

    let client_id = Text::new("Spotify client id:").prompt()?;
    let client_secret = Password::new("Spotify client secret:").without_confirmation().prompt()?;
    let refresh_token = Password::new("Spotify refresh token:").without_confirmation().prompt()?;

    file_config.set_spotify_credentials(SpotifyCredentials {
        client_id: client_id.trim().to_string(),
        client_secret: client_secret.trim().to_string(),
        refresh_token: refresh_token.trim().to_string(),
    });
    file_config.save()?;

    println!("Saved credentials to {}", Config::config_file_path()?.display());
    Ok(())
}

fn print_now_playing(outcome: NowPlayingOutcome) {
    match outcome {
        NowPlayingOutcome::NotConfigured => {
            println!("Spotify is not configured. Hint: run `folio configure`.")
        }
        NowPlayingOutcome::Idle => println!("Nothing playing."),
        NowPlayingOutcome::Upstream(status) => println!("Spotify returned {status}."),
        NowPlayingOutcome::Failed(msg) => println!("Could not reach Spotify: {msg}"),
        NowPlayingOutcome::Playing(track) => {
            let state = if track.is_playing { "Playing" } else { "Paused" };
            println!(
                "{state}: {} by {} ({})",
                track.name.as_deref().unwrap_or("Unknown track"),
                track.artists.as_deref().filter(|a| !a.is_empty()).unwrap_or("Unknown artist"),
                track.album.as_deref().unwrap_or("Unknown album"),
            );
            if let Some(url) = track.url {
                println!("{url}");
            }
        }
    }
}
