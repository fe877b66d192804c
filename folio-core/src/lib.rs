//! Core library for the `folio` personal-site backend.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Clients for the weather, geolocation and music services
//! - The weather and now-playing aggregators
//! - The blog read service and its SQLite store
//! - The axum HTTP surface serving all of the above
//!
//! It is used by `folio-cli`, but can also be reused by other binaries or services.

pub mod api;
pub mod blog;
pub mod config;
pub mod model;
pub mod now_playing;
pub mod provider;
pub mod weather;

pub use blog::{BlogError, BlogService, PostStore, SqlitePostStore};
pub use config::{Config, Endpoints, SpotifyCredentials};
pub use model::{
    BlogPost, BlogPostDetail, BlogPostSummary, LocationQuery, NewBlogPost, NowPlaying, Page,
    WeatherReport,
};
pub use now_playing::{NowPlayingOutcome, NowPlayingService};
pub use weather::{WeatherError, WeatherService};
