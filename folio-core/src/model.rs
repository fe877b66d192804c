use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coordinates supplied by the caller. Both or neither are expected.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocationQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl LocationQuery {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat: Some(lat), lon: Some(lon) }
    }

    /// Parse raw query-string values. Unparseable values count as absent.
    pub fn from_raw(lat: Option<&str>, lon: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<f64>().ok());
        Self { lat: parse(lat), lon: parse(lon) }
    }

    /// Both coordinates, when present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    pub temperature: Option<f64>,
    pub condition: String,
}

/// A track reported by the playback service. Absent values serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub is_playing: bool,
    pub name: Option<String>,
    pub artists: Option<String>,
    pub album: Option<String>,
    pub url: Option<String>,
    pub album_image_url: Option<String>,
    pub duration_ms: Option<u64>,
    pub progress_ms: Option<u64>,
}

/// Body used whenever no track is reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingStatus {
    pub is_playing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl NowPlayingStatus {
    pub fn idle() -> Self {
        Self { is_playing: false, detail: None }
    }

    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self { is_playing: false, detail: Some(detail.into()) }
    }
}

/// A stored blog post.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPostSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPostDetail {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<BlogPost> for BlogPostDetail {
    fn from(post: BlogPost) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            created_at: post.created_at,
        }
    }
}

/// Input for inserting a post.
#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}
