use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::{ApiError, AppState, error::ApiResult, hosts::request_host};
use crate::model::{BlogPostDetail, BlogPostSummary, LocationQuery, Page, WeatherReport};

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}

/// `GET /location-weather/`
pub async fn location_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> ApiResult<Json<WeatherReport>> {
    let query = LocationQuery::from_raw(params.lat.as_deref(), params.lon.as_deref());
    if query.coordinates().is_none() && (params.lat.is_some() || params.lon.is_some()) {
        tracing::debug!(?params, "Incomplete coordinates, falling back to IP lookup");
    }

    let report = state.weather.location_weather(query).await?;
    Ok(Json(report))
}

/// `GET /spotify/`
pub async fn spotify_now_playing(State(state): State<AppState>) -> Response {
    let (status, body) = state.now_playing.now_playing().await.into_parts();
    (status, Json(body)).into_response()
}

/// `GET /blogs/`
pub async fn blog_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<BlogPostSummary>>> {
    let host = request_host(&headers, &uri).unwrap_or_else(|| state.config.host.clone());
    let list_url = listing_url(&host, &uri);

    let page = state.blog.list_posts(params.page.as_deref(), &list_url).await?;
    Ok(Json(page))
}

/// `GET /blogs/{slug}/`
pub async fn blog_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<BlogPostDetail>> {
    let post = state.blog.post_by_slug(&slug).await?;
    Ok(Json(post))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Absolute URL of a listing request with its `page` pair removed. Other query
/// pairs are kept verbatim, in order.
fn listing_url(host: &str, uri: &Uri) -> String {
    let scheme = uri.scheme_str().unwrap_or("http");
    let base = format!("{scheme}://{host}{}", uri.path());

    let kept: Vec<&str> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && pair.split('=').next() != Some("page"))
        .collect();

    if kept.is_empty() { base } else { format!("{base}?{}", kept.join("&")) }
}
