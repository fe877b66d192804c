//! HTTP surface: routes, middleware and JSON error mapping.

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    middleware,
    routing::get,
};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;

pub mod error;
pub mod handlers;
pub mod hosts;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

/// Upper bound for a whole request, including its chained upstream calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the application router with its middleware stack.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/location-weather/", get(handlers::location_weather))
        .route("/spotify/", get(handlers::spotify_now_playing))
        .route("/blogs/", get(handlers::blog_list))
        .route("/blogs/{slug}/", get(handlers::blog_detail))
        .fallback(handlers::not_found)
        // Applied bottom-up: CORS runs first, the host check last.
        .layer(middleware::from_fn_with_state(state.clone(), hosts::require_allowed_host))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured origins.
fn cors_layer(config: &Config) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origins(config))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Origins usable in an explicit allow-list. Invalid values and `*` (which a
/// credentialed list cannot carry) are skipped with a warning.
fn allowed_origins(config: &Config) -> Vec<HeaderValue> {
    config
        .cors_allowed_origins
        .iter()
        .filter_map(|o| {
            if o.trim() == "*" {
                tracing::warn!("Ignoring wildcard CORS origin, list origins explicitly");
                return None;
            }
            match o.parse() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            }
        })
        .collect()
}
