//! End-to-end tests of the HTTP surface with every upstream mocked.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode},
};
use chrono::{Duration, TimeZone, Utc};
use folio_core::{
    Config, Endpoints, NewBlogPost, SpotifyCredentials, SqlitePostStore,
    api::{AppState, router},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_config(server: &MockServer) -> Config {
    Config {
        allowed_hosts: vec!["localhost".to_string()],
        endpoints: Endpoints::with_base(&server.uri()),
        ..Config::default()
    }
}

fn with_spotify(mut config: Config) -> Config {
    config.set_spotify_credentials(SpotifyCredentials {
        client_id: "id".into(),
        client_secret: "secret".into(),
        refresh_token: "refresh".into(),
    });
    config
}

/// URL on a local port nothing listens on, so requests fail to connect.
fn unreachable_url(path: &str) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}{path}")
}

async fn build_app(config: Config) -> (Router, SqlitePostStore) {
    let store = SqlitePostStore::in_memory().await.unwrap();
    let state = AppState::new(config, Arc::new(store.clone()));
    (router(state), store)
}

async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("Host", "localhost")
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn mount_forecast(server: &MockServer, code: i64) {
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("current_weather", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current_weather": { "temperature": 12.5, "weathercode": code }
        })))
        .mount(server)
        .await;
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh" })))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// /location-weather/
// ---------------------------------------------------------------------------

#[tokio::test]
async fn weather_with_coordinates_skips_ip_lookup() {
    let server = MockServer::start().await;
    mount_forecast(&server, 3).await;
    Mock::given(method("GET"))
        .and(path("/v1/reverse"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "results": [{ "name": "Lisbon" }] })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/json/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = build_app(test_config(&server)).await;
    let response = get(app, "/location-weather/?lat=38.7&lon=-9.1").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "city": "Lisbon", "temperature": 12.5, "condition": "Overcast" })
    );
}

#[tokio::test]
async fn weather_uses_city_from_ip_lookup() {
    let server = MockServer::start().await;
    mount_forecast(&server, 0).await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "city": "Berlin", "latitude": 52.52, "longitude": 13.41
        })))
        .mount(&server)
        .await;
    Mock::given(path("/v1/reverse"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = build_app(test_config(&server)).await;
    let json = body_json(get(app, "/location-weather/").await).await;

    assert_eq!(json["city"], "Berlin");
    assert_eq!(json["condition"], "Clear sky");
}

#[tokio::test]
async fn weather_ip_failure_is_400() {
    let server = MockServer::start().await;
    Mock::given(path("/json/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (app, _) = build_app(test_config(&server)).await;
    let response = get(app, "/location-weather/").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Could not determine location");
}

#[tokio::test]
async fn weather_forecast_failure_is_502() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (app, _) = build_app(test_config(&server)).await;
    let response = get(app, "/location-weather/?lat=1&lon=2").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["detail"], "Weather service error");
}

#[tokio::test]
async fn weather_malformed_forecast_is_500_with_detail() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let (app, _) = build_app(test_config(&server)).await;
    let response = get(app, "/location-weather/?lat=1&lon=2").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body_json(response).await["detail"].as_str().unwrap().to_string();
    assert!(detail.contains("forecast"), "unexpected detail: {detail}");
}

#[tokio::test]
async fn weather_ip_lookup_unreachable_is_400() {
    let server = MockServer::start().await;
    mount_forecast(&server, 0).await;

    let mut config = test_config(&server);
    config.endpoints.ip_lookup = unreachable_url("/json/");

    let (app, _) = build_app(config).await;
    let response = get(app, "/location-weather/").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Could not determine location");
}

#[tokio::test]
async fn weather_forecast_unreachable_is_502() {
    let server = MockServer::start().await;

    let mut config = test_config(&server);
    config.endpoints.forecast = unreachable_url("/v1/forecast");

    let (app, _) = build_app(config).await;
    let response = get(app, "/location-weather/?lat=1&lon=2").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["detail"], "Weather service error");
}

#[tokio::test]
async fn weather_reverse_geocode_unreachable_falls_back_to_unknown() {
    let server = MockServer::start().await;
    mount_forecast(&server, 3).await;

    let mut config = test_config(&server);
    config.endpoints.reverse_geocode = unreachable_url("/v1/reverse");

    let (app, _) = build_app(config).await;
    let response = get(app, "/location-weather/?lat=1&lon=2").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["city"], "Unknown");
}

// ---------------------------------------------------------------------------
// /spotify/
// ---------------------------------------------------------------------------

#[tokio::test]
async fn spotify_without_credentials_reports_not_configured() {
    let server = MockServer::start().await;
    Mock::given(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = build_app(test_config(&server)).await;
    let response = get(app, "/spotify/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["is_playing"], false);
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn spotify_nothing_playing() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let (app, _) = build_app(with_spotify(test_config(&server))).await;
    let response = get(app, "/spotify/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "is_playing": false }));
}

#[tokio::test]
async fn spotify_passes_through_upstream_status() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(path("/v1/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let (app, _) = build_app(with_spotify(test_config(&server))).await;
    let response = get(app, "/spotify/").await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await, json!({ "is_playing": false }));
}

#[tokio::test]
async fn spotify_token_rejection_degrades_to_not_configured() {
    let server = MockServer::start().await;
    Mock::given(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&server)
        .await;

    let (app, _) = build_app(with_spotify(test_config(&server))).await;
    let response = get(app, "/spotify/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["detail"], "Spotify not configured");
}

#[tokio::test]
async fn spotify_token_endpoint_unreachable_is_not_configured() {
    let server = MockServer::start().await;

    let mut config = with_spotify(test_config(&server));
    config.endpoints.spotify_token = unreachable_url("/api/token");

    let (app, _) = build_app(config).await;
    let response = get(app, "/spotify/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["detail"], "Spotify not configured");
}

#[tokio::test]
async fn spotify_player_unreachable_reports_detail() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let mut config = with_spotify(test_config(&server));
    config.endpoints.spotify_now_playing = unreachable_url("/v1/me/player/currently-playing");

    let (app, _) = build_app(config).await;
    let response = get(app, "/spotify/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["is_playing"], false);
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.contains("spotify player request failed"), "unexpected detail: {detail}");
}

#[tokio::test]
async fn spotify_playing_track() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(path("/v1/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_playing": true,
            "progress_ms": 5000,
            "item": {
                "name": "Song",
                "duration_ms": 210000,
                "artists": [{ "name": "A" }, { "name": "B" }],
                "album": { "name": "Record", "images": [] },
                "external_urls": { "spotify": "https://open.spotify.com/track/1" }
            }
        })))
        .mount(&server)
        .await;

    let (app, _) = build_app(with_spotify(test_config(&server))).await;
    let json = body_json(get(app, "/spotify/").await).await;

    assert_eq!(
        json,
        json!({
            "is_playing": true,
            "name": "Song",
            "artists": "A, B",
            "album": "Record",
            "url": "https://open.spotify.com/track/1",
            "album_image_url": null,
            "duration_ms": 210000,
            "progress_ms": 5000
        })
    );
}

// ---------------------------------------------------------------------------
// /blogs/
// ---------------------------------------------------------------------------

async fn seed(store: &SqlitePostStore, n: usize) {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    for i in 0..n {
        store
            .insert(&NewBlogPost {
                title: format!("Post {i}"),
                slug: format!("post-{i}"),
                content: "w".repeat(200),
                created_at: base + Duration::days(i as i64),
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn blog_list_first_page() {
    let server = MockServer::start().await;
    let (app, store) = build_app(test_config(&server)).await;
    seed(&store, 12).await;

    let response = get(app, "/blogs/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["count"], 12);
    assert_eq!(json["next"], "http://localhost/blogs/?page=2");
    assert!(json["previous"].is_null());

    let results = json["results"].as_array().unwrap();
    let slugs: Vec<_> = results.iter().map(|r| r["slug"].as_str().unwrap()).collect();
    assert_eq!(slugs, vec!["post-11", "post-10", "post-9", "post-8", "post-7"]);

    let excerpt = results[0]["excerpt"].as_str().unwrap();
    assert_eq!(excerpt, format!("{}…", "w".repeat(160)));
    assert!(results[0].get("content").is_none());
}

#[tokio::test]
async fn blog_list_out_of_range_page_is_404() {
    let server = MockServer::start().await;
    let (app, store) = build_app(test_config(&server)).await;
    seed(&store, 3).await;

    let response = get(app, "/blogs/?page=9").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["detail"], "Invalid page.");
}

#[tokio::test]
async fn blog_list_links_keep_other_query_params() {
    let server = MockServer::start().await;
    let (app, store) = build_app(test_config(&server)).await;
    seed(&store, 12).await;

    let response = get(app, "/blogs/?tag=rust&page=2").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["next"], "http://localhost/blogs/?tag=rust&page=3");
    assert_eq!(json["previous"], "http://localhost/blogs/?tag=rust");
}

#[tokio::test]
async fn blog_detail_returns_full_content() {
    let server = MockServer::start().await;
    let (app, store) = build_app(test_config(&server)).await;
    seed(&store, 2).await;

    let response = get(app, "/blogs/post-1/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["title"], "Post 1");
    assert_eq!(json["content"].as_str().unwrap().len(), 200);
    assert!(json["created_at"].is_string());
}

#[tokio::test]
async fn blog_detail_unknown_slug_is_404() {
    let server = MockServer::start().await;
    let (app, _) = build_app(test_config(&server)).await;

    let response = get(app, "/blogs/does-not-exist/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["detail"], "Not found.");
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disallowed_host_is_rejected() {
    let server = MockServer::start().await;
    let (app, _) = build_app(test_config(&server)).await;

    let request = Request::builder()
        .uri("/blogs/")
        .header("Host", "evil.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Invalid host header");
}

#[tokio::test]
async fn unknown_route_is_404_json() {
    let server = MockServer::start().await;
    let (app, _) = build_app(test_config(&server)).await;

    let response = get(app, "/nowhere/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["detail"], "Not found.");
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let server = MockServer::start().await;
    let (app, _) = build_app(test_config(&server)).await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/blogs/")
        .header("Host", "localhost")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let allow_origin = response
        .headers()
        .get("access-control-allow-origin")
        .expect("Missing Access-Control-Allow-Origin header")
        .to_str()
        .unwrap();
    assert_eq!(allow_origin, "http://localhost:5173");
}
