use axum::{
    extract::{Request, State},
    http::{HeaderMap, Uri, header::HOST},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{ApiError, AppState};

/// Host the client addressed: the `Host` header, else the URI authority.
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| uri.authority().map(|a| a.as_str().to_owned()))
}

/// Reject requests whose host is not in the configured allow-list.
pub async fn require_allowed_host(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match request_host(req.headers(), req.uri()) {
        Some(host) if state.config.is_host_allowed(&host) => next.run(req).await,
        host => {
            tracing::warn!(host = ?host, "Rejected request for disallowed host");
            ApiError::InvalidHost.into_response()
        }
    }
}
