use crate::state::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Build the CORS layer from `REVIEW_CORS_ORIGINS`.
///
/// With an explicit allowlist credentials are allowed, so the session cookie
/// works cross-origin.  Without one any origin may call the API but browsers
/// will not attach cookies.
pub fn cors_layer(state: Arc<AppState>) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = state
        .config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    if origins.is_empty() {
        // Wildcard – suitable for development; set REVIEW_CORS_ORIGINS in production.
        CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_headers([axum::http::header::CONTENT_TYPE])
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_credentials(true)
    }
}
