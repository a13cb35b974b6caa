//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Optional Swagger UI / OpenAPI document endpoint (disable with `REVIEW_ENABLE_SWAGGER=false`)
//! - Health / heartbeat route
//! - `/api/user` account routes and `/api/code` review routes
//! - Optional static frontend for every other path

mod code;
pub mod doc;
mod health;
mod user;

use std::sync::Arc;

use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .merge(health::router())
        .nest("/api/user", user::router())
        .nest("/api/code", code::router(state.clone()));

    let mut app = Router::new().merge(api_router);

    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    // Client-side routes like /review/3 must load the SPA shell.
    if let Some(dir) = &state.config.client_dir {
        info!(client_dir = %dir.display(), "serving frontend");
        let spa = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
        app = app.fallback_service(spa);
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(state.clone())))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
