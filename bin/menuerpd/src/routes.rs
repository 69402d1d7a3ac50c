//! Route registration — module routes plus system endpoints.

use std::sync::Arc;

use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use menuerp_auth::service::AuthService;

use crate::auth_middleware;

/// Assemble the full router: system endpoints, each module nested under
/// `/{name}`, and the session middleware over everything.
pub fn build_router(auth: Arc<AuthService>, module_routes: Vec<(&str, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    for (name, router) in module_routes {
        app = app.nest(&format!("/{}", name), router);
    }

    app.layer(middleware::from_fn_with_state(
        auth,
        auth_middleware::auth_middleware,
    ))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({"status": "ok"}))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "menuerpd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
