use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use menuerp_core::ServiceError;

use crate::model::{Claims, TokenResponse};
use crate::service::AuthService;

pub type AppState = Arc<AuthService>;

/// Build the auth API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

async fn login(
    State(svc): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    svc.login(&body.username, &body.password).map(Json)
}

async fn logout(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.logout(&claims)?;
    Ok(Json(serde_json::json!({"ok": true})))
}

async fn me(
    Extension(claims): Extension<Claims>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "username": claims.sub,
        "session_id": claims.sid,
        "expires_at": claims.exp,
    }))
}
