use axum::extract::State;
use axum::{Extension, Json};
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use menuerp_core::ServiceError;

use crate::model::{ImportOutcome, StagedItem};

use super::AppState;

/// Username of the authenticated operator, attached by the auth
/// middleware when present.
#[derive(Debug, Clone)]
pub struct Operator(pub String);

#[derive(Debug, Deserialize)]
pub struct StageRequest {
    pub store_name: String,
    #[serde(default)]
    pub items: Vec<StagedItem>,
}

pub async fn stage(
    State(state): State<AppState>,
    operator: Option<Extension<Operator>>,
    Json(body): Json<StageRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let user = operator.as_ref().map(|op| op.0 .0.as_str());
    let ocr_menu_id = state.svc.stage_menu(&body.store_name, user, &body.items)?;
    Ok(Json(json!({"ocr_menu_id": ocr_menu_id})))
}

pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let menus = state.svc.list_staged_menus()?;
    Ok(Json(json!({"ocr_menus": menus})))
}

#[derive(Debug, Deserialize)]
pub struct RecognizeRequest {
    pub store_name: String,
    /// Base64-encoded menu photograph, no data-URL prefix.
    pub image: String,
}

/// Run vision recognition on an uploaded menu photo and stage the
/// recognized items under the given store name.
pub async fn recognize(
    State(state): State<AppState>,
    operator: Option<Extension<Operator>>,
    Json(body): Json<RecognizeRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    if body.image.trim().is_empty() {
        return Err(ServiceError::Validation("image is required".into()));
    }
    // Reject garbage before spending a vision call on it.
    base64::engine::general_purpose::STANDARD
        .decode(body.image.trim())
        .map_err(|_| ServiceError::Validation("image must be valid base64".into()))?;
    let items = state.recognizer.recognize(body.image.trim()).await?;

    let user = operator.as_ref().map(|op| op.0 .0.as_str());
    let ocr_menu_id = state.svc.stage_menu(&body.store_name, user, &items)?;
    Ok(Json(json!({
        "ocr_menu_id": ocr_menu_id,
        "recognized_count": items.len(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub store_name: String,
}

pub async fn import(
    State(state): State<AppState>,
    Json(body): Json<ImportRequest>,
) -> Result<Json<ImportOutcome>, ServiceError> {
    state.svc.import_ocr_menu(&body.store_name).map(Json)
}
