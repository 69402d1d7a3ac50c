use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use menuerp_core::ServiceError;

use crate::model::Language;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    search: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let languages = state.svc.list_languages(q.search.as_deref())?;
    Ok(Json(json!({"languages": languages})))
}

pub async fn add(
    State(state): State<AppState>,
    Json(lang): Json<Language>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let lang = state.svc.add_language(lang)?;
    Ok(Json(json!({"language": lang})))
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub original_lang_code: String,
    pub lang_name: String,
    #[serde(default)]
    pub translation_lang_code: Option<String>,
    #[serde(default)]
    pub stt_lang_code: Option<String>,
}

pub async fn edit(
    State(state): State<AppState>,
    Json(body): Json<EditRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state.svc.edit_language(
        &body.original_lang_code,
        &body.lang_name,
        body.translation_lang_code,
        body.stt_lang_code,
    )?;
    Ok(Json(json!({"ok": true})))
}
