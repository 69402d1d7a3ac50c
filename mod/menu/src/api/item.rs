use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use menuerp_core::ServiceError;

use crate::model::Translation;

use super::AppState;

pub async fn list(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let items = state.svc.list_menu_items(store_id)?;
    Ok(Json(json!({"items": items})))
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub store_id: i64,
    pub item_name: String,
    #[serde(default)]
    pub price_big: Option<i64>,
    #[serde(default)]
    pub price_small: Option<i64>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let item = state.svc.add_menu_item(
        body.store_id,
        &body.item_name,
        body.price_big,
        body.price_small,
    )?;
    Ok(Json(json!({"item": item})))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub item_name: String,
    #[serde(default)]
    pub price_big: Option<i64>,
    #[serde(default)]
    pub price_small: Option<i64>,
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let item = state
        .svc
        .update_menu_item(id, &body.item_name, body.price_big, body.price_small)?;
    Ok(Json(json!({"item": item})))
}

#[derive(Debug, Deserialize)]
pub struct TranslationsRequest {
    pub translations: Vec<Translation>,
}

pub async fn replace_translations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<TranslationsRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let count = state.svc.replace_translations(id, &body.translations)?;
    Ok(Json(json!({"replaced": count})))
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub target_langs: Vec<String>,
}

/// Machine-translate an item's name into the requested languages, then
/// install the result as the item's full translation set.
pub async fn translate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<TranslateRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    if body.target_langs.is_empty() {
        return Err(ServiceError::Validation("target_langs is required".into()));
    }
    let item = state.svc.get_menu_item(id)?;

    let pairs = state
        .translator
        .translate(&item.item_name, &body.target_langs)
        .await?;
    let translations: Vec<Translation> = pairs
        .into_iter()
        .map(|(lang_code, description)| Translation {
            lang_code,
            description,
        })
        .collect();

    let count = state.svc.replace_translations(id, &translations)?;
    Ok(Json(json!({"translated": count})))
}
