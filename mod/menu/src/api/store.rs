use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use menuerp_core::{PageMeta, ServiceError};

use crate::model::StoreFields;
use crate::service::store::StoreFilters;

use super::AppState;

const STORES_PER_PAGE: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    level: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let page = q.page.unwrap_or(1).max(1);
    let filters = StoreFilters {
        name: q.name,
        level: q.level,
    };
    let result = state
        .svc
        .list_stores(&filters, STORES_PER_PAGE, (page - 1) * STORES_PER_PAGE)?;
    let meta = PageMeta::new(page, result.total, STORES_PER_PAGE);
    Ok(Json(json!({
        "stores": result.items,
        "total": result.total,
        "pagination": meta,
    })))
}

pub async fn list_all(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let stores = state.svc.list_all_stores()?;
    Ok(Json(json!({"stores": stores})))
}

pub async fn create(
    State(state): State<AppState>,
    Json(fields): Json<StoreFields>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let store = state.svc.create_store(fields)?;
    Ok(Json(json!({"store": store})))
}

pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let store = state.svc.get_store(id)?;
    Ok(Json(json!({"store": store})))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(fields): Json<StoreFields>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let store = state.svc.update_store(id, fields)?;
    Ok(Json(json!({"store": store})))
}
