mod item;
mod language;
mod ocr;
mod store;

pub use ocr::Operator;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::client::{MenuRecognizer, Translator};
use crate::service::MenuService;

/// Shared state for the menu routes: the storage-backed service plus the
/// outbound AI collaborators.
#[derive(Clone)]
pub struct AppState {
    pub svc: Arc<MenuService>,
    pub recognizer: Arc<dyn MenuRecognizer>,
    pub translator: Arc<dyn Translator>,
}

/// Build the menu API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/languages", get(language::list))
        .route("/api/languages/add", post(language::add))
        .route("/api/languages/edit", post(language::edit))
        .route("/api/stores", get(store::list).post(store::create))
        .route("/api/stores/{id}", get(store::fetch).post(store::update))
        .route("/api/all_stores", get(store::list_all))
        .route("/api/menu_items", post(item::create))
        .route("/api/menu_items/{store_id}", get(item::list))
        .route("/api/menu_items/{id}/edit", post(item::update))
        .route("/api/menu_items/{id}/translations", post(item::replace_translations))
        .route("/api/menu_items/{id}/translate", post(item::translate))
        .route("/api/ocr/stage", post(ocr::stage))
        .route("/api/ocr/menus", get(ocr::list))
        .route("/api/ocr/recognize", post(ocr::recognize))
        .route("/api/ocr/import", post(ocr::import))
        .with_state(state)
}
