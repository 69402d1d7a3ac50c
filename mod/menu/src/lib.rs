pub mod api;
pub mod client;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use menuerp_core::Module;

use client::{MenuRecognizer, Translator};
use service::MenuService;

/// Menu module — stores, languages, menu items, and the OCR staging /
/// import pipeline.
pub struct MenuModule {
    state: api::AppState,
}

impl MenuModule {
    pub fn new(
        service: MenuService,
        recognizer: Arc<dyn MenuRecognizer>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            state: api::AppState {
                svc: Arc::new(service),
                recognizer,
                translator,
            },
        }
    }

    pub fn service(&self) -> Arc<MenuService> {
        self.state.svc.clone()
    }
}

impl Module for MenuModule {
    fn name(&self) -> &str {
        "menu"
    }

    fn routes(&self) -> Router {
        api::router(self.state.clone())
    }
}
