pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use menuerp_core::Module;

use service::AuthService;

/// Auth module — admin accounts and login sessions.
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    pub fn new(service: AuthService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn service(&self) -> Arc<AuthService> {
        self.service.clone()
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::router(self.service.clone())
    }
}
