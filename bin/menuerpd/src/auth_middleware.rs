//! Session authentication middleware.
//!
//! Extracts the bearer token, verifies it against the auth service
//! (signature, expiry, and session revocation), and stores the claims
//! plus an [`Operator`] tag in request extensions.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use menuerp_auth::service::AuthService;
use menuerp_core::ServiceError;
use menuerp_menu::api::Operator;

pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    if is_public_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ServiceError::Unauthorized("missing authorization token".into()))?;

    let claims = auth.verify_token(token)?;
    request.extensions_mut().insert(Operator(claims.sub.clone()));
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

fn is_public_path(path: &str) -> bool {
    matches!(path, "/health" | "/version") || path.starts_with("/auth/login")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths() {
        assert!(is_public_path("/health"));
        assert!(is_public_path("/version"));
        assert!(is_public_path("/auth/login"));
        assert!(!is_public_path("/auth/me"));
        assert!(!is_public_path("/menu/api/stores"));
    }
}
