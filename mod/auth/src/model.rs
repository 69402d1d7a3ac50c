use serde::{Deserialize, Serialize};

/// JWT claims payload for an admin session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: account username.
    pub sub: String,
    /// Session id — used for revocation on logout.
    pub sid: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// A login session row. Revoked sessions fail token verification even
/// before the token itself expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub username: String,
    pub issued_at: String,
    pub expires_at: String,
    pub revoked: bool,
}

/// Response body of a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}
