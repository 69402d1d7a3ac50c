use std::sync::Arc;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use md5::{Digest, Md5};
use tracing::{info, warn};

use menuerp_core::{new_id, ServiceError};
use menuerp_sql::{SqlStore, Value};

use crate::model::{Claims, Session, TokenResponse};

/// Auth module configuration. The JWT secret and token lifetime are
/// injected at construction time, never read from ambient state.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 86_400,
        }
    }
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS accounts (
        username VARCHAR(64) PRIMARY KEY,
        password CHAR(32) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id CHAR(32) PRIMARY KEY,
        username VARCHAR(64) NOT NULL,
        issued_at VARCHAR(40) NOT NULL,
        expires_at VARCHAR(40) NOT NULL,
        revoked INTEGER NOT NULL DEFAULT 0
    )",
];

/// Auth service — verifies account credentials and manages sessions.
///
/// Account passwords are stored as MD5 hex digests for compatibility
/// with pre-existing `accounts` data. New deployments seed accounts
/// through `create_account`.
pub struct AuthService {
    sql: Arc<dyn SqlStore>,
    config: AuthConfig,
}

/// Hex MD5 digest of a password, as stored in `accounts.password`.
pub fn password_digest(password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

impl AuthService {
    pub fn new(sql: Arc<dyn SqlStore>, config: AuthConfig) -> Result<Self, ServiceError> {
        for stmt in SCHEMA {
            sql.exec(stmt, &[])
                .map_err(|e| ServiceError::Storage(format!("auth schema init failed: {}", e)))?;
        }
        Ok(Self { sql, config })
    }

    /// Create an admin account. Fails with Conflict if the username exists.
    pub fn create_account(&self, username: &str, password: &str) -> Result<(), ServiceError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "username and password are required".into(),
            ));
        }
        let sql = format!(
            "INSERT INTO accounts (username, password) VALUES ({}, {})",
            self.sql.marker(1),
            self.sql.marker(2)
        );
        self.sql
            .exec(
                &sql,
                &[
                    Value::Text(username.to_string()),
                    Value::Text(password_digest(password)),
                ],
            )
            .map_err(|e| match e {
                menuerp_sql::SqlError::Constraint(_) => {
                    ServiceError::Conflict(format!("account '{}' already exists", username))
                }
                other => {
                    warn!(username, error = %other, "account creation failed");
                    ServiceError::Storage("account creation failed".into())
                }
            })?;
        info!(username, "account created");
        Ok(())
    }

    /// Verify credentials and issue a session token.
    pub fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ServiceError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "username and password are required".into(),
            ));
        }

        let sql = format!(
            "SELECT password FROM accounts WHERE username = {}",
            self.sql.marker(1)
        );
        let rows = self
            .sql
            .query(&sql, &[Value::Text(username.to_string())])
            .map_err(|e| {
                warn!(username, error = %e, "credential lookup failed");
                ServiceError::Storage("login failed".into())
            })?;

        let stored = rows.first().and_then(|r| r.get_str("password"));
        if stored != Some(password_digest(password).as_str()) {
            return Err(ServiceError::Unauthorized("invalid credentials".into()));
        }

        self.issue_token(username)
    }

    /// Issue a JWT for a verified account and record the session.
    fn issue_token(&self, username: &str) -> Result<TokenResponse, ServiceError> {
        let session_id = new_id();
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(self.config.token_ttl_secs);

        let claims = Claims {
            sub: username.to_string(),
            sid: session_id.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("JWT encode failed: {}", e)))?;

        let sql = format!(
            "INSERT INTO sessions (id, username, issued_at, expires_at, revoked) \
             VALUES ({}, {}, {}, {}, 0)",
            self.sql.marker(1),
            self.sql.marker(2),
            self.sql.marker(3),
            self.sql.marker(4)
        );
        self.sql
            .exec(
                &sql,
                &[
                    Value::Text(session_id),
                    Value::Text(username.to_string()),
                    Value::Text(now.to_rfc3339()),
                    Value::Text(exp.to_rfc3339()),
                ],
            )
            .map_err(|e| {
                warn!(username, error = %e, "session insert failed");
                ServiceError::Storage("login failed".into())
            })?;

        info!(username, "login succeeded");
        Ok(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_ttl_secs,
        })
    }

    /// Verify and decode a session token. Fails if the signature or expiry
    /// is invalid, or if the session was revoked by logout.
    pub fn verify_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {}", e)))?;

        let sql = format!(
            "SELECT revoked FROM sessions WHERE id = {}",
            self.sql.marker(1)
        );
        let rows = self
            .sql
            .query(&sql, &[Value::Text(data.claims.sid.clone())])
            .map_err(|e| {
                warn!(error = %e, "session lookup failed");
                ServiceError::Storage("session verification failed".into())
            })?;

        match rows.first().and_then(|r| r.get_i64("revoked")) {
            Some(0) => Ok(data.claims),
            Some(_) => Err(ServiceError::Unauthorized("session revoked".into())),
            None => Err(ServiceError::Unauthorized("unknown session".into())),
        }
    }

    /// Revoke the session behind a set of claims.
    pub fn logout(&self, claims: &Claims) -> Result<(), ServiceError> {
        let sql = format!(
            "UPDATE sessions SET revoked = 1 WHERE id = {}",
            self.sql.marker(1)
        );
        self.sql
            .exec(&sql, &[Value::Text(claims.sid.clone())])
            .map_err(|e| {
                warn!(username = %claims.sub, error = %e, "logout failed");
                ServiceError::Storage("logout failed".into())
            })?;
        info!(username = %claims.sub, "logged out");
        Ok(())
    }

    /// Fetch a session row by id.
    pub fn get_session(&self, id: &str) -> Result<Session, ServiceError> {
        let sql = format!(
            "SELECT id, username, issued_at, expires_at, revoked FROM sessions WHERE id = {}",
            self.sql.marker(1)
        );
        let rows = self
            .sql
            .query(&sql, &[Value::Text(id.to_string())])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("session '{}' not found", id)))?;
        Ok(Session {
            id: row.get_str("id").unwrap_or_default().to_string(),
            username: row.get_str("username").unwrap_or_default().to_string(),
            issued_at: row.get_str("issued_at").unwrap_or_default().to_string(),
            expires_at: row.get_str("expires_at").unwrap_or_default().to_string(),
            revoked: row.get_i64("revoked").unwrap_or(0) != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menuerp_sql::SqliteStore;

    fn service() -> AuthService {
        let sql: Arc<dyn SqlStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = AuthConfig {
            jwt_secret: "test-secret".into(),
            token_ttl_secs: 3600,
        };
        let svc = AuthService::new(sql, config).unwrap();
        svc.create_account("admin", "hunter2").unwrap();
        svc
    }

    #[test]
    fn digest_matches_known_md5() {
        // md5("admin") — the digest format the accounts table predates us with.
        assert_eq!(password_digest("admin"), "21232f297a57a5a743894a0e4a801fc3");
    }

    #[test]
    fn login_roundtrip() {
        let svc = service();
        let token = svc.login("admin", "hunter2").unwrap();
        let claims = svc.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.sub, "admin");
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        let svc = service();
        let err = svc.login("admin", "nope").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn unknown_user_is_unauthorized() {
        let svc = service();
        let err = svc.login("ghost", "hunter2").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn empty_credentials_are_validation_errors() {
        let svc = service();
        assert!(matches!(svc.login("", "x"), Err(ServiceError::Validation(_))));
        assert!(matches!(svc.login("admin", ""), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn logout_revokes_session() {
        let svc = service();
        let token = svc.login("admin", "hunter2").unwrap();
        let claims = svc.verify_token(&token.access_token).unwrap();
        svc.logout(&claims).unwrap();
        let err = svc.verify_token(&token.access_token).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert!(svc.get_session(&claims.sid).unwrap().revoked);
    }

    #[test]
    fn duplicate_account_conflicts() {
        let svc = service();
        let err = svc.create_account("admin", "other").unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let svc = service();
        assert!(matches!(
            svc.verify_token("not-a-jwt"),
            Err(ServiceError::Unauthorized(_))
        ));
    }
}
