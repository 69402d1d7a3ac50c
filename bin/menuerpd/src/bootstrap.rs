//! First-start checks and admin account seeding.

use tracing::info;

use menuerp_auth::service::AuthService;
use menuerp_core::ServiceError;

use crate::config::ServerConfig;

/// Refuse to start with an unusable configuration.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.auth.jwt_secret.is_empty() {
        anyhow::bail!("auth.jwt_secret is empty in configuration");
    }
    match config.storage.backend.as_str() {
        "sqlite" => {
            if config.storage.data_dir.is_empty() {
                anyhow::bail!("storage.data_dir is empty in configuration");
            }
        }
        "mysql" => {
            if config.storage.mysql.is_none() {
                anyhow::bail!("storage.backend is \"mysql\" but [storage.mysql] is missing");
            }
        }
        other => anyhow::bail!("unknown storage.backend {:?} (expected sqlite or mysql)", other),
    }
    Ok(())
}

/// Create the configured admin account if it does not already exist.
pub fn seed_admin(auth: &AuthService, config: &ServerConfig) -> anyhow::Result<()> {
    let (Some(username), Some(password)) = (
        config.auth.admin_username.as_deref(),
        config.auth.admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    match auth.create_account(username, password) {
        Ok(()) => {
            info!(username, "seeded admin account");
            Ok(())
        }
        Err(ServiceError::Conflict(_)) => Ok(()),
        Err(e) => Err(anyhow::anyhow!("failed to seed admin account: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(text: &str) -> ServerConfig {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn rejects_empty_jwt_secret() {
        let cfg = config("[auth]\njwt_secret = \"\"");
        assert!(verify_config(&cfg).is_err());
    }

    #[test]
    fn rejects_mysql_without_connection_block() {
        let cfg = config(
            "[storage]\nbackend = \"mysql\"\n[auth]\njwt_secret = \"s\"",
        );
        assert!(verify_config(&cfg).is_err());
    }

    #[test]
    fn accepts_default_sqlite() {
        let cfg = config("[auth]\njwt_secret = \"s\"");
        assert!(verify_config(&cfg).is_ok());
    }
}
