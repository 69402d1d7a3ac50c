//! Server configuration — `/etc/menuerp/<name>.toml` or an explicit path.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use menuerp_sql::MysqlConfig;

/// Top-level server configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    pub auth: AuthSection,
    #[serde(default)]
    pub vision: Option<EndpointSection>,
    #[serde(default)]
    pub translate: Option<EndpointSection>,
}

/// Which backend holds the menu data. SQLite needs only `data_dir`;
/// MySQL needs the connection block.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub mysql: Option<MysqlSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MysqlSection {
    pub host: String,
    #[serde(default = "default_mysql_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
}

impl MysqlSection {
    pub fn to_sql_config(&self) -> MysqlConfig {
        MysqlConfig {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSection {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
    /// Seed admin account, created on first start if missing.
    #[serde(default)]
    pub admin_username: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
}

/// A chat-completions endpoint for one of the AI collaborators.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointSection {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
}

fn default_backend() -> String {
    "sqlite".into()
}

fn default_data_dir() -> String {
    "/var/lib/menuerp".into()
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_token_ttl() -> i64 {
    86400
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
            mysql: None,
        }
    }
}

impl ServerConfig {
    /// A bare name resolves to `/etc/menuerp/<name>.toml`; anything with
    /// a `/` or `.` is treated as a path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/menuerp/{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_bare_name() {
        assert_eq!(
            ServerConfig::resolve_path("prod"),
            PathBuf::from("/etc/menuerp/prod.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./local.toml"),
            PathBuf::from("./local.toml")
        );
    }

    #[test]
    fn minimal_sqlite_config_parses() {
        let cfg: ServerConfig = toml::from_str(
            r#"
            [auth]
            jwt_secret = "s3cret"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.storage.backend, "sqlite");
        assert_eq!(cfg.auth.token_ttl_secs, 86400);
        assert!(cfg.vision.is_none());
    }

    #[test]
    fn mysql_config_parses() {
        let cfg: ServerConfig = toml::from_str(
            r#"
            [storage]
            backend = "mysql"

            [storage.mysql]
            host = "db.internal"
            user = "menuerp"
            password = "pw"
            database = "menuerp"

            [auth]
            jwt_secret = "s3cret"
            admin_username = "admin"
            admin_password = "admin"

            [vision]
            base_url = "https://api.example.com/v1"
            api_key = "key"
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.storage.backend, "mysql");
        let mysql = cfg.storage.mysql.unwrap();
        assert_eq!(mysql.port, 3306);
        assert_eq!(mysql.to_sql_config().host, "db.internal");
        assert_eq!(cfg.vision.unwrap().model, "gpt-4o");
    }
}
