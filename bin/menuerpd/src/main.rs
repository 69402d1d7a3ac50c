//! `menuerpd` — the menu back-office server binary.
//!
//! Usage:
//!   menuerpd -c <config-name-or-path> [--listen <addr>]
//!
//! The config name resolves to `/etc/menuerp/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod auth_middleware;
mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use menuerp_auth::AuthModule;
use menuerp_core::Module;
use menuerp_menu::client::{
    ChatEndpoint, ChatRecognizer, ChatTranslator, DisabledRecognizer, DisabledTranslator,
    MenuRecognizer, Translator,
};
use menuerp_menu::MenuModule;
use menuerp_sql::{MysqlStore, SqliteStore, SqlStore};

use config::{EndpointSection, ServerConfig};

/// Menu back-office server.
#[derive(Parser, Debug)]
#[command(name = "menuerpd", about = "Menu back-office server")]
struct Cli {
    /// Config name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    // Open storage. This is the only place the dialect is chosen; every
    // module downstream sees the same SqlStore trait.
    let sql: Arc<dyn SqlStore> = match server_config.storage.backend.as_str() {
        "mysql" => {
            let section = server_config
                .storage
                .mysql
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("[storage.mysql] is missing"))?;
            info!(host = %section.host, database = %section.database, "using MySQL storage");
            Arc::new(
                MysqlStore::connect(&section.to_sql_config())
                    .map_err(|e| anyhow::anyhow!("failed to connect to MySQL: {}", e))?,
            )
        }
        _ => {
            let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
            std::fs::create_dir_all(&data_dir)?;
            let core_config = menuerp_core::ServiceConfig {
                data_dir: Some(data_dir),
                listen: cli.listen.clone(),
                ..Default::default()
            };
            let path = core_config.resolve_sqlite_path();
            info!(path = %path.display(), "using SQLite storage");
            Arc::new(
                SqliteStore::open(&path)
                    .map_err(|e| anyhow::anyhow!("failed to open SQLite store: {}", e))?,
            )
        }
    };

    let auth_config = menuerp_auth::service::AuthConfig {
        jwt_secret: server_config.auth.jwt_secret.clone(),
        token_ttl_secs: server_config.auth.token_ttl_secs,
    };
    let auth_service = menuerp_auth::service::AuthService::new(Arc::clone(&sql), auth_config)
        .map_err(|e| anyhow::anyhow!("auth init failed: {}", e))?;
    bootstrap::seed_admin(&auth_service, &server_config)?;

    let auth_module = AuthModule::new(auth_service);
    info!("auth module initialized");

    let recognizer: Arc<dyn MenuRecognizer> = match &server_config.vision {
        Some(section) => Arc::new(ChatRecognizer::new(to_endpoint(section))),
        None => Arc::new(DisabledRecognizer),
    };
    let translator: Arc<dyn Translator> = match &server_config.translate {
        Some(section) => Arc::new(ChatTranslator::new(to_endpoint(section))),
        None => Arc::new(DisabledTranslator),
    };

    let menu_service = menuerp_menu::service::MenuService::new(Arc::clone(&sql))
        .map_err(|e| anyhow::anyhow!("menu init failed: {}", e))?;
    let menu_module = MenuModule::new(menu_service, recognizer, translator);
    info!("menu module initialized");

    let auth_state = auth_module.service();
    let module_routes = vec![
        (auth_module.name(), auth_module.routes()),
        (menu_module.name(), menu_module.routes()),
    ];
    let app = routes::build_router(auth_state, module_routes);

    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("menuerpd listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}

fn to_endpoint(section: &EndpointSection) -> ChatEndpoint {
    ChatEndpoint {
        base_url: section.base_url.trim_end_matches('/').to_string(),
        api_key: section.api_key.clone(),
        model: section.model.clone(),
    }
}
