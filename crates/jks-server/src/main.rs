mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use jks_platform::StorageClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(jks_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting jks-server");

    let pool_config = jks_db::PoolConfig::from_app_config(&config);
    let pool = jks_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = jks_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let _scheduler = scheduler::build_scheduler(pool.clone(), Arc::clone(&config)).await?;

    let storage = match (&config.storage_url, &config.storage_key) {
        (Some(url), Some(key)) => Some(Arc::new(StorageClient::with_base_url(
            url,
            key,
            &config.storage_bucket,
            config.http_timeout_secs,
        )?)),
        _ => {
            tracing::warn!("JKS_STORAGE_URL not set; image uploads are disabled");
            None
        }
    };

    let auth = AuthState::from_env(matches!(config.env, jks_core::Environment::Development))?;
    let state = AppState {
        pool,
        storage,
        public_base_url: Arc::from(config.public_base_url.as_str()),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
