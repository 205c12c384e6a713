mod auth;
mod config;
mod date;
mod db;
mod error;
mod handlers;
mod models;
mod routes;
mod seeder;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use config::Config;
use db::Store;
use state::AppState;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// `AGENDA_LOG_JSON=true` switches log output to JSON lines.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = std::env::var("AGENDA_LOG_JSON").is_ok_and(|v| v.eq_ignore_ascii_case("true"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| fmt::layer().json().with_target(true)))
        .with((!json).then(fmt::layer))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = Config::from_env().context("failed to load configuration")?;

    let store = Store::connect(&config.database_url)
        .await
        .context("failed to connect to db")?;
    store
        .init_schema()
        .await
        .context("failed to create tables")?;

    let app_state = AppState::new(store, &config);
    let app = routes::create_router(app_state, &config);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        address = %addr,
        static_dir = %config.static_dir.display(),
        auth_routes = config.auth_routes,
        "server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}
