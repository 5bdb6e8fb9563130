use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use growth_hub::config::{AppConfig, SessionBackend};
use growth_hub::services::session::{MemorySessionStore, RedisSessionStore, SessionStore};
use growth_hub::services::stats::StatsAggregator;
use growth_hub::{db, routes, store, AppState};
use mimalloc::MiMalloc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// M-MIMALLOC-APP: Use mimalloc as global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// How often expired in-memory sessions are swept.
const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "growth_hub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(&pool).await?;

    let stats_store = store::from_backend(
        &config.stats_backend,
        &pool,
        config.store_request_timeout_ms,
    )?;

    let sessions: Arc<dyn SessionStore> = match &config.session_backend {
        SessionBackend::Memory => {
            let sessions = Arc::new(MemorySessionStore::new());
            spawn_session_pruner(sessions.clone());
            sessions
        }
        SessionBackend::Redis { url } => Arc::new(RedisSessionStore::connect(url).await?),
    };
    tracing::info!(backend = sessions.backend(), "Session store configured");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let state = AppState {
        db: pool,
        config,
        stats: StatsAggregator::new(stats_store),
        sessions,
    };

    tracing::info!(host = %addr, "Starting Growth Hub server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, routes::build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Growth Hub server shut down");
    Ok(())
}

fn spawn_session_pruner(sessions: Arc<MemorySessionStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sessions.prune_expired().await;
            if removed > 0 {
                tracing::debug!(removed, "Pruned expired sessions");
            }
        }
    });
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
