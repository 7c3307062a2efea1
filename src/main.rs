use anyhow::anyhow;
use axum::http::{HeaderValue, Method};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use akhbar::app::auth::TokenService;
use akhbar::config::{AppConfig, StoreKind};
use akhbar::infra::{
    cache::{CounterCache, RedisCache}, db::Db, memory_store::MemoryInteractionStore,
    pg_store::PgInteractionStore, store::InteractionStore,
};
use akhbar::{http, jobs, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn InteractionStore> = match config.store {
        StoreKind::Postgres => Arc::new(PgInteractionStore::new(Db::connect(&config).await?)),
        StoreKind::Memory => {
            tracing::warn!("using in-memory interaction store; data is lost on exit");
            Arc::new(MemoryInteractionStore::new())
        }
    };

    let cache: Option<Arc<dyn CounterCache>> = match &config.redis_url {
        Some(url) => Some(Arc::new(
            RedisCache::connect(url, config.counter_cache_ttl_seconds).await?,
        )),
        None => {
            tracing::info!("REDIS_URL not set, counter cache disabled");
            None
        }
    };

    match config.app_mode.as_str() {
        "api" => {
            let tokens = TokenService::new(config.paseto_access_key, config.access_ttl_minutes);
            let state = AppState::new(store, cache, tokens, config.trust_user_id_header);

            let app: Router = http::router(state)
                .layer(cors_layer(&config)?)
                .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
                .layer(TraceLayer::new_for_http());
            let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
            tracing::info!("listening on {}", config.http_addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        "worker" => {
            tracing::info!("starting worker mode");
            let interval = Duration::from_secs(config.reconcile_interval_seconds.max(1));
            tokio::select! {
                result = jobs::counter_reconciler::run(store, interval) => {
                    result?;
                }
                _ = shutdown_signal() => {}
            }
        }
        other => return Err(anyhow!("unknown APP_MODE: {}", other)),
    }

    Ok(())
}

fn cors_layer(config: &AppConfig) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);
    let layer = match &config.cors_allow_origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .map_err(|err| anyhow!("invalid CORS_ALLOW_ORIGIN: {}", err))?;
            layer.allow_origin(origin)
        }
        None => layer.allow_origin(Any),
    };
    Ok(layer)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
