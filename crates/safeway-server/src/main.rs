mod api;
mod middleware;
mod password;
mod scheduler;

use std::sync::Arc;

use safeway_opendata::InfrastructureCache;
use safeway_route::LinearPolicy;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState, AuthSettings},
    middleware::RateLimitState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = safeway_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting safeway-server");

    let pool_config = safeway_db::PoolConfig::from_app_config(&config);
    let pool = safeway_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = safeway_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let policy_config = safeway_core::load_scoring_policy(&config.scoring_policy_path)?;
    let policy = LinearPolicy::new(policy_config);

    let opendata = InfrastructureCache::from_app_config(&config)?.map(Arc::new);
    match &opendata {
        Some(cache) => {
            let cache = Arc::clone(cache);
            tokio::spawn(async move {
                if let Err(e) = cache.refresh().await {
                    tracing::warn!(error = %e, "initial infrastructure fetch failed");
                }
            });
        }
        None => tracing::warn!("OPENDATA_API_KEY not set; route scoring will answer 503"),
    }

    let _scheduler = scheduler::build_scheduler(pool.clone(), opendata.clone()).await?;

    // Ten years is far beyond any sane TTL and keeps the duration in range.
    let session_hours = i64::try_from(config.session_ttl_hours.min(87_600)).unwrap_or(87_600);
    let state = AppState {
        pool,
        opendata,
        policy: Arc::new(policy),
        auth: Arc::new(AuthSettings {
            password_pepper: config.password_pepper.clone(),
            session_ttl: chrono::Duration::hours(session_hours),
        }),
    };
    let app = build_app(state, RateLimitState::per_minute(config.rate_limit_per_minute));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
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
