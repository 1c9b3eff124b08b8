mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use stockbook_ai::AnthropicClient;
use stockbook_enrich::Orchestrator;
use stockbook_fetch::{HeadlessFetcher, HeadlessOptions, StaticFetcher};
use stockbook_images::{ImagePipeline, StorageClient};
use stockbook_lookup::LookupChain;

use crate::api::{build_app, AppState, AI_TIMEOUT_SECS};

fn build_ai_client(config: &stockbook_core::AppConfig) -> anyhow::Result<Option<AnthropicClient>> {
    let Some(key) = config.anthropic_api_key.as_deref() else {
        tracing::warn!("ANTHROPIC_API_KEY not set; AI enrichment endpoints disabled");
        return Ok(None);
    };
    Ok(Some(AnthropicClient::with_base_url(
        key,
        &config.ai_model,
        AI_TIMEOUT_SECS,
        &config.ai_base_url,
    )?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(stockbook_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = stockbook_db::PoolConfig::from_app_config(&config);
    let pool = stockbook_db::connect_pool(&config.database_url, pool_config).await?;
    stockbook_db::run_migrations(&pool).await?;

    let static_fetcher = Arc::new(StaticFetcher::new(
        config.fetch_timeout_secs,
        &config.fetch_user_agent,
    )?);
    let headless_fetcher = Arc::new(HeadlessFetcher::new(HeadlessOptions {
        user_agent: config.fetch_user_agent.clone(),
        nav_timeout_secs: config.headless_nav_timeout_secs,
        render_delay_ms: config.headless_render_delay_ms,
        chrome_executable: config.chrome_executable.clone(),
    }));
    let storage = StorageClient::with_base_url(
        &config.storage_url,
        &config.storage_key,
        &config.storage_bucket,
        config.fetch_timeout_secs,
    )?;
    let images = Arc::new(ImagePipeline::new(
        storage,
        &config.fetch_user_agent,
        config.fetch_timeout_secs,
    )?);

    let ai_client = build_ai_client(&config)?;
    let lookup = Arc::new(LookupChain::new(
        config.upc_database_api_key.clone(),
        config.barcode_lookup_api_key.clone(),
        ai_client.clone(),
    )?);
    let ai = ai_client.map(Arc::new);
    let orchestrator = ai.clone().map(|ai| {
        Arc::new(Orchestrator::new(
            pool.clone(),
            ai,
            Arc::clone(&static_fetcher),
            Arc::clone(&headless_fetcher),
            Arc::clone(&images),
        ))
    });

    let app = build_app(AppState {
        config: Arc::clone(&config),
        pool,
        ai,
        static_fetcher,
        headless_fetcher,
        images,
        lookup,
        orchestrator,
    });

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
