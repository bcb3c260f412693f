mod config;
mod error;
mod favorites;
mod loader;
mod model;
mod navigation;
mod search;
mod server;
mod session;
mod snippet;
mod tree;
mod update;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kb_common::redis::RedisCache;

use config::Config;
use error::AppError;
use favorites::FavoritesStore;
use server::KnowledgebaseServer;
use session::SearchSession;
use update::ReloadService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting knowledgebase MCP server");

    let config = Config::from_env()?;
    info!(
        corpus_path = %config.corpus_path,
        redis = config.redis_url.is_some(),
        search_delay_ms = config.search_delay.as_millis() as u64,
        "configuration loaded"
    );

    let loaded = loader::load_corpus(&config.corpus_file_path())?;

    let redis_cache = connect_redis(config.redis_url.as_deref()).await;
    let favorites = FavoritesStore::new(redis_cache, config.favorites_key.clone());
    let saved_favorites = favorites.load().await;
    info!(favorites = saved_favorites.len(), "favorites loaded");

    let session = SearchSession::new(config.search_delay);
    info!(delay_ms = session.delay().as_millis() as u64, "search session ready");

    let server = KnowledgebaseServer::new(
        loaded,
        saved_favorites,
        session,
        favorites,
        ReloadService::new(config.corpus_file_path()),
    );

    if let Ok(addr) = std::env::var("MCP_TCP_LISTEN_ADDR") {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                tracing::info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                tracing::info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}

/// Redis is optional. An unreachable server degrades to session-only favorites.
async fn connect_redis(url: Option<&str>) -> RedisCache {
    let cache = RedisCache::new(url);
    if !cache.is_configured() {
        info!("REDIS_URL not set, favorites will not persist");
        return cache;
    }
    match cache.ping().await.map_err(AppError::from) {
        Ok(()) => {
            info!("redis connected");
            cache
        }
        Err(e) => {
            warn!(error = %e, "redis unavailable, favorites will not persist");
            RedisCache::disabled()
        }
    }
}
