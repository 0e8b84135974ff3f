use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use common::event::{GenericEvent, MEDIA_CREATE};
use common::hook::{Hook, HookRegistry};
use common::media::{MediaRepository, MemoryMediaRepository};
use common::permissions::PLUGIN_ID;
use common::store::{KeyValueStore, MemoryStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::database::{DbMediaRepository, DbPluginStore, init_db};
use server::services::ClientAccessor;
use server::state::AppState;

/// Logs every media file the plugin creates.
struct MediaLogHook;

#[async_trait]
impl Hook for MediaLogHook {
    fn id(&self) -> &str {
        "media-log"
    }

    fn topics(&self) -> &[&str] {
        &[MEDIA_CREATE]
    }

    async fn on_event(&self, e: &GenericEvent) -> anyhow::Result<()> {
        let media = e.payload.get("media").context("event without media")?;
        info!(
            id = %media.get("id").unwrap_or(&serde_json::Value::Null),
            name = %media.get("name").unwrap_or(&serde_json::Value::Null),
            "Media file created"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let (store, media): (Arc<dyn KeyValueStore>, Arc<dyn MediaRepository>) =
        match &config.database.url {
            Some(url) => {
                let db = init_db(url).await.context("failed to connect to database")?;
                (
                    Arc::new(DbPluginStore::new(db.clone(), PLUGIN_ID)),
                    Arc::new(DbMediaRepository::new(db)),
                )
            }
            None => {
                warn!("No database configured, settings and media are kept in memory");
                (
                    Arc::new(MemoryStore::new()),
                    Arc::new(MemoryMediaRepository::new()),
                )
            }
        };

    let mut hooks = HookRegistry::new();
    hooks.add_hook(Arc::new(MediaLogHook));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    let state = AppState::build(config, store, media, hooks, ClientAccessor::new())
        .await
        .context("failed to prepare local upload storage")?;

    state.settings.seed_settings().await?;

    let app = server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
