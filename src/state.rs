use crate::config::{AppConfig, StoreConfig};
use crate::store::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = connect_store(&config.store).await?;
        Ok(Self { config, store })
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn DocumentStore>) -> Self {
        Self { config, store }
    }

    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            store: StoreConfig {
                database_url: None,
                max_connections: 1,
                project: "test".into(),
            },
        });
        let store = Arc::new(MemoryDocumentStore::new()) as Arc<dyn DocumentStore>;
        Self::from_parts(config, store)
    }
}

async fn connect_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using in-memory document store");
        return Ok(Arc::new(MemoryDocumentStore::new()));
    };

    let store = PgDocumentStore::connect(url, config.max_connections, &config.project)
        .await
        .context("connect to document store")?;

    sqlx::migrate!("./migrations")
        .run(store.pool())
        .await
        .context("create documents table")?;

    tracing::info!(project = %config.project, "connected to document store");
    Ok(Arc::new(store))
}
