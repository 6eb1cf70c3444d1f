#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Postgres connection string. Unset means the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub project: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("PORT").filter(|v| !v.is_empty()) {
            Some(v) => v.parse::<u16>()?,
            None => {
                tracing::info!("Defaulting to port 8080");
                8080
            }
        };

        let store = StoreConfig {
            database_url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            project: lookup("STORE_PROJECT")
                .filter(|v| !v.is_empty())
                .or_else(|| lookup("GOOGLE_CLOUD_PROJECT").filter(|v| !v.is_empty()))
                .unwrap_or_else(|| "default".into()),
        };

        Ok(Self { host, port, store })
    }
}
