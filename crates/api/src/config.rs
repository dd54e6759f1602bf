//! Process configuration, read from the environment at startup.

use relocate_infra::jobs::BatchConfig;

/// API server configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `BIND_ADDR` | `0.0.0.0:8080` | Listen address |
/// | `USE_PERSISTENT_STORES` | `false` | Back memberships with Postgres |
/// | `DATABASE_URL` | unset | Required when `USE_PERSISTENT_STORES=true` |
/// | `MOVE_CHUNK_SIZE`, `MOVE_PACING_MS` | see `BatchConfig::from_env` | Runner tuning |
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub batch: BatchConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            use_persistent_stores: false,
            database_url: None,
            batch: BatchConfig::default(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);

        let use_persistent_stores = std::env::var("USE_PERSISTENT_STORES")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        let database_url = std::env::var("DATABASE_URL").ok();

        Self {
            bind_addr,
            use_persistent_stores,
            database_url,
            batch: BatchConfig::from_env(),
        }
    }
}
