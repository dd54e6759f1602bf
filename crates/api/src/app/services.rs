use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use relocate_infra::{
    jobs::{BatchConfig, InMemoryJobLedger, MoveService},
    membership::{InMemoryMembershipStore, MembershipStore, PostgresMembershipStore},
};

use crate::config::ApiConfig;

/// Move service as wired for the HTTP layer.
///
/// Membership storage is chosen at startup; the job ledger is always the
/// process-local in-memory one.
pub type SharedMoveService = MoveService<Arc<dyn MembershipStore>, Arc<InMemoryJobLedger>>;

pub struct AppServices {
    pub moves: SharedMoveService,
}

impl AppServices {
    pub fn new(store: Arc<dyn MembershipStore>, batch: BatchConfig) -> Self {
        Self {
            moves: MoveService::new(store, InMemoryJobLedger::arc(), batch),
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory(store: Arc<InMemoryMembershipStore>, batch: BatchConfig) -> Self {
        Self::new(store, batch)
    }
}

pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    if !config.use_persistent_stores {
        tracing::warn!("USE_PERSISTENT_STORES not set; memberships are kept in memory");
        return Ok(AppServices::in_memory(
            Arc::new(InMemoryMembershipStore::new()),
            config.batch.clone(),
        ));
    }

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")?;

    let pool = PgPool::connect(database_url)
        .await
        .context("failed to connect to Postgres")?;

    let store = PostgresMembershipStore::new(pool);
    store
        .ensure_schema()
        .await
        .context("failed to prepare membership schema")?;

    tracing::info!(
        chunk_size = config.batch.chunk_size,
        pacing_ms = config.batch.pacing.as_millis() as u64,
        "membership storage: postgres"
    );
    Ok(AppServices::new(Arc::new(store), config.batch.clone()))
}
