//! Shared application state and collaborator wiring.

use std::sync::Arc;
use std::time::Duration;

use ledger::{InMemoryLedger, InventoryLedger, PostgresLedger};
use saga::{
    CatalogReader, EventSink, InMemoryCatalog, InMemoryEventSink, InMemoryOrderStore,
    InMemoryReconciliationLog, OrderOrchestrator, OrderStore, PostgresCatalog,
    PostgresOrderStore, PostgresOutboxSink, ReconciliationLog, SagaConfig,
};
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::error::StartupError;

/// Orchestrator over type-erased collaborators, so one state type serves
/// both storage backends.
pub type Orchestrator = OrderOrchestrator<
    Arc<dyn InventoryLedger>,
    Arc<dyn CatalogReader>,
    Arc<dyn OrderStore>,
    Arc<dyn EventSink>,
>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub ledger: Arc<dyn InventoryLedger>,
    pub orders: Arc<dyn OrderStore>,
    pub reconciliation: Arc<dyn ReconciliationLog>,
    pub order_deadline: Duration,
    /// `"memory"` or `"postgres"`, reported by the health check.
    pub storage: &'static str,
}

impl AppState {
    fn assemble(
        config: &Config,
        storage: &'static str,
        ledger: Arc<dyn InventoryLedger>,
        catalog: Arc<dyn CatalogReader>,
        orders: Arc<dyn OrderStore>,
        sink: Arc<dyn EventSink>,
        reconciliation: Arc<dyn ReconciliationLog>,
    ) -> Self {
        let orchestrator =
            OrderOrchestrator::new(ledger.clone(), catalog, orders.clone(), sink)
                .with_reconciliation_log(reconciliation.clone())
                .with_config(
                    SagaConfig::with_compensation_timeout(config.compensation_timeout)
                        .with_publish_timeout(config.publish_timeout),
                );

        Self {
            orchestrator,
            ledger,
            orders,
            reconciliation,
            order_deadline: config.order_deadline,
            storage,
        }
    }
}

/// Handles to the in-memory collaborators behind a default state.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    pub ledger: InMemoryLedger,
    pub catalog: InMemoryCatalog,
    pub store: InMemoryOrderStore,
    pub sink: InMemoryEventSink,
    pub reconciliation: Arc<InMemoryReconciliationLog>,
}

/// Creates application state backed by in-memory collaborators.
pub fn create_default_state(config: &Config) -> (Arc<AppState>, InMemoryBackend) {
    let backend = InMemoryBackend::default();
    let state = AppState::assemble(
        config,
        "memory",
        Arc::new(backend.ledger.clone()),
        Arc::new(backend.catalog.clone()),
        Arc::new(backend.store.clone()),
        Arc::new(backend.sink.clone()),
        backend.reconciliation.clone(),
    );
    (Arc::new(state), backend)
}

/// Connects to PostgreSQL, runs migrations and builds application state.
///
/// Orphaned deductions are kept in memory in both modes.
pub async fn create_postgres_state(
    config: &Config,
    database_url: &str,
) -> Result<Arc<AppState>, StartupError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;

    let ledger = PostgresLedger::new(pool.clone());
    ledger.run_migrations().await?;
    tracing::info!("database migrations applied");

    let state = AppState::assemble(
        config,
        "postgres",
        Arc::new(ledger),
        Arc::new(PostgresCatalog::new(pool.clone())),
        Arc::new(PostgresOrderStore::new(pool.clone())),
        Arc::new(PostgresOutboxSink::new(pool)),
        Arc::new(InMemoryReconciliationLog::new()),
    );
    Ok(Arc::new(state))
}
