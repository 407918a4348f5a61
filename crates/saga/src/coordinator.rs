//! Orchestrator for the order creation saga.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use common::{Money, UserId};
use domain::{CartItem, DomainEvent, NewOrder, Order, OrderEvent, OrderItem};
use ledger::{InventoryLedger, LedgerError, LedgerExt};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{CompensationFailed, OrderError};
use crate::order_fulfillment::{
    SAGA_TYPE, STEP_LOOKUP_PRICE, STEP_PERSIST_ORDER, STEP_PUBLISH_EVENT,
    STEP_RESERVE_STOCK, SagaConfig,
};
use crate::reservation::StockReservation;
use crate::services::{
    CatalogReader, EventSink, InMemoryReconciliationLog, OrderStore, OrphanedDeduction,
    ReconciliationKind, ReconciliationLog,
};

/// Drives order creation across the ledger, catalog, order store and event sink.
///
/// For each cart line, in submission order, the price is looked up and the
/// quantity deducted from the ledger. The priced order is then persisted and
/// an `order.created.v1` event published. Any failure before persistence
/// returns every deduction made so far, in reverse order.
///
/// The orchestrator holds no state between calls; concurrent orders only
/// meet inside the ledger.
pub struct OrderOrchestrator<L, C, S, E>
where
    L: InventoryLedger,
    C: CatalogReader,
    S: OrderStore,
    E: EventSink,
{
    ledger: L,
    catalog: C,
    store: S,
    sink: E,
    reconciliation: Arc<dyn ReconciliationLog>,
    config: SagaConfig,
}

impl<L, C, S, E> OrderOrchestrator<L, C, S, E>
where
    L: InventoryLedger,
    C: CatalogReader,
    S: OrderStore,
    E: EventSink,
{
    /// Creates an orchestrator with an in-memory reconciliation log.
    pub fn new(ledger: L, catalog: C, store: S, sink: E) -> Self {
        Self {
            ledger,
            catalog,
            store,
            sink,
            reconciliation: Arc::new(InMemoryReconciliationLog::new()),
            config: SagaConfig::default(),
        }
    }

    /// Replaces the log that receives orphaned deductions.
    pub fn with_reconciliation_log(mut self, log: Arc<dyn ReconciliationLog>) -> Self {
        self.reconciliation = log;
        self
    }

    pub fn with_config(mut self, config: SagaConfig) -> Self {
        self.config = config;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn reconciliation_log(&self) -> &Arc<dyn ReconciliationLog> {
        &self.reconciliation
    }

    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Creates an order that must finish within `timeout` from now.
    pub async fn create_order_within(
        &self,
        user_id: UserId,
        items: Vec<CartItem>,
        timeout: Duration,
    ) -> Result<Order, OrderError> {
        self.create_order(user_id, items, Instant::now() + timeout)
            .await
    }

    /// Creates an order, deducting stock for every line.
    ///
    /// On success the returned order is `completed` and an event has been
    /// handed to the sink (best effort). On failure no order exists and every
    /// deduction has been returned, except those written to the
    /// reconciliation log.
    #[tracing::instrument(
        skip(self, user_id, items, deadline),
        fields(saga_type = SAGA_TYPE, user_id = %user_id, saga_id = tracing::field::Empty)
    )]
    pub async fn create_order(
        &self,
        user_id: UserId,
        items: Vec<CartItem>,
        deadline: Instant,
    ) -> Result<Order, OrderError> {
        let started = std::time::Instant::now();
        let result = self.run(user_id, items, deadline).await;
        metrics::histogram!("order_saga_duration_seconds").record(started.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(order_id = %order.id, total = %order.total_amount, "order created");
            }
            Err(err) => {
                metrics::counter!("orders_failed_total", "reason" => err.kind()).increment(1);
                tracing::warn!(error = %err, "order creation failed");
            }
        }
        result
    }

    async fn run(
        &self,
        user_id: UserId,
        items: Vec<CartItem>,
        deadline: Instant,
    ) -> Result<Order, OrderError> {
        validate_cart(&items)?;

        let mut reservation = StockReservation::new();
        tracing::Span::current().record("saga_id", tracing::field::display(reservation.saga_id()));

        let mut priced = Vec::with_capacity(items.len());
        for item in items {
            match self
                .reserve_line(&item, reservation.saga_id(), &user_id, deadline)
                .await
            {
                Ok(unit_price) => {
                    reservation.record(item.product_id.clone(), item.quantity);
                    priced.push(OrderItem::new(item.product_id, item.quantity, unit_price));
                }
                Err(err) => {
                    self.compensate(&mut reservation, &user_id).await;
                    return Err(err);
                }
            }
        }

        reservation.begin_persisting();
        let new_order = match NewOrder::new(user_id.clone(), priced) {
            Ok(order) => order,
            Err(err) => {
                self.compensate(&mut reservation, &user_id).await;
                return Err(OrderError::PersistenceFailed(err.to_string()));
            }
        };

        tracing::debug!(step = STEP_PERSIST_ORDER, "saga step started");
        let order_id =
            match within_deadline(deadline, STEP_PERSIST_ORDER, self.store.create_order(&new_order))
                .await
            {
                Ok(Ok(order_id)) => order_id,
                Ok(Err(err)) => {
                    self.compensate(&mut reservation, &user_id).await;
                    return Err(OrderError::PersistenceFailed(err.to_string()));
                }
                Err(timeout) => {
                    self.compensate(&mut reservation, &user_id).await;
                    // The write may still land after the deadline.
                    for line in reservation.lines() {
                        self.flag_for_review(
                            reservation.saga_id(),
                            &user_id,
                            ReconciliationKind::PersistOutcomeUnknown,
                            CompensationFailed {
                                product_id: line.product_id.clone(),
                                quantity: line.quantity,
                                reason: "order write timed out; order may exist without this deduction"
                                    .to_string(),
                            },
                        )
                        .await;
                    }
                    return Err(timeout);
                }
            };
        reservation.complete();

        let mut order = new_order.into_order(order_id);
        if let Err(err) = order.mark_completed() {
            tracing::error!(order_id = %order.id, error = %err, "could not mark order completed");
        }

        self.publish(&order, deadline).await;
        Ok(order)
    }

    /// Prices and deducts one line. Returns the unit price frozen for the order.
    ///
    /// A deduct that times out in flight is not compensated: its outcome is
    /// unknown, so it is flagged for review instead.
    #[tracing::instrument(
        skip(self, item, user_id, deadline),
        fields(product_id = %item.product_id, quantity = item.quantity)
    )]
    async fn reserve_line(
        &self,
        item: &CartItem,
        saga_id: Uuid,
        user_id: &UserId,
        deadline: Instant,
    ) -> Result<Money, OrderError> {
        let unavailable = |reason: String| OrderError::ProductUnavailable {
            product_id: item.product_id.clone(),
            reason,
        };

        let unit_price = within_deadline(
            deadline,
            STEP_LOOKUP_PRICE,
            self.catalog.get_price(&item.product_id),
        )
        .await?
        .map_err(|err| unavailable(err.to_string()))?
        .ok_or_else(|| unavailable("not found in catalog".to_string()))?;

        if Instant::now() >= deadline {
            return Err(OrderError::Timeout {
                step: STEP_RESERVE_STOCK,
            });
        }
        let deducted = tokio::time::timeout_at(
            deadline,
            self.ledger.deduct(&item.product_id, item.quantity),
        )
        .await;
        let Ok(deducted) = deducted else {
            self.flag_for_review(
                saga_id,
                user_id,
                ReconciliationKind::DeductOutcomeUnknown,
                CompensationFailed {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    reason: "deduct timed out in flight and was not compensated".to_string(),
                },
            )
            .await;
            return Err(OrderError::Timeout {
                step: STEP_RESERVE_STOCK,
            });
        };

        deducted.map_err(|err| match err {
            LedgerError::InsufficientStock { .. } => OrderError::InsufficientStock {
                product_id: item.product_id.clone(),
            },
            other => unavailable(other.to_string()),
        })?;

        Ok(unit_price)
    }

    /// Returns every reserved line to the ledger, newest first.
    ///
    /// Each restock gets its own timeout, independent of the caller's
    /// deadline. Failures never stop the walk; they are logged and written
    /// to the reconciliation log.
    async fn compensate(&self, reservation: &mut StockReservation, user_id: &UserId) {
        reservation.begin_compensation();
        let saga_id = reservation.saga_id();
        let timeout = self.config.compensation_timeout;

        for line in reservation.compensation_order() {
            metrics::counter!("saga_compensations_total").increment(1);

            let outcome =
                tokio::time::timeout(timeout, self.ledger.restock(&line.product_id, line.quantity))
                    .await;
            let reason = match outcome {
                Ok(Ok(_)) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(_) => format!("restock timed out after {}ms", timeout.as_millis()),
            };

            metrics::counter!("saga_compensation_failures_total").increment(1);
            let failure = CompensationFailed {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                reason,
            };
            self.flag_for_review(saga_id, user_id, ReconciliationKind::CompensationFailed, failure)
                .await;
        }

        reservation.fail();
        tracing::warn!(%saga_id, saga_type = SAGA_TYPE, "saga compensated");
    }

    /// Writes an entry to the reconciliation log. A log failure is only logged.
    async fn flag_for_review(
        &self,
        saga_id: Uuid,
        user_id: &UserId,
        kind: ReconciliationKind,
        failure: CompensationFailed,
    ) {
        match kind {
            ReconciliationKind::CompensationFailed => tracing::error!(
                %saga_id,
                product_id = %failure.product_id,
                quantity = failure.quantity,
                reason = %failure.reason,
                "compensation failed; deduction orphaned"
            ),
            _ => tracing::warn!(
                %saga_id,
                ?kind,
                product_id = %failure.product_id,
                quantity = failure.quantity,
                reason = %failure.reason,
                "step outcome unknown; flagged for reconciliation"
            ),
        }

        let entry = OrphanedDeduction::with_kind(saga_id, user_id.clone(), kind, failure);
        if let Err(err) = self.reconciliation.record(entry).await {
            tracing::error!(%saga_id, error = %err, "could not record reconciliation entry");
        }
    }

    /// Publishes the order-created event. Failures are logged and dropped.
    ///
    /// The order is already persisted, so the step always gets at least
    /// `publish_timeout` even when the caller's deadline has passed.
    async fn publish(&self, order: &Order, deadline: Instant) {
        let event = OrderEvent::order_created(order);
        let payload = match event.to_bytes() {
            Ok(payload) => payload,
            Err(err) => {
                metrics::counter!("order_event_publish_failures_total").increment(1);
                tracing::warn!(order_id = %order.id, error = %err, "could not encode order event");
                return;
            }
        };

        let deadline = deadline.max(Instant::now() + self.config.publish_timeout);
        let outcome =
            within_deadline(deadline, STEP_PUBLISH_EVENT, self.sink.publish(event.topic(), payload))
                .await;
        let error = match outcome {
            Ok(Ok(())) => {
                metrics::counter!("order_events_published_total").increment(1);
                return;
            }
            Ok(Err(err)) => err.to_string(),
            Err(err) => err.to_string(),
        };
        metrics::counter!("order_event_publish_failures_total").increment(1);
        tracing::warn!(order_id = %order.id, %error, "order event publish failed");
    }
}

fn validate_cart(items: &[CartItem]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyCart);
    }
    if let Some(item) = items.iter().find(|item| item.quantity == 0) {
        return Err(OrderError::InvalidQuantity {
            product_id: item.product_id.clone(),
        });
    }
    Ok(())
}

/// Runs `fut` under the caller's deadline. An already expired deadline fails
/// without starting the step.
async fn within_deadline<F: Future>(
    deadline: Instant,
    step: &'static str,
    fut: F,
) -> Result<F::Output, OrderError> {
    if Instant::now() >= deadline {
        return Err(OrderError::Timeout { step });
    }
    tokio::time::timeout_at(deadline, fut)
        .await
        .map_err(|_| OrderError::Timeout { step })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryCatalog, InMemoryEventSink, InMemoryOrderStore};
    use domain::OrderStatus;
    use ledger::InMemoryLedger;

    type TestOrchestrator =
        OrderOrchestrator<InMemoryLedger, InMemoryCatalog, InMemoryOrderStore, InMemoryEventSink>;

    async fn setup() -> (
        TestOrchestrator,
        InMemoryLedger,
        InMemoryCatalog,
        InMemoryOrderStore,
        InMemoryEventSink,
    ) {
        let ledger = InMemoryLedger::with_stock([("SKU-001", 10), ("SKU-002", 5)])
            .await
            .unwrap();
        let catalog = InMemoryCatalog::with_prices([
            ("SKU-001", Money::from_cents(1000)),
            ("SKU-002", Money::from_cents(2500)),
        ])
        .await;
        let store = InMemoryOrderStore::new();
        let sink = InMemoryEventSink::new();

        let orchestrator =
            OrderOrchestrator::new(ledger.clone(), catalog.clone(), store.clone(), sink.clone());
        (orchestrator, ledger, catalog, store, sink)
    }

    fn user() -> UserId {
        UserId::new("user-1")
    }

    #[tokio::test]
    async fn test_happy_path() {
        let (orchestrator, ledger, _, store, sink) = setup().await;

        let order = orchestrator
            .create_order_within(
                user(),
                vec![CartItem::new("SKU-001", 2), CartItem::new("SKU-002", 1)],
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.total_amount, Money::from_cents(4500));
        assert_eq!(order.items.len(), 2);
        assert_eq!(ledger.get_quantity(&"SKU-001".into()).await.unwrap(), 8);
        assert_eq!(ledger.get_quantity(&"SKU-002".into()).await.unwrap(), 4);
        assert_eq!(store.order_count().await, 1);
        assert_eq!(sink.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_touches_nothing() {
        let (orchestrator, ledger, catalog, store, _) = setup().await;

        let result = orchestrator
            .create_order_within(user(), vec![], Duration::from_secs(5))
            .await;

        assert!(matches!(result, Err(OrderError::EmptyCart)));
        assert_eq!(ledger.adjust_calls(), 0);
        assert_eq!(catalog.lookups(), 0);
        assert_eq!(store.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected_up_front() {
        let (orchestrator, ledger, _, store, _) = setup().await;

        let result = orchestrator
            .create_order_within(
                user(),
                vec![CartItem::new("SKU-001", 1), CartItem::new("SKU-002", 0)],
                Duration::from_secs(5),
            )
            .await;

        assert!(matches!(
            result,
            Err(OrderError::InvalidQuantity { ref product_id }) if product_id.as_str() == "SKU-002"
        ));
        assert_eq!(ledger.adjust_calls(), 0);
        assert_eq!(store.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_deadline_fails_before_any_call() {
        let (orchestrator, ledger, catalog, _, _) = setup().await;

        let result = orchestrator
            .create_order(user(), vec![CartItem::new("SKU-001", 1)], Instant::now())
            .await;

        assert!(matches!(
            result,
            Err(OrderError::Timeout { step: STEP_LOOKUP_PRICE })
        ));
        assert_eq!(catalog.lookups(), 0);
        assert_eq!(ledger.adjust_calls(), 0);
    }

    #[tokio::test]
    async fn test_custom_reconciliation_log_receives_failures() {
        let (orchestrator, ledger, _, store, _) = setup().await;
        let log = Arc::new(InMemoryReconciliationLog::new());
        let orchestrator = orchestrator.with_reconciliation_log(log.clone());

        store.set_fail_on_create(true);
        ledger.set_fail_on_restock(true);

        let result = orchestrator
            .create_order_within(user(), vec![CartItem::new("SKU-001", 3)], Duration::from_secs(5))
            .await;

        assert!(matches!(result, Err(OrderError::PersistenceFailed(_))));
        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].failure.quantity, 3);
        assert_eq!(entries[0].user_id, user());
    }

    #[test]
    fn test_validate_cart() {
        assert!(matches!(validate_cart(&[]), Err(OrderError::EmptyCart)));
        assert!(validate_cart(&[CartItem::new("SKU-001", 1)]).is_ok());
    }
}
