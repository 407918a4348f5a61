//! Catalog reader trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{Money, ProductId};
use tokio::sync::RwLock;

use crate::error::ServiceError;

/// Read access to product prices.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Returns the current unit price, or None if the product is not listed.
    async fn get_price(&self, product_id: &ProductId) -> Result<Option<Money>, ServiceError>;
}

#[async_trait]
impl<T: CatalogReader + ?Sized> CatalogReader for Arc<T> {
    async fn get_price(&self, product_id: &ProductId) -> Result<Option<Money>, ServiceError> {
        (**self).get_price(product_id).await
    }
}

#[derive(Default)]
struct CatalogState {
    prices: RwLock<HashMap<ProductId, Money>>,
    lookups: AtomicU64,
    latency_ms: AtomicU64,
    unavailable: AtomicBool,
}

/// In-memory catalog for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<CatalogState>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog with the given prices.
    pub async fn with_prices<I, P>(prices: I) -> Self
    where
        I: IntoIterator<Item = (P, Money)>,
        P: Into<ProductId>,
    {
        let catalog = Self::new();
        for (product_id, price) in prices {
            catalog.set_price(product_id, price).await;
        }
        catalog
    }

    /// Sets or replaces a product's price.
    pub async fn set_price(&self, product_id: impl Into<ProductId>, price: Money) {
        self.state
            .prices
            .write()
            .await
            .insert(product_id.into(), price);
    }

    /// Adds artificial latency to every lookup.
    pub fn set_latency(&self, latency: Duration) {
        self.state
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Makes every lookup fail as if the catalog were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns how many lookups have been received.
    pub fn lookups(&self) -> u64 {
        self.state.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn get_price(&self, product_id: &ProductId) -> Result<Option<Money>, ServiceError> {
        self.state.lookups.fetch_add(1, Ordering::SeqCst);

        let latency = self.state.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.state.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("catalog is down".to_string()));
        }

        Ok(self.state.prices.read().await.get(product_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_known_and_unknown_products() {
        let catalog = InMemoryCatalog::with_prices([("SKU-001", Money::from_cents(1999))]).await;

        let price = catalog.get_price(&ProductId::new("SKU-001")).await.unwrap();
        assert_eq!(price, Some(Money::from_cents(1999)));

        let missing = catalog.get_price(&ProductId::new("SKU-404")).await.unwrap();
        assert_eq!(missing, None);
        assert_eq!(catalog.lookups(), 2);
    }

    #[tokio::test]
    async fn test_price_change_is_visible() {
        let catalog = InMemoryCatalog::with_prices([("SKU-001", Money::from_cents(100))]).await;
        catalog.set_price("SKU-001", Money::from_cents(250)).await;

        let price = catalog.get_price(&ProductId::new("SKU-001")).await.unwrap();
        assert_eq!(price, Some(Money::from_cents(250)));
    }

    #[tokio::test]
    async fn test_unavailable_catalog() {
        let catalog = InMemoryCatalog::with_prices([("SKU-001", Money::from_cents(100))]).await;
        catalog.set_unavailable(true);

        let result = catalog.get_price(&ProductId::new("SKU-001")).await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
    }
}
