//! Event sink trait and in-memory implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::ServiceError;

/// Destination for integration events.
///
/// Publication is at-least-once from the consumer's point of view: a message
/// may be redelivered, so consumers deduplicate on the order ID.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), ServiceError>;
}

#[async_trait]
impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), ServiceError> {
        (**self).publish(topic, payload).await
    }
}

/// A message accepted by [`InMemoryEventSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[derive(Default)]
struct SinkState {
    messages: RwLock<Vec<PublishedMessage>>,
    publish_calls: AtomicU64,
    latency_ms: AtomicU64,
    fail_on_publish: AtomicBool,
}

/// In-memory event sink that keeps every message it accepts.
#[derive(Clone, Default)]
pub struct InMemoryEventSink {
    state: Arc<SinkState>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every publish call fail.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state.fail_on_publish.store(fail, Ordering::SeqCst);
    }

    /// Adds artificial latency to publish calls.
    pub fn set_latency(&self, latency: Duration) {
        self.state
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn publish_calls(&self) -> u64 {
        self.state.publish_calls.load(Ordering::SeqCst)
    }

    /// Returns accepted messages in publication order.
    pub async fn messages(&self) -> Vec<PublishedMessage> {
        self.state.messages.read().await.clone()
    }

    /// Returns accepted messages for one topic.
    pub async fn messages_for(&self, topic: &str) -> Vec<PublishedMessage> {
        self.state
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), ServiceError> {
        self.state.publish_calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.state.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.state.fail_on_publish.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("event sink is down".to_string()));
        }

        self.state.messages.write().await.push(PublishedMessage {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }
}
