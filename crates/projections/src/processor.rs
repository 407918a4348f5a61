//! Event processor that feeds sink messages to projections.

use domain::{ORDER_CREATED_TOPIC, OrderEvent};

use crate::Result;
use crate::projection::Projection;

/// Decodes messages taken off the event sink and delivers them to projections.
///
/// The processor supports:
/// - Single message delivery: decodes one message and delivers it to all projections
/// - Replay: delivers a batch of previously published messages
/// - Rebuild: resets all projections and replays from scratch
#[derive(Default)]
pub struct EventProcessor {
    projections: Vec<Box<dyn Projection>>,
}

impl EventProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Decodes a message and delivers it. Messages on other topics are ignored.
    #[tracing::instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub async fn process_message(&self, topic: &str, payload: &[u8]) -> Result<()> {
        if topic != ORDER_CREATED_TOPIC {
            tracing::debug!("ignoring message on unrelated topic");
            return Ok(());
        }
        let event = OrderEvent::from_bytes(payload)?;
        self.process_event(&event).await
    }

    /// Delivers a decoded event to all registered projections.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id()))]
    pub async fn process_event(&self, event: &OrderEvent) -> Result<()> {
        for projection in &self.projections {
            projection.handle(event).await?;
        }
        metrics::counter!("projections_events_processed").increment(1);
        Ok(())
    }

    /// Delivers a batch of messages in order and returns how many were
    /// delivered. Undecodable messages are logged and skipped.
    #[tracing::instrument(skip(self, messages))]
    pub async fn replay<'a, I>(&self, messages: I) -> Result<u64>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let mut delivered = 0;
        for (topic, payload) in messages {
            if topic != ORDER_CREATED_TOPIC {
                continue;
            }
            match OrderEvent::from_bytes(payload) {
                Ok(event) => {
                    self.process_event(&event).await?;
                    delivered += 1;
                }
                Err(err) => {
                    metrics::counter!("projections_decode_failures_total").increment(1);
                    tracing::warn!(error = %err, "skipping undecodable order event");
                }
            }
        }

        tracing::info!(events_processed = delivered, "replay complete");
        Ok(delivered)
    }

    /// Resets all projections and replays the given messages.
    #[tracing::instrument(skip(self, messages))]
    pub async fn rebuild_all<'a, I>(&self, messages: I) -> Result<u64>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.replay(messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionPosition;
    use async_trait::async_trait;
    use common::{Money, OrderId, UserId};
    use domain::{NewOrder, OrderItem};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// A simple counting projection for testing.
    struct CountingProjection {
        count: Arc<RwLock<u64>>,
        position: Arc<RwLock<ProjectionPosition>>,
    }

    impl CountingProjection {
        fn new() -> Self {
            Self {
                count: Arc::new(RwLock::new(0)),
                position: Arc::new(RwLock::new(ProjectionPosition::zero())),
            }
        }
    }

    #[async_trait]
    impl Projection for CountingProjection {
        fn name(&self) -> &'static str {
            "CountingProjection"
        }

        async fn handle(&self, event: &OrderEvent) -> Result<()> {
            *self.count.write().await += 1;
            let OrderEvent::OrderCreatedV1(data) = event;
            let mut pos = self.position.write().await;
            *pos = pos.applied(data.order_id);
            Ok(())
        }

        async fn position(&self) -> ProjectionPosition {
            *self.position.read().await
        }

        async fn reset(&self) -> Result<()> {
            *self.count.write().await = 0;
            *self.position.write().await = ProjectionPosition::zero();
            Ok(())
        }
    }

    fn encoded_event() -> Vec<u8> {
        let order = NewOrder::new(
            UserId::new("user-1"),
            vec![OrderItem::new("SKU-001", 1, Money::from_cents(100))],
        )
        .unwrap()
        .into_order(OrderId::new());
        OrderEvent::order_created(&order).to_bytes().unwrap()
    }

    #[tokio::test]
    async fn test_process_message_delivers_to_all() {
        let first = CountingProjection::new();
        let second = CountingProjection::new();
        let count1 = Arc::clone(&first.count);
        let count2 = Arc::clone(&second.count);

        let mut processor = EventProcessor::new();
        processor.register(Box::new(first));
        processor.register(Box::new(second));
        assert_eq!(processor.projection_count(), 2);

        processor
            .process_message(ORDER_CREATED_TOPIC, &encoded_event())
            .await
            .unwrap();

        assert_eq!(*count1.read().await, 1);
        assert_eq!(*count2.read().await, 1);
    }

    #[tokio::test]
    async fn test_other_topics_are_ignored() {
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);
        let mut processor = EventProcessor::new();
        processor.register(Box::new(projection));

        processor
            .process_message("payment.captured", b"not json")
            .await
            .unwrap();
        assert_eq!(*count_ref.read().await, 0);
    }

    #[tokio::test]
    async fn test_undecodable_message_is_an_error() {
        let processor = EventProcessor::new();
        let result = processor
            .process_message(ORDER_CREATED_TOPIC, b"{\"type\":\"bogus\"}")
            .await;
        assert!(matches!(result, Err(crate::ProjectionError::Decode(_))));
    }

    #[tokio::test]
    async fn test_replay_skips_bad_messages() {
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);
        let mut processor = EventProcessor::new();
        processor.register(Box::new(projection));

        let good = encoded_event();
        let messages: Vec<(&str, &[u8])> = vec![
            (ORDER_CREATED_TOPIC, good.as_slice()),
            (ORDER_CREATED_TOPIC, b"garbage".as_slice()),
            ("other", good.as_slice()),
            (ORDER_CREATED_TOPIC, good.as_slice()),
        ];

        let delivered = processor.replay(messages).await.unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(*count_ref.read().await, 2);
    }

    #[tokio::test]
    async fn test_rebuild_resets_and_replays() {
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);
        let pos_ref = Arc::clone(&projection.position);
        let mut processor = EventProcessor::new();
        processor.register(Box::new(projection));

        let good = encoded_event();
        let messages = [(ORDER_CREATED_TOPIC, good.as_slice()); 2];

        processor.replay(messages).await.unwrap();
        assert_eq!(*count_ref.read().await, 2);

        processor.rebuild_all(messages).await.unwrap();
        assert_eq!(*count_ref.read().await, 2);
        assert_eq!(pos_ref.read().await.delivered, 2);
    }
}
