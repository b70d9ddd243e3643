//! Stream manager
//!
//! The public capability for producing and consuming streams. The
//! surrounding system (query engine, REST layer) talks to the manager;
//! the registry and the serving connections stay internal.
//!
//! Consumption is exactly-once-readable: a ticket's sequence can be read
//! end-to-end by at most one consumer, and a second concurrent
//! `get_stream` fails with `AlreadyConsuming`. This is deliberate: the
//! service addresses one stream per ticket, it is not a broadcast bus.

pub mod producer;
pub mod stream;

pub use producer::StreamProducer;
pub use stream::TicketStream;

use std::sync::Arc;

use crate::error::Result;
use crate::registry::{StreamRegistry, StreamTicket};

/// Public capability surface for producing and consuming streams
pub struct StreamManager {
    registry: Arc<StreamRegistry>,
}

impl StreamManager {
    /// Create a manager over a registry
    pub fn new(registry: Arc<StreamRegistry>) -> Self {
        Self { registry }
    }

    /// Id of the node this manager serves
    pub fn node_id(&self) -> &str {
        self.registry.node_id()
    }

    /// The registry backing this manager
    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Register a producer and mint its ticket
    ///
    /// Fails with `InvalidSchema` if the producer's declared schema is
    /// malformed and `ResourceExhausted` if the registry is at capacity.
    pub async fn create_stream(&self, producer: Box<dyn StreamProducer>) -> Result<StreamTicket> {
        producer.schema().validate()?;
        let handle = self.registry.register(producer).await?;
        Ok(handle.ticket().clone())
    }

    /// Claim a ticket's stream for exclusive consumption
    ///
    /// Returns a lazy, forward-only, non-restartable sequence; pulling a
    /// batch drives the producer. A second concurrent claim on a live
    /// ticket fails with `AlreadyConsuming`; an unknown or revoked ticket
    /// fails with `NotFound`.
    pub async fn get_stream(&self, ticket: &StreamTicket) -> Result<TicketStream> {
        let handle = self.registry.resolve(ticket).await?;
        let producer = handle.claim()?;
        tracing::debug!(ticket = %ticket, "Stream claimed");
        Ok(TicketStream::new(handle, Arc::clone(&self.registry), producer))
    }

    /// Close a stream, releasing its producer resources
    ///
    /// Idempotent: safe to call on an already-closed or never-consumed
    /// ticket. Any pull parked on the stream is unblocked with a terminal
    /// signal.
    pub async fn close_stream(&self, ticket: &StreamTicket) {
        self.registry.revoke(ticket).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{Column, DataType, Field, RecordBatch, Schema};
    use crate::error::FlightError;
    use async_trait::async_trait;
    use std::time::Duration;

    struct VecProducer {
        schema: Schema,
        batches: std::collections::VecDeque<RecordBatch>,
    }

    impl VecProducer {
        fn new(values: Vec<Vec<i64>>) -> Self {
            let schema = Schema::new(vec![Field::new("n", DataType::Int64)]);
            let batches = values
                .into_iter()
                .map(|v| RecordBatch::try_new(schema.clone(), vec![Column::Int64(v)]).unwrap())
                .collect();
            Self { schema, batches }
        }
    }

    #[async_trait]
    impl StreamProducer for VecProducer {
        fn schema(&self) -> &Schema {
            &self.schema
        }

        async fn next_batch(&mut self) -> crate::error::Result<Option<RecordBatch>> {
            Ok(self.batches.pop_front())
        }
    }

    struct BadSchemaProducer {
        schema: Schema,
    }

    #[async_trait]
    impl StreamProducer for BadSchemaProducer {
        fn schema(&self) -> &Schema {
            &self.schema
        }

        async fn next_batch(&mut self) -> crate::error::Result<Option<RecordBatch>> {
            Ok(None)
        }
    }

    /// Producer that never yields; used to test unblocking on close
    struct PendingProducer {
        schema: Schema,
    }

    #[async_trait]
    impl StreamProducer for PendingProducer {
        fn schema(&self) -> &Schema {
            &self.schema
        }

        async fn next_batch(&mut self) -> crate::error::Result<Option<RecordBatch>> {
            std::future::pending().await
        }
    }

    fn manager() -> StreamManager {
        StreamManager::new(Arc::new(StreamRegistry::new("node-a")))
    }

    #[tokio::test]
    async fn test_create_and_consume_in_order() {
        let manager = manager();
        let ticket = manager
            .create_stream(Box::new(VecProducer::new(vec![vec![1], vec![2], vec![3]])))
            .await
            .unwrap();

        let mut stream = manager.get_stream(&ticket).await.unwrap();
        let mut seen = Vec::new();
        while let Some(batch) = stream.next_batch().await.unwrap() {
            if let Column::Int64(values) = &batch.columns()[0] {
                seen.extend_from_slice(values);
            }
        }
        assert_eq!(seen, vec![1, 2, 3]);

        // Fully consumed streams are revoked
        assert!(matches!(
            manager.get_stream(&ticket).await,
            Err(FlightError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_schema_rejected() {
        let manager = manager();
        let result = manager
            .create_stream(Box::new(BadSchemaProducer {
                schema: Schema::new(vec![]),
            }))
            .await;
        assert!(matches!(result, Err(FlightError::InvalidSchema(_))));
    }

    #[tokio::test]
    async fn test_second_consumer_rejected() {
        let manager = manager();
        let ticket = manager
            .create_stream(Box::new(VecProducer::new(vec![vec![1]])))
            .await
            .unwrap();

        let _stream = manager.get_stream(&ticket).await.unwrap();
        assert!(matches!(
            manager.get_stream(&ticket).await,
            Err(FlightError::AlreadyConsuming(_))
        ));
    }

    #[tokio::test]
    async fn test_close_unblocks_parked_pull() {
        let manager = manager();
        let ticket = manager
            .create_stream(Box::new(PendingProducer {
                schema: Schema::new(vec![Field::new("n", DataType::Int64)]),
            }))
            .await
            .unwrap();

        let mut stream = manager.get_stream(&ticket).await.unwrap();

        let pull = tokio::spawn(async move { stream.next_batch().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        manager.close_stream(&ticket).await;

        let result = tokio::time::timeout(Duration::from_secs(1), pull)
            .await
            .expect("pull should unblock after close")
            .unwrap();
        assert!(matches!(result, Err(FlightError::StreamClosed(_))));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let manager = manager();
        let ticket = manager
            .create_stream(Box::new(VecProducer::new(vec![vec![1]])))
            .await
            .unwrap();

        manager.close_stream(&ticket).await;
        manager.close_stream(&ticket).await;

        assert!(matches!(
            manager.get_stream(&ticket).await,
            Err(FlightError::NotFound(_))
        ));
    }
}
