//! Stream handles
//!
//! A handle is the server-side binding of a ticket to its live producer.
//! The producer sits in a take-once slot: claiming it is how a consumer
//! acquires exclusive read access, and an empty slot is what a second
//! concurrent consumer observes as `AlreadyConsuming`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::batch::Schema;
use crate::manager::StreamProducer;

use super::error::RegistryError;
use super::ticket::StreamTicket;

/// Server-side binding of a ticket to a live producer
pub struct StreamHandle {
    ticket: StreamTicket,
    schema: Schema,

    /// Take-once producer slot; emptied by the first successful claim
    producer: Mutex<Option<Box<dyn StreamProducer>>>,

    /// Cancelled on revoke; unblocks any pull parked on this stream
    cancel: CancellationToken,

    /// True while a consumer is parked inside a batch pull; the idle
    /// sweep must not reap a stream that is merely waiting on a slow
    /// producer
    pulling: AtomicBool,

    /// Updated on claim and around every batch pull; drives the idle sweep
    last_activity: Mutex<Instant>,
}

impl StreamHandle {
    pub(super) fn new(
        ticket: StreamTicket,
        schema: Schema,
        producer: Box<dyn StreamProducer>,
    ) -> Self {
        Self {
            ticket,
            schema,
            producer: Mutex::new(Some(producer)),
            cancel: CancellationToken::new(),
            pulling: AtomicBool::new(false),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// The ticket this handle is bound to
    pub fn ticket(&self) -> &StreamTicket {
        &self.ticket
    }

    /// The producer's declared schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Claim the producer for exclusive consumption
    ///
    /// The first claim takes the producer out of the slot; any later claim
    /// fails with `AlreadyConsuming`.
    pub fn claim(&self) -> Result<Box<dyn StreamProducer>, RegistryError> {
        let mut slot = self.producer.lock().expect("producer slot poisoned");
        match slot.take() {
            Some(producer) => {
                self.touch();
                Ok(producer)
            }
            None => Err(RegistryError::AlreadyConsuming(self.ticket.clone())),
        }
    }

    /// Whether the producer has been claimed
    pub fn is_claimed(&self) -> bool {
        self.producer.lock().expect("producer slot poisoned").is_none()
    }

    /// Record consumer activity
    pub fn touch(&self) {
        *self.last_activity.lock().expect("activity clock poisoned") = Instant::now();
    }

    /// Mark a batch pull as in flight
    pub(crate) fn begin_pull(&self) {
        self.pulling.store(true, Ordering::Relaxed);
        self.touch();
    }

    /// Mark the in-flight batch pull as finished
    pub(crate) fn end_pull(&self) {
        self.pulling.store(false, Ordering::Relaxed);
        self.touch();
    }

    /// Whether a consumer is currently parked inside a pull
    pub fn is_pulling(&self) -> bool {
        self.pulling.load(Ordering::Relaxed)
    }

    /// Time since the last consumer activity
    pub fn idle_for(&self) -> Duration {
        self.last_activity
            .lock()
            .expect("activity clock poisoned")
            .elapsed()
    }

    /// Cancel the handle, unblocking any parked pull
    pub(super) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the handle has been revoked
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the handle is revoked
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("ticket", &self.ticket)
            .field("claimed", &self.is_claimed())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{DataType, Field, RecordBatch, Schema};
    use crate::error::Result;
    use async_trait::async_trait;

    struct EmptyProducer {
        schema: Schema,
    }

    #[async_trait]
    impl StreamProducer for EmptyProducer {
        fn schema(&self) -> &Schema {
            &self.schema
        }

        async fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
            Ok(None)
        }
    }

    fn handle() -> StreamHandle {
        let schema = Schema::new(vec![Field::new("id", DataType::Int64)]);
        StreamHandle::new(
            StreamTicket::new("node-a", 1, 0),
            schema.clone(),
            Box::new(EmptyProducer { schema }),
        )
    }

    #[test]
    fn test_claim_is_exclusive() {
        let handle = handle();
        assert!(!handle.is_claimed());

        assert!(handle.claim().is_ok());
        assert!(handle.is_claimed());

        assert!(matches!(
            handle.claim(),
            Err(RegistryError::AlreadyConsuming(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_unblocks_waiter() {
        let handle = std::sync::Arc::new(handle());

        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.cancelled().await })
        };

        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should unblock")
            .unwrap();
        assert!(handle.is_cancelled());
    }
}
