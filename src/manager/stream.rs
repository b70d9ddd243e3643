//! Ticket streams
//!
//! The consumer-side view of one claimed stream: forward-only, pull
//! driven, non-restartable. Every pull races the handle's cancellation
//! token, so revoking the ticket from any side unblocks a parked pull
//! with a terminal signal instead of hanging it.

use std::sync::Arc;

use crate::batch::{RecordBatch, Schema};
use crate::error::{FlightError, Result};
use crate::registry::{StreamHandle, StreamRegistry, StreamTicket};

use super::producer::StreamProducer;

/// Exclusive, forward-only reader over one ticket's sequence
pub struct TicketStream {
    handle: Arc<StreamHandle>,
    registry: Arc<StreamRegistry>,
    producer: Box<dyn StreamProducer>,
    done: bool,
}

impl TicketStream {
    pub(super) fn new(
        handle: Arc<StreamHandle>,
        registry: Arc<StreamRegistry>,
        producer: Box<dyn StreamProducer>,
    ) -> Self {
        Self {
            handle,
            registry,
            producer,
            done: false,
        }
    }

    /// The ticket being consumed
    pub fn ticket(&self) -> &StreamTicket {
        self.handle.ticket()
    }

    /// The stream's declared schema
    pub fn schema(&self) -> &Schema {
        self.handle.schema()
    }

    /// Pull the next batch, driving the producer
    ///
    /// Suspends until the producer yields, ends, or errors, or until the
    /// ticket is revoked, which surfaces as `StreamClosed`. After the
    /// terminal pull (end or error) the ticket is revoked and every later
    /// pull returns `Ok(None)` or the stored terminal state.
    pub async fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
        if self.done {
            return Ok(None);
        }
        if self.handle.is_cancelled() {
            self.done = true;
            return Err(FlightError::StreamClosed(self.handle.ticket().clone()));
        }

        // A pull parked on a slow producer is active, not idle; the flag
        // keeps the sweep away until the pull resolves
        self.handle.begin_pull();
        let result = tokio::select! {
            _ = self.handle.cancelled() => {
                self.done = true;
                Err(FlightError::StreamClosed(self.handle.ticket().clone()))
            }
            result = self.producer.next_batch() => {
                match result {
                    Ok(Some(batch)) => Ok(Some(batch)),
                    Ok(None) => {
                        self.done = true;
                        self.registry.revoke(self.handle.ticket()).await;
                        Ok(None)
                    }
                    Err(e) => {
                        self.done = true;
                        tracing::warn!(
                            ticket = %self.handle.ticket(),
                            error = %e,
                            "Producer failed, tearing stream down"
                        );
                        self.registry.revoke(self.handle.ticket()).await;
                        Err(e)
                    }
                }
            }
        };
        self.handle.end_pull();
        result
    }
}

impl Drop for TicketStream {
    fn drop(&mut self) {
        // A pull future abandoned mid-flight must not pin the handle as
        // active forever
        self.handle.end_pull();
    }
}

impl std::fmt::Debug for TicketStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketStream")
            .field("ticket", self.handle.ticket())
            .field("done", &self.done)
            .finish()
    }
}
