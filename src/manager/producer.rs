//! Producer trait
//!
//! A producer is a sequence-emitting resource: the query engine (or any
//! other data source) implements this trait and hands the boxed producer
//! to the manager. Production may run on whatever pool the producer
//! chooses; the manager never assumes producer and consumer share a
//! thread.

use async_trait::async_trait;

use crate::batch::{RecordBatch, Schema};
use crate::error::Result;

/// A lazy source of schema-conforming record batches
///
/// Pulling is what drives production: `next_batch` is only called when a
/// consumer wants the next chunk, and it may suspend until data is
/// available.
#[async_trait]
pub trait StreamProducer: Send + 'static {
    /// The schema every emitted batch conforms to
    fn schema(&self) -> &Schema;

    /// Produce the next batch
    ///
    /// `Ok(None)` signals normal end of stream; an error is terminal and
    /// tears the stream down.
    async fn next_batch(&mut self) -> Result<Option<RecordBatch>>;
}
