//! Client manager
//!
//! The node-to-node consumption path: given a ticket and the id of the
//! node that minted it, resolve that node's endpoint through the
//! directory (running a discovery round on a miss) and open the stream.
//! The connection and its whole read loop run on the dedicated client
//! pool; batches reach the caller over a bounded channel, keeping the
//! bulk transfer off the host node's general pools.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::batch::{RecordBatch, Schema};
use crate::client::connection::FlightClient;
use crate::discovery::{EndpointDirectory, NodesFlightInfo};
use crate::error::{FlightError, Result};
use crate::registry::StreamTicket;
use crate::security::SecureTransport;
use crate::server::FlightThreadPool;

/// In-flight batches buffered between the pump and the caller
const BATCH_CHANNEL_CAPACITY: usize = 8;

/// Opens remote streams by node id, via directory lookup
pub struct FlightClientManager {
    directory: Arc<EndpointDirectory>,
    discovery: Arc<NodesFlightInfo>,
    pool: Arc<FlightThreadPool>,
    security: Option<Arc<dyn SecureTransport>>,
}

impl FlightClientManager {
    /// Create the manager
    pub fn new(
        directory: Arc<EndpointDirectory>,
        discovery: Arc<NodesFlightInfo>,
        pool: Arc<FlightThreadPool>,
        security: Option<Arc<dyn SecureTransport>>,
    ) -> Self {
        Self {
            directory,
            discovery,
            pool,
            security,
        }
    }

    /// Resolve `node_id`'s endpoint, refreshing the directory on a miss
    pub async fn resolve_endpoint(
        &self,
        node_id: &str,
    ) -> Result<crate::discovery::EndpointDescriptor> {
        if let Some(descriptor) = self.directory.lookup(node_id) {
            return Ok(descriptor);
        }

        tracing::debug!(node = %node_id, "Endpoint not cached, running discovery");
        let response = self.discovery.collect().await;
        self.directory.apply(&response);

        self.directory.lookup(node_id).ok_or_else(|| {
            let reason = response
                .failures
                .iter()
                .find(|f| f.node_id == node_id)
                .map(|f| f.reason.clone())
                .unwrap_or_else(|| "node not in cluster".to_owned());
            FlightError::Unavailable(format!("no flight endpoint for {}: {}", node_id, reason))
        })
    }

    /// Open the stream addressed by `ticket` on the node that minted it
    ///
    /// The connection is dialed and read to completion on the client
    /// pool; the returned stream hands batches over as they arrive. After
    /// the subsystem closes this fails with `Unavailable`.
    pub async fn stream_from(&self, node_id: &str, ticket: &StreamTicket) -> Result<ClientStream> {
        let descriptor = self.resolve_endpoint(node_id).await?;
        let addr = descriptor.address();
        let security = self.security.clone();
        let ticket = ticket.clone();

        let (ready_tx, ready_rx) = oneshot::channel();
        let (batch_tx, batch_rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);

        let pump_ticket = ticket.clone();
        let _pump = self.pool.spawn(async move {
            let client = match security {
                Some(provider) => FlightClient::with_security(provider),
                None => FlightClient::new(),
            };
            let opened = async {
                let connection = client.connect(&addr).await?;
                connection.do_get(&pump_ticket).await
            }
            .await;

            let mut stream = match opened {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(stream.schema().clone()));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            loop {
                match stream.next_batch().await {
                    Ok(Some(batch)) => {
                        // A dropped receiver means the caller lost interest
                        if batch_tx.send(Ok(batch)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = batch_tx.send(Err(e)).await;
                        break;
                    }
                }
            }
        })?;

        let schema = ready_rx
            .await
            .map_err(|_| FlightError::Unavailable("client pool task failed".into()))??;

        Ok(ClientStream {
            ticket,
            schema,
            batches: batch_rx,
            done: false,
        })
    }
}

/// Forward-only reader over a remote stream pumped on the client pool
pub struct ClientStream {
    ticket: StreamTicket,
    schema: Schema,
    batches: mpsc::Receiver<Result<RecordBatch>>,
    done: bool,
}

impl ClientStream {
    /// The ticket being consumed
    pub fn ticket(&self) -> &StreamTicket {
        &self.ticket
    }

    /// Schema declared in the stream preamble
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Receive the next batch, in the producer's emission order
    ///
    /// `Ok(None)` is the end-of-stream marker; a terminal error from the
    /// serving node surfaces as the matching `FlightError` variant.
    pub async fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
        if self.done {
            return Ok(None);
        }

        match self.batches.recv().await {
            Some(Ok(batch)) => Ok(Some(batch)),
            Some(Err(e)) => {
                self.done = true;
                Err(e)
            }
            None => {
                self.done = true;
                Ok(None)
            }
        }
    }

    /// Drain the rest of the stream, collecting every remaining batch
    pub async fn collect(mut self) -> Result<Vec<RecordBatch>> {
        let mut batches = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            batches.push(batch);
        }
        Ok(batches)
    }
}

impl std::fmt::Debug for ClientStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientStream")
            .field("ticket", &self.ticket)
            .field("done", &self.done)
            .finish()
    }
}
