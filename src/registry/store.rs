//! Stream registry implementation
//!
//! The central per-node table of live streams. Registration mints tickets,
//! resolution serves consumers, revocation tears streams down. A cleanup
//! task sweeps handles that have gone idle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;

use crate::manager::StreamProducer;

use super::config::RegistryConfig;
use super::error::RegistryError;
use super::handle::StreamHandle;
use super::ticket::StreamTicket;

/// Central registry for all live streams on this node
///
/// Thread-safe via `RwLock`: ticket lifecycle transitions (register,
/// revoke, sweep) take the write lock; resolution shares the read lock.
pub struct StreamRegistry {
    /// Id of the node this registry belongs to; stamped into every ticket
    node_id: String,

    /// Map of ticket to live handle
    streams: RwLock<HashMap<StreamTicket, Arc<StreamHandle>>>,

    /// Monotonic stream counter; revoked ids are never reused
    next_stream_id: AtomicU64,

    /// Configuration
    config: RegistryConfig,
}

impl StreamRegistry {
    /// Create a registry with default configuration
    pub fn new(node_id: impl Into<String>) -> Self {
        Self::with_config(node_id, RegistryConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(node_id: impl Into<String>, config: RegistryConfig) -> Self {
        Self {
            node_id: node_id.into(),
            streams: RwLock::new(HashMap::new()),
            next_stream_id: AtomicU64::new(1),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Id of the node this registry belongs to
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Register a producer, minting a fresh ticket
    ///
    /// The capacity check and the insert happen under one write lock, so
    /// the registered count is consistent under concurrent registration.
    pub async fn register(
        &self,
        producer: Box<dyn StreamProducer>,
    ) -> Result<Arc<StreamHandle>, RegistryError> {
        let schema = producer.schema().clone();
        let mut streams = self.streams.write().await;

        if streams.len() >= self.config.max_streams {
            return Err(RegistryError::Exhausted {
                limit: self.config.max_streams,
            });
        }

        let ticket = self.mint_ticket();
        let handle = Arc::new(StreamHandle::new(ticket.clone(), schema, producer));
        streams.insert(ticket.clone(), Arc::clone(&handle));

        tracing::info!(
            ticket = %ticket,
            streams = streams.len(),
            "Stream registered"
        );

        Ok(handle)
    }

    /// Resolve a ticket to its live handle
    pub async fn resolve(&self, ticket: &StreamTicket) -> Result<Arc<StreamHandle>, RegistryError> {
        let streams = self.streams.read().await;
        streams
            .get(ticket)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(ticket.clone()))
    }

    /// Revoke a ticket, cancelling its handle
    ///
    /// Idempotent: revoking an unknown or already-revoked ticket is a
    /// no-op. Any pull parked on the handle is unblocked promptly.
    pub async fn revoke(&self, ticket: &StreamTicket) {
        let removed = {
            let mut streams = self.streams.write().await;
            streams.remove(ticket)
        };

        if let Some(handle) = removed {
            handle.cancel();
            tracing::info!(ticket = %ticket, "Stream revoked");
        }
    }

    /// Number of live streams
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }

    /// Revoke every live stream
    ///
    /// Used on service shutdown after the drain deadline passes.
    pub async fn revoke_all(&self) {
        let drained: Vec<(StreamTicket, Arc<StreamHandle>)> = {
            let mut streams = self.streams.write().await;
            streams.drain().collect()
        };

        for (ticket, handle) in drained {
            handle.cancel();
            tracing::debug!(ticket = %ticket, "Stream revoked at shutdown");
        }
    }

    /// Run the idle sweep once
    ///
    /// Revokes handles with no consumer activity within
    /// `idle_stream_timeout`. A handle whose consumer is parked inside a
    /// batch pull counts as active however long the producer takes.
    pub async fn cleanup(&self) {
        let expired: Vec<(StreamTicket, Arc<StreamHandle>)> = {
            let mut streams = self.streams.write().await;
            let timeout = self.config.idle_stream_timeout;

            let keys: Vec<StreamTicket> = streams
                .iter()
                .filter(|(_, handle)| !handle.is_pulling() && handle.idle_for() > timeout)
                .map(|(ticket, _)| ticket.clone())
                .collect();

            keys.into_iter()
                .filter_map(|ticket| streams.remove(&ticket).map(|h| (ticket, h)))
                .collect()
        };

        for (ticket, handle) in expired {
            handle.cancel();
            tracing::info!(
                ticket = %ticket,
                idle_secs = handle.idle_for().as_secs(),
                "Idle stream revoked by cleanup"
            );
        }
    }

    /// Spawn the background idle sweep
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        let interval = registry.config.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.cleanup().await;
            }
        })
    }

    fn mint_ticket(&self) -> StreamTicket {
        let stream_id = self.next_stream_id.fetch_add(1, Ordering::Relaxed);
        let issued_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        StreamTicket::new(self.node_id.clone(), stream_id, issued_at_ms)
    }
}
