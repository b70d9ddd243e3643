//! Node composition
//!
//! One startup routine wires the subsystem in dependency order
//! (registry, stream manager, executor pools, flight service, endpoint
//! directory, discovery action), passing references explicitly. There is
//! no ambient or global lookup; everything the core needs from the host
//! (membership view, internal channel, security provider) is injected
//! here.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::client::FlightClientManager;
use crate::cluster::{ClusterView, FlightInfoChannel};
use crate::config::FlightSettings;
use crate::discovery::{EndpointDirectory, NodesFlightInfo};
use crate::error::{FlightError, Result};
use crate::manager::StreamManager;
use crate::registry::StreamRegistry;
use crate::security::SecureTransport;
use crate::server::{FlightService, FlightThreadPool, ServiceState};

/// The assembled streaming subsystem of one node
///
/// When the feature flag is off, or the configured port cannot be bound,
/// the node comes up without the streaming capability: accessors return
/// `Unavailable` and nothing is listening. Downstream code may treat the
/// capability as statically present or absent for the process lifetime.
pub struct FlightNode {
    directory: Arc<EndpointDirectory>,
    manager: Option<Arc<StreamManager>>,
    service: Option<Arc<FlightService>>,
    discovery: Option<Arc<NodesFlightInfo>>,
    clients: Option<Arc<FlightClientManager>>,
    server_pool: Option<Arc<FlightThreadPool>>,
    client_pool: Option<Arc<FlightThreadPool>>,
    cleanup_task: Mutex<Option<JoinHandle<()>>>,
}

impl FlightNode {
    /// Construct and start the subsystem
    ///
    /// With the feature disabled this returns a node whose capability
    /// accessors fail with `Unavailable`. A bind failure on the
    /// configured port is reported in the log and degrades the node the
    /// same way; the host process is never crashed by it.
    pub async fn start(
        settings: FlightSettings,
        cluster: Arc<dyn ClusterView>,
        info_channel: Arc<dyn FlightInfoChannel>,
        security: Option<Arc<dyn SecureTransport>>,
    ) -> Result<Self> {
        let node_id = cluster.local_node_id();
        let directory = Arc::new(EndpointDirectory::new(&node_id));

        if !settings.enabled {
            tracing::info!(node = %node_id, "Flight streams disabled, subsystem not started");
            return Ok(Self::disabled(directory));
        }

        let registry = Arc::new(StreamRegistry::with_config(
            &node_id,
            settings.registry.clone(),
        ));
        let manager = Arc::new(StreamManager::new(Arc::clone(&registry)));

        let server_pool = Arc::new(FlightThreadPool::new(
            "server",
            settings.server.server_threads,
        )?);
        let client_pool = Arc::new(FlightThreadPool::new(
            "client",
            settings.server.client_threads,
        )?);

        let service = Arc::new(FlightService::new(
            settings.server.clone(),
            Arc::clone(&manager),
            Arc::clone(&directory),
            security.clone(),
            Arc::clone(&server_pool),
        ));

        if let Err(e) = service.start().await {
            tracing::error!(
                node = %node_id,
                error = %e,
                "Flight service failed to start, subsystem unavailable"
            );
            server_pool.shutdown();
            client_pool.shutdown();
            return Ok(Self::disabled(directory));
        }

        // The idle sweep lives on the dedicated serving pool
        let pool_handle = server_pool.handle()?;
        let cleanup_task = {
            let _guard = pool_handle.enter();
            registry.spawn_cleanup_task()
        };

        let discovery = Arc::new(NodesFlightInfo::new(
            Arc::clone(&cluster),
            info_channel,
            settings.discovery_timeout,
        ));
        let clients = Arc::new(FlightClientManager::new(
            Arc::clone(&directory),
            Arc::clone(&discovery),
            Arc::clone(&client_pool),
            security,
        ));

        tracing::info!(node = %node_id, "Flight subsystem started");

        Ok(Self {
            directory,
            manager: Some(manager),
            service: Some(service),
            discovery: Some(discovery),
            clients: Some(clients),
            server_pool: Some(server_pool),
            client_pool: Some(client_pool),
            cleanup_task: Mutex::new(Some(cleanup_task)),
        })
    }

    fn disabled(directory: Arc<EndpointDirectory>) -> Self {
        Self {
            directory,
            manager: None,
            service: None,
            discovery: None,
            clients: None,
            server_pool: None,
            client_pool: None,
            cleanup_task: Mutex::new(None),
        }
    }

    /// Whether the streaming capability is present
    pub fn is_enabled(&self) -> bool {
        self.manager.is_some()
    }

    /// The produce/consume capability
    pub fn stream_manager(&self) -> Result<Arc<StreamManager>> {
        self.manager
            .clone()
            .ok_or_else(|| FlightError::Unavailable("flight streams are not enabled".into()))
    }

    /// The node-to-node consumption capability
    pub fn client_manager(&self) -> Result<Arc<FlightClientManager>> {
        self.clients
            .clone()
            .ok_or_else(|| FlightError::Unavailable("flight streams are not enabled".into()))
    }

    /// The endpoint directory (present even when disabled, always empty then)
    pub fn directory(&self) -> &Arc<EndpointDirectory> {
        &self.directory
    }

    /// The discovery action, when enabled
    pub fn discovery(&self) -> Result<Arc<NodesFlightInfo>> {
        self.discovery
            .clone()
            .ok_or_else(|| FlightError::Unavailable("flight streams are not enabled".into()))
    }

    /// Service lifecycle state, when enabled
    pub fn service_state(&self) -> Option<ServiceState> {
        self.service.as_ref().map(|s| s.state())
    }

    /// The bound listener address, when serving
    pub fn bound_addr(&self) -> Option<SocketAddr> {
        self.service.as_ref().and_then(|s| s.bound_addr())
    }

    /// Shut the subsystem down
    ///
    /// Ordering is the exit contract: the service closes (drain, then
    /// force-close) before its executor pools are released. Idempotent.
    pub async fn close(&self) {
        if let Some(task) = self
            .cleanup_task
            .lock()
            .expect("cleanup task lock poisoned")
            .take()
        {
            task.abort();
        }

        if let Some(ref service) = self.service {
            service.close().await;
        }

        if let Some(ref pool) = self.server_pool {
            pool.shutdown();
        }
        if let Some(ref pool) = self.client_pool {
            pool.shutdown();
        }
    }
}

impl std::fmt::Debug for FlightNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightNode")
            .field("enabled", &self.is_enabled())
            .field("state", &self.service_state())
            .field("bound_addr", &self.bound_addr())
            .finish()
    }
}
