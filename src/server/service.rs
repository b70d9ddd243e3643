//! Flight service lifecycle and accept loop

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Semaphore};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::discovery::{EndpointDescriptor, EndpointDirectory};
use crate::error::{FlightError, Result};
use crate::manager::StreamManager;
use crate::security::SecureTransport;
use crate::server::config::ServerConfig;
use crate::server::connection;
use crate::server::executor::FlightThreadPool;

/// Service lifecycle state
///
/// Transitions are one-directional; `Closed` is terminal and releases the
/// bound port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Constructed, not yet bound
    Uninitialized,
    /// Listener bound, accept loop not yet running
    Bound,
    /// Accepting and serving streams
    Serving,
    /// Draining in-flight transfers
    Closing,
    /// Port released; terminal
    Closed,
}

/// The network-facing streaming server
pub struct FlightService {
    config: ServerConfig,
    manager: Arc<StreamManager>,
    directory: Arc<EndpointDirectory>,
    security: Option<Arc<dyn SecureTransport>>,
    pool: Arc<FlightThreadPool>,

    state: Mutex<ServiceState>,
    bound_addr: Mutex<Option<SocketAddr>>,
    accept_cancel: CancellationToken,
    transfers: TaskTracker,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl FlightService {
    /// Create the service; nothing is bound until [`FlightService::start`]
    pub fn new(
        config: ServerConfig,
        manager: Arc<StreamManager>,
        directory: Arc<EndpointDirectory>,
        security: Option<Arc<dyn SecureTransport>>,
        pool: Arc<FlightThreadPool>,
    ) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            manager,
            directory,
            security,
            pool,
            state: Mutex::new(ServiceState::Uninitialized),
            bound_addr: Mutex::new(None),
            accept_cancel: CancellationToken::new(),
            transfers: TaskTracker::new(),
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServiceState {
        *self.state.lock().expect("state lock poisoned")
    }

    /// The bound address, once serving
    pub fn bound_addr(&self) -> Option<SocketAddr> {
        *self.bound_addr.lock().expect("addr lock poisoned")
    }

    /// Security mode advertised in the endpoint descriptor
    pub fn security_mode(&self) -> crate::security::SecurityMode {
        if self.security.is_some() {
            crate::security::SecurityMode::Tls
        } else {
            crate::security::SecurityMode::Plaintext
        }
    }

    /// Bind the listener and start serving
    ///
    /// Binds the configured address, falling back to an ephemeral port if
    /// none is set, then publishes the local endpoint descriptor. A bind
    /// failure is returned to the operator; the service stays unbound and
    /// the host process is not crashed.
    pub async fn start(self: &Arc<Self>) -> Result<SocketAddr> {
        {
            let state = self.state.lock().expect("state lock poisoned");
            if *state != ServiceState::Uninitialized {
                return Err(FlightError::Unavailable(format!(
                    "service cannot start from {:?}",
                    *state
                )));
            }
        }

        let bind_address = self.config.bind_address();
        let (addr_tx, addr_rx) = oneshot::channel();

        let service = Arc::clone(self);
        let _accept_task = self.pool.spawn(async move {
            let listener = match TcpListener::bind(&bind_address).await {
                Ok(listener) => listener,
                Err(e) => {
                    let _ = addr_tx.send(Err(e));
                    return;
                }
            };
            let addr = match listener.local_addr() {
                Ok(addr) => addr,
                Err(e) => {
                    let _ = addr_tx.send(Err(e));
                    return;
                }
            };
            let _ = addr_tx.send(Ok(addr));
            service.accept_loop(listener).await;
        })?;

        let addr = match addr_rx.await {
            Ok(Ok(addr)) => addr,
            Ok(Err(e)) => {
                tracing::error!(
                    addr = %self.config.bind_address(),
                    error = %e,
                    "Failed to bind flight listener"
                );
                return Err(FlightError::Io(e));
            }
            Err(_) => {
                return Err(FlightError::Unavailable(
                    "server pool dropped during bind".into(),
                ));
            }
        };

        {
            let mut state = self.state.lock().expect("state lock poisoned");
            *state = ServiceState::Bound;
            *self.bound_addr.lock().expect("addr lock poisoned") = Some(addr);
            *state = ServiceState::Serving;
        }

        let descriptor = EndpointDescriptor::new(
            self.manager.node_id(),
            self.config.advertised_host(),
            addr.port(),
            self.security_mode(),
        );
        self.directory.set_local(descriptor);

        tracing::info!(addr = %addr, "Flight service listening");
        Ok(addr)
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        loop {
            tokio::select! {
                _ = self.accept_cancel.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer_addr)) => {
                        self.handle_connection(socket, peer_addr);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to accept connection");
                    }
                }
            }
        }
        // Listener drops here, releasing the port
        tracing::debug!("Flight accept loop stopped");
    }

    fn handle_connection(self: &Arc<Self>, socket: TcpStream, peer_addr: SocketAddr) {
        let _permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(session_id, peer = %peer_addr, "New flight connection");

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::debug!(session_id, error = %e, "Failed to set TCP_NODELAY");
            }
        }

        let service = Arc::clone(self);
        self.transfers.spawn(async move {
            let _permit = _permit;
            let result = match service.security {
                Some(ref provider) => match provider.wrap_server(socket).await {
                    Ok(io) => connection::serve(session_id, io, &service.config, &service.manager).await,
                    Err(e) => {
                        tracing::debug!(session_id, error = %e, "Security wrap failed");
                        return;
                    }
                },
                None => connection::serve(session_id, socket, &service.config, &service.manager).await,
            };

            match result {
                Ok(()) => tracing::debug!(session_id, "Connection closed"),
                Err(e) => tracing::debug!(session_id, error = %e, "Connection error"),
            }
        });
    }

    /// Stop accepting, drain, force-close stragglers, release the port
    ///
    /// Idempotent and safe to call from any state, including repeatedly
    /// and from shutdown hooks. After the drain grace period passes, all
    /// remaining stream handles are revoked, which unblocks their serving
    /// tasks promptly.
    pub async fn close(&self) {
        {
            let mut state = self.state.lock().expect("state lock poisoned");
            match *state {
                ServiceState::Closing | ServiceState::Closed => return,
                ServiceState::Uninitialized => {
                    *state = ServiceState::Closed;
                    return;
                }
                ServiceState::Bound | ServiceState::Serving => {
                    *state = ServiceState::Closing;
                }
            }
        }

        tracing::info!("Flight service closing");
        self.accept_cancel.cancel();
        self.transfers.close();

        if timeout(self.config.drain_grace, self.transfers.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                grace_secs = self.config.drain_grace.as_secs(),
                "Drain deadline passed, force-closing remaining streams"
            );
            self.manager.registry().revoke_all().await;
            // Revocation unblocks the serving tasks; give them a moment
            // to write their terminal frames.
            let _ = timeout(std::time::Duration::from_secs(1), self.transfers.wait()).await;
        }

        self.directory.clear_local();
        *self.bound_addr.lock().expect("addr lock poisoned") = None;
        *self.state.lock().expect("state lock poisoned") = ServiceState::Closed;
        tracing::info!("Flight service closed");
    }
}

impl std::fmt::Debug for FlightService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightService")
            .field("state", &self.state())
            .field("bound_addr", &self.bound_addr())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StreamRegistry;

    fn service() -> Arc<FlightService> {
        let registry = Arc::new(StreamRegistry::new("node-a"));
        let manager = Arc::new(StreamManager::new(registry));
        let directory = Arc::new(EndpointDirectory::new("node-a"));
        let pool = Arc::new(FlightThreadPool::new("server-test", 1).unwrap());
        Arc::new(FlightService::new(
            ServerConfig::default().bind_host("127.0.0.1"),
            manager,
            directory,
            None,
            pool,
        ))
    }

    #[tokio::test]
    async fn test_ephemeral_bind_publishes_descriptor() {
        let service = service();
        assert_eq!(service.state(), ServiceState::Uninitialized);

        let addr = service.start().await.unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(service.state(), ServiceState::Serving);

        let descriptor = service.directory.local().expect("descriptor published");
        assert_eq!(descriptor.port, addr.port());
        assert_eq!(descriptor.node_id, "node-a");

        service.close().await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_terminal() {
        let service = service();
        service.start().await.unwrap();

        service.close().await;
        assert_eq!(service.state(), ServiceState::Closed);
        assert!(service.bound_addr().is_none());
        assert!(service.directory.local().is_none());

        // Second close is a no-op
        service.close().await;
        assert_eq!(service.state(), ServiceState::Closed);

        // A closed service never restarts
        assert!(matches!(
            service.start().await,
            Err(FlightError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_close_before_start() {
        let service = service();
        service.close().await;
        assert_eq!(service.state(), ServiceState::Closed);
    }

    #[tokio::test]
    async fn test_bind_failure_reported_not_fatal() {
        let registry = Arc::new(StreamRegistry::new("node-a"));
        let manager = Arc::new(StreamManager::new(registry));
        let directory = Arc::new(EndpointDirectory::new("node-a"));
        let pool = Arc::new(FlightThreadPool::new("server-test", 1).unwrap());

        // Occupy a port, then ask the service to bind it
        let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let taken = blocker.local_addr().unwrap().port();

        let service = Arc::new(FlightService::new(
            ServerConfig::default().bind_host("127.0.0.1").port(taken),
            manager,
            directory.clone(),
            None,
            pool,
        ));

        assert!(matches!(service.start().await, Err(FlightError::Io(_))));
        assert!(directory.local().is_none());
    }
}
