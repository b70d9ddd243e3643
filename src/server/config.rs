//! Server configuration

use std::time::Duration;

/// Flight service configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind on
    pub bind_host: String,

    /// Port to bind; `None` falls back to an ephemeral port
    pub port: Option<u16>,

    /// Host advertised in the endpoint descriptor; defaults to the bind host
    pub advertise_host: Option<String>,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Handshake and ticket exchange must complete within this time
    pub handshake_timeout: Duration,

    /// How long `close()` waits for in-flight transfers before force-closing
    pub drain_grace: Duration,

    /// Worker threads in the dedicated serving pool
    pub server_threads: usize,

    /// Worker threads in the outbound client pool
    pub client_threads: usize,

    /// Enable TCP_NODELAY on accepted sockets
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_owned(),
            port: None,
            advertise_host: None,
            max_connections: 0, // Unlimited
            handshake_timeout: Duration::from_secs(10),
            drain_grace: Duration::from_secs(10),
            server_threads: 2,
            client_threads: 2,
            tcp_nodelay: true,
        }
    }
}

impl ServerConfig {
    /// Set the bind host
    pub fn bind_host(mut self, host: impl Into<String>) -> Self {
        self.bind_host = host.into();
        self
    }

    /// Set a fixed port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the advertised host
    pub fn advertise_host(mut self, host: impl Into<String>) -> Self {
        self.advertise_host = Some(host.into());
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the drain grace period
    pub fn drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Set the serving pool size
    pub fn server_threads(mut self, threads: usize) -> Self {
        self.server_threads = threads;
        self
    }

    /// Set the client pool size
    pub fn client_threads(mut self, threads: usize) -> Self {
        self.client_threads = threads;
        self
    }

    /// The address string to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port.unwrap_or(0))
    }

    /// The host to advertise in the endpoint descriptor
    pub fn advertised_host(&self) -> &str {
        self.advertise_host.as_deref().unwrap_or(&self.bind_host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_host, "0.0.0.0");
        assert_eq!(config.port, None);
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.server_threads, 2);
        assert_eq!(config.client_threads, 2);
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_unset_port_binds_ephemeral() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:0");
    }

    #[test]
    fn test_advertised_host_falls_back_to_bind_host() {
        let config = ServerConfig::default().bind_host("10.0.0.5");
        assert_eq!(config.advertised_host(), "10.0.0.5");

        let config = config.advertise_host("search-node-1.internal");
        assert_eq!(config.advertised_host(), "search-node-1.internal");
    }

    #[test]
    fn test_builder_chaining() {
        let config = ServerConfig::default()
            .bind_host("127.0.0.1")
            .port(47470)
            .max_connections(64)
            .handshake_timeout(Duration::from_secs(5))
            .drain_grace(Duration::from_secs(2))
            .server_threads(4)
            .client_threads(1);

        assert_eq!(config.bind_address(), "127.0.0.1:47470");
        assert_eq!(config.max_connections, 64);
        assert_eq!(config.handshake_timeout, Duration::from_secs(5));
        assert_eq!(config.drain_grace, Duration::from_secs(2));
        assert_eq!(config.server_threads, 4);
        assert_eq!(config.client_threads, 1);
    }
}
