//! Subsystem settings
//!
//! The configuration surface the host node feeds into
//! [`FlightNode::start`](crate::node::FlightNode::start). The enable flag
//! is evaluated exactly once at startup: a disabled subsystem binds no
//! port, starts no pools, and exposes no capability for the rest of the
//! process lifetime.

use std::time::Duration;

use crate::registry::RegistryConfig;
use crate::server::ServerConfig;

/// Top-level settings for the streaming subsystem
#[derive(Debug, Clone)]
pub struct FlightSettings {
    /// Whether the subsystem activates at all
    pub enabled: bool,

    /// Flight service configuration
    pub server: ServerConfig,

    /// Stream registry configuration
    pub registry: RegistryConfig,

    /// Per-node timeout for the discovery fan-out
    pub discovery_timeout: Duration,
}

impl Default for FlightSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            server: ServerConfig::default(),
            registry: RegistryConfig::default(),
            discovery_timeout: Duration::from_secs(5),
        }
    }
}

impl FlightSettings {
    /// Enable or disable the whole subsystem
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the service configuration
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// Set the registry configuration
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// Set the discovery per-node timeout
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }
}
