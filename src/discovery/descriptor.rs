//! Endpoint descriptors

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::security::SecurityMode;

/// A node's address, port and security metadata for the streaming service
///
/// One per node. Mutated only by that node's flight service on bind or
/// rebind; every other node sees it through discovery, lookup only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Owning node's id
    pub node_id: String,
    /// Host the service is bound on
    pub host: String,
    /// Bound port (the ephemeral one if no port was configured)
    pub port: u16,
    /// Whether connections must be security-wrapped
    pub security_mode: SecurityMode,
}

impl EndpointDescriptor {
    /// Create a descriptor
    pub fn new(
        node_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        security_mode: SecurityMode,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            host: host.into(),
            port,
            security_mode,
        }
    }

    /// Socket address string for dialing
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse into a `SocketAddr` when the host is a literal IP
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.address().parse().ok()
    }
}

impl std::fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}:{} ({})",
            self.node_id, self.host, self.port, self.security_mode
        )
    }
}
