//! Transport security seam
//!
//! Encryption and mutual verification are a deployment-time decision made
//! by the host: if a provider is configured, every accepted and dialed
//! connection is wrapped before any ticket exchange; if not, the service
//! runs in plain form. The mode is never negotiated at runtime, and this
//! crate never links a TLS implementation: it consumes the provider as a
//! capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Whether a node's flight endpoint expects wrapped connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Connections are served as-is
    Plaintext,
    /// Connections are wrapped by the configured provider
    Tls,
}

impl std::fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityMode::Plaintext => write!(f, "plaintext"),
            SecurityMode::Tls => write!(f, "tls"),
        }
    }
}

/// Object-safe async IO, what a wrapped connection looks like to the codec
pub trait AsyncIo: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncIo for T {}

/// Boxed connection, plain or wrapped
pub type BoxedIo = Box<dyn AsyncIo>;

/// Injected transport-security provider
#[async_trait]
pub trait SecureTransport: Send + Sync {
    /// Wrap an accepted connection (server side of the TLS handshake)
    async fn wrap_server(&self, stream: TcpStream) -> std::io::Result<BoxedIo>;

    /// Wrap a dialed connection (client side of the TLS handshake)
    async fn wrap_client(&self, stream: TcpStream) -> std::io::Result<BoxedIo>;
}
