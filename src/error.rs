//! Crate-level error types
//!
//! Each subsystem has its own error enum; `FlightError` is the crate-level
//! error returned across public boundaries, with `From` conversions so `?`
//! works everywhere.

use crate::registry::StreamTicket;

/// Convenience result type used throughout the crate
pub type Result<T> = std::result::Result<T, FlightError>;

/// Crate-level error taxonomy
#[derive(Debug)]
pub enum FlightError {
    /// Ticket is unknown, expired, or already revoked
    NotFound(StreamTicket),
    /// A second concurrent consumer attempted to read an exclusive stream
    AlreadyConsuming(StreamTicket),
    /// Registry is at its configured stream ceiling
    ResourceExhausted {
        /// Configured maximum number of live streams
        limit: usize,
    },
    /// Producer declared a malformed schema
    InvalidSchema(String),
    /// Feature disabled or service not bound
    Unavailable(String),
    /// Stream was closed while a consumer was waiting on it
    StreamClosed(StreamTicket),
    /// Ticket bytes did not decode
    InvalidTicket(String),
    /// Peer violated the wire protocol
    Protocol(String),
    /// Handshake with the peer failed (bad magic or version)
    Handshake(String),
    /// Producer reported a failure mid-stream
    Producer(String),
    /// Remote side reported an error the local taxonomy doesn't model
    Remote(String),
    /// Underlying socket error
    Io(std::io::Error),
}

impl std::fmt::Display for FlightError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightError::NotFound(ticket) => write!(f, "Stream not found: {}", ticket),
            FlightError::AlreadyConsuming(ticket) => {
                write!(f, "Stream already has a consumer: {}", ticket)
            }
            FlightError::ResourceExhausted { limit } => {
                write!(f, "Stream registry at capacity ({} streams)", limit)
            }
            FlightError::InvalidSchema(reason) => write!(f, "Invalid schema: {}", reason),
            FlightError::Unavailable(reason) => write!(f, "Flight service unavailable: {}", reason),
            FlightError::StreamClosed(ticket) => write!(f, "Stream closed: {}", ticket),
            FlightError::InvalidTicket(reason) => write!(f, "Invalid ticket: {}", reason),
            FlightError::Protocol(reason) => write!(f, "Protocol error: {}", reason),
            FlightError::Handshake(reason) => write!(f, "Handshake failed: {}", reason),
            FlightError::Producer(reason) => write!(f, "Producer error: {}", reason),
            FlightError::Remote(reason) => write!(f, "Remote error: {}", reason),
            FlightError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for FlightError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FlightError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FlightError {
    fn from(e: std::io::Error) -> Self {
        FlightError::Io(e)
    }
}

impl From<crate::registry::RegistryError> for FlightError {
    fn from(e: crate::registry::RegistryError) -> Self {
        use crate::registry::RegistryError;
        match e {
            RegistryError::NotFound(ticket) => FlightError::NotFound(ticket),
            RegistryError::AlreadyConsuming(ticket) => FlightError::AlreadyConsuming(ticket),
            RegistryError::Exhausted { limit } => FlightError::ResourceExhausted { limit },
        }
    }
}
