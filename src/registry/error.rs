//! Registry error types

use super::ticket::StreamTicket;

/// Error type for registry operations
#[derive(Debug, Clone)]
pub enum RegistryError {
    /// Ticket is unknown or already revoked
    NotFound(StreamTicket),
    /// The stream's producer has already been claimed by a consumer
    AlreadyConsuming(StreamTicket),
    /// Registry is at its configured stream ceiling
    Exhausted {
        /// Configured maximum number of live streams
        limit: usize,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::NotFound(ticket) => write!(f, "Stream not found: {}", ticket),
            RegistryError::AlreadyConsuming(ticket) => {
                write!(f, "Stream already has a consumer: {}", ticket)
            }
            RegistryError::Exhausted { limit } => {
                write!(f, "Stream registry at capacity ({} streams)", limit)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
