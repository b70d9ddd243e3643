//! Outbound connections and remote streams

use std::sync::Arc;

use tokio::net::TcpStream;

use crate::batch::{decode_batch, RecordBatch, Schema};
use crate::error::{FlightError, Result};
use crate::protocol::{client_handshake, read_frame, write_frame, ErrorCode, Frame};
use crate::registry::StreamTicket;
use crate::security::{BoxedIo, SecureTransport};

/// Dials flight endpoints
#[derive(Default)]
pub struct FlightClient {
    security: Option<Arc<dyn SecureTransport>>,
}

impl FlightClient {
    /// Client for plaintext endpoints
    pub fn new() -> Self {
        Self { security: None }
    }

    /// Client whose connections are wrapped by the given provider
    pub fn with_security(security: Arc<dyn SecureTransport>) -> Self {
        Self {
            security: Some(security),
        }
    }

    /// Dial an endpoint and complete the handshake
    pub async fn connect(&self, addr: &str) -> Result<FlightConnection> {
        let socket = TcpStream::connect(addr).await?;
        socket.set_nodelay(true).ok();

        let mut io: BoxedIo = match self.security {
            Some(ref provider) => provider.wrap_client(socket).await?,
            None => Box::new(socket),
        };

        client_handshake(&mut io).await?;
        tracing::debug!(addr = %addr, "Flight connection established");

        Ok(FlightConnection { io })
    }
}

/// An established connection, ready for one ticket exchange
pub struct FlightConnection {
    io: BoxedIo,
}

impl FlightConnection {
    /// Exchange the ticket for its stream
    ///
    /// Consumes the connection: the protocol serves one stream per
    /// connection, so there is nothing left to do with it afterwards.
    pub async fn do_get(mut self, ticket: &StreamTicket) -> Result<RemoteStream> {
        write_frame(
            &mut self.io,
            &Frame::Get {
                ticket: ticket.to_bytes(),
            },
        )
        .await?;

        let schema = match read_frame(&mut self.io).await? {
            Frame::Schema(json) => Schema::from_json(&json)?,
            Frame::Error { code, message } => {
                return Err(decode_remote_error(code, message, ticket))
            }
            other => {
                return Err(FlightError::Protocol(format!(
                    "expected Schema frame, got {:?}",
                    other
                )))
            }
        };

        Ok(RemoteStream {
            io: self.io,
            ticket: ticket.clone(),
            schema,
            done: false,
        })
    }
}

/// Forward-only reader over a remote node's stream
pub struct RemoteStream {
    io: BoxedIo,
    ticket: StreamTicket,
    schema: Schema,
    done: bool,
}

impl RemoteStream {
    /// The ticket being consumed
    pub fn ticket(&self) -> &StreamTicket {
        &self.ticket
    }

    /// Schema declared in the stream preamble
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Pull the next batch off the wire
    ///
    /// Batches arrive in the producer's emission order. `Ok(None)` is the
    /// end-of-stream marker; a terminal error frame surfaces as the same
    /// `FlightError` variant the serving node raised.
    pub async fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
        if self.done {
            return Ok(None);
        }

        match read_frame(&mut self.io).await? {
            Frame::Batch(payload) => Ok(Some(decode_batch(&self.schema, payload)?)),
            Frame::End => {
                self.done = true;
                Ok(None)
            }
            Frame::Error { code, message } => {
                self.done = true;
                Err(decode_remote_error(code, message, &self.ticket))
            }
            other => {
                self.done = true;
                Err(FlightError::Protocol(format!(
                    "expected Batch/End/Error frame, got {:?}",
                    other
                )))
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

/// Rebuild the serving node's error from its wire form
fn decode_remote_error(code: ErrorCode, message: String, ticket: &StreamTicket) -> FlightError {
    match code {
        ErrorCode::NotFound => FlightError::NotFound(ticket.clone()),
        ErrorCode::AlreadyConsuming => FlightError::AlreadyConsuming(ticket.clone()),
        ErrorCode::ResourceExhausted => FlightError::ResourceExhausted { limit: 0 },
        ErrorCode::InvalidSchema => FlightError::InvalidSchema(message),
        ErrorCode::Unavailable => FlightError::Unavailable(message),
        ErrorCode::InvalidTicket => FlightError::InvalidTicket(message),
        ErrorCode::StreamClosed => FlightError::StreamClosed(ticket.clone()),
        ErrorCode::Producer => FlightError::Producer(message),
        ErrorCode::Internal => FlightError::Remote(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_mapping() {
        let ticket = StreamTicket::new("node-a", 1, 0);

        assert!(matches!(
            decode_remote_error(ErrorCode::NotFound, String::new(), &ticket),
            FlightError::NotFound(_)
        ));
        assert!(matches!(
            decode_remote_error(ErrorCode::AlreadyConsuming, String::new(), &ticket),
            FlightError::AlreadyConsuming(_)
        ));
        assert!(matches!(
            decode_remote_error(ErrorCode::Internal, "boom".into(), &ticket),
            FlightError::Remote(_)
        ));
    }
}
