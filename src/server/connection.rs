//! Per-connection serving
//!
//! One accepted connection serves one ticket: handshake, `Get`, then the
//! schema preamble and batches in emission order until end or error. Any
//! failure after the stream is claimed surfaces to the consumer as a
//! terminal `Error` frame and tears the handle down.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;

use crate::batch::encode_batch;
use crate::error::{FlightError, Result};
use crate::manager::StreamManager;
use crate::protocol::{read_frame, server_handshake, write_frame, ErrorCode, Frame};
use crate::registry::StreamTicket;
use crate::server::config::ServerConfig;

/// Serve one accepted connection end-to-end
pub(crate) async fn serve<S>(
    session_id: u64,
    mut io: S,
    config: &ServerConfig,
    manager: &Arc<StreamManager>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    timeout(config.handshake_timeout, server_handshake(&mut io))
        .await
        .map_err(|_| FlightError::Handshake("handshake timed out".into()))??;

    let frame = timeout(config.handshake_timeout, read_frame(&mut io))
        .await
        .map_err(|_| FlightError::Protocol("ticket exchange timed out".into()))??;

    let ticket_bytes = match frame {
        Frame::Get { ticket } => ticket,
        other => {
            let err = FlightError::Protocol(format!("expected Get frame, got {:?}", other));
            send_error(&mut io, &err).await;
            return Err(err);
        }
    };

    let ticket = match StreamTicket::from_bytes(ticket_bytes) {
        Ok(ticket) => ticket,
        Err(e) => {
            send_error(&mut io, &e).await;
            return Err(e);
        }
    };

    let mut stream = match manager.get_stream(&ticket).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::debug!(session_id, ticket = %ticket, error = %e, "Stream request refused");
            send_error(&mut io, &e).await;
            return Ok(());
        }
    };

    let outcome = stream_batches(session_id, &mut io, &mut stream).await;

    if outcome.is_err() {
        // Consumer went away mid-transfer; the sequence is forward-only
        // and non-restartable, so the handle is torn down, not parked.
        manager.close_stream(&ticket).await;
    }

    outcome
}

async fn stream_batches<S>(
    session_id: u64,
    io: &mut S,
    stream: &mut crate::manager::TicketStream,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let schema_json = stream.schema().to_json()?;
    write_frame(io, &Frame::Schema(Bytes::from(schema_json))).await?;

    let mut batches_sent: u64 = 0;
    loop {
        match stream.next_batch().await {
            Ok(Some(batch)) => {
                write_frame(io, &Frame::Batch(encode_batch(&batch))).await?;
                batches_sent += 1;
            }
            Ok(None) => {
                write_frame(io, &Frame::End).await?;
                tracing::debug!(
                    session_id,
                    ticket = %stream.ticket(),
                    batches = batches_sent,
                    "Stream served to completion"
                );
                break;
            }
            Err(e) => {
                // The pull itself already tore the handle down
                tracing::debug!(
                    session_id,
                    ticket = %stream.ticket(),
                    batches = batches_sent,
                    error = %e,
                    "Stream ended with error"
                );
                send_error(io, &e).await;
                break;
            }
        }
    }

    Ok(())
}

/// Best-effort terminal error frame; the peer may already be gone
async fn send_error<S>(io: &mut S, error: &FlightError)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = Frame::Error {
        code: ErrorCode::from_error(error),
        message: error.to_string(),
    };
    if let Err(e) = write_frame(io, &frame).await {
        tracing::debug!(error = %e, "Failed to deliver error frame");
    }
}
