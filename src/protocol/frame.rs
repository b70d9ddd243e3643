//! Frame codec
//!
//! Every frame is `[type u8][length u32 BE][payload]`. Payload length is
//! bounded; a peer announcing more than [`MAX_FRAME_LEN`] is cut off
//! before any allocation happens.
//!
//! Frame types:
//!
//! | type | name   | payload                      |
//! |------|--------|------------------------------|
//! | 0x01 | Get    | opaque ticket bytes          |
//! | 0x02 | Schema | schema JSON                  |
//! | 0x03 | Batch  | encoded record batch         |
//! | 0x04 | End    | empty                        |
//! | 0x05 | Error  | `[code u8][utf8 message]`    |

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{FlightError, Result};

/// Upper bound on a single frame's payload
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

const TYPE_GET: u8 = 0x01;
const TYPE_SCHEMA: u8 = 0x02;
const TYPE_BATCH: u8 = 0x03;
const TYPE_END: u8 = 0x04;
const TYPE_ERROR: u8 = 0x05;

/// Error codes carried in `Error` frames
///
/// These map one-to-one onto the crate error taxonomy so a failure on the
/// serving node surfaces as the same variant on the consuming node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Unknown or revoked ticket
    NotFound = 1,
    /// Ticket already claimed by another consumer
    AlreadyConsuming = 2,
    /// Registry at capacity
    ResourceExhausted = 3,
    /// Malformed schema
    InvalidSchema = 4,
    /// Feature disabled or service not serving
    Unavailable = 5,
    /// Ticket bytes did not decode
    InvalidTicket = 6,
    /// Stream torn down mid-transfer
    StreamClosed = 7,
    /// Producer failed mid-stream
    Producer = 8,
    /// Anything else
    Internal = 9,
}

impl ErrorCode {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(ErrorCode::NotFound),
            2 => Some(ErrorCode::AlreadyConsuming),
            3 => Some(ErrorCode::ResourceExhausted),
            4 => Some(ErrorCode::InvalidSchema),
            5 => Some(ErrorCode::Unavailable),
            6 => Some(ErrorCode::InvalidTicket),
            7 => Some(ErrorCode::StreamClosed),
            8 => Some(ErrorCode::Producer),
            9 => Some(ErrorCode::Internal),
            _ => None,
        }
    }

    /// Classify a crate error for the wire
    pub fn from_error(error: &FlightError) -> Self {
        match error {
            FlightError::NotFound(_) => ErrorCode::NotFound,
            FlightError::AlreadyConsuming(_) => ErrorCode::AlreadyConsuming,
            FlightError::ResourceExhausted { .. } => ErrorCode::ResourceExhausted,
            FlightError::InvalidSchema(_) => ErrorCode::InvalidSchema,
            FlightError::Unavailable(_) => ErrorCode::Unavailable,
            FlightError::InvalidTicket(_) => ErrorCode::InvalidTicket,
            FlightError::StreamClosed(_) => ErrorCode::StreamClosed,
            FlightError::Producer(_) => ErrorCode::Producer,
            _ => ErrorCode::Internal,
        }
    }
}

/// A single protocol frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Consumer requests the stream addressed by the ticket
    Get {
        /// Opaque ticket bytes
        ticket: Bytes,
    },
    /// Schema preamble, JSON payload
    Schema(Bytes),
    /// One encoded record batch
    Batch(Bytes),
    /// Normal end of stream
    End,
    /// Terminal error frame
    Error {
        /// Taxonomy code
        code: ErrorCode,
        /// Human-readable detail
        message: String,
    },
}

impl Frame {
    fn frame_type(&self) -> u8 {
        match self {
            Frame::Get { .. } => TYPE_GET,
            Frame::Schema(_) => TYPE_SCHEMA,
            Frame::Batch(_) => TYPE_BATCH,
            Frame::End => TYPE_END,
            Frame::Error { .. } => TYPE_ERROR,
        }
    }
}

/// Write one frame
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let payload = match frame {
        Frame::Get { ticket } => ticket.clone(),
        Frame::Schema(data) | Frame::Batch(data) => data.clone(),
        Frame::End => Bytes::new(),
        Frame::Error { code, message } => {
            let mut buf = BytesMut::with_capacity(1 + message.len());
            buf.put_u8(*code as u8);
            buf.put_slice(message.as_bytes());
            buf.freeze()
        }
    };

    if payload.len() > MAX_FRAME_LEN {
        return Err(FlightError::Protocol(format!(
            "outgoing frame of {} bytes exceeds limit",
            payload.len()
        )));
    }

    let mut header = [0u8; 5];
    header[0] = frame.frame_type();
    header[1..].copy_from_slice(&(payload.len() as u32).to_be_bytes());

    writer.write_all(&header).await?;
    if !payload.is_empty() {
        writer.write_all(&payload).await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Read one frame
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 5];
    reader.read_exact(&mut header).await?;

    let frame_type = header[0];
    let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FlightError::Protocol(format!(
            "peer announced frame of {} bytes, limit is {}",
            len, MAX_FRAME_LEN
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    let mut payload = Bytes::from(payload);

    match frame_type {
        TYPE_GET => Ok(Frame::Get { ticket: payload }),
        TYPE_SCHEMA => Ok(Frame::Schema(payload)),
        TYPE_BATCH => Ok(Frame::Batch(payload)),
        TYPE_END => {
            if !payload.is_empty() {
                return Err(FlightError::Protocol("End frame carries payload".into()));
            }
            Ok(Frame::End)
        }
        TYPE_ERROR => {
            if payload.is_empty() {
                return Err(FlightError::Protocol("empty Error frame".into()));
            }
            let code = payload.get_u8();
            let code = ErrorCode::from_u8(code)
                .ok_or_else(|| FlightError::Protocol(format!("unknown error code {}", code)))?;
            let message = std::str::from_utf8(&payload)
                .map_err(|_| FlightError::Protocol("non-UTF8 error message".into()))?
                .to_owned();
            Ok(Frame::Error { code, message })
        }
        other => Err(FlightError::Protocol(format!(
            "unknown frame type 0x{:02x}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn roundtrip(frame: Frame) -> Frame {
        let (mut client, mut server) = tokio::io::duplex(MAX_FRAME_LEN);
        write_frame(&mut client, &frame).await.unwrap();
        read_frame(&mut server).await.unwrap()
    }

    #[tokio::test]
    async fn test_get_roundtrip() {
        let frame = Frame::Get {
            ticket: Bytes::from_static(b"ticket-bytes"),
        };
        assert_eq!(roundtrip(frame.clone()).await, frame);
    }

    #[tokio::test]
    async fn test_end_roundtrip() {
        assert_eq!(roundtrip(Frame::End).await, Frame::End);
    }

    #[tokio::test]
    async fn test_error_roundtrip() {
        let frame = Frame::Error {
            code: ErrorCode::NotFound,
            message: "no such stream".into(),
        };
        assert_eq!(roundtrip(frame.clone()).await, frame);
    }

    #[tokio::test]
    async fn test_unknown_type_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        use tokio::io::AsyncWriteExt;
        client.write_all(&[0x7F, 0, 0, 0, 0]).await.unwrap();

        let result = read_frame(&mut server).await;
        assert!(matches!(result, Err(FlightError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        use tokio::io::AsyncWriteExt;
        let mut header = [0u8; 5];
        header[0] = 0x03;
        header[1..].copy_from_slice(&(MAX_FRAME_LEN as u32 + 1).to_be_bytes());
        client.write_all(&header).await.unwrap();

        let result = read_frame(&mut server).await;
        assert!(matches!(result, Err(FlightError::Protocol(_))));
    }

    #[test]
    fn test_error_code_mapping_is_total_over_taxonomy() {
        use crate::registry::StreamTicket;
        let ticket = StreamTicket::new("n", 1, 0);

        assert_eq!(
            ErrorCode::from_error(&FlightError::NotFound(ticket.clone())),
            ErrorCode::NotFound
        );
        assert_eq!(
            ErrorCode::from_error(&FlightError::AlreadyConsuming(ticket.clone())),
            ErrorCode::AlreadyConsuming
        );
        assert_eq!(
            ErrorCode::from_error(&FlightError::ResourceExhausted { limit: 1 }),
            ErrorCode::ResourceExhausted
        );
        assert_eq!(
            ErrorCode::from_error(&FlightError::Unavailable("off".into())),
            ErrorCode::Unavailable
        );
        assert_eq!(
            ErrorCode::from_error(&FlightError::StreamClosed(ticket)),
            ErrorCode::StreamClosed
        );
    }
}
