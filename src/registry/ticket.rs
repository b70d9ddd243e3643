//! Stream tickets
//!
//! A ticket is the opaque address of exactly one producer-created stream.
//! It carries the producing node's id, a per-registry stream counter, and
//! the issue time. Consumers treat it as a blob: the binary form below is
//! what crosses the wire, and only the registry that minted a ticket can
//! resolve it.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FlightError, Result};

/// Longest node id accepted when decoding a ticket off the wire
const MAX_NODE_ID_LEN: usize = 512;

/// Opaque address of one producer-created stream
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamTicket {
    node_id: String,
    stream_id: u64,
    issued_at_ms: u64,
}

impl StreamTicket {
    /// Create a ticket; only the registry mints these
    pub fn new(node_id: impl Into<String>, stream_id: u64, issued_at_ms: u64) -> Self {
        Self {
            node_id: node_id.into(),
            stream_id,
            issued_at_ms,
        }
    }

    /// Id of the node whose registry minted the ticket
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Per-registry stream counter value
    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    /// Issue time, milliseconds since the Unix epoch
    pub fn issued_at_ms(&self) -> u64 {
        self.issued_at_ms
    }

    /// Encode to the opaque wire form
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(2 + self.node_id.len() + 16);
        buf.put_u16(self.node_id.len() as u16);
        buf.put_slice(self.node_id.as_bytes());
        buf.put_u64(self.stream_id);
        buf.put_u64(self.issued_at_ms);
        buf.freeze()
    }

    /// Decode the opaque wire form
    pub fn from_bytes(mut data: Bytes) -> Result<Self> {
        if data.remaining() < 2 {
            return Err(FlightError::InvalidTicket("ticket truncated".into()));
        }
        let node_len = data.get_u16() as usize;
        if node_len == 0 || node_len > MAX_NODE_ID_LEN {
            return Err(FlightError::InvalidTicket(format!(
                "node id length {} out of range",
                node_len
            )));
        }
        if data.remaining() < node_len + 16 {
            return Err(FlightError::InvalidTicket("ticket truncated".into()));
        }

        let raw = data.split_to(node_len);
        let node_id = std::str::from_utf8(&raw)
            .map_err(|_| FlightError::InvalidTicket("node id is not UTF-8".into()))?
            .to_owned();
        let stream_id = data.get_u64();
        let issued_at_ms = data.get_u64();

        if data.has_remaining() {
            return Err(FlightError::InvalidTicket("trailing bytes in ticket".into()));
        }

        Ok(Self {
            node_id,
            stream_id,
            issued_at_ms,
        })
    }
}

impl std::fmt::Display for StreamTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{:016x}", self.node_id, self.stream_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let ticket = StreamTicket::new("node-a", 42, 1_700_000_000_000);
        let decoded = StreamTicket::from_bytes(ticket.to_bytes()).unwrap();
        assert_eq!(decoded, ticket);
    }

    #[test]
    fn test_truncated_rejected() {
        let bytes = StreamTicket::new("node-a", 1, 0).to_bytes();
        let truncated = bytes.slice(0..bytes.len() - 4);
        assert!(matches!(
            StreamTicket::from_bytes(truncated),
            Err(FlightError::InvalidTicket(_))
        ));
    }

    #[test]
    fn test_empty_node_id_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u16(0);
        buf.put_u64(1);
        buf.put_u64(0);
        assert!(matches!(
            StreamTicket::from_bytes(buf.freeze()),
            Err(FlightError::InvalidTicket(_))
        ));
    }

    #[test]
    fn test_display() {
        let ticket = StreamTicket::new("node-a", 255, 0);
        assert_eq!(ticket.to_string(), "node-a/00000000000000ff");
    }
}
