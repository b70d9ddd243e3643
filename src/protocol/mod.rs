//! Stream RPC wire protocol
//!
//! A connection runs one exchange: handshake, then a `Get` carrying the
//! ticket, then the server's reply: a `Schema` frame followed by zero or
//! more `Batch` frames in emission order, terminated by `End` or by a
//! single `Error` frame. Nothing is multiplexed; one connection serves
//! one ticket.

pub mod frame;
pub mod handshake;

pub use frame::{read_frame, write_frame, ErrorCode, Frame, MAX_FRAME_LEN};
pub use handshake::{client_handshake, server_handshake, PROTOCOL_VERSION};
