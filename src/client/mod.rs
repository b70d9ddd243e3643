//! Flight client
//!
//! Client-side of the stream RPC, for:
//! - Consuming a remote node's stream given its ticket
//! - Resolving which node to dial through the endpoint directory
//!
//! A connection serves exactly one ticket; `do_get` consumes the
//! connection and yields the remote stream. [`FlightClientManager`] is
//! the node-to-node path: it resolves the endpoint and drives the whole
//! transfer on the dedicated client pool.

pub mod connection;
pub mod manager;

pub use connection::{FlightClient, FlightConnection, RemoteStream};
pub use manager::{ClientStream, FlightClientManager};
