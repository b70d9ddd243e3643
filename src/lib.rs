//! # flightrpc
//!
//! A ticket-addressed streaming RPC service for cluster nodes. Any node
//! can produce a large result stream (query output, export, replication
//! feed) and any other node or client can discover, address and consume
//! it without routing the bytes through the cluster's primary
//! request/response transport.
//!
//! The moving parts:
//!
//! - [`registry::StreamRegistry`]: per-node table binding tickets to
//!   live producers
//! - [`manager::StreamManager`]: the produce/consume capability the
//!   host exposes to its query engine and REST layer
//! - [`server::FlightService`]: the network server on its own port and
//!   dedicated executor pool
//! - [`discovery`]: endpoint descriptors, the per-node directory, and
//!   the cluster-wide scatter-gather info action
//! - [`client`]: the consuming side (dial, exchange the ticket, read
//!   batches)
//! - [`node::FlightNode`]: explicit composition of all of the above
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use flightrpc::config::FlightSettings;
//! use flightrpc::node::FlightNode;
//! # use flightrpc::cluster::{ClusterView, FlightInfoChannel};
//! # async fn run(cluster: Arc<dyn ClusterView>, channel: Arc<dyn FlightInfoChannel>) -> flightrpc::error::Result<()> {
//! let node = FlightNode::start(FlightSettings::default(), cluster, channel, None).await?;
//! let manager = node.stream_manager()?;
//! // manager.create_stream(producer) -> ticket; hand the ticket to the requester
//! node.close().await;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod client;
pub mod cluster;
pub mod config;
pub mod discovery;
pub mod error;
pub mod manager;
pub mod node;
pub mod protocol;
pub mod registry;
pub mod rest;
pub mod security;
pub mod server;

pub use batch::{Column, DataType, Field, RecordBatch, Schema};
pub use client::{ClientStream, FlightClient, FlightClientManager, RemoteStream};
pub use config::FlightSettings;
pub use discovery::{EndpointDescriptor, EndpointDirectory, NodesFlightInfo};
pub use error::{FlightError, Result};
pub use manager::{StreamManager, StreamProducer, TicketStream};
pub use node::FlightNode;
pub use registry::{StreamRegistry, StreamTicket};
pub use security::{SecureTransport, SecurityMode};
pub use server::{FlightService, ServerConfig, ServiceState};
