//! Cluster collaborator seams
//!
//! The streaming core needs exactly two things from cluster membership:
//! the local node's id and the current member set. Both come through an
//! injected [`ClusterView`]; there is no ambient or global lookup, and
//! this crate never implements membership itself.
//!
//! Discovery requests ride the cluster's existing internal node-to-node
//! channel, injected as [`FlightInfoChannel`].

use async_trait::async_trait;

use crate::discovery::EndpointDescriptor;
use crate::error::Result;

/// Read-only view of cluster membership
pub trait ClusterView: Send + Sync {
    /// Id of the node this process is running as
    fn local_node_id(&self) -> String;

    /// Ids of every node currently in the cluster, including the local one
    fn member_nodes(&self) -> Vec<String>;
}

/// One-operation channel for endpoint discovery
///
/// Asks a node for its flight endpoint descriptor over the cluster's
/// internal transport. `Ok(None)` means the node answered but is not
/// serving streams (feature disabled there).
#[async_trait]
pub trait FlightInfoChannel: Send + Sync {
    /// Request `node_id`'s endpoint descriptor
    async fn flight_info(&self, node_id: &str) -> Result<Option<EndpointDescriptor>>;
}
