//! Endpoint directory
//!
//! Per-node record of where every flight service listens. The local slot
//! is written only by the local service on bind and cleared on close; the
//! remote cache is refreshed from discovery results and read lock-free of
//! writers (shared-read, exclusive-write, no await while holding either).

use std::collections::HashMap;
use std::sync::RwLock;

use super::action::NodesFlightInfoResponse;
use super::descriptor::EndpointDescriptor;

/// Directory of flight endpoints, local and discovered
pub struct EndpointDirectory {
    local_node_id: String,
    local: RwLock<Option<EndpointDescriptor>>,
    remote: RwLock<HashMap<String, EndpointDescriptor>>,
}

impl EndpointDirectory {
    /// Create an empty directory for the given node
    pub fn new(local_node_id: impl Into<String>) -> Self {
        Self {
            local_node_id: local_node_id.into(),
            local: RwLock::new(None),
            remote: RwLock::new(HashMap::new()),
        }
    }

    /// Id of the node this directory belongs to
    pub fn local_node_id(&self) -> &str {
        &self.local_node_id
    }

    /// Publish the local descriptor; called by the service on (re)bind
    pub fn set_local(&self, descriptor: EndpointDescriptor) {
        tracing::info!(endpoint = %descriptor, "Local flight endpoint published");
        *self.local.write().expect("directory lock poisoned") = Some(descriptor);
    }

    /// Clear the local descriptor; called when the service closes
    pub fn clear_local(&self) {
        *self.local.write().expect("directory lock poisoned") = None;
    }

    /// The local descriptor, if the service is bound
    pub fn local(&self) -> Option<EndpointDescriptor> {
        self.local.read().expect("directory lock poisoned").clone()
    }

    /// Look up a node's endpoint, local or previously discovered
    pub fn lookup(&self, node_id: &str) -> Option<EndpointDescriptor> {
        if node_id == self.local_node_id {
            return self.local();
        }
        self.remote
            .read()
            .expect("directory lock poisoned")
            .get(node_id)
            .cloned()
    }

    /// Merge a discovery result into the remote cache
    ///
    /// Entries for responding nodes are replaced; failed nodes keep their
    /// stale entry, if any, until a later refresh succeeds.
    pub fn apply(&self, response: &NodesFlightInfoResponse) {
        let mut remote = self.remote.write().expect("directory lock poisoned");
        for (node_id, descriptor) in &response.nodes {
            remote.insert(node_id.clone(), descriptor.clone());
        }
        tracing::debug!(
            discovered = response.nodes.len(),
            failed = response.failures.len(),
            cached = remote.len(),
            "Endpoint directory refreshed"
        );
    }
}
