//! Nodes flight info action
//!
//! Scatter-gather endpoint discovery: ask every node in the membership
//! view for its descriptor, wait up to a per-node timeout, and aggregate
//! whatever came back. Partial failure is carried as data: the aggregate
//! always succeeds, listing the nodes that answered and a reason for each
//! node that didn't.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::cluster::{ClusterView, FlightInfoChannel};

use super::descriptor::EndpointDescriptor;

/// Why one node is missing from a discovery aggregate
#[derive(Debug, Clone)]
pub struct NodeFailure {
    /// The node that did not contribute a descriptor
    pub node_id: String,
    /// Human-readable reason (timeout, transport error, not serving)
    pub reason: String,
}

/// Aggregate result of one discovery round
#[derive(Debug, Clone, Default)]
pub struct NodesFlightInfoResponse {
    /// Descriptors from every node that answered, keyed by node id
    pub nodes: HashMap<String, EndpointDescriptor>,
    /// Per-node failure reasons for the rest
    pub failures: Vec<NodeFailure>,
}

impl NodesFlightInfoResponse {
    /// Whether every polled node answered
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Cluster-wide endpoint discovery over the injected membership view
pub struct NodesFlightInfo {
    cluster: Arc<dyn ClusterView>,
    channel: Arc<dyn FlightInfoChannel>,
    per_node_timeout: Duration,
}

impl NodesFlightInfo {
    /// Create the action
    pub fn new(
        cluster: Arc<dyn ClusterView>,
        channel: Arc<dyn FlightInfoChannel>,
        per_node_timeout: Duration,
    ) -> Self {
        Self {
            cluster,
            channel,
            per_node_timeout,
        }
    }

    /// Run one discovery round over the current member set
    pub async fn collect(&self) -> NodesFlightInfoResponse {
        let members = self.cluster.member_nodes();
        tracing::debug!(members = members.len(), "Collecting flight info");

        let requests = members.into_iter().map(|node_id| {
            let channel = Arc::clone(&self.channel);
            let timeout = self.per_node_timeout;
            async move {
                let outcome =
                    match tokio::time::timeout(timeout, channel.flight_info(&node_id)).await {
                        Ok(Ok(Some(descriptor))) => Ok(descriptor),
                        Ok(Ok(None)) => Err("not serving streams".to_owned()),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(_) => Err(format!("timed out after {:?}", timeout)),
                    };
                (node_id, outcome)
            }
        });

        let mut response = NodesFlightInfoResponse::default();
        for (node_id, outcome) in join_all(requests).await {
            match outcome {
                Ok(descriptor) => {
                    response.nodes.insert(node_id, descriptor);
                }
                Err(reason) => {
                    tracing::debug!(node = %node_id, reason = %reason, "Node skipped in discovery");
                    response.failures.push(NodeFailure { node_id, reason });
                }
            }
        }

        tracing::info!(
            answered = response.nodes.len(),
            failed = response.failures.len(),
            "Flight info collected"
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FlightError, Result};
    use crate::security::SecurityMode;
    use async_trait::async_trait;

    struct StaticCluster {
        local: String,
        members: Vec<String>,
    }

    impl ClusterView for StaticCluster {
        fn local_node_id(&self) -> String {
            self.local.clone()
        }

        fn member_nodes(&self) -> Vec<String> {
            self.members.clone()
        }
    }

    /// Channel where some nodes answer, some are disabled, some hang
    struct MixedChannel;

    #[async_trait]
    impl FlightInfoChannel for MixedChannel {
        async fn flight_info(&self, node_id: &str) -> Result<Option<EndpointDescriptor>> {
            match node_id {
                "node-a" | "node-b" => Ok(Some(EndpointDescriptor::new(
                    node_id,
                    "127.0.0.1",
                    47470,
                    SecurityMode::Plaintext,
                ))),
                "node-disabled" => Ok(None),
                "node-broken" => Err(FlightError::Unavailable("transport down".into())),
                // node-slow: never answers
                _ => std::future::pending().await,
            }
        }
    }

    #[tokio::test]
    async fn test_partial_failure_is_data_not_error() {
        let cluster = Arc::new(StaticCluster {
            local: "node-a".into(),
            members: vec![
                "node-a".into(),
                "node-b".into(),
                "node-disabled".into(),
                "node-broken".into(),
                "node-slow".into(),
            ],
        });
        let action = NodesFlightInfo::new(cluster, Arc::new(MixedChannel), Duration::from_millis(50));

        let response = action.collect().await;

        assert_eq!(response.nodes.len(), 2);
        assert!(response.nodes.contains_key("node-a"));
        assert!(response.nodes.contains_key("node-b"));

        assert_eq!(response.failures.len(), 3);
        assert!(!response.is_complete());

        let reasons: HashMap<&str, &str> = response
            .failures
            .iter()
            .map(|f| (f.node_id.as_str(), f.reason.as_str()))
            .collect();
        assert_eq!(reasons["node-disabled"], "not serving streams");
        assert!(reasons["node-slow"].contains("timed out"));
    }

    #[tokio::test]
    async fn test_all_respond() {
        let cluster = Arc::new(StaticCluster {
            local: "node-a".into(),
            members: vec!["node-a".into(), "node-b".into()],
        });
        let action = NodesFlightInfo::new(cluster, Arc::new(MixedChannel), Duration::from_millis(50));

        let response = action.collect().await;
        assert_eq!(response.nodes.len(), 2);
        assert!(response.is_complete());
    }
}
