//! Shared fixtures for the integration suites
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use flightrpc::batch::{Column, DataType, Field, RecordBatch, Schema};
use flightrpc::cluster::{ClusterView, FlightInfoChannel};
use flightrpc::discovery::{EndpointDescriptor, EndpointDirectory};
use flightrpc::error::Result;
use flightrpc::manager::StreamProducer;

/// Wire up test logging once; `RUST_LOG` controls verbosity
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Fixed membership view
pub struct StaticCluster {
    pub local: String,
    pub members: Vec<String>,
}

impl ClusterView for StaticCluster {
    fn local_node_id(&self) -> String {
        self.local.clone()
    }

    fn member_nodes(&self) -> Vec<String> {
        self.members.clone()
    }
}

/// In-process discovery channel backed by each node's real directory
///
/// Stands in for the cluster's internal node-to-node transport: a
/// request for a node's flight info reads that node's local descriptor.
#[derive(Default)]
pub struct DirectoryChannel {
    directories: Mutex<HashMap<String, Arc<EndpointDirectory>>>,
}

impl DirectoryChannel {
    pub fn register(&self, node_id: impl Into<String>, directory: Arc<EndpointDirectory>) {
        self.directories
            .lock()
            .unwrap()
            .insert(node_id.into(), directory);
    }
}

#[async_trait]
impl FlightInfoChannel for DirectoryChannel {
    async fn flight_info(&self, node_id: &str) -> Result<Option<EndpointDescriptor>> {
        let directory = self.directories.lock().unwrap().get(node_id).cloned();
        Ok(directory.and_then(|d| d.local()))
    }
}

/// Producer emitting a fixed sequence of single-column Int64 batches
pub struct IntProducer {
    schema: Schema,
    batches: std::collections::VecDeque<Vec<i64>>,
}

impl IntProducer {
    pub fn new(batches: Vec<Vec<i64>>) -> Self {
        Self {
            schema: Schema::new(vec![Field::new("value", DataType::Int64)]),
            batches: batches.into(),
        }
    }
}

#[async_trait]
impl StreamProducer for IntProducer {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
        match self.batches.pop_front() {
            Some(values) => Ok(Some(RecordBatch::try_new(
                self.schema.clone(),
                vec![Column::Int64(values)],
            )?)),
            None => Ok(None),
        }
    }
}

/// Flatten the Int64 column of a batch sequence into one vector
pub fn int_values(batches: &[RecordBatch]) -> Vec<i64> {
    batches
        .iter()
        .flat_map(|batch| match &batch.columns()[0] {
            Column::Int64(values) => values.clone(),
            other => panic!("expected Int64 column, got {:?}", other),
        })
        .collect()
}
