//! Endpoint discovery
//!
//! Every serving node publishes one [`EndpointDescriptor`] describing
//! where its flight service listens. The local descriptor lives in the
//! [`EndpointDirectory`] and is written only by the local service on
//! (re)bind; remote descriptors are collected by the [`NodesFlightInfo`]
//! scatter-gather action and cached, eventually consistent, tolerant of
//! stale entries until the next refresh.

pub mod action;
pub mod descriptor;
pub mod directory;

pub use action::{NodeFailure, NodesFlightInfo, NodesFlightInfoResponse};
pub use descriptor::EndpointDescriptor;
pub use directory::EndpointDirectory;
