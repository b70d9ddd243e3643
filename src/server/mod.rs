//! Flight service
//!
//! The network-facing server: binds a dedicated port, accepts stream
//! requests, and serves them from its own bounded executor pool so that
//! large transfers never starve the node's general request handling.
//!
//! Lifecycle is one-directional:
//!
//! ```text
//! Uninitialized ──start()──► Bound ──► Serving ──close()──► Closing ──► Closed
//! ```
//!
//! `Closed` is terminal and releases the bound port; `close()` is
//! idempotent and safe from shutdown hooks.

pub mod config;
pub mod connection;
pub mod executor;
pub mod service;

pub use config::ServerConfig;
pub use executor::FlightThreadPool;
pub use service::{FlightService, ServiceState};
