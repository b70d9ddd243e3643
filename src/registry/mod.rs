//! Stream registry for ticket lifecycle
//!
//! The registry is the per-node table of live streams. Registering a
//! producer mints a [`StreamTicket`] and binds it to a [`StreamHandle`];
//! the ticket travels to the consumer out of band, and the consumer trades
//! it back for the handle's data. Tickets are minted from a monotonically
//! increasing counter, so a revoked ticket is never reused.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<StreamRegistry>
//!                  ┌────────────────────────────┐
//!                  │ streams: HashMap<Ticket,   │
//!                  │   Arc<StreamHandle> {      │
//!                  │     schema,                │
//!                  │     producer slot,         │
//!                  │     cancel token,          │
//!                  │   }                        │
//!                  │ >                          │
//!                  └─────────────┬──────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            │                   │                   │
//!            ▼                   ▼                   ▼
//!       register()          resolve()            revoke()
//!       (producer)      (serving connection)   (close/idle sweep)
//! ```
//!
//! Thread-safe via `RwLock`: ticket lifecycle transitions take the write
//! lock, lookups share the read lock and never block each other.

pub mod config;
pub mod error;
pub mod handle;
pub mod store;
pub mod ticket;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use handle::StreamHandle;
pub use store::StreamRegistry;
pub use ticket::StreamTicket;
