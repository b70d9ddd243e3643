//! Dedicated executor pools
//!
//! Stream serving runs on its own bounded thread pool, distinct from the
//! host node's general and search pools. This is the concurrency-isolation
//! design point of the whole subsystem. The original policy is fixed at
//! two pools per node: one serving inbound transfers, one driving
//! outbound consumption.

use std::future::Future;
use std::sync::Mutex;

use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

use crate::error::{FlightError, Result};

/// A named, bounded tokio runtime owned by the flight subsystem
///
/// The runtime sits behind a mutex so the pool can be released through a
/// shared reference during shutdown. Spawning on a released pool fails
/// with `Unavailable`; callers that outlive `close()` get an error, not a
/// panic.
pub struct FlightThreadPool {
    name: String,
    runtime: Mutex<Option<Runtime>>,
}

impl FlightThreadPool {
    /// Build a pool with the given number of worker threads
    pub fn new(name: impl Into<String>, worker_threads: usize) -> std::io::Result<Self> {
        let name = name.into();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name(format!("flight-{}", name))
            .enable_all()
            .build()?;

        tracing::debug!(pool = %name, threads = worker_threads.max(1), "Flight pool started");

        Ok(Self {
            name,
            runtime: Mutex::new(Some(runtime)),
        })
    }

    /// Spawn a task onto the pool
    ///
    /// Fails with `Unavailable` once the pool has been released.
    pub fn spawn<F>(&self, future: F) -> Result<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        Ok(self.handle()?.spawn(future))
    }

    /// Handle for spawning from elsewhere
    ///
    /// Fails with `Unavailable` once the pool has been released.
    pub fn handle(&self) -> Result<Handle> {
        self.runtime
            .lock()
            .expect("pool lock poisoned")
            .as_ref()
            .map(|runtime| runtime.handle().clone())
            .ok_or_else(|| FlightError::Unavailable(format!("{} pool released", self.name)))
    }

    /// Whether the pool has been released
    pub fn is_shut_down(&self) -> bool {
        self.runtime.lock().expect("pool lock poisoned").is_none()
    }

    /// Release the pool without blocking
    ///
    /// Idempotent. Tasks still running are left to finish on their own;
    /// the service's `close()` must have drained transfers before this is
    /// called.
    pub fn shutdown(&self) {
        if let Some(runtime) = self.runtime.lock().expect("pool lock poisoned").take() {
            runtime.shutdown_background();
            tracing::debug!(pool = %self.name, "Flight pool released");
        }
    }
}

impl Drop for FlightThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for FlightThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightThreadPool")
            .field("name", &self.name)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_runs_tasks() {
        let pool = FlightThreadPool::new("test", 1).unwrap();
        let handle = pool.spawn(async { 40 + 2 }).unwrap();
        let result = pool
            .handle()
            .unwrap()
            .block_on(async { handle.await.unwrap() });
        assert_eq!(result, 42);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let pool = FlightThreadPool::new("test", 1).unwrap();
        pool.shutdown();
        pool.shutdown();
        assert!(pool.is_shut_down());
    }

    #[test]
    fn test_spawn_after_shutdown_is_unavailable() {
        let pool = FlightThreadPool::new("test", 1).unwrap();
        pool.shutdown();

        assert!(matches!(
            pool.spawn(async {}),
            Err(FlightError::Unavailable(_))
        ));
        assert!(matches!(pool.handle(), Err(FlightError::Unavailable(_))));
    }

    #[test]
    fn test_zero_threads_clamped() {
        // A zero-width pool would deadlock; it is clamped to one worker
        let pool = FlightThreadPool::new("test", 0).unwrap();
        let handle = pool.spawn(async { 1 }).unwrap();
        assert_eq!(
            pool.handle()
                .unwrap()
                .block_on(async { handle.await.unwrap() }),
            1
        );
    }
}
