//! Registry configuration

use std::time::Duration;

/// Configuration for the stream registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of live streams; registrations beyond this fail
    pub max_streams: usize,

    /// Revoke handles with no consumer activity for this long
    pub idle_stream_timeout: Duration,

    /// How often the idle sweep runs
    pub cleanup_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_streams: 1024,
            idle_stream_timeout: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(30),
        }
    }
}

impl RegistryConfig {
    /// Set the live-stream ceiling
    pub fn max_streams(mut self, max: usize) -> Self {
        self.max_streams = max;
        self
    }

    /// Set the idle timeout
    pub fn idle_stream_timeout(mut self, timeout: Duration) -> Self {
        self.idle_stream_timeout = timeout;
        self
    }

    /// Set the cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.max_streams, 1024);
        assert_eq!(config.idle_stream_timeout, Duration::from_secs(300));
        assert_eq!(config.cleanup_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .max_streams(8)
            .idle_stream_timeout(Duration::from_secs(5))
            .cleanup_interval(Duration::from_millis(100));

        assert_eq!(config.max_streams, 8);
        assert_eq!(config.idle_stream_timeout, Duration::from_secs(5));
        assert_eq!(config.cleanup_interval, Duration::from_millis(100));
    }
}
