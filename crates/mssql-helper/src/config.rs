//! Helper configuration.

use std::time::Duration;

use crate::param_cache::ParameterCacheConfig;

/// Configuration for [`SqlHelper`](crate::SqlHelper).
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct HelperConfig {
    /// Parameter cache behavior.
    pub cache: ParameterCacheConfig,
    /// Render every executed command as debug SQL and emit it at `DEBUG`.
    pub log_statements: bool,
    /// Timeout applied to commands built by the helper. `None` defers to
    /// the executor's own default.
    pub command_timeout: Option<Duration>,
}

impl HelperConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parameter cache configuration.
    #[must_use]
    pub fn cache(mut self, cache: ParameterCacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Enable or disable statement logging.
    #[must_use]
    pub fn log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    /// Set the command timeout.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HelperConfig::default();
        assert!(!config.cache.single_flight);
        assert!(!config.log_statements);
        assert!(config.command_timeout.is_none());
    }

    #[test]
    fn test_builder() {
        let config = HelperConfig::new()
            .cache(ParameterCacheConfig::new().single_flight(true))
            .log_statements(true)
            .command_timeout(Duration::from_secs(30));
        assert!(config.cache.single_flight);
        assert!(config.log_statements);
        assert_eq!(config.command_timeout, Some(Duration::from_secs(30)));
    }
}
