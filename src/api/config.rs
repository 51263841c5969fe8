//! Service configuration.

/// Configuration for the readback service.
#[derive(Debug, Clone)]
pub struct ReadbackConfig {
    /// Entries to reserve in the request table up front (default: 32)
    pub initial_capacity: usize,

    /// Emit a warning diagnostic when a result is clamped to a smaller
    /// caller-supplied destination (default: true)
    pub warn_on_truncation: bool,
}

impl Default for ReadbackConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 32,
            warn_on_truncation: true,
        }
    }
}

impl ReadbackConfig {
    /// Create a minimal config for testing or constrained environments.
    pub fn minimal() -> Self {
        Self {
            initial_capacity: 4,
            warn_on_truncation: false,
        }
    }

    /// Builder pattern: set the request table capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Builder pattern: enable or disable truncation warnings.
    pub fn with_truncation_warnings(mut self, enable: bool) -> Self {
        self.warn_on_truncation = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReadbackConfig::default();
        assert_eq!(config.initial_capacity, 32);
        assert!(config.warn_on_truncation);
    }

    #[test]
    fn test_builders_chain() {
        let config = ReadbackConfig::minimal()
            .with_initial_capacity(128)
            .with_truncation_warnings(true);
        assert_eq!(config.initial_capacity, 128);
        assert!(config.warn_on_truncation);
    }
}
