//! Server configuration types.
//!
//! # Example
//!
//! ```rust
//! use baton_server::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .max_body_size(64 * 1024)
//!     .keep_alive(false)
//!     .build();
//!
//! assert_eq!(config.max_body_size(), 64 * 1024);
//! assert!(!config.keep_alive());
//! ```

/// Default address used by `start` when none is given.
pub const DEFAULT_START_ADDR: &str = "127.0.0.1:0";

/// Default request body limit (4 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 4 * 1024 * 1024;

/// Server configuration.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Largest request body accepted before answering 413.
    max_body_size: usize,

    /// Whether HTTP/1.1 keep-alive is enabled.
    keep_alive: bool,

    /// Address `start` binds when called without one.
    default_addr: String,

    /// Whether a connection stays open after the client half-closes.
    half_close: bool,
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the request body limit in bytes.
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Returns whether keep-alive is enabled.
    #[must_use]
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Returns the default address for `start`.
    #[must_use]
    pub fn default_addr(&self) -> &str {
        &self.default_addr
    }

    /// Returns whether half-closed connections are supported.
    #[must_use]
    pub fn half_close(&self) -> bool {
        self.half_close
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    max_body_size: usize,
    keep_alive: bool,
    default_addr: String,
    half_close: bool,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            keep_alive: true,
            default_addr: DEFAULT_START_ADDR.to_string(),
            half_close: false,
        }
    }

    /// Sets the request body limit in bytes.
    #[must_use]
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Enables or disables keep-alive.
    #[must_use]
    pub fn keep_alive(mut self, enabled: bool) -> Self {
        self.keep_alive = enabled;
        self
    }

    /// Sets the address `start` binds when called without one.
    #[must_use]
    pub fn default_addr(mut self, addr: impl Into<String>) -> Self {
        self.default_addr = addr.into();
        self
    }

    /// Enables or disables half-close support.
    #[must_use]
    pub fn half_close(mut self, enabled: bool) -> Self {
        self.half_close = enabled;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            max_body_size: self.max_body_size,
            keep_alive: self.keep_alive,
            default_addr: self.default_addr,
            half_close: self.half_close,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.max_body_size(), DEFAULT_MAX_BODY_SIZE);
        assert!(config.keep_alive());
        assert_eq!(config.default_addr(), "127.0.0.1:0");
        assert!(!config.half_close());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ServerConfig::builder()
            .max_body_size(10)
            .keep_alive(false)
            .default_addr("0.0.0.0:0")
            .half_close(true)
            .build();

        assert_eq!(config.max_body_size(), 10);
        assert!(!config.keep_alive());
        assert_eq!(config.default_addr(), "0.0.0.0:0");
        assert!(config.half_close());
    }
}
