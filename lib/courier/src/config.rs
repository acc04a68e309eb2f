//! Limits applied by [`HyperClient`](crate::HyperClient) to every fetch.
//!
//! The defaults suit calls to remote JSON APIs. The shared client behind
//! [`fetch`](crate::fetch()) always uses them; build a client with
//! [`HyperClient::builder`](crate::HyperClient::builder) to pick others.
//!
//! ```
//! use std::time::Duration;
//!
//! use courier::{ClientConfig, HyperClient};
//!
//! let config = ClientConfig::builder()
//!     .timeout(Duration::from_secs(5))
//!     .pool_idle_per_host(4)
//!     .build();
//! let client = HyperClient::with_config(config);
//! assert_eq!(client.config().timeout, Duration::from_secs(5));
//! ```

use std::time::Duration;

/// Timeouts and connection pooling of a [`HyperClient`](crate::HyperClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Time allowed from sending the request until the response head arrives.
    ///
    /// Exceeding it fails the fetch with [`Error::Timeout`](crate::Error::Timeout).
    pub timeout: Duration,
    /// Time allowed to open the TCP connection, TLS handshake excluded.
    pub connect_timeout: Duration,
    /// Idle keep-alive connections kept per host.
    pub pool_idle_per_host: usize,
    /// Idle time after which a pooled connection is closed.
    pub pool_idle_timeout: Duration,
}

impl Default for ClientConfig {
    /// 30s per request, 10s to connect, 32 idle connections per host kept
    /// for 90s.
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl ClientConfig {
    /// Start from the defaults and override what differs.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl From<ClientConfig> for ClientConfigBuilder {
    fn from(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl ClientConfigBuilder {
    /// See [`ClientConfig::timeout`].
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// See [`ClientConfig::connect_timeout`].
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Zero disables keep-alive reuse.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config.pool_idle_per_host = count;
        self
    }

    /// See [`ClientConfig::pool_idle_timeout`].
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Finish the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
