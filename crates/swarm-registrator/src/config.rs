//! Startup configuration.

use std::time::Duration;

use swarm_registrator_docker::DockerHost;
use swarm_registrator_store::ConsulAddress;

use crate::error::ConfigError;

/// Default timeout for Consul calls and service inspections, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Validated configuration for one registrator process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistratorConfig {
    /// Consul agent to write registrations to.
    pub consul: ConsulAddress,
    /// Engine API address.
    pub docker_host: DockerHost,
    /// Timeout for individual request/response calls.
    pub request_timeout: Duration,
}

impl RegistratorConfig {
    /// Build a configuration from raw command-line values.
    ///
    /// A missing or empty `consul_url` means `localhost:8500`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the Consul URL has an unsupported scheme or
    /// bad port, if the Docker host is neither a TCP address nor a Unix
    /// socket, or if the timeout is zero.
    pub fn from_args(
        consul_url: Option<&str>,
        docker_host: &str,
        request_timeout_secs: u64,
    ) -> Result<Self, ConfigError> {
        if request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(Self {
            consul: ConsulAddress::parse_or_default(consul_url)?,
            docker_host: DockerHost::parse(docker_host)?,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

impl Default for RegistratorConfig {
    fn default() -> Self {
        Self {
            consul: ConsulAddress::default(),
            docker_host: DockerHost::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}
