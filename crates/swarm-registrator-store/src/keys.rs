//! Registry key namespace.
//!
//! The layout is shared with existing registries and consumers, so the
//! prefixes must not change.

use swarm_registrator_core::ServiceName;

/// Prefix of the base settings written by the deployment tooling.
pub const APPSETTINGS_PREFIX: &str = "appsettings/v1/";

/// Prefix of HTTP registrations.
pub const HTTP_PREFIX: &str = "swarm-registrator/v1/http/";

/// Prefix of auxiliary TCP registrations.
pub const TCP_PREFIX: &str = "swarm-registrator/v1/tcp/";

/// Key of a service's base settings: `appsettings/v1/<name>`.
#[must_use]
pub fn appsettings_key(name: &ServiceName) -> String {
    format!("{APPSETTINGS_PREFIX}{name}")
}

/// Key of a service's HTTP registration: `swarm-registrator/v1/http/<name>`.
#[must_use]
pub fn http_key(name: &ServiceName) -> String {
    format!("{HTTP_PREFIX}{name}")
}

/// Key of a service's TCP registration: `swarm-registrator/v1/tcp/<name>`.
#[must_use]
pub fn tcp_key(name: &ServiceName) -> String {
    format!("{TCP_PREFIX}{name}")
}
