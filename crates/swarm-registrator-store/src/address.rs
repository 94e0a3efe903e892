//! Consul connection addresses.

use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Default Consul agent host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default Consul HTTP API port.
pub const DEFAULT_PORT: u16 = 8500;

const SCHEME: &str = "consul://";

/// Host and port of a Consul agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsulAddress {
    /// Host name or IP address.
    pub host: String,
    /// HTTP API port.
    pub port: u16,
}

impl Default for ConsulAddress {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ConsulAddress {
    /// Parse an optional connection URL, falling back to `localhost:8500`.
    ///
    /// # Errors
    ///
    /// See [`ConsulAddress::from_str`].
    pub fn parse_or_default(url: Option<&str>) -> Result<Self, StoreError> {
        match url.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(url) => url.parse(),
        }
    }

    /// Base URL of the HTTP API.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ConsulAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}:{}", self.host, self.port)
    }
}

impl FromStr for ConsulAddress {
    type Err = StoreError;

    /// Accepts `consul://host[:port]` or a bare `host[:port]`.
    ///
    /// Any other scheme is rejected.
    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| StoreError::InvalidAddress {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let rest = match url.strip_prefix(SCHEME) {
            Some(rest) => rest,
            None if url.contains("://") => return Err(invalid("scheme must be consul://")),
            None => url,
        };
        let rest = rest.trim_end_matches('/');

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| invalid("port is not a number between 0 and 65535"))?;
                (host, port)
            }
            None => (rest, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(invalid("host is empty"));
        }
        if host.contains('/') {
            return Err(invalid("paths are not supported"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_when_absent() {
        assert_eq!(
            ConsulAddress::parse_or_default(None).unwrap(),
            ConsulAddress::default()
        );
        assert_eq!(
            ConsulAddress::parse_or_default(Some("  ")).unwrap().base_url(),
            "http://localhost:8500"
        );
    }

    #[test]
    fn consul_scheme_with_port() {
        let addr: ConsulAddress = "consul://consul.service:8501".parse().unwrap();
        assert_eq!(addr.host, "consul.service");
        assert_eq!(addr.port, 8501);
        assert_eq!(addr.to_string(), "consul://consul.service:8501");
    }

    #[test]
    fn consul_scheme_without_port() {
        let addr: ConsulAddress = "consul://10.0.0.5/".parse().unwrap();
        assert_eq!(addr.host, "10.0.0.5");
        assert_eq!(addr.port, DEFAULT_PORT);
    }

    #[test]
    fn bare_host_port() {
        let addr: ConsulAddress = "registry:9500".parse().unwrap();
        assert_eq!(addr.base_url(), "http://registry:9500");
    }

    #[test]
    fn rejects_other_schemes() {
        let err = "http://localhost:8500".parse::<ConsulAddress>().unwrap_err();
        assert!(matches!(err, StoreError::InvalidAddress { .. }));
        assert!("etcd://localhost".parse::<ConsulAddress>().is_err());
    }

    #[test]
    fn rejects_bad_port_and_host() {
        assert!("consul://localhost:http".parse::<ConsulAddress>().is_err());
        assert!("consul://:8500".parse::<ConsulAddress>().is_err());
        assert!("consul://host/kv".parse::<ConsulAddress>().is_err());
    }
}
