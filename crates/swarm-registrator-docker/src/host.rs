//! `DOCKER_HOST` style Engine API addresses.

use std::fmt;
#[cfg(unix)]
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{OrchestratorError, Result};

/// Default Engine API address, the local daemon socket.
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// Where the Engine API listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerHost {
    /// HTTP(S) base URL without a trailing slash.
    Http(String),
    /// Path of a Unix domain socket.
    #[cfg(unix)]
    Unix(PathBuf),
}

impl DockerHost {
    /// Parse an address.
    ///
    /// `tcp://` is rewritten to `http://`, `http://` and `https://` are kept,
    /// a bare `host:port` gets `http://` and `unix://` names a socket path.
    ///
    /// # Errors
    ///
    /// Returns `OrchestratorError::Config` for named pipes, unknown schemes,
    /// an empty address or an empty socket path.
    pub fn parse(host: &str) -> Result<Self> {
        let host = host.trim();

        if let Some(path) = host.strip_prefix("unix://") {
            return Self::unix(path);
        }

        let host = host.trim_end_matches('/');
        if let Some(rest) = host.strip_prefix("tcp://") {
            Ok(Self::Http(format!("http://{rest}")))
        } else if host.starts_with("http://") || host.starts_with("https://") {
            Ok(Self::Http(host.to_string()))
        } else if host.starts_with("npipe://") {
            Err(OrchestratorError::Config(format!("{host}: named pipes are not supported")))
        } else if host.contains("://") {
            Err(OrchestratorError::Config(format!("{host}: unsupported scheme")))
        } else if host.is_empty() {
            Err(OrchestratorError::Config("Docker host is empty".to_string()))
        } else {
            Ok(Self::Http(format!("http://{host}")))
        }
    }

    #[cfg(unix)]
    fn unix(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(OrchestratorError::Config("unix://: socket path is empty".to_string()));
        }
        Ok(Self::Unix(PathBuf::from(path)))
    }

    #[cfg(not(unix))]
    fn unix(path: &str) -> Result<Self> {
        Err(OrchestratorError::Config(format!(
            "unix://{path}: Unix sockets are not available on this platform"
        )))
    }
}

impl Default for DockerHost {
    fn default() -> Self {
        #[cfg(unix)]
        {
            Self::Unix(PathBuf::from("/var/run/docker.sock"))
        }
        #[cfg(not(unix))]
        {
            Self::Http("http://localhost:2375".to_string())
        }
    }
}

impl FromStr for DockerHost {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DockerHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(base_url) => f.write_str(base_url),
            #[cfg(unix)]
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_addresses_become_http() {
        assert_eq!(
            DockerHost::parse("tcp://manager:2375").unwrap(),
            DockerHost::Http("http://manager:2375".into())
        );
        assert_eq!(
            DockerHost::parse("https://manager:2376/").unwrap(),
            DockerHost::Http("https://manager:2376".into())
        );
        assert_eq!(
            DockerHost::parse("manager:2375").unwrap(),
            DockerHost::Http("http://manager:2375".into())
        );
    }

    #[cfg(unix)]
    #[test]
    fn unix_socket_address() {
        let host = DockerHost::parse(DEFAULT_DOCKER_HOST).unwrap();
        assert_eq!(host, DockerHost::Unix(PathBuf::from("/var/run/docker.sock")));
        assert_eq!(host, DockerHost::default());
        assert_eq!(host.to_string(), DEFAULT_DOCKER_HOST);
    }

    #[test]
    fn unusable_addresses() {
        assert!(DockerHost::parse("unix://").is_err());
        assert!(DockerHost::parse("npipe:////./pipe/docker_engine").is_err());
        assert!(DockerHost::parse("ssh://manager").is_err());
        assert!(DockerHost::parse("").is_err());
    }
}
