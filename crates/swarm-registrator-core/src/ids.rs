//! Identifier types for Swarm services.
//!
//! Both identifiers are thin wrappers over the strings Docker hands out.
//! Construction never fails so that foreign events can still be represented;
//! callers that derive registry keys from a name go through
//! [`ServiceName::validate`] first.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// The orchestrator's opaque identifier for a service.
///
/// Unique within the cluster; used only for inspection calls.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the identifier can be used for an inspection call.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::EmptyServiceId` if the identifier is empty.
    pub fn validate(&self) -> Result<()> {
        if self.0.trim().is_empty() {
            return Err(CoreError::EmptyServiceId);
        }
        Ok(())
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceId({})", self.0)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ServiceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The human-readable service name, stable for the lifetime of a service.
///
/// Registry keys are derived from this name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceName(String);

impl ServiceName {
    /// Wrap a raw service name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the name is usable as a single registry key segment.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidServiceName` if the name is empty, contains a
    /// `/`, or contains whitespace or control characters.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.0.is_empty() {
            "empty"
        } else if self.0.contains('/') {
            "contains '/'"
        } else if self.0.chars().any(|c| c.is_whitespace() || c.is_control()) {
            "contains whitespace or control characters"
        } else {
            return Ok(());
        };

        Err(CoreError::InvalidServiceName {
            name: self.0.clone(),
            reason,
        })
    }
}

impl fmt::Debug for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceName({})", self.0)
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ServiceName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_name_display() {
        let name = ServiceName::from("web");
        assert_eq!(name.to_string(), "web");
        assert_eq!(format!("{name:?}"), "ServiceName(web)");
    }

    #[test]
    fn service_name_validation() {
        assert!(ServiceName::from("api-v2_blue.1").validate().is_ok());
        assert!(ServiceName::from("").validate().is_err());
        assert!(ServiceName::from("web/admin").validate().is_err());
        assert!(ServiceName::from("web admin").validate().is_err());
    }

    #[test]
    fn service_id_validation() {
        assert!(ServiceId::from("x7q2m9k1").validate().is_ok());
        assert_eq!(
            ServiceId::from("  ").validate(),
            Err(CoreError::EmptyServiceId)
        );
    }

    #[test]
    fn serde_transparent() {
        let name: ServiceName = serde_json::from_str("\"worker\"").unwrap();
        assert_eq!(name.as_str(), "worker");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"worker\"");
    }
}
