//! Conduit Error Types
//!
//! Every error is returned to the immediate caller; nothing in the
//! context layer retries or swallows failures.

use std::io;
use thiserror::Error;

use crate::endpoint::Endpoint;

/// Main error type for messaging context operations
#[derive(Error, Debug)]
pub enum ConduitError {
    /// Malformed configuration value
    #[error("Invalid setting '{key}': {reason}")]
    Configuration { key: String, reason: String },

    /// Transport failed to allocate its context
    #[error("Transport context initialization failed: {0}")]
    Initialization(#[source] io::Error),

    /// `initialize` called on a context that is running or terminated
    #[error("Messaging context already initialized")]
    AlreadyInitialized,

    /// Operation outside the initialize..terminate window
    #[error("Messaging context not initialized")]
    NotInitialized,

    /// Bind rejected by the transport
    #[error("Bind to {endpoint} failed: {source}")]
    Bind {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },

    /// Connect rejected synchronously by the transport
    #[error("Connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },

    /// Socket creation, option or teardown failure
    #[error("Transport {operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Result type alias for messaging context operations
pub type Result<T> = std::result::Result<T, ConduitError>;

impl ConduitError {
    /// Create a configuration error for `key`
    pub fn configuration(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a transport error for `operation`
    pub fn transport(operation: &'static str, source: io::Error) -> Self {
        Self::Transport { operation, source }
    }

    /// Check if this error comes from the configuration source
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Check if this error is a lifecycle misuse
    #[must_use]
    pub const fn is_lifecycle_error(&self) -> bool {
        matches!(self, Self::NotInitialized | Self::AlreadyInitialized)
    }

    /// Check if a bind failed because the address is taken
    #[must_use]
    pub fn is_addr_in_use(&self) -> bool {
        matches!(self, Self::Bind { source, .. } if source.kind() == io::ErrorKind::AddrInUse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::resolve_bind;

    #[test]
    fn test_classification() {
        assert!(ConduitError::configuration("zmq.hwm", "negative").is_configuration_error());
        assert!(ConduitError::NotInitialized.is_lifecycle_error());
        assert!(ConduitError::AlreadyInitialized.is_lifecycle_error());
        assert!(!ConduitError::NotInitialized.is_configuration_error());
    }

    #[test]
    fn test_addr_in_use() {
        let err = ConduitError::Bind {
            endpoint: resolve_bind(false, 6700),
            source: io::Error::new(io::ErrorKind::AddrInUse, "taken"),
        };
        assert!(err.is_addr_in_use());
        assert_eq!(err.to_string(), "Bind to tcp://*:6700 failed: taken");

        let err = ConduitError::Bind {
            endpoint: resolve_bind(false, 6700),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_addr_in_use());
    }

    #[test]
    fn test_configuration_message() {
        let err = ConduitError::configuration("zmq.threads", "expected an integer, got true");
        assert_eq!(
            err.to_string(),
            "Invalid setting 'zmq.threads': expected an integer, got true"
        );
    }
}
