//! Endpoint addressing and resolution.
//!
//! A messaging context never stores addresses; it derives them from the
//! locality flag and a logical port every time it binds or connects.
//! Peers using the same scheme must agree on the exact strings:
//!
//! | side    | local            | distributed        |
//! |---------|------------------|--------------------|
//! | bind    | `ipc://<port>.ipc` | `tcp://*:<port>`    |
//! | connect | `ipc://<port>.ipc` | `tcp://<host>:<port>` |

use std::fmt;
use std::str::FromStr;

/// Transport endpoint address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// IPC transport keyed by name: `ipc://name`
    Ipc(String),
    /// TCP bind on all interfaces: `tcp://*:port`
    TcpWildcard(u16),
    /// TCP peer: `tcp://host:port`
    Tcp {
        /// Host name or address, brackets included for IPv6
        host: String,
        /// TCP port
        port: u16,
    },
}

/// Resolve the address a receiving socket binds to.
///
/// # Examples
///
/// ```
/// use conduit_core::endpoint::resolve_bind;
///
/// assert_eq!(resolve_bind(true, 6700).to_string(), "ipc://6700.ipc");
/// assert_eq!(resolve_bind(false, 6700).to_string(), "tcp://*:6700");
/// ```
pub fn resolve_bind(is_local: bool, port: u16) -> Endpoint {
    if is_local {
        Endpoint::local(port)
    } else {
        Endpoint::TcpWildcard(port)
    }
}

/// Resolve the address a sending socket connects to.
///
/// When local, `host` is ignored so that both sides rendezvous on the
/// same IPC name.
///
/// # Examples
///
/// ```
/// use conduit_core::endpoint::{resolve_bind, resolve_connect};
///
/// assert_eq!(
///     resolve_connect(true, "node2", 6700),
///     resolve_bind(true, 6700),
/// );
/// assert_eq!(resolve_connect(false, "node2", 6700).to_string(), "tcp://node2:6700");
/// ```
pub fn resolve_connect(is_local: bool, host: &str, port: u16) -> Endpoint {
    if is_local {
        Endpoint::local(port)
    } else {
        Endpoint::Tcp {
            host: host.to_string(),
            port,
        }
    }
}

impl Endpoint {
    /// Local channel keyed by `port`.
    fn local(port: u16) -> Self {
        Endpoint::Ipc(format!("{port}.ipc"))
    }

    /// Parse an endpoint from a string.
    ///
    /// Supported formats:
    /// - `ipc://6700.ipc`
    /// - `tcp://*:6700`
    /// - `tcp://node2:6700`, `tcp://[::1]:6700`
    pub fn parse(s: &str) -> Result<Self, EndpointError> {
        s.parse()
    }

    /// Returns true if this endpoint can only be bound, never connected to.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Endpoint::TcpWildcard(_))
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix("ipc://") {
            if name.is_empty() {
                return Err(EndpointError::InvalidIpcName(
                    "ipc name cannot be empty".to_string(),
                ));
            }
            Ok(Endpoint::Ipc(name.to_string()))
        } else if let Some(addr) = s.strip_prefix("tcp://") {
            let (host, port) = addr
                .rsplit_once(':')
                .ok_or_else(|| EndpointError::InvalidTcpAddress(addr.to_string()))?;
            let port = port
                .parse::<u16>()
                .map_err(|_| EndpointError::InvalidTcpAddress(addr.to_string()))?;
            match host {
                "" => Err(EndpointError::InvalidTcpAddress(addr.to_string())),
                "*" => Ok(Endpoint::TcpWildcard(port)),
                host => Ok(Endpoint::Tcp {
                    host: host.to_string(),
                    port,
                }),
            }
        } else {
            Err(EndpointError::InvalidScheme(s.to_string()))
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Ipc(name) => write!(f, "ipc://{name}"),
            Endpoint::TcpWildcard(port) => write!(f, "tcp://*:{port}"),
            Endpoint::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

/// Errors that can occur when parsing endpoints.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Invalid scheme in endpoint: {0} (expected tcp:// or ipc://)")]
    InvalidScheme(String),

    #[error("Invalid TCP address: {0}")]
    InvalidTcpAddress(String),

    #[error("Invalid ipc name: {0}")]
    InvalidIpcName(String),
}
