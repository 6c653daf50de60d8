//! Conduit Core
//!
//! This crate contains the transport-agnostic building blocks of a
//! messaging context:
//! - Transport capability contract (`transport`)
//! - Endpoint addressing and resolution (`endpoint`)
//! - Socket kinds (`socket_type`) and options (`options`)
//! - Error types (`error`)

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
pub mod endpoint;
pub mod error;
pub mod options;
pub mod socket_type;
pub mod transport;

// Optional: a small prelude to make downstream crates ergonomic.
// Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::endpoint::{resolve_bind, resolve_connect, Endpoint, EndpointError};
    pub use crate::error::{ConduitError, Result};
    pub use crate::options::SocketOption;
    pub use crate::socket_type::SocketType;
    pub use crate::transport::{Transport, TransportContext, TransportSocket};
}
