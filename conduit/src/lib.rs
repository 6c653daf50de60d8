//! # Conduit
//!
//! A messaging context that materializes point-to-point channels over a
//! pluggable transport.
//!
//! ## Architecture
//!
//! - **`conduit-core`**: transport capability contract, endpoint
//!   resolution, socket kinds and options, errors
//! - **`conduit`**: the messaging context, its configuration, connection
//!   handles and the bundled transports (this crate)
//!
//! ## Transports
//!
//! - [`memory::MemoryTransport`] - in-process channels, always available
//! - `zmq_transport::ZmqTransport` - libzmq, behind the **`zmq`** feature
//!
//! ```toml
//! [dependencies]
//! conduit = { version = "0.1", features = ["zmq"] }
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use conduit::config::Settings;
//! use conduit::memory::MemoryTransport;
//! use conduit::MessagingContext;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings: Settings = serde_json::from_value(json!({
//!     "zmq.hwm": 1000,
//!     "storm.cluster.mode": "distributed",
//! }))?;
//!
//! let mut context = MessagingContext::new(MemoryTransport::new());
//! context.initialize(&settings)?;
//!
//! // Receiver binds tcp://*:6700, sender connects tcp://node2:6700
//! let mut receiver = context.bind("wordcount-1", 6700)?;
//! let mut sender = context.connect("wordcount-1", "node2", 6700)?;
//!
//! sender.send("tuple")?;
//! assert_eq!(receiver.receive()?, "tuple");
//!
//! context.terminate()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod connection;
pub mod context;
pub mod dev_tracing;
pub mod memory;

#[cfg(feature = "zmq")]
pub mod zmq_transport;

// Re-export core types
pub use bytes::Bytes;
pub use conduit_core::{endpoint, error, options, socket_type, transport};
pub use conduit_core::error::{ConduitError, Result};

pub use config::{ContextConfig, Settings};
pub use connection::{Connection, ReceiveConnection, SendConnection};
pub use context::MessagingContext;

/// Convenient imports.
pub mod prelude {
    pub use crate::config::{ContextConfig, Settings};
    pub use crate::connection::{Connection, ReceiveConnection, SendConnection};
    pub use crate::context::MessagingContext;
    pub use crate::memory::MemoryTransport;
    pub use bytes::Bytes;
    pub use conduit_core::prelude::*;
}
