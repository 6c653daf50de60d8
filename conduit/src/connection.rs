//! Connection handles returned by a messaging context.
//!
//! Each handle exclusively owns one transport socket. Directional
//! operations are delegated straight to the socket: no buffering, retry or
//! framing is added here.

use std::fmt;
use std::io;

use bytes::Bytes;
use conduit_core::endpoint::Endpoint;
use conduit_core::transport::TransportSocket;
use tracing::{debug, trace};

/// Capabilities shared by both connection directions.
pub trait Connection {
    /// Address the underlying socket was bound or connected to.
    fn endpoint(&self) -> &Endpoint;

    /// Topology the connection was created for.
    fn topology_id(&self) -> &str;

    /// Close the connection and its socket.
    fn close(self) -> io::Result<()>
    where
        Self: Sized;
}

/// Receive-only end of a channel (PULL socket).
pub struct ReceiveConnection<S: TransportSocket> {
    socket: S,
    topology_id: String,
    endpoint: Endpoint,
}

impl<S: TransportSocket> ReceiveConnection<S> {
    pub(crate) fn new(socket: S, topology_id: &str, endpoint: Endpoint) -> Self {
        Self {
            socket,
            topology_id: topology_id.to_string(),
            endpoint,
        }
    }

    /// Receive a message, blocking until one arrives.
    pub fn receive(&mut self) -> io::Result<Bytes> {
        let msg = self.socket.recv()?;
        trace!("[RECV] {} bytes on {}", msg.len(), self.endpoint);
        Ok(msg)
    }

    /// Receive a message if one is already queued.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(msg))` - Message received
    /// - `Ok(None)` - Nothing queued
    /// - `Err(io::Error)` - Socket failed or context terminated
    pub fn try_receive(&mut self) -> io::Result<Option<Bytes>> {
        self.socket.try_recv()
    }
}

impl<S: TransportSocket> Connection for ReceiveConnection<S> {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn topology_id(&self) -> &str {
        &self.topology_id
    }

    fn close(self) -> io::Result<()> {
        debug!(topology_id = %self.topology_id, "[RECV] Closing receiver {}", self.endpoint);
        self.socket.close()
    }
}

impl<S: TransportSocket> fmt::Debug for ReceiveConnection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiveConnection")
            .field("topology_id", &self.topology_id)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Send-only end of a channel (PUSH socket).
pub struct SendConnection<S: TransportSocket> {
    socket: S,
    topology_id: String,
    endpoint: Endpoint,
}

impl<S: TransportSocket> SendConnection<S> {
    pub(crate) fn new(socket: S, topology_id: &str, endpoint: Endpoint) -> Self {
        Self {
            socket,
            topology_id: topology_id.to_string(),
            endpoint,
        }
    }

    /// Send a message.
    ///
    /// Delivery failures to an unreachable peer surface here, not at connect.
    pub fn send(&mut self, msg: impl Into<Bytes>) -> io::Result<()> {
        let msg = msg.into();
        trace!("[SEND] {} bytes to {}", msg.len(), self.endpoint);
        self.socket.send(msg)
    }
}

impl<S: TransportSocket> Connection for SendConnection<S> {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn topology_id(&self) -> &str {
        &self.topology_id
    }

    fn close(self) -> io::Result<()> {
        debug!(topology_id = %self.topology_id, "[SEND] Closing sender {}", self.endpoint);
        self.socket.close()
    }
}

impl<S: TransportSocket> fmt::Debug for SendConnection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendConnection")
            .field("topology_id", &self.topology_id)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
