//! Transport capability contract.
//!
//! A messaging context never touches sockets directly. It drives any
//! transport that implements these three traits:
//!
//! - [`Transport`] allocates a shared context with a number of I/O threads
//! - [`TransportContext`] creates sockets and is torn down once
//! - [`TransportSocket`] is one PUSH or PULL endpoint
//!
//! Fallible operations use `io::Result`. Transports report a bind on a
//! taken address with [`io::ErrorKind::AddrInUse`], and `connect` must be
//! lazy: an absent peer is not an error at connect time.
//!
//! Sharing a context across threads (`&TransportContext: Send`) is only
//! possible when the transport guarantees concurrent socket creation is
//! safe, which is what the `Sync` auto trait expresses.

use bytes::Bytes;
use std::io;

use crate::options::SocketOption;
use crate::socket_type::SocketType;

/// Factory for transport contexts.
pub trait Transport {
    /// Shared context type
    type Context: TransportContext;

    /// Allocate a context running `io_threads` I/O threads.
    fn create_context(&self, io_threads: usize) -> io::Result<Self::Context>;
}

/// A live transport context against which sockets are multiplexed.
pub trait TransportContext {
    /// Socket type produced by this context
    type Socket: TransportSocket;

    /// Create a new, unconfigured socket.
    fn socket(&self, kind: SocketType) -> io::Result<Self::Socket>;

    /// Tear the context down. Sockets created from it become invalid.
    fn terminate(&mut self) -> io::Result<()>;
}

/// A single transport socket.
///
/// Options must be applied before `bind`/`connect`; transports may reject
/// option changes afterwards.
pub trait TransportSocket {
    /// Get the socket type.
    fn socket_type(&self) -> SocketType;

    /// Apply one option.
    fn set_option(&mut self, option: SocketOption) -> io::Result<()>;

    /// Bind to a local address.
    fn bind(&mut self, endpoint: &str) -> io::Result<()>;

    /// Connect to a peer address. Never fails because the peer is absent.
    fn connect(&mut self, endpoint: &str) -> io::Result<()>;

    /// Send one message.
    fn send(&mut self, msg: Bytes) -> io::Result<()>;

    /// Receive one message, blocking until one arrives.
    fn recv(&mut self) -> io::Result<Bytes>;

    /// Receive one message if one is queued.
    ///
    /// - `Ok(Some(msg))` - Message received
    /// - `Ok(None)` - Nothing queued
    fn try_recv(&mut self) -> io::Result<Option<Bytes>>;

    /// Close the socket, honouring any linger setting.
    fn close(self) -> io::Result<()>
    where
        Self: Sized;
}
