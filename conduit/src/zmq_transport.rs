//! libzmq-backed transport.
//!
//! Maps the transport capability onto the `zmq` crate. Enabled with the
//! `zmq` feature; needs the system libzmq.
//!
//! ```rust,no_run
//! use conduit::config::Settings;
//! use conduit::zmq_transport::ZmqTransport;
//! use conduit::MessagingContext;
//!
//! # fn example() -> conduit::Result<()> {
//! let mut context = MessagingContext::new(ZmqTransport::new());
//! context.initialize(&Settings::new())?;
//! let receiver = context.bind("wordcount-1", 6700)?;
//! # Ok(())
//! # }
//! ```

use std::io;

use bytes::Bytes;
use conduit_core::options::SocketOption;
use conduit_core::socket_type::SocketType;
use conduit_core::transport::{Transport, TransportContext, TransportSocket};
use tracing::debug;

/// Transport over libzmq.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZmqTransport;

impl ZmqTransport {
    /// Create the transport.
    pub fn new() -> Self {
        Self
    }
}

impl Transport for ZmqTransport {
    type Context = ZmqContext;

    fn create_context(&self, io_threads: usize) -> io::Result<ZmqContext> {
        let threads = to_i32(io_threads as u64, "io_threads")?;
        let context = zmq::Context::new();
        context.set_io_threads(threads).map_err(to_io)?;
        debug!("[ZMQ] Context created with {} I/O threads", threads);
        Ok(ZmqContext { context })
    }
}

/// libzmq context handle.
pub struct ZmqContext {
    context: zmq::Context,
}

impl TransportContext for ZmqContext {
    type Socket = ZmqSocket;

    fn socket(&self, kind: SocketType) -> io::Result<ZmqSocket> {
        let zmq_kind = match kind {
            SocketType::Pull => zmq::PULL,
            SocketType::Push => zmq::PUSH,
        };
        let socket = self.context.socket(zmq_kind).map_err(to_io)?;
        Ok(ZmqSocket { socket, kind })
    }

    // zmq_ctx_term blocks until every socket of the context is closed.
    fn terminate(&mut self) -> io::Result<()> {
        self.context.destroy().map_err(to_io)
    }
}

/// libzmq PUSH or PULL socket.
pub struct ZmqSocket {
    socket: zmq::Socket,
    kind: SocketType,
}

impl TransportSocket for ZmqSocket {
    fn socket_type(&self) -> SocketType {
        self.kind
    }

    fn set_option(&mut self, option: SocketOption) -> io::Result<()> {
        match option {
            SocketOption::HighWaterMark(hwm) => {
                let hwm = to_i32(hwm, "high water mark")?;
                self.socket.set_sndhwm(hwm).map_err(to_io)?;
                self.socket.set_rcvhwm(hwm).map_err(to_io)
            }
            SocketOption::Linger(linger) => {
                let millis = u64::try_from(linger.as_millis()).unwrap_or(u64::MAX);
                self.socket.set_linger(to_i32(millis, "linger")?).map_err(to_io)
            }
        }
    }

    fn bind(&mut self, endpoint: &str) -> io::Result<()> {
        self.socket.bind(endpoint).map_err(to_io)
    }

    fn connect(&mut self, endpoint: &str) -> io::Result<()> {
        self.socket.connect(endpoint).map_err(to_io)
    }

    fn send(&mut self, msg: Bytes) -> io::Result<()> {
        self.socket.send(&msg[..], 0).map_err(to_io)
    }

    fn recv(&mut self) -> io::Result<Bytes> {
        self.socket.recv_bytes(0).map(Bytes::from).map_err(to_io)
    }

    fn try_recv(&mut self) -> io::Result<Option<Bytes>> {
        match self.socket.recv_bytes(zmq::DONTWAIT) {
            Ok(msg) => Ok(Some(Bytes::from(msg))),
            Err(zmq::Error::EAGAIN) => Ok(None),
            Err(e) => Err(to_io(e)),
        }
    }

    fn close(self) -> io::Result<()> {
        drop(self.socket);
        Ok(())
    }
}

fn to_i32(value: u64, what: &str) -> io::Result<i32> {
    i32::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{what} {value} exceeds the libzmq limit"),
        )
    })
}

fn to_io(err: zmq::Error) -> io::Error {
    let kind = match err {
        zmq::Error::EADDRINUSE => io::ErrorKind::AddrInUse,
        zmq::Error::EAGAIN => io::ErrorKind::WouldBlock,
        zmq::Error::ETERM => io::ErrorKind::NotConnected,
        zmq::Error::EINVAL | zmq::Error::EPROTONOSUPPORT => io::ErrorKind::InvalidInput,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, err)
}
