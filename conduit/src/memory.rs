//! In-memory transport.
//!
//! A conforming transport that keeps every channel inside the process, for
//! local-mode topologies and tests.
//!
//! # Behaviour
//!
//! - **Scoped registry**: bound endpoints live in the context, not a global
//! - **Exclusive bind**: a second bind on the same address fails with
//!   `AddrInUse` until the first PULL socket is closed
//! - **Lazy connect**: the peer is looked up on every send; messages sent
//!   before it binds wait in a pending queue
//! - **High water mark**: bounds the receive queue and the pending queue;
//!   a full queue makes `send` fail with `WouldBlock`
//! - **Linger**: closing a PUSH socket keeps delivering pending messages
//!   until they are all taken, the context terminates or the linger period
//!   runs out; whatever is left is then discarded
//!
//! TCP addresses are keyed by port only: every host is this process.
//!
//! # Usage
//!
//! ```rust
//! use conduit::memory::MemoryTransport;
//! use conduit::transport::{Transport, TransportContext, TransportSocket};
//! use conduit::socket_type::SocketType;
//!
//! # fn example() -> std::io::Result<()> {
//! let context = MemoryTransport::new().create_context(1)?;
//!
//! let mut pull = context.socket(SocketType::Pull)?;
//! pull.bind("tcp://*:6700")?;
//!
//! let mut push = context.socket(SocketType::Push)?;
//! push.connect("tcp://node2:6700")?;
//! push.send("hello".into())?;
//!
//! assert_eq!(pull.recv()?, "hello");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use conduit_core::endpoint::Endpoint;
use conduit_core::options::SocketOption;
use conduit_core::socket_type::SocketType;
use conduit_core::transport::{Transport, TransportContext, TransportSocket};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use flume::{Receiver, SendTimeoutError, Sender, TryRecvError, TrySendError};
use tracing::{debug, trace};

/// Longest single wait while lingering, so termination and late binds are noticed.
const LINGER_POLL: Duration = Duration::from_millis(10);

/// Transport that delivers messages through in-process channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryTransport;

impl MemoryTransport {
    /// Create the transport.
    pub fn new() -> Self {
        Self
    }
}

impl Transport for MemoryTransport {
    type Context = MemoryContext;

    fn create_context(&self, io_threads: usize) -> io::Result<MemoryContext> {
        if io_threads == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "at least one I/O thread is required",
            ));
        }
        debug!("[MEMORY] Creating context with {} I/O threads", io_threads);
        Ok(MemoryContext {
            shared: Arc::new(Shared::default()),
        })
    }
}

#[derive(Default)]
struct Shared {
    registry: DashMap<String, Sender<Bytes>>,
    terminated: AtomicBool,
}

impl Shared {
    fn ensure_live(&self) -> io::Result<()> {
        if self.terminated.load(Ordering::Acquire) {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "context terminated",
            ));
        }
        Ok(())
    }
}

/// Shared context of the in-memory transport.
pub struct MemoryContext {
    shared: Arc<Shared>,
}

impl MemoryContext {
    /// Registry keys of the currently bound endpoints.
    ///
    /// This is primarily useful for debugging and testing.
    pub fn bound_endpoints(&self) -> Vec<String> {
        self.shared
            .registry
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl TransportContext for MemoryContext {
    type Socket = MemorySocket;

    fn socket(&self, kind: SocketType) -> io::Result<MemorySocket> {
        self.shared.ensure_live()?;
        Ok(MemorySocket {
            kind,
            shared: Arc::clone(&self.shared),
            hwm: 0,
            linger: Duration::ZERO,
            state: SocketState::Idle,
        })
    }

    fn terminate(&mut self) -> io::Result<()> {
        if self.shared.terminated.swap(true, Ordering::AcqRel) {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "context already terminated",
            ));
        }
        // Dropping the senders wakes receivers blocked in recv.
        self.shared.registry.clear();
        debug!("[MEMORY] Context terminated");
        Ok(())
    }
}

enum SocketState {
    Idle,
    Bound {
        key: String,
        rx: Receiver<Bytes>,
    },
    Connected {
        key: String,
        pending: VecDeque<Bytes>,
    },
}

/// PUSH or PULL socket of the in-memory transport.
///
/// PULL sockets can only bind and PUSH sockets can only connect.
pub struct MemorySocket {
    kind: SocketType,
    shared: Arc<Shared>,
    hwm: u64,
    linger: Duration,
    state: SocketState,
}

impl MemorySocket {
    fn ensure_idle(&self) -> io::Result<()> {
        match self.state {
            SocketState::Idle => Ok(()),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "socket is already bound or connected",
            )),
        }
    }

    fn ensure_direction(&self, allowed: bool, operation: &str) -> io::Result<()> {
        if !allowed {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("{operation} is not supported on {} sockets", self.kind),
            ));
        }
        Ok(())
    }

    fn receiver(&self) -> io::Result<&Receiver<Bytes>> {
        self.shared.ensure_live()?;
        match &self.state {
            SocketState::Bound { rx, .. } => Ok(rx),
            _ => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "socket is not bound",
            )),
        }
    }

    /// Messages waiting for the peer to bind or drain.
    pub fn pending(&self) -> usize {
        match &self.state {
            SocketState::Connected { pending, .. } => pending.len(),
            _ => 0,
        }
    }
}

/// Registry key: IPC by name, TCP by port.
fn registry_key(endpoint: &str) -> io::Result<(Endpoint, String)> {
    let parsed = Endpoint::parse(endpoint)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let key = match &parsed {
        Endpoint::Ipc(name) => format!("ipc://{name}"),
        Endpoint::TcpWildcard(port) | Endpoint::Tcp { port, .. } => format!("tcp://*:{port}"),
    };
    Ok((parsed, key))
}

/// Move pending messages to the peer, oldest first.
///
/// Returns the number delivered; stops at a missing or full peer.
fn flush(shared: &Shared, key: &str, pending: &mut VecDeque<Bytes>) -> usize {
    let Some(peer) = shared.registry.get(key).map(|entry| entry.value().clone()) else {
        return 0;
    };

    let mut delivered = 0;
    while let Some(msg) = pending.pop_front() {
        match peer.try_send(msg) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(msg) | TrySendError::Disconnected(msg)) => {
                pending.push_front(msg);
                break;
            }
        }
    }
    delivered
}

/// Keep delivering `pending` until it is empty, the context terminates or
/// `linger` has elapsed.
fn drain_with_linger(
    shared: &Shared,
    key: &str,
    pending: &mut VecDeque<Bytes>,
    linger: Duration,
) {
    // A linger too large to represent waits indefinitely.
    let deadline = Instant::now().checked_add(linger);

    while !pending.is_empty() && !shared.terminated.load(Ordering::Acquire) {
        let wait = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                remaining.min(LINGER_POLL)
            }
            None => LINGER_POLL,
        };

        let Some(peer) = shared.registry.get(key).map(|entry| entry.value().clone()) else {
            thread::sleep(wait);
            continue;
        };
        let Some(msg) = pending.pop_front() else {
            break;
        };
        match peer.send_timeout(msg, wait) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(msg)) => pending.push_front(msg),
            Err(SendTimeoutError::Disconnected(msg)) => {
                // Peer unbound; wait for a rebind like any absent peer.
                pending.push_front(msg);
                thread::sleep(wait);
            }
        }
    }
}

impl TransportSocket for MemorySocket {
    fn socket_type(&self) -> SocketType {
        self.kind
    }

    fn set_option(&mut self, option: SocketOption) -> io::Result<()> {
        // Queues are sized at bind/connect time.
        self.ensure_idle()?;
        match option {
            SocketOption::HighWaterMark(hwm) => self.hwm = hwm,
            SocketOption::Linger(linger) => self.linger = linger,
        }
        Ok(())
    }

    fn bind(&mut self, endpoint: &str) -> io::Result<()> {
        self.shared.ensure_live()?;
        self.ensure_direction(self.kind.can_recv(), "bind")?;
        self.ensure_idle()?;
        let (_, key) = registry_key(endpoint)?;

        let (tx, rx) = match self.hwm {
            0 => flume::unbounded(),
            hwm => flume::bounded(usize::try_from(hwm).unwrap_or(usize::MAX)),
        };

        match self.shared.registry.entry(key.clone()) {
            Entry::Occupied(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::AddrInUse,
                    format!("endpoint '{endpoint}' is already bound"),
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(tx);
            }
        }

        debug!("[MEMORY] Bound {}", key);
        self.state = SocketState::Bound { key, rx };
        Ok(())
    }

    fn connect(&mut self, endpoint: &str) -> io::Result<()> {
        self.shared.ensure_live()?;
        self.ensure_direction(self.kind.can_send(), "connect")?;
        self.ensure_idle()?;
        let (parsed, key) = registry_key(endpoint)?;
        if parsed.is_wildcard() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot connect to wildcard endpoint '{endpoint}'"),
            ));
        }

        debug!("[MEMORY] Connected to {}", key);
        self.state = SocketState::Connected {
            key,
            pending: VecDeque::new(),
        };
        Ok(())
    }

    fn send(&mut self, msg: Bytes) -> io::Result<()> {
        self.shared.ensure_live()?;
        let SocketState::Connected { key, pending } = &mut self.state else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "socket is not connected",
            ));
        };

        flush(&self.shared, key, pending);
        if self.hwm > 0 && pending.len() as u64 >= self.hwm {
            return Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                format!("high water mark of {} reached", self.hwm),
            ));
        }

        pending.push_back(msg);
        flush(&self.shared, key, pending);
        trace!("[MEMORY] {} messages pending for {}", pending.len(), key);
        Ok(())
    }

    fn recv(&mut self) -> io::Result<Bytes> {
        self.receiver()?.recv().map_err(|_| {
            io::Error::new(io::ErrorKind::NotConnected, "context terminated")
        })
    }

    fn try_recv(&mut self) -> io::Result<Option<Bytes>> {
        match self.receiver()?.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "context terminated",
            )),
        }
    }

    fn close(self) -> io::Result<()> {
        // Linger and unbind happen in Drop so an unclosed socket behaves the same.
        drop(self);
        Ok(())
    }
}

impl Drop for MemorySocket {
    fn drop(&mut self) {
        match &mut self.state {
            SocketState::Idle => {}
            SocketState::Bound { key, .. } => {
                if !self.shared.terminated.load(Ordering::Acquire) {
                    self.shared.registry.remove(key.as_str());
                    debug!("[MEMORY] Unbound {}", key);
                }
            }
            SocketState::Connected { key, pending } => {
                if pending.is_empty() {
                    return;
                }
                if self.linger.is_zero() {
                    debug!("[MEMORY] Linger=0, discarding {} messages", pending.len());
                    return;
                }
                debug!(
                    "[MEMORY] Lingering up to {:?} on {} pending messages",
                    self.linger,
                    pending.len()
                );
                drain_with_linger(&self.shared, key, pending, self.linger);
                if !pending.is_empty() {
                    debug!(
                        "[MEMORY] Linger expired, discarding {} messages for {}",
                        pending.len(),
                        key
                    );
                }
            }
        }
    }
}
