//! Messaging context.
//!
//! One context per process owns the shared transport context and turns a
//! handful of settings into per-socket policy:
//!
//! - every socket gets the high water mark
//! - send-side sockets also get the linger, after the high water mark and
//!   before connecting
//! - addresses come from [`resolve_bind`]/[`resolve_connect`] and the
//!   locality flag fixed at initialization
//!
//! # Lifecycle
//!
//! `Uninitialized --initialize--> Running --terminate--> Terminated`
//!
//! `bind` and `connect` are only valid while running. They borrow the
//! context shared, while `initialize` and `terminate` need it exclusively, so
//! a context cannot be torn down under an in-flight `bind`/`connect`.

use std::time::Duration;

use conduit_core::endpoint::{resolve_bind, resolve_connect};
use conduit_core::error::{ConduitError, Result};
use conduit_core::options::SocketOption;
use conduit_core::socket_type::SocketType;
use conduit_core::transport::{Transport, TransportContext, TransportSocket};
use tracing::{debug, info};

use crate::config::{ContextConfig, Settings};
use crate::connection::{ReceiveConnection, SendConnection};

/// Socket type produced by transport `T`.
pub type SocketOf<T> = <<T as Transport>::Context as TransportContext>::Socket;

enum State<C> {
    Uninitialized,
    Running(C),
    Terminated,
}

/// Creates PUSH/PULL channels over a shared transport context.
///
/// # Examples
///
/// ```
/// use conduit::config::Settings;
/// use conduit::memory::MemoryTransport;
/// use conduit::MessagingContext;
///
/// # fn main() -> conduit::Result<()> {
/// let mut context = MessagingContext::new(MemoryTransport::new());
/// context.initialize(&Settings::new())?;
///
/// let mut receiver = context.bind("wordcount-1", 6700)?;
/// let mut sender = context.connect("wordcount-1", "localhost", 6700)?;
///
/// sender.send("hello").unwrap();
/// assert_eq!(receiver.receive().unwrap(), "hello");
///
/// context.terminate()?;
/// # Ok(())
/// # }
/// ```
pub struct MessagingContext<T: Transport> {
    transport: T,
    config: Option<ContextConfig>,
    state: State<T::Context>,
}

impl<T: Transport> MessagingContext<T> {
    /// Create an uninitialized context over `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: None,
            state: State::Uninitialized,
        }
    }

    /// Read the settings and allocate the shared transport context.
    ///
    /// # Errors
    ///
    /// - [`ConduitError::AlreadyInitialized`] unless the context is fresh
    /// - [`ConduitError::Configuration`] for a malformed setting
    /// - [`ConduitError::Initialization`] if the transport cannot allocate
    pub fn initialize(&mut self, settings: &Settings) -> Result<()> {
        self.ensure_uninitialized()?;
        let config = ContextConfig::from_settings(settings)?;
        self.initialize_with(config)
    }

    /// Initialize from an already-typed configuration.
    pub fn initialize_with(&mut self, config: ContextConfig) -> Result<()> {
        self.ensure_uninitialized()?;
        if config.thread_count == 0 {
            return Err(ConduitError::configuration(
                crate::config::ZMQ_THREADS,
                "thread count must be positive, got 0",
            ));
        }

        let context = self
            .transport
            .create_context(config.thread_count)
            .map_err(ConduitError::Initialization)?;

        info!(
            threads = config.thread_count,
            linger = ?config.linger,
            hwm = config.high_water_mark,
            local = config.is_local,
            "[CONTEXT] Messaging context prepared"
        );

        self.state = State::Running(context);
        self.config = Some(config);
        Ok(())
    }

    /// Create a receiving connection bound to `port`.
    ///
    /// `topology_id` is used for diagnostics only.
    ///
    /// # Errors
    ///
    /// - [`ConduitError::NotInitialized`] outside the running window
    /// - [`ConduitError::Bind`] if the transport rejects the address
    /// - [`ConduitError::Transport`] if the socket cannot be created or configured
    pub fn bind(&self, topology_id: &str, port: u16) -> Result<ReceiveConnection<SocketOf<T>>> {
        let (context, config) = self.running()?;
        let endpoint = resolve_bind(config.is_local, port);

        let mut socket = context
            .socket(SocketType::Pull)
            .map_err(|e| ConduitError::transport("socket", e))?;
        apply(&mut socket, SocketOption::HighWaterMark(config.high_water_mark))?;

        socket
            .bind(&endpoint.to_string())
            .map_err(|source| ConduitError::Bind {
                endpoint: endpoint.clone(),
                source,
            })?;

        info!(topology_id, "[CONTEXT] Created receiver {}", endpoint);
        Ok(ReceiveConnection::new(socket, topology_id, endpoint))
    }

    /// Create a sending connection to `host:port`.
    ///
    /// The connect is lazy: an absent peer is not an error here and only
    /// shows up when sending.
    ///
    /// # Errors
    ///
    /// - [`ConduitError::NotInitialized`] outside the running window
    /// - [`ConduitError::Connect`] if the transport rejects the address
    /// - [`ConduitError::Transport`] if the socket cannot be created or configured
    pub fn connect(
        &self,
        topology_id: &str,
        host: &str,
        port: u16,
    ) -> Result<SendConnection<SocketOf<T>>> {
        let (context, config) = self.running()?;
        let endpoint = resolve_connect(config.is_local, host, port);

        let mut socket = context
            .socket(SocketType::Push)
            .map_err(|e| ConduitError::transport("socket", e))?;
        // HWM before linger, both before connect
        apply(&mut socket, SocketOption::HighWaterMark(config.high_water_mark))?;
        apply(&mut socket, SocketOption::Linger(config.linger))?;

        socket
            .connect(&endpoint.to_string())
            .map_err(|source| ConduitError::Connect {
                endpoint: endpoint.clone(),
                source,
            })?;

        info!(topology_id, "[CONTEXT] Created sender {}", endpoint);
        Ok(SendConnection::new(socket, topology_id, endpoint))
    }

    /// Tear down the shared transport context.
    ///
    /// The context ends up terminated even if the transport reports a
    /// failure while shutting down.
    ///
    /// # Errors
    ///
    /// - [`ConduitError::NotInitialized`] before `initialize` or on a second call
    /// - [`ConduitError::Transport`] if the transport fails to terminate
    pub fn terminate(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, State::Terminated) {
            State::Running(mut context) => {
                info!("[CONTEXT] Messaging context terminates");
                context
                    .terminate()
                    .map_err(|e| ConduitError::transport("terminate", e))
            }
            State::Uninitialized => {
                self.state = State::Uninitialized;
                Err(ConduitError::NotInitialized)
            }
            State::Terminated => Err(ConduitError::NotInitialized),
        }
    }

    /// Whether `bind`/`connect` are currently valid.
    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    /// Configuration fixed at initialization, kept after termination.
    pub fn config(&self) -> Option<&ContextConfig> {
        self.config.as_ref()
    }

    /// Transport I/O threads.
    pub fn thread_count(&self) -> Option<usize> {
        self.config.as_ref().map(|c| c.thread_count)
    }

    /// Linger applied to send-side sockets.
    pub fn linger(&self) -> Option<Duration> {
        self.config.as_ref().map(|c| c.linger)
    }

    /// High water mark applied to every socket.
    pub fn high_water_mark(&self) -> Option<u64> {
        self.config.as_ref().map(|c| c.high_water_mark)
    }

    /// Whether local (IPC) addressing is in use.
    pub fn is_local(&self) -> Option<bool> {
        self.config.as_ref().map(|c| c.is_local)
    }

    fn ensure_uninitialized(&self) -> Result<()> {
        match self.state {
            State::Uninitialized => Ok(()),
            State::Running(_) | State::Terminated => Err(ConduitError::AlreadyInitialized),
        }
    }

    fn running(&self) -> Result<(&T::Context, &ContextConfig)> {
        match (&self.state, &self.config) {
            (State::Running(context), Some(config)) => Ok((context, config)),
            _ => Err(ConduitError::NotInitialized),
        }
    }
}

fn apply<S: TransportSocket>(socket: &mut S, option: SocketOption) -> Result<()> {
    debug!("[CONTEXT] Setting {} on {} socket", option, socket.socket_type());
    socket
        .set_option(option)
        .map_err(|e| ConduitError::transport("set_option", e))
}
