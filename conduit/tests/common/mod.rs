//! Recording transport shared by the integration tests.
//!
//! Every capability call is appended to a log so tests can assert the order
//! in which the context applies policy. Binds are exclusive per address.
//! A [`Fault`] makes one kind of capability call fail after it is recorded.

#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use conduit::options::SocketOption;
use conduit::socket_type::SocketType;
use conduit::transport::{Transport, TransportContext, TransportSocket};
use parking_lot::Mutex;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateContext(usize),
    Socket(SocketType),
    SetOption(SocketType, SocketOption),
    Bind(String),
    Connect(String),
    Send(Bytes),
    Close(SocketType),
    Terminate,
}

/// Capability call that fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    CreateContext,
    Socket,
    SetOption,
    Connect,
    Terminate,
}

impl Fault {
    fn error(self) -> io::Error {
        match self {
            Fault::CreateContext => {
                io::Error::new(io::ErrorKind::OutOfMemory, "too many open contexts")
            }
            Fault::Socket => io::Error::new(io::ErrorKind::Other, "socket limit reached"),
            Fault::SetOption => io::Error::new(io::ErrorKind::InvalidInput, "option rejected"),
            Fault::Connect => io::Error::new(io::ErrorKind::InvalidInput, "unresolvable host"),
            Fault::Terminate => io::Error::new(io::ErrorKind::Interrupted, "terminate interrupted"),
        }
    }
}

#[derive(Default)]
struct Log {
    calls: Mutex<Vec<Call>>,
    bound: Mutex<HashSet<String>>,
    fault: Option<Fault>,
}

impl Log {
    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn check(&self, fault: Fault) -> io::Result<()> {
        match self.fault {
            Some(configured) if configured == fault => Err(fault.error()),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingTransport {
    log: Arc<Log>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose `fault` calls fail.
    pub fn with_fault(fault: Fault) -> Self {
        Self {
            log: Arc::new(Log {
                fault: Some(fault),
                ..Log::default()
            }),
        }
    }

    /// A transport that cannot allocate its context.
    pub fn exhausted() -> Self {
        Self::with_fault(Fault::CreateContext)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.calls.lock().clone()
    }

    /// Calls recorded after the context was created.
    pub fn socket_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::CreateContext(_)))
            .collect()
    }
}

impl Transport for RecordingTransport {
    type Context = RecordingContext;

    fn create_context(&self, io_threads: usize) -> io::Result<RecordingContext> {
        self.log.record(Call::CreateContext(io_threads));
        self.log.check(Fault::CreateContext)?;
        Ok(RecordingContext {
            log: Arc::clone(&self.log),
        })
    }
}

pub struct RecordingContext {
    log: Arc<Log>,
}

impl TransportContext for RecordingContext {
    type Socket = RecordingSocket;

    fn socket(&self, kind: SocketType) -> io::Result<RecordingSocket> {
        self.log.record(Call::Socket(kind));
        self.log.check(Fault::Socket)?;
        Ok(RecordingSocket {
            log: Arc::clone(&self.log),
            kind,
            bound: None,
        })
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.log.record(Call::Terminate);
        self.log.check(Fault::Terminate)
    }
}

pub struct RecordingSocket {
    log: Arc<Log>,
    kind: SocketType,
    bound: Option<String>,
}

impl TransportSocket for RecordingSocket {
    fn socket_type(&self) -> SocketType {
        self.kind
    }

    fn set_option(&mut self, option: SocketOption) -> io::Result<()> {
        self.log.record(Call::SetOption(self.kind, option));
        self.log.check(Fault::SetOption)
    }

    fn bind(&mut self, endpoint: &str) -> io::Result<()> {
        self.log.record(Call::Bind(endpoint.to_string()));
        if !self.log.bound.lock().insert(endpoint.to_string()) {
            return Err(io::Error::new(
                io::ErrorKind::AddrInUse,
                format!("{endpoint} already bound"),
            ));
        }
        self.bound = Some(endpoint.to_string());
        Ok(())
    }

    fn connect(&mut self, endpoint: &str) -> io::Result<()> {
        self.log.record(Call::Connect(endpoint.to_string()));
        self.log.check(Fault::Connect)
    }

    fn send(&mut self, msg: Bytes) -> io::Result<()> {
        self.log.record(Call::Send(msg));
        Ok(())
    }

    fn recv(&mut self) -> io::Result<Bytes> {
        Err(io::Error::new(io::ErrorKind::WouldBlock, "nothing recorded"))
    }

    fn try_recv(&mut self) -> io::Result<Option<Bytes>> {
        Ok(None)
    }

    fn close(self) -> io::Result<()> {
        self.log.record(Call::Close(self.kind));
        if let Some(endpoint) = &self.bound {
            self.log.bound.lock().remove(endpoint);
        }
        Ok(())
    }
}

pub fn settings(value: Value) -> conduit::Settings {
    match value {
        Value::Object(map) => map,
        other => panic!("settings must be an object, got {other}"),
    }
}
