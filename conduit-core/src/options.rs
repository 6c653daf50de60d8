//! Socket options applied by a messaging context.
//!
//! Only the two policies the context enforces are modelled, mirroring
//! libzmq's `ZMQ_SNDHWM`/`ZMQ_RCVHWM` and `ZMQ_LINGER`.

use std::fmt;
use std::time::Duration;

/// A single socket option with its value.
///
/// # Examples
///
/// ```
/// use conduit_core::options::SocketOption;
/// use std::time::Duration;
///
/// let hwm = SocketOption::HighWaterMark(1000);
/// let linger = SocketOption::Linger(Duration::from_millis(5000));
/// assert_eq!(hwm.name(), "HWM");
/// assert_eq!(linger.name(), "LINGER");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketOption {
    /// High water mark (ZMQ_SNDHWM / ZMQ_RCVHWM)
    ///
    /// Maximum number of messages queued per socket before the transport's
    /// backpressure or drop policy engages.
    /// - `0`: unbounded
    HighWaterMark(u64),

    /// Linger timeout (ZMQ_LINGER)
    ///
    /// How long queued but unsent messages survive a close.
    /// - `Duration::ZERO`: discard pending messages immediately
    Linger(Duration),
}

impl SocketOption {
    /// Short option name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HighWaterMark(_) => "HWM",
            Self::Linger(_) => "LINGER",
        }
    }
}

impl fmt::Display for SocketOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighWaterMark(hwm) => write!(f, "{}={hwm}", self.name()),
            Self::Linger(linger) => write!(f, "{}={}ms", self.name(), linger.as_millis()),
        }
    }
}
