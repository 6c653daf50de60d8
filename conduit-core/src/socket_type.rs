//! Socket kinds a messaging context asks its transport for.
//!
//! Channels are strictly one-directional, so only the pipeline pair of
//! ZeroMQ socket types is modelled.

use std::fmt;

/// Pipeline socket types.
///
/// Discriminants match the ZMQ_TYPE values (ZMTP 3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SocketType {
    /// PULL socket, receive-only end of a channel
    Pull = 7,

    /// PUSH socket, send-only end of a channel
    Push = 8,
}

impl SocketType {
    /// Get the socket type as a string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pull => "PULL",
            Self::Push => "PUSH",
        }
    }

    /// Whether sockets of this type can send.
    pub fn can_send(&self) -> bool {
        matches!(self, Self::Push)
    }

    /// Whether sockets of this type can receive.
    pub fn can_recv(&self) -> bool {
        matches!(self, Self::Pull)
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction() {
        assert!(SocketType::Push.can_send());
        assert!(!SocketType::Push.can_recv());
        assert!(SocketType::Pull.can_recv());
        assert!(!SocketType::Pull.can_send());
    }

    #[test]
    fn test_wire_values() {
        assert_eq!(SocketType::Pull as u8, 7);
        assert_eq!(SocketType::Push as u8, 8);
        assert_eq!(SocketType::Push.to_string(), "PUSH");
    }
}
