use std::ops::Deref;

use bytes::Bytes;

use crate::buffer::SharedBuffer;
use crate::exit::ExitReason;
use crate::pid::Pid;

/// An item in a [`Mailbox`](crate::mailbox::Mailbox).
#[derive(Debug, Clone)]
pub enum Message {
    Data(Payload),
    System(SystemMessage),
}

/// Opaque message body.
///
/// Either a plain byte string, or a region of the [`BufferPool`](crate::buffer::BufferPool)
/// that has been handed over without copying.
#[derive(Debug, Clone)]
pub enum Payload {
    Bytes(Bytes),
    Buffer(SharedBuffer),
}

/// Notifications produced by the runtime itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMessage {
    /// A monitored actor (local or remote) has terminated.
    Down { pid: Pid, reason: ExitReason },

    /// A linked actor has terminated, delivered to the actors trapping exits.
    Exit { from: Pid, reason: ExitReason },

    Heartbeat,

    Custom(Bytes),
}

impl Message {
    pub fn data(bytes: impl Into<Bytes>) -> Self {
        Self::Data(Payload::Bytes(bytes.into()))
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }

    pub fn as_data(&self) -> Option<&Payload> {
        match self {
            Self::Data(payload) => Some(payload),
            Self::System(_) => None,
        }
    }

    pub fn as_system(&self) -> Option<&SystemMessage> {
        match self {
            Self::System(sys) => Some(sys),
            Self::Data(_) => None,
        }
    }

    pub fn into_data(self) -> Option<Payload> {
        match self {
            Self::Data(payload) => Some(payload),
            Self::System(_) => None,
        }
    }

    /// Whether this is a data message starting with `prefix`.
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.as_data().map(|p| p.starts_with(prefix)).unwrap_or(false)
    }
}

impl From<Payload> for Message {
    fn from(payload: Payload) -> Self {
        Self::Data(payload)
    }
}
impl From<SystemMessage> for Message {
    fn from(sys: SystemMessage) -> Self {
        Self::System(sys)
    }
}

impl Payload {
    /// Cheap for [`Payload::Bytes`], copies for [`Payload::Buffer`].
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Bytes(bytes) => bytes.clone(),
            Self::Buffer(buffer) => Bytes::copy_from_slice(buffer),
        }
    }

    pub fn as_buffer(&self) -> Option<&SharedBuffer> {
        match self {
            Self::Buffer(buffer) => Some(buffer),
            Self::Bytes(_) => None,
        }
    }
}

impl Deref for Payload {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Buffer(buffer) => buffer,
        }
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}
impl From<SharedBuffer> for Payload {
    fn from(buffer: SharedBuffer) -> Self {
        Self::Buffer(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_accessors() {
        let msg = Message::data(&b"HEAVY payload"[..]);
        assert!(!msg.is_system());
        assert!(msg.starts_with(b"HEAVY"));
        assert_eq!(&msg.as_data().unwrap()[..], b"HEAVY payload");

        let sys = Message::from(SystemMessage::Heartbeat);
        assert!(sys.is_system());
        assert!(!sys.starts_with(b""));
        assert!(sys.into_data().is_none());
    }
}
