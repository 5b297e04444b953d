use bytes::{Buf, BufMut, Bytes, BytesMut};
use myrmidon_actors::{ExitReason, Pid};
use tokio_util::codec::{Decoder, Encoder};

use crate::reason;


pub const MAGIC: u16 = 0x4D59;
pub const VERSION: u8 = 1;
pub const HEADER_LEN: usize = 2 + 1 + 1 + 8 + 4;

const NO_PID: Pid = Pid::from_raw(0);
const FOUND: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("I/O")]
    Io(#[source] std::io::Error),

    #[error("Bad magic: {:#06x}", _0)]
    BadMagic(u16),

    #[error("Unsupported protocol version: {}", _0)]
    UnsupportedVersion(u8),

    #[error("Unknown frame kind: {}", _0)]
    UnknownKind(u8),

    #[error("Frame too large: {} > {}", len, max)]
    TooLarge { len: usize, max: usize },

    #[error("Malformed payload: {}", _0)]
    BadPayload(&'static str),
}

impl From<std::io::Error> for FrameError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameKind {
    Data = 1,
    ResolveReq = 2,
    ResolveResp = 3,
    MonitorSub = 4,
    Heartbeat = 5,
    Down = 6,
}

impl TryFrom<u8> for FrameKind {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let kind = match value {
            1 => Self::Data,
            2 => Self::ResolveReq,
            3 => Self::ResolveResp,
            4 => Self::MonitorSub,
            5 => Self::Heartbeat,
            6 => Self::Down,
            unknown => return Err(FrameError::UnknownKind(unknown)),
        };
        Ok(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub target: Pid,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(kind: FrameKind, target: Pid, payload: impl Into<Bytes>) -> Self {
        Self { kind, target, payload: payload.into() }
    }

    pub fn data(target: Pid, payload: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Data, target, payload)
    }

    pub fn resolve_req(name: &str) -> Self {
        Self::new(FrameKind::ResolveReq, NO_PID, Bytes::copy_from_slice(name.as_bytes()))
    }

    pub fn resolve_resp(resolved: Option<Pid>) -> Self {
        match resolved {
            Some(pid) => Self::new(FrameKind::ResolveResp, pid, Bytes::from_static(&[FOUND])),
            None => Self::new(FrameKind::ResolveResp, NO_PID, Bytes::new()),
        }
    }

    pub fn monitor_sub(pid: Pid) -> Self {
        Self::new(FrameKind::MonitorSub, pid, Bytes::new())
    }

    pub fn heartbeat() -> Self {
        Self::new(FrameKind::Heartbeat, NO_PID, Bytes::new())
    }

    pub fn down(pid: Pid, exit_reason: &ExitReason) -> Self {
        let mut payload = BytesMut::new();
        reason::encode(exit_reason, &mut payload);
        Self::new(FrameKind::Down, pid, payload.freeze())
    }

    /// The name carried by a [`FrameKind::ResolveReq`].
    pub fn name(&self) -> Result<&str, FrameError> {
        std::str::from_utf8(&self.payload).map_err(|_| FrameError::BadPayload("name is not utf-8"))
    }

    /// The answer carried by a [`FrameKind::ResolveResp`].
    pub fn resolved(&self) -> Option<Pid> {
        (self.payload.first() == Some(&FOUND)).then_some(self.target)
    }

    /// The exit reason carried by a [`FrameKind::Down`].
    pub fn exit_reason(&self) -> Result<ExitReason, FrameError> {
        reason::decode(&mut self.payload.clone())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_len: usize,
}

impl FrameCodec {
    pub fn new(max_frame_len: usize) -> Self {
        Self { max_frame_len: max_frame_len.min(u32::MAX as usize) }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(crate::TransportConfig::default().max_frame_len)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_LEN {
            return Ok(None)
        }

        let mut header = &src[..HEADER_LEN];
        let magic = header.get_u16();
        if magic != MAGIC {
            return Err(FrameError::BadMagic(magic))
        }
        let version = header.get_u8();
        if version != VERSION {
            return Err(FrameError::UnsupportedVersion(version))
        }
        let kind = FrameKind::try_from(header.get_u8())?;
        let target = Pid::from_raw(header.get_u64());
        let len = header.get_u32() as usize;

        if len > self.max_frame_len {
            return Err(FrameError::TooLarge { len, max: self.max_frame_len })
        }
        if src.len() < HEADER_LEN + len {
            src.reserve(HEADER_LEN + len - src.len());
            return Ok(None)
        }

        src.advance(HEADER_LEN);
        let payload = src.split_to(len).freeze();

        Ok(Some(Frame { kind, target, payload }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let len = frame.payload.len();
        if len > self.max_frame_len {
            return Err(FrameError::TooLarge { len, max: self.max_frame_len })
        }

        dst.reserve(HEADER_LEN + len);
        dst.put_u16(MAGIC);
        dst.put_u8(VERSION);
        dst.put_u8(frame.kind as u8);
        dst.put_u64(frame.target.to_raw());
        dst.put_u32(len as u32);
        dst.extend_from_slice(&frame.payload);

        Ok(())
    }
}
