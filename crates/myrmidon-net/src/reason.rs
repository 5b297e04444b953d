//! [`ExitReason`] on the wire: a tag byte followed by the variant's details.

use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use myrmidon_actors::{ExitReason, Pid};

use crate::frame::FrameError;

const NORMAL: u8 = 0;
const SHUTDOWN: u8 = 1;
const KILL: u8 = 2;
const NO_ACTOR: u8 = 3;
const PANIC: u8 = 4;
const LINKED: u8 = 5;
const CONNECTION_LOST: u8 = 6;
const CUSTOM: u8 = 7;

const MAX_DEPTH: usize = 16;

pub(crate) fn encode(exit_reason: &ExitReason, dst: &mut BytesMut) {
    match exit_reason {
        ExitReason::Normal => dst.put_u8(NORMAL),
        ExitReason::Shutdown => dst.put_u8(SHUTDOWN),
        ExitReason::Kill => dst.put_u8(KILL),
        ExitReason::NoActor => dst.put_u8(NO_ACTOR),
        ExitReason::ConnectionLost => dst.put_u8(CONNECTION_LOST),
        ExitReason::Panic(text) => {
            dst.put_u8(PANIC);
            dst.extend_from_slice(text.as_bytes());
        },
        ExitReason::Custom(text) => {
            dst.put_u8(CUSTOM);
            dst.extend_from_slice(text.as_bytes());
        },
        ExitReason::Linked(pid, nested) => {
            dst.put_u8(LINKED);
            dst.put_u64(pid.to_raw());
            encode(nested, dst);
        },
    }
}

pub(crate) fn decode(src: &mut Bytes) -> Result<ExitReason, FrameError> {
    decode_nested(src, 0)
}

fn decode_nested(src: &mut Bytes, depth: usize) -> Result<ExitReason, FrameError> {
    if depth > MAX_DEPTH {
        return Err(FrameError::BadPayload("exit reason nested too deep"))
    }
    if !src.has_remaining() {
        return Err(FrameError::BadPayload("empty exit reason"))
    }
    let exit_reason = match src.get_u8() {
        NORMAL => ExitReason::Normal,
        SHUTDOWN => ExitReason::Shutdown,
        KILL => ExitReason::Kill,
        NO_ACTOR => ExitReason::NoActor,
        CONNECTION_LOST => ExitReason::ConnectionLost,
        PANIC => ExitReason::Panic(text(src)?),
        CUSTOM => ExitReason::Custom(text(src)?),
        LINKED => {
            if src.remaining() < 8 {
                return Err(FrameError::BadPayload("truncated linked pid"))
            }
            let pid = Pid::from_raw(src.get_u64());
            ExitReason::Linked(pid, Box::new(decode_nested(src, depth + 1)?))
        },
        _ => return Err(FrameError::BadPayload("unknown exit reason tag")),
    };
    Ok(exit_reason)
}

fn text(src: &mut Bytes) -> Result<Arc<str>, FrameError> {
    let bytes = src.split_to(src.len());
    std::str::from_utf8(&bytes)
        .map(Arc::from)
        .map_err(|_| FrameError::BadPayload("exit reason text is not utf-8"))
}
