//! TCP transport between nodes.
//!
//! Every connection carries a stream of [`Frame`]s:
//!
//! ```text
//! +-------+---------+------+------------+--------+---------+
//! | magic | version | kind | target_pid | length | payload |
//! |  u16  |   u8    |  u8  |    u64     |  u32   |  bytes  |
//! +-------+---------+------+------------+--------+---------+
//! ```
//!
//! All integers are big-endian.

mod frame;
mod reason;
mod transport;
mod transport_config;

pub use frame::{Frame, FrameCodec, FrameError, FrameKind, HEADER_LEN, MAGIC, VERSION};
pub use transport::{Transport, TransportError};
pub use transport_config::TransportConfig;
