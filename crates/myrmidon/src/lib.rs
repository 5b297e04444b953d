//! myrmidon: an [actor](https://en.wikipedia.org/wiki/Actor_model) runtime with remote nodes and
//! zero-copy buffers.
//!
//! # [Actors](crate::actors)
//!
//! An actor is an activity with the following properties:
//! - runs concurrently with the other actors (implemented as a tokio task);
//! - has a handle ([`Pid`](crate::actors::Pid)): the upper 32 bits identify the node, the lower
//!   32 bits the actor's slot on that node;
//! - owns a mailbox: an ordered queue of [`Message`](crate::actors::Message)s;
//! - when terminates, yields an exit reason ([`ExitReason`](crate::actors::ExitReason)).
//!
//! An actor runs in one of three modes:
//! - *push*: the runtime invokes a [`PushHandler`](crate::actors::PushHandler) for every message;
//!   the handler can be [hot-swapped](crate::actors::System::hot_swap);
//! - *pull*: a [`PullHandler`](crate::actors::PullHandler) owns the
//!   [`Mailbox`](crate::actors::Mailbox) and receives at its own pace, possibly selectively;
//! - *observed*: there is no handler at all, the mailbox is read from the outside with
//!   [`System::selective_recv`](crate::actors::System::selective_recv).
//!
//! Every actor yields to the scheduler after receiving `budget` messages in a row, so that an
//! actor flooded with messages does not starve its neighbours.
//!
//! Example:
//! ```
//! use myrmidon::actors::Message;
//! use myrmidon::Runtime;
//!
//! let runtime = Runtime::new(Default::default()).expect("Failed to start the runtime");
//!
//! let pid = runtime
//!     .spawn(
//!         |message: Message| async move {
//!             eprintln!("received {:?}", message);
//!         },
//!         100,
//!     )
//!     .expect("Failed to spawn an actor");
//!
//! assert!(runtime.send(pid, &b"hello"[..]));
//! runtime.stop(pid);
//! let exit_reason = runtime.join_blocking(pid);
//! assert!(exit_reason.is_shutdown());
//! ```
//!
//! # Supervision
//!
//! Failures are ordinary messages: a monitor gets a
//! [`SystemMessage::Down`](crate::actors::SystemMessage::Down), a linked actor trapping exits
//! gets a [`SystemMessage::Exit`](crate::actors::SystemMessage::Exit). A linked actor that does not
//! trap exits terminates along with its peer.
//!
//! A [`Supervisor`](crate::actors::Supervisor) restarts the failed actors it supervises, within
//! a [restart intensity](crate::actors::RestartIntensity). Supervisors can also be kept per path
//! (see [`PathSupervisors`](crate::reg::PathSupervisors)), e.g. one for everything below
//! `/workers`.
//!
//! # [Names](crate::reg)
//!
//! A [`NameRegistry`](crate::reg::NameRegistry) binds names and hierarchical paths to
//! [`Pid`](crate::actors::Pid)s. Other nodes can resolve the names over the transport.
//!
//! # [Transport](crate::net)
//!
//! Nodes talk over TCP: remote sends are fire-and-forget, remote monitors turn a remote
//! termination or a lost connection into a `Down` message.
//!
//! # Buffers
//!
//! Large payloads are written straight into a region of the
//! [`BufferPool`](crate::actors::BufferPool) and handed over to an actor with
//! [`send_buffer`](crate::actors::System::send_buffer): the sender loses its write access, the
//! receivers share the region read-only, the region is freed when the last of them lets go.

mod runtime;
mod runtime_config;

pub use runtime::{PathSpawnError, Runtime, RuntimeError};
pub use runtime_config::RuntimeConfig;

pub mod utils {
    pub use myrmidon_utils::*;
}

pub mod actors {
    pub use myrmidon_actors::*;
}

pub mod reg {
    pub use myrmidon_reg::*;
}

pub mod net {
    pub use myrmidon_net::*;
}
