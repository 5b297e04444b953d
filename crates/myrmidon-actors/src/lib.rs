//! Actors: lightweight tasks with a mailbox each, addressed by [`Pid`].
//!
//! An actor is either *push*-mode (a [`PushHandler`] is invoked per message), *pull*-mode (a
//! [`PullHandler`] owns the [`Mailbox`] and reads it at its own pace), or *observed* (no
//! behaviour; its mailbox is read from the outside with [`System::selective_recv`]).
//!
//! Actors yield to the scheduler every `budget` received messages, so that a busy actor cannot
//! starve the others sharing its worker thread.

mod actor_runner;
mod buffer;
mod exit;
mod exit_handler;
mod handler;
mod mailbox;
mod message;
mod pid;
mod spawn_opts;
mod supervisor;
mod system;
mod system_config;
mod timers;

mod exports {
    pub use crate::actor_runner::sys_msg::ActorInfo;
    pub use crate::buffer::{BufferError, BufferId, BufferLease, BufferPool, BufferStats, SharedBuffer};
    pub use crate::exit::ExitReason;
    pub use crate::exit_handler::ExitHandler;
    pub use crate::handler::{Handler, Mode, PullHandler, PushHandler};
    pub use crate::mailbox::{Mailbox, MailboxSender, SendError};
    pub use crate::message::{Message, Payload, SystemMessage};
    pub use crate::pid::Pid;
    pub use crate::spawn_opts::SpawnOpts;
    pub use crate::supervisor::{
        MaxRestartIntensityReached, RestartIntensity, RestartStrategy, Supervisor, SupervisorError,
    };
    pub use crate::system::{
        ActorState, HotSwapError, RecvError, SysSpawnError, System, SystemWeakRef,
    };
    pub use crate::system_config::{StopPolicy, SystemConfig};
    pub use crate::timers::TimerId;

    pub mod exit_handlers {
        pub use crate::exit_handler::{LogExitHandler, NoopExitHandler, StderrExitHandler};
    }
}
mod imports {
    pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
}

pub use exports::*;
pub use imports::*;
