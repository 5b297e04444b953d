use std::sync::Arc;

use myrmidon_utils::std_error_pp::StdErrorPP;

use crate::pid::Pid;

mod into_exit;

/// The reason an actor has terminated with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExitReason {
    #[error("Normal")]
    Normal,

    #[error("Shutdown")]
    Shutdown,

    #[error("Kill")]
    Kill,

    #[error("No Actor")]
    NoActor,

    #[error("Panic: {}", _0)]
    Panic(Arc<str>),

    #[error("Linked {} exited", _0)]
    Linked(Pid, #[source] Box<ExitReason>),

    #[error("Connection lost")]
    ConnectionLost,

    #[error("{}", _0)]
    Custom(Arc<str>),
}

impl Default for ExitReason {
    fn default() -> Self {
        Self::Normal
    }
}

impl ExitReason {
    pub fn is_normal(&self) -> bool {
        matches!(self, Self::Normal)
    }
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown)
    }
    pub fn is_kill(&self) -> bool {
        matches!(self, Self::Kill)
    }
    pub fn is_no_actor(&self) -> bool {
        matches!(self, Self::NoActor)
    }
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panic(_))
    }

    /// Anything but [`Normal`](ExitReason::Normal) and [`Shutdown`](ExitReason::Shutdown).
    ///
    /// Only failures are propagated along links to the actors that do not trap exits.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Normal | Self::Shutdown)
    }

    pub fn normal() -> Self {
        Self::Normal
    }
    pub fn shutdown() -> Self {
        Self::Shutdown
    }
    pub fn kill() -> Self {
        Self::Kill
    }
    pub fn no_actor() -> Self {
        Self::NoActor
    }
    pub fn linked(who: Pid, reason: impl Into<Box<Self>>) -> Self {
        Self::Linked(who, reason.into())
    }

    /// A custom reason carrying the whole source-chain of the error.
    pub fn custom<E: std::error::Error>(e: E) -> Self {
        Self::Custom(e.pp().to_string().into())
    }

    pub fn custom_text(text: impl AsRef<str>) -> Self {
        Self::Custom(text.as_ref().into())
    }

    /// Turn a caught panic payload into an exit reason.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let text = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).into()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.as_str().into()
        } else {
            "<non-string panic payload>".into()
        };
        Self::Panic(text)
    }
}
