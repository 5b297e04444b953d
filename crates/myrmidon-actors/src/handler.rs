use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::exit::ExitReason;
use crate::mailbox::Mailbox;
use crate::message::Message;

/// Invoked by the runtime once per message.
///
/// Implemented for any `Fn(Message) -> impl Future<Output = ()>`.
pub trait PushHandler: Send + Sync + 'static {
    fn handle(&self, message: Message) -> BoxFuture<'static, ()>;
}

/// Owns the mailbox and pulls from it at its own pace. The actor terminates when the returned
/// future completes.
///
/// Implemented for any `FnOnce(Mailbox) -> impl Future<Output = impl Into<ExitReason>>`.
pub trait PullHandler: Send + 'static {
    fn run(self: Box<Self>, mailbox: Mailbox) -> BoxFuture<'static, ExitReason>;
}

/// The behaviour of an actor.
pub enum Handler {
    Push(Box<dyn PushHandler>),
    Pull(Box<dyn PullHandler>),

    /// No behaviour at all: the messages are retained for retrieval by an outside observer
    /// (see [`System::selective_recv`](crate::system::System::selective_recv)).
    Observed,
}

impl Handler {
    pub fn push(handler: impl PushHandler) -> Self {
        Self::Push(Box::new(handler))
    }

    pub fn pull(handler: impl PullHandler) -> Self {
        Self::Pull(Box::new(handler))
    }

    pub fn observed() -> Self {
        Self::Observed
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Push(_) => Mode::Push,
            Self::Pull(_) => Mode::Pull,
            Self::Observed => Mode::Observed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Push,
    Pull,
    Observed,
}

impl<F, Fut> PushHandler for F
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn handle(&self, message: Message) -> BoxFuture<'static, ()> {
        (self)(message).boxed()
    }
}

impl<F, Fut> PullHandler for F
where
    F: FnOnce(Mailbox) -> Fut + Send + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Into<ExitReason>,
{
    fn run(self: Box<Self>, mailbox: Mailbox) -> BoxFuture<'static, ExitReason> {
        (self)(mailbox).map(Into::into).boxed()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler::{:?}", self.mode())
    }
}
