use std::collections::HashSet;
use std::sync::Arc;

use crate::exit_handler::ExitHandler;
use crate::pid::Pid;

/// Options with which an actor will be spawned.
///
/// It is possible to specify:
/// - the reduction budget;
/// - the mailbox capacity;
/// - the set of [pids](crate::pid::Pid) the newly spawned actor will be immediately linked to;
/// - the parent, that will take the actor down with itself;
/// - whether the actor traps exits of the linked actors;
/// - [exit-handler](crate::exit_handler::ExitHandler).
#[derive(Debug, Default)]
pub struct SpawnOpts {
    budget: Option<usize>,
    mailbox_capacity: Option<usize>,
    links: HashSet<Pid>,
    parent: Option<Pid>,
    trap_exit: bool,
    exit_handler: Option<Arc<dyn ExitHandler>>,
}

impl SpawnOpts {
    /// create new [SpawnOpts](SpawnOpts)
    pub fn new() -> Self {
        Default::default()
    }
}

impl SpawnOpts {
    /// number of messages received per scheduling turn. Zero means "system default".
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = Some(budget).filter(|b| *b > 0);
        self
    }
    pub fn budget(&self) -> Option<usize> {
        self.budget
    }
}

impl SpawnOpts {
    /// specify the capacity limit for the data messages in the mailbox
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = Some(capacity);
        self
    }
    pub fn mailbox_capacity(&self) -> Option<usize> {
        self.mailbox_capacity
    }
}

impl SpawnOpts {
    /// add a linked actor
    pub fn with_link(mut self, with: Pid) -> Self {
        self.links.insert(with);
        self
    }
    /// iterator of linked actors
    pub fn links(&self) -> impl Iterator<Item = Pid> + '_ {
        self.links.iter().copied()
    }
}

impl SpawnOpts {
    /// the actor will be stopped when its parent exits
    pub fn with_parent(mut self, parent: Pid) -> Self {
        self.parent = Some(parent);
        self
    }
    pub fn parent(&self) -> Option<Pid> {
        self.parent
    }
}

impl SpawnOpts {
    /// exit signals from the linked actors are delivered as
    /// [`SystemMessage::Exit`](crate::message::SystemMessage::Exit) instead of terminating the
    /// actor
    pub fn with_trap_exit(mut self, trap_exit: bool) -> Self {
        self.trap_exit = trap_exit;
        self
    }
    pub fn trap_exit(&self) -> bool {
        self.trap_exit
    }
}

impl SpawnOpts {
    /// Specify the [exit-handler](crate::exit_handler::ExitHandler) for the spawned actor
    pub fn with_exit_handler(mut self, exit_handler: Arc<dyn ExitHandler>) -> Self {
        let _ = self.exit_handler.replace(exit_handler);
        self
    }
    pub(crate) fn take_exit_handler(&mut self) -> Option<Arc<dyn ExitHandler>> {
        self.exit_handler.take()
    }
    pub(crate) fn take_links(&mut self) -> HashSet<Pid> {
        std::mem::take(&mut self.links)
    }
}
