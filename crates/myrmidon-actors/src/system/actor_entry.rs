use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use tokio::sync::{mpsc, oneshot};

use crate::actor_runner::sys_msg::SysMsg;
use crate::exit::ExitReason;
use crate::handler::{Mode, PushHandler};
use crate::mailbox::{Mailbox, MailboxSender};
use crate::pid::Pid;

use super::actor_state::{ActorState, StateCell};
use super::slot_pool::SlotLease;

pub(crate) type PushSlot = Arc<ArcSwap<Box<dyn PushHandler>>>;
pub(crate) type ObservedMailbox = Arc<tokio::sync::Mutex<Mailbox>>;

#[derive(Debug)]
pub(crate) struct ActorEntry(Entry);

#[derive(Debug)]
enum Entry {
    Vacant(Option<Terminated>),
    Occupied(Occupied),
}

pub(crate) struct Occupied {
    pub slot_lease: SlotLease,
    pub pid: Pid,
    pub mode: Mode,
    pub state: Arc<StateCell>,
    pub mailbox_tx: MailboxSender,
    pub sys_msg_tx: mpsc::UnboundedSender<SysMsg>,
    pub push_slot: Option<PushSlot>,
    pub observed: Option<ObservedMailbox>,
    pub watches: Vec<oneshot::Sender<ExitReason>>,
}

#[derive(Debug)]
struct Terminated {
    pid: Pid,
    exit: ExitReason,
    #[allow(unused)]
    at: Instant,
}

impl Default for ActorEntry {
    fn default() -> Self {
        Self(Entry::Vacant(None))
    }
}

impl ActorEntry {
    pub fn new(occupied: Occupied) -> Self {
        Self(Entry::Occupied(occupied))
    }

    /// The running actor, provided it is the one identified by `pid`.
    pub fn running(&self, pid: Pid) -> Option<&Occupied> {
        match &self.0 {
            Entry::Occupied(occupied) if occupied.pid == pid => Some(occupied),
            _ => None,
        }
    }

    pub fn running_pid(&self) -> Option<Pid> {
        match &self.0 {
            Entry::Occupied(occupied) => Some(occupied.pid),
            Entry::Vacant(_) => None,
        }
    }

    pub fn state(&self, pid: Pid) -> Option<ActorState> {
        match &self.0 {
            Entry::Occupied(occupied) if occupied.pid == pid => Some(occupied.state.get()),
            Entry::Vacant(Some(terminated)) if terminated.pid == pid => Some(ActorState::Stopped),
            _ => None,
        }
    }

    pub fn add_watch(&mut self, pid: Pid, watch: oneshot::Sender<ExitReason>) {
        match &mut self.0 {
            Entry::Vacant(Some(Terminated { pid: terminated, exit, .. })) if *terminated == pid => {
                log::trace!("[{}|TERMINATED] replying immediately upon attempt to join", pid);
                let _ = watch.send(exit.to_owned());
            },
            Entry::Occupied(occupied) if occupied.pid == pid => {
                occupied.watches.retain(|tx| !tx.is_closed());
                log::trace!("[{}] adding 'join' #{}", pid, occupied.watches.len());
                occupied.watches.push(watch);
            },
            // dropping the `watch` tells the waiting side there is no such actor
            _ => (),
        }
    }

    pub fn terminate(&mut self, pid: Pid, exit_reason: ExitReason) -> bool {
        if self.running_pid() != Some(pid) {
            return false
        }

        let to_terminate = std::mem::replace(
            &mut self.0,
            Entry::Vacant(Some(Terminated { pid, exit: exit_reason.to_owned(), at: Instant::now() })),
        );

        if let Entry::Occupied(Occupied { slot_lease, watches, .. }) = to_terminate {
            for (idx, tx) in watches.into_iter().enumerate() {
                log::trace!("[{}] notifying joining chan #{}", pid, idx);
                let _ = tx.send(exit_reason.to_owned());
            }
            log::trace!("[{}] releasing slot {}", pid, *slot_lease);
        }
        true
    }
}

impl std::fmt::Debug for Occupied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Occupied")
            .field("pid", &self.pid)
            .field("mode", &self.mode)
            .field("state", &self.state.get())
            .field("watches", &self.watches.len())
            .finish()
    }
}
