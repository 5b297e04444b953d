use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwap;
use bytes::Bytes;
use futures::future;
use myrmidon_utils::future_timeout_ext::FutureTimeoutExt;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use crate::actor_runner::sys_msg::{ActorInfo, SysMsg};
use crate::actor_runner::{ActorRunner, Behaviour};
use crate::buffer::{BufferError, BufferId, BufferLease, BufferPool};
use crate::exit::ExitReason;
use crate::exit_handler::ExitHandler;
use crate::handler::{Handler, PullHandler, PushHandler};
use crate::mailbox::{self, SendError};
use crate::message::{Message, Payload, SystemMessage};
use crate::pid::Pid;
use crate::spawn_opts::SpawnOpts;
use crate::system_config::{StopPolicy, SystemConfig};
use crate::timers::Timers;

pub(crate) mod actor_entry;
use actor_entry::{ActorEntry, Occupied};

mod actor_state;
pub use actor_state::ActorState;
pub(crate) use actor_state::StateCell;

mod slot_pool;
use slot_pool::SlotPool;

mod errors;
pub use errors::{HotSwapError, RecvError, SysSpawnError};

mod observed;
mod supervision;

/// A [`System`](crate::system::System) is a scope within which the actors run.
///
/// Cheap to clone: all the clones refer to the same actor table.
#[derive(Debug, Clone)]
pub struct System(Arc<Inner>);

impl System {
    pub fn rc_downgrade(&self) -> SystemWeakRef {
        SystemWeakRef(Arc::downgrade(&self.0))
    }
}

#[derive(Debug, Clone)]
pub struct SystemWeakRef(Weak<Inner>);
impl SystemWeakRef {
    pub fn rc_upgrade(&self) -> Option<System> {
        self.0.upgrade().map(System)
    }
}

#[derive(Debug)]
struct Inner {
    config: SystemConfig,
    node_id: u32,
    runtime: Handle,
    slot_pool: SlotPool,
    actor_entries: Box<[RwLock<ActorEntry>]>,
    exit_handler: Arc<dyn ExitHandler>,
    buffers: BufferPool,
    timers: Timers,
    shutting_down: AtomicBool,
}

impl System {
    /// Create a new [`System`] using the provided config.
    ///
    /// The actors are spawned onto the tokio runtime this is called from.
    ///
    /// # Panics
    /// If called outside of a tokio runtime. See [`System::with_runtime`].
    pub fn new(config: SystemConfig) -> Self {
        Self::with_runtime(config, Handle::current())
    }

    /// Create a new [`System`] whose actors are spawned onto the runtime behind `runtime`.
    pub fn with_runtime(config: SystemConfig, runtime: Handle) -> Self {
        static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

        let node_id =
            config.node_id.unwrap_or_else(|| NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed));

        let slot_pool = SlotPool::new(config.max_actors);
        let actor_entries =
            (0..config.max_actors).map(|_| RwLock::new(Default::default())).collect();

        let exit_handler = config.exit_handler.to_owned();
        let buffers = BufferPool::new(config.max_buffer_bytes);

        log::trace!("[node:{}] system created [max-actors: {}]", node_id, config.max_actors);

        let inner = Inner {
            config,
            node_id,
            runtime,
            slot_pool,
            actor_entries,
            exit_handler,
            buffers,
            timers: Default::default(),
            shutting_down: AtomicBool::new(false),
        };
        Self(Arc::new(inner))
    }

    /// The config with which this [`System`] was created.
    pub fn config(&self) -> &SystemConfig {
        &self.0.config
    }

    /// The node id, i.e. the upper half of every [`Pid`] spawned by this [`System`].
    pub fn node_id(&self) -> u32 {
        self.0.node_id
    }

    pub fn runtime(&self) -> &Handle {
        &self.0.runtime
    }

    pub fn buffers(&self) -> &BufferPool {
        &self.0.buffers
    }

    pub(crate) fn timers(&self) -> &Timers {
        &self.0.timers
    }
}

impl System {
    /// Spawn a push-mode actor: `handler` is invoked once per message.
    ///
    /// Example:
    /// ```
    /// use myrmidon_actors::{Message, System};
    ///
    /// let _ = async {
    ///     let system = System::new(Default::default());
    ///     let echo = system
    ///         .spawn(|message: Message| async move { eprintln!("{:?}", message) }, 10)
    ///         .expect("Failed to spawn an actor");
    ///     assert!(system.send(echo, "hello"));
    /// };
    /// ```
    pub fn spawn(&self, handler: impl PushHandler, budget: usize) -> Result<Pid, SysSpawnError> {
        self.spawn_with_opts(Handler::push(handler), SpawnOpts::new().with_budget(budget))
    }

    /// Spawn a pull-mode actor: `handler` gets the [`Mailbox`](crate::mailbox::Mailbox), and the
    /// actor terminates once the handler returns.
    pub fn spawn_with_mailbox(
        &self,
        handler: impl PullHandler,
        budget: usize,
    ) -> Result<Pid, SysSpawnError> {
        self.spawn_with_opts(Handler::pull(handler), SpawnOpts::new().with_budget(budget))
    }

    /// Spawn an actor without a behaviour, whose messages are retrieved with
    /// [`System::selective_recv`] and [`System::take_messages`].
    pub fn spawn_observed(&self, budget: usize) -> Result<Pid, SysSpawnError> {
        self.spawn_with_opts(Handler::observed(), SpawnOpts::new().with_budget(budget))
    }

    /// Spawn an actor that will be stopped as soon as `parent` exits.
    pub fn spawn_child(
        &self,
        parent: Pid,
        handler: Handler,
        budget: usize,
    ) -> Result<Pid, SysSpawnError> {
        self.spawn_with_opts(handler, SpawnOpts::new().with_budget(budget).with_parent(parent))
    }

    pub fn spawn_with_opts(
        &self,
        handler: Handler,
        mut spawn_opts: SpawnOpts,
    ) -> Result<Pid, SysSpawnError> {
        if self.0.shutting_down.load(Ordering::Acquire) {
            return Err(SysSpawnError::ShuttingDown)
        }
        if let Some(parent) = spawn_opts.parent() {
            if !self.is_alive(parent) {
                return Err(SysSpawnError::NoParent(parent))
            }
        }

        let slot_lease = self.0.slot_pool.acquire().ok_or(SysSpawnError::MaxActorsLimit)?;
        let slot = *slot_lease as usize;
        let pid = Pid::new(self.0.node_id, *slot_lease);

        let config = &self.0.config;
        let budget = spawn_opts.budget().unwrap_or(config.default_budget);
        let capacity = spawn_opts.mailbox_capacity().or(config.mailbox_capacity);
        let exit_handler =
            spawn_opts.take_exit_handler().unwrap_or_else(|| self.0.exit_handler.to_owned());

        let (mailbox_tx, mailbox) = mailbox::channel(pid, capacity, budget);
        let (sys_msg_tx, sys_msg_rx) = mpsc::unbounded_channel();
        let state = Arc::new(StateCell::default());

        let mode = handler.mode();
        let (behaviour, push_slot, observed) = match handler {
            Handler::Push(push) => {
                let slot = Arc::new(ArcSwap::from_pointee(push));
                (Behaviour::Push(Arc::clone(&slot), mailbox), Some(slot), None)
            },
            Handler::Pull(pull) => (Behaviour::Pull(pull, mailbox), None, None),
            Handler::Observed =>
                (Behaviour::Observed, None, Some(Arc::new(tokio::sync::Mutex::new(mailbox)))),
        };

        let runner = ActorRunner {
            pid,
            system: self.rc_downgrade(),
            behaviour,
            budget,
            state: Arc::clone(&state),
            mailbox_tx: mailbox_tx.to_owned(),
            sys_msg_rx,
            sys_msg_tx: sys_msg_tx.to_owned(),
            exit_handler,
            stop_policy: config.stop_policy,
            termination_timeout: config.actor_termination_timeout,
            links: spawn_opts.take_links().into_iter().collect(),
            parent: spawn_opts.parent(),
            trap_exit: spawn_opts.trap_exit(),
        };

        let entry = ActorEntry::new(Occupied {
            slot_lease,
            pid,
            mode,
            state,
            mailbox_tx,
            sys_msg_tx,
            push_slot,
            observed,
            watches: Default::default(),
        });
        *self.0.actor_entries[slot].write() = entry;

        self.0.runtime.spawn(runner.run());
        log::trace!("[{}] spawned [mode: {:?}]", pid, mode);

        Ok(pid)
    }
}

impl System {
    /// Enqueue a data message. Returns `false` if there is no such live actor, or the message has
    /// been rejected by its mailbox.
    pub fn send(&self, to: Pid, data: impl Into<Bytes>) -> bool {
        self.send_message(to, Message::data(data))
    }

    pub fn send_system(&self, to: Pid, sys: SystemMessage) -> bool {
        self.send_message(to, Message::System(sys))
    }

    pub fn send_message(&self, to: Pid, message: Message) -> bool {
        let Some(entry) = self.actor_entry_read(to) else { return false };
        let Some(occupied) = entry.running(to) else { return false };

        match occupied.mailbox_tx.send(message) {
            Ok(()) => true,
            Err(SendError::Full(_)) => {
                log::debug!("[{}] mailbox full, message dropped", to);
                false
            },
            Err(SendError::Closed(_)) => {
                log::trace!("[{}] mailbox closed, message dropped", to);
                false
            },
        }
    }

    /// Allocate a region in the [`BufferPool`].
    pub fn allocate_buffer(&self, size: usize) -> Result<BufferLease, BufferError> {
        self.0.buffers.allocate(size)
    }

    /// Hand the region `buffer` over to `to` without copying.
    ///
    /// If `to` is not alive, `false` is returned and the lease stays writable. Otherwise the lease
    /// loses its write access, and should the mailbox still reject the message, the region is
    /// released right away.
    pub fn send_buffer(&self, to: Pid, buffer: BufferId) -> bool {
        if !self.is_alive(to) {
            return false
        }
        let Some(shared) = self.0.buffers.seal(buffer) else { return false };
        self.send_message(to, Message::Data(Payload::Buffer(shared)))
    }

    /// Replace the handler of a push-mode actor. The messages received after the swap are
    /// handled by the new handler; nothing is lost in between.
    pub fn hot_swap(&self, pid: Pid, handler: impl PushHandler) -> Result<(), HotSwapError> {
        let entry = self.actor_entry_read(pid).ok_or(HotSwapError::NoActor)?;
        let occupied = entry.running(pid).ok_or(HotSwapError::NoActor)?;
        let slot = occupied.push_slot.as_ref().ok_or(HotSwapError::NotPushMode)?;

        let handler: Box<dyn PushHandler> = Box::new(handler);
        slot.store(Arc::new(handler));
        log::trace!("[{}] handler swapped", pid);
        Ok(())
    }

    /// Ask the actor to stop: the mailbox stops accepting messages, and the actor terminates
    /// according to the [`StopPolicy`](crate::system_config::StopPolicy).
    pub fn stop(&self, pid: Pid) -> bool {
        self.exit(pid, ExitReason::shutdown())
    }

    /// Terminate the actor with the given reason. [`ExitReason::Kill`] skips the graceful part.
    ///
    /// The actor is [`Stopping`](ActorState::Stopping) as soon as this returns `true`: no message
    /// sent afterwards gets into its mailbox.
    pub fn exit(&self, pid: Pid, exit_reason: ExitReason) -> bool {
        let Some(entry) = self.actor_entry_read(pid) else { return false };
        let Some(occupied) = entry.running(pid) else { return false };

        let discard = exit_reason.is_kill() || self.0.config.stop_policy == StopPolicy::Discard;

        // the stop is queued before the mailbox closes, so the runner finds it once the
        // behaviour sees the mailbox closed
        if occupied.sys_msg_tx.send(SysMsg::Stop(exit_reason)).is_err() {
            return false
        }
        occupied.state.advance(ActorState::Stopping);
        occupied.mailbox_tx.close();
        if discard {
            occupied.mailbox_tx.clear();
        }
        true
    }

    /// Wait for the specified actor to terminate, and return upon its termination the
    /// [`ExitReason`]. In case the actor with the specified `pid` does not exist, return
    /// [`ExitReason::NoActor`] right away.
    pub fn join(&self, pid: Pid) -> impl Future<Output = ExitReason> + Send + 'static {
        let (tx, rx) = oneshot::channel();

        if let Some(mut entry) = self.actor_entry_write(pid) {
            entry.add_watch(pid, tx);
        }
        async move { rx.await.unwrap_or_else(|_| ExitReason::no_actor()) }
    }

    pub fn state(&self, pid: Pid) -> Option<ActorState> {
        self.actor_entry_read(pid).and_then(|entry| entry.state(pid))
    }

    pub fn is_alive(&self, pid: Pid) -> bool {
        self.actor_entry_read(pid).map(|entry| entry.running(pid).is_some()).unwrap_or(false)
    }

    pub fn mailbox_size(&self, pid: Pid) -> Option<usize> {
        self.actor_entry_read(pid)
            .and_then(|entry| entry.running(pid).map(|occupied| occupied.mailbox_tx.len()))
    }

    pub fn all_actors(&self) -> Vec<Pid> {
        self.0.actor_entries.iter().filter_map(|slot| slot.read().running_pid()).collect()
    }

    pub async fn actor_info(&self, pid: Pid) -> Option<ActorInfo> {
        let (tx, rx) = oneshot::channel();
        self.send_sys_msg(pid, SysMsg::GetInfo(tx));
        rx.await.ok()
    }

    /// Stop every actor, waiting up to `timeout` for them to terminate; those still running by
    /// then are killed. No actors can be spawned afterwards.
    pub async fn shutdown(&self, timeout: Duration) {
        if self.0.shutting_down.swap(true, Ordering::AcqRel) {
            return
        }
        self.0.slot_pool.drain();
        self.0.timers.cancel_all();

        let actors = self.all_actors();
        log::trace!("[node:{}] shutting down {} actors", self.0.node_id, actors.len());

        let joins = actors
            .iter()
            .map(|pid| {
                let join = self.join(*pid);
                self.stop(*pid);
                join
            })
            .collect::<Vec<_>>();

        if future::join_all(joins).timeout(timeout).await.is_err() {
            for pid in self.all_actors() {
                log::warn!("[{}] did not stop within {:?}, killing", pid, timeout);
                self.exit(pid, ExitReason::kill());
            }
        }
    }
}

impl System {
    pub(crate) fn send_sys_msg(&self, to: Pid, sys_msg: SysMsg) -> bool {
        log::trace!("[node:{}] sending sys-msg [to: {}, sys-msg: {:?}]", self.0.node_id, to, sys_msg);

        self.actor_entry_read(to)
            .and_then(|entry| entry.running(to).map(|occupied| occupied.sys_msg_tx.send(sys_msg).is_ok()))
            .unwrap_or(false)
    }

    pub(crate) fn actor_entry_terminate(&self, pid: Pid, exit_reason: ExitReason) {
        if let Some(mut entry) = self.actor_entry_write(pid) {
            if !entry.terminate(pid, exit_reason) {
                log::warn!("[{}] actor-entry is not occupied by this actor", pid);
            }
        }
    }

    fn actor_entry_slot(&self, pid: Pid) -> Option<&RwLock<ActorEntry>> {
        if pid.node() != self.0.node_id {
            return None
        }
        self.0.actor_entries.get(pid.slot() as usize)
    }

    fn actor_entry_read(&self, pid: Pid) -> Option<RwLockReadGuard<'_, ActorEntry>> {
        self.actor_entry_slot(pid).map(RwLock::read)
    }

    fn actor_entry_write(&self, pid: Pid) -> Option<RwLockWriteGuard<'_, ActorEntry>> {
        self.actor_entry_slot(pid).map(RwLock::write)
    }
}
