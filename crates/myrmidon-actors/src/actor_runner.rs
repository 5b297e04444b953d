use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use myrmidon_utils::std_error_pp::StdErrorPP;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::exit::ExitReason;
use crate::exit_handler::ExitHandler;
use crate::handler::{Mode, PullHandler};
use crate::mailbox::{Mailbox, MailboxSender};
use crate::pid::Pid;
use crate::system::actor_entry::PushSlot;
use crate::system::{ActorState, StateCell, SystemWeakRef};
use crate::system_config::StopPolicy;

pub(crate) mod sys_msg;
mod watches;

use sys_msg::{ActorInfo, SysMsg};
use watches::Watches;

pub(crate) enum Behaviour {
    Push(PushSlot, Mailbox),
    Pull(Box<dyn PullHandler>, Mailbox),
    Observed,
}

pub(crate) struct ActorRunner {
    pub pid: Pid,
    pub system: SystemWeakRef,
    pub behaviour: Behaviour,
    pub budget: usize,
    pub state: Arc<StateCell>,
    pub mailbox_tx: MailboxSender,
    pub sys_msg_rx: mpsc::UnboundedReceiver<SysMsg>,
    pub sys_msg_tx: mpsc::UnboundedSender<SysMsg>,
    pub exit_handler: Arc<dyn ExitHandler>,
    pub stop_policy: StopPolicy,
    pub termination_timeout: Duration,
    pub links: Vec<Pid>,
    pub parent: Option<Pid>,
    pub trap_exit: bool,
}

impl ActorRunner {
    pub async fn run(self) {
        let Self {
            pid,
            system,
            behaviour,
            budget,
            state,
            mailbox_tx,
            sys_msg_rx,
            sys_msg_tx,
            exit_handler,
            stop_policy,
            termination_timeout,
            links,
            parent,
            trap_exit,
        } = self;

        let mode = behaviour.mode();
        log::trace!("[{}] init [mode: {:?}, budget: {}]", pid, mode, budget);

        let mut backend = Backend {
            pid,
            mode,
            budget,
            system,
            state,
            mailbox_tx,
            sys_msg_rx,
            sys_msg_tx,
            stop_policy,
            termination_timeout,
            stop_requested: None,
            deadline: None,
            watches: Watches { trap_exit, parent, ..Default::default() },
        };

        for link_to in links {
            backend.do_link(link_to);
        }
        if let Some(parent) = parent {
            backend.do_adopt(parent);
        }

        backend.state.advance(ActorState::Running);
        log::trace!("[{}] running", pid);

        let exit_reason = backend.run_actor_backend(behaviour.run()).await;

        exit_handler.on_actor_exit(pid, &exit_reason);
        backend.terminate(exit_reason).await;
    }
}

impl Behaviour {
    fn mode(&self) -> Mode {
        match self {
            Self::Push(..) => Mode::Push,
            Self::Pull(..) => Mode::Pull,
            Self::Observed => Mode::Observed,
        }
    }

    /// Panics raised by the handler terminate the actor, and the actor only.
    fn run(self) -> BoxFuture<'static, ExitReason> {
        let running = match self {
            Self::Push(slot, mailbox) => push_loop(slot, mailbox).boxed(),
            Self::Pull(handler, mailbox) => handler.run(mailbox),
            Self::Observed => std::future::pending().boxed(),
        };
        AssertUnwindSafe(running)
            .catch_unwind()
            .map(|result| result.unwrap_or_else(|panic| ExitReason::from_panic(&*panic)))
            .boxed()
    }
}

async fn push_loop(slot: PushSlot, mut mailbox: Mailbox) -> ExitReason {
    while let Some(message) = mailbox.recv().await {
        let handler = slot.load_full();
        handler.handle(message).await;
    }
    ExitReason::normal()
}

struct Backend {
    pid: Pid,
    mode: Mode,
    budget: usize,
    system: SystemWeakRef,
    state: Arc<StateCell>,
    mailbox_tx: MailboxSender,
    sys_msg_rx: mpsc::UnboundedReceiver<SysMsg>,
    sys_msg_tx: mpsc::UnboundedSender<SysMsg>,
    stop_policy: StopPolicy,
    termination_timeout: Duration,
    stop_requested: Option<ExitReason>,
    deadline: Option<Instant>,
    watches: Watches,
}

impl Backend {
    async fn run_actor_backend(&mut self, mut behaviour: BoxFuture<'static, ExitReason>) -> ExitReason {
        let exit_reason = loop {
            let deadline = self.deadline;
            tokio::select! {
                behaviour_exit = &mut behaviour =>
                    break self.behaviour_exited(behaviour_exit),
                sys_msg_recv = self.sys_msg_rx.recv() =>
                    if let Err(exit_reason) = self.handle_sys_msg(sys_msg_recv) {
                        break exit_reason
                    },
                () = sleep_until_opt(deadline) => {
                    log::warn!(
                        "[{}] did not terminate within {:?}, killing",
                        self.pid,
                        self.termination_timeout
                    );
                    break ExitReason::kill()
                },
            }
        };
        log::trace!("[{}] exiting: {}", self.pid, exit_reason.pp());
        exit_reason
    }

    async fn terminate(mut self, exit_reason: ExitReason) {
        self.state.advance(ActorState::Stopping);
        self.mailbox_tx.close();
        self.sys_msg_rx.close();

        self.notify_linked_actors(&exit_reason);
        self.notify_monitors(&exit_reason);
        self.stop_children();
        self.notify_parent();

        while let Some(sys_msg) = self.sys_msg_rx.recv().await {
            self.handle_sys_msg_on_shutdown(sys_msg, &exit_reason);
        }

        self.state.advance(ActorState::Stopped);
        if let Some(system) = self.system.rc_upgrade() {
            log::trace!("[{}] cleaning up actor-entry...", self.pid);
            system.actor_entry_terminate(self.pid, exit_reason);
        }
        log::trace!("[{}] exited", self.pid);
    }

    fn behaviour_exited(&mut self, behaviour_exit: ExitReason) -> ExitReason {
        if behaviour_exit.is_normal() && self.stop_requested.is_none() {
            // the mailbox may have been closed by a stop that is still queued
            while let Ok(sys_msg) = self.sys_msg_rx.try_recv() {
                if let Err(exit_reason) = self.handle_sys_msg(Some(sys_msg)) {
                    return exit_reason
                }
            }
        }
        match self.stop_requested.take() {
            Some(requested) if behaviour_exit.is_normal() => requested,
            _ => behaviour_exit,
        }
    }

    fn handle_sys_msg(&mut self, sys_msg_recv: Option<SysMsg>) -> Result<(), ExitReason> {
        match sys_msg_recv {
            None => Err(ExitReason::kill()),
            Some(SysMsg::Stop(exit_reason)) => self.handle_sys_msg_stop(exit_reason),
            Some(SysMsg::Link(link_to)) => self.handle_sys_msg_link(link_to),
            Some(SysMsg::Unlink(unlink_from)) => self.handle_sys_msg_unlink(unlink_from),
            Some(SysMsg::Exited(terminated, exit_reason)) =>
                self.handle_sys_msg_exited(terminated, exit_reason),
            Some(SysMsg::Monitor(watcher)) => self.handle_sys_msg_monitor(watcher),
            Some(SysMsg::Demonitor(watcher)) => self.handle_sys_msg_demonitor(watcher),
            Some(SysMsg::AdoptChild(child)) => self.handle_sys_msg_adopt_child(child),
            Some(SysMsg::ChildExited(child)) => self.handle_sys_msg_child_exited(child),
            Some(SysMsg::TrapExit(trap_exit)) => self.handle_set_trap_exit(trap_exit),
            Some(SysMsg::GetInfo(report_to)) => self.handle_sys_msg_get_info(report_to),
        }
    }

    fn handle_sys_msg_on_shutdown(&mut self, sys_msg: SysMsg, exit_reason: &ExitReason) {
        match sys_msg {
            SysMsg::Link(linked) => {
                self.send_sys_msg(linked, SysMsg::Exited(self.pid, exit_reason.to_owned()));
            },
            SysMsg::Monitor(watcher) => {
                self.send_down(watcher, exit_reason);
            },
            SysMsg::AdoptChild(child) => {
                self.send_sys_msg(child, SysMsg::Stop(ExitReason::shutdown()));
            },
            SysMsg::GetInfo(report_to) => {
                let _ = self.handle_sys_msg_get_info(report_to);
            },
            SysMsg::Stop { .. } |
            SysMsg::Unlink { .. } |
            SysMsg::Exited { .. } |
            SysMsg::Demonitor { .. } |
            SysMsg::ChildExited { .. } |
            SysMsg::TrapExit { .. } => (),
        }
    }

    fn handle_sys_msg_stop(&mut self, exit_reason: ExitReason) -> Result<(), ExitReason> {
        if exit_reason.is_kill() || self.mode == Mode::Observed {
            return Err(exit_reason)
        }
        if self.stop_requested.is_some() {
            return Ok(())
        }

        log::trace!("[{}] stop requested: {} [policy: {:?}]", self.pid, exit_reason, self.stop_policy);

        self.state.advance(ActorState::Stopping);
        self.mailbox_tx.close();
        if self.stop_policy == StopPolicy::Discard {
            let dropped = self.mailbox_tx.clear();
            log::trace!("[{}] discarded {} queued messages", self.pid, dropped);
        }

        self.stop_requested = Some(exit_reason);
        self.deadline = Some(Instant::now() + self.termination_timeout);
        Ok(())
    }

    fn handle_sys_msg_get_info(
        &self,
        report_to: oneshot::Sender<ActorInfo>,
    ) -> Result<(), ExitReason> {
        let info = ActorInfo {
            pid: self.pid,
            mode: self.mode,
            state: self.state.get(),
            budget: self.budget,
            mailbox_len: self.mailbox_tx.len(),
            trap_exit: self.watches.trap_exit,
            parent: self.watches.parent,
            links: self.watches.links.iter().copied().collect(),
            monitors: self.watches.monitors.iter().copied().collect(),
            children: self.watches.children.iter().copied().collect(),
        };
        let _ = report_to.send(info);
        Ok(())
    }

    fn send_sys_msg(&self, to: Pid, sys_msg: SysMsg) -> bool {
        self.system.rc_upgrade().map(|system| system.send_sys_msg(to, sys_msg)).unwrap_or(false)
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
