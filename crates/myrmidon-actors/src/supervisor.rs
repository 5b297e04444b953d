//! Restarts failed actors.
//!
//! A [`Supervisor`] keeps a factory per child. When a child fails (see
//! [`ExitReason::is_failure`]), the child (or, with [`RestartStrategy::RestartAll`], every child)
//! is started anew using the factory. Children that exit normally, as well as the children taken
//! under [`watch`](Supervisor::watch) without a factory, are simply forgotten once gone. Too many
//! restarts within the [`RestartIntensity`] window make the supervisor give up: the remaining
//! children are stopped.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future;
use myrmidon_utils::std_error_pp::{ErrorPP, StdErrorPP};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::exit::ExitReason;
use crate::imports::BoxError;
use crate::pid::Pid;
use crate::system::System;

mod restart_intensity;
pub use restart_intensity::{MaxRestartIntensityReached, RestartIntensity};
use restart_intensity::RestartStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RestartStrategy {
    /// Only the failed child is restarted.
    #[default]
    RestartOne,

    /// All the children are stopped, then started again in the order they were added.
    RestartAll,
}

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("Supervisor gave up (max restart intensity reached)")]
    Exhausted,

    #[error("No such actor: {}", _0)]
    NoActor(Pid),

    #[error("Child factory failed")]
    Factory(#[source] BoxError),
}

type ChildFactory = Arc<dyn Fn(&System) -> Result<Pid, BoxError> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct Supervisor(Arc<Inner>);

struct Inner {
    system: System,
    strategy: RestartStrategy,
    intensity: RestartIntensity,
    state: Mutex<State>,
    exhausted: watch::Sender<bool>,
}

struct State {
    next_child_id: usize,
    children: Vec<Child>,
    restarts: RestartStats,
}

enum Decision {
    Ignore,
    GiveUp,
    Restart { to_stop: Vec<Pid>, to_restart: Vec<usize> },
}

struct Child {
    id: usize,
    pid: Pid,
    restarting: bool,
    factory: Option<ChildFactory>,
}

impl Supervisor {
    pub fn new(system: &System, strategy: RestartStrategy, intensity: RestartIntensity) -> Self {
        let (exhausted, _) = watch::channel(false);
        let state =
            State { next_child_id: 0, children: Vec::new(), restarts: intensity.new_stats() };
        Self(Arc::new(Inner {
            system: system.to_owned(),
            strategy,
            intensity,
            state: Mutex::new(state),
            exhausted,
        }))
    }

    /// Start a child using `factory`, and restart it with the same factory whenever it fails.
    pub fn start_child<F, E>(&self, factory: F) -> Result<Pid, SupervisorError>
    where
        F: Fn(&System) -> Result<Pid, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let factory: ChildFactory = Arc::new(move |system: &System| factory(system).map_err(Into::into));
        let pid = factory(&self.0.system).map_err(SupervisorError::Factory)?;
        self.add_child(pid, Some(factory))?;
        Ok(pid)
    }

    /// Take an already running actor under supervision. `factory` is used to restart it.
    pub fn supervise<F, E>(&self, pid: Pid, factory: F) -> Result<(), SupervisorError>
    where
        F: Fn(&System) -> Result<Pid, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        if !self.0.system.is_alive(pid) {
            return Err(SupervisorError::NoActor(pid))
        }
        let factory: ChildFactory = Arc::new(move |system: &System| factory(system).map_err(Into::into));
        self.add_child(pid, Some(factory))
    }

    /// Count a running actor among the children without being able to restart it: it is stopped
    /// together with the others, and forgotten once it terminates.
    pub fn watch(&self, pid: Pid) -> Result<(), SupervisorError> {
        if !self.0.system.is_alive(pid) {
            return Err(SupervisorError::NoActor(pid))
        }
        self.add_child(pid, None)
    }

    pub fn children_count(&self) -> usize {
        self.0.state.lock().children.len()
    }

    pub fn child_pids(&self) -> Vec<Pid> {
        self.0.state.lock().children.iter().map(|c| c.pid).collect()
    }

    pub fn is_exhausted(&self) -> bool {
        *self.0.exhausted.borrow()
    }

    /// Resolves once the supervisor has given up.
    pub async fn exhausted(&self) {
        let mut rx = self.0.exhausted.subscribe();
        let _ = rx.wait_for(|exhausted| *exhausted).await;
    }

    /// Stop supervising: all the children are stopped and not restarted.
    pub async fn shutdown(&self) {
        let pids = self.give_up();
        let joins = pids
            .into_iter()
            .map(|pid| {
                let join = self.0.system.join(pid);
                self.0.system.stop(pid);
                join
            })
            .collect::<Vec<_>>();
        future::join_all(joins).await;
    }
}

impl Supervisor {
    fn add_child(&self, pid: Pid, factory: Option<ChildFactory>) -> Result<(), SupervisorError> {
        if self.is_exhausted() {
            return Err(SupervisorError::Exhausted)
        }
        let id = {
            let mut state = self.0.state.lock();
            let id = state.next_child_id;
            state.next_child_id += 1;
            state.children.push(Child { id, pid, restarting: false, factory });
            id
        };
        log::trace!("[sup] child #{} started as {}", id, pid);
        self.watch_child(id, pid);
        Ok(())
    }

    fn watch_child(&self, child_id: usize, pid: Pid) {
        let join = self.0.system.join(pid);
        let sup = self.to_owned();
        self.0.system.runtime().spawn(async move {
            let exit_reason = join.await;
            sup.on_child_exit(child_id, pid, exit_reason).await;
        });
    }

    async fn on_child_exit(&self, child_id: usize, pid: Pid, exit_reason: ExitReason) {
        match self.decide(child_id, pid, &exit_reason) {
            Decision::Ignore => (),
            Decision::GiveUp => self.shutdown().await,
            Decision::Restart { to_stop, to_restart } => {
                let joins = to_stop
                    .into_iter()
                    .map(|sibling| {
                        let join = self.0.system.join(sibling);
                        self.0.system.stop(sibling);
                        join
                    })
                    .collect::<Vec<_>>();
                future::join_all(joins).await;

                for child_id in to_restart {
                    self.restart_child(child_id);
                }
            },
        }
    }

    fn decide(&self, child_id: usize, pid: Pid, exit_reason: &ExitReason) -> Decision {
        let mut state = self.0.state.lock();
        let Some(idx) =
            state.children.iter().position(|c| c.id == child_id && c.pid == pid && !c.restarting)
        else {
            return Decision::Ignore
        };

        if !exit_reason.is_failure() || state.children[idx].factory.is_none() {
            log::trace!("[sup] child #{} ({}) is done: {}", child_id, pid, exit_reason);
            state.children.remove(idx);
            return Decision::Ignore
        }

        log::warn!("[sup] child #{} ({}) failed: {}", child_id, pid, exit_reason.pp());

        if let Err(reason) = self.0.intensity.report_restart(&mut state.restarts, Instant::now()) {
            log::error!("[sup] giving up: {}", reason);
            return Decision::GiveUp
        }

        match self.0.strategy {
            RestartStrategy::RestartOne => {
                state.children[idx].restarting = true;
                Decision::Restart { to_stop: vec![], to_restart: vec![child_id] }
            },
            RestartStrategy::RestartAll => {
                let to_stop =
                    state.children.iter().filter(|c| c.id != child_id).map(|c| c.pid).collect();
                // the watched-only children are stopped for good
                state.children.retain(|c| c.factory.is_some());
                state.children.iter_mut().for_each(|c| c.restarting = true);
                let to_restart = state.children.iter().map(|c| c.id).collect();
                Decision::Restart { to_stop, to_restart }
            },
        }
    }

    fn restart_child(&self, child_id: usize) {
        let mut state = self.0.state.lock();
        let Some(idx) = state.children.iter().position(|c| c.id == child_id) else { return };
        let Some(factory) = state.children[idx].factory.to_owned() else {
            state.children.remove(idx);
            return
        };

        match factory(&self.0.system) {
            Ok(pid) => {
                let child = &mut state.children[idx];
                child.pid = pid;
                child.restarting = false;
                drop(state);

                log::trace!("[sup] child #{} restarted as {}", child_id, pid);
                self.watch_child(child_id, pid);
            },
            Err(reason) => {
                log::error!("[sup] failed to restart child #{}: {}", child_id, ErrorPP::of(&*reason));
                state.children.remove(idx);
            },
        }
    }

    fn give_up(&self) -> Vec<Pid> {
        let pids = self.0.state.lock().children.drain(..).map(|c| c.pid).collect();
        self.0.exhausted.send_replace(true);
        pids
    }
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("strategy", &self.0.strategy)
            .field("intensity", &self.0.intensity)
            .field("children", &self.child_pids())
            .finish()
    }
}
