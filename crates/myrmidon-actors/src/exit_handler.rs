use std::fmt;

use myrmidon_utils::std_error_pp::StdErrorPP;

use crate::exit::ExitReason;
use crate::pid::Pid;

/// Notified once per actor, right after the actor's behaviour has completed and before its
/// links and monitors learn about it.
///
/// The handler comes from [`SpawnOpts::with_exit_handler`](crate::spawn_opts::SpawnOpts::with_exit_handler)
/// if set, from the [`SystemConfig`](crate::system_config::SystemConfig) otherwise.
pub trait ExitHandler: fmt::Debug + Send + Sync + 'static {
    fn on_actor_exit(&self, pid: Pid, exit_reason: &ExitReason);
}

/// Logs the failures: panics and custom reasons as errors, the rest as warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogExitHandler;

/// Prints the failures into stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrExitHandler;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExitHandler;

impl ExitHandler for LogExitHandler {
    fn on_actor_exit(&self, pid: Pid, exit_reason: &ExitReason) {
        match exit_reason {
            ExitReason::Panic(_) | ExitReason::Custom(_) => {
                log::error!("[{}] failed: {}", pid, exit_reason.pp())
            },
            failure if failure.is_failure() => {
                log::warn!("[{}] terminated: {}", pid, failure.pp())
            },
            _ => log::trace!("[{}] terminated: {}", pid, exit_reason),
        }
    }
}

impl ExitHandler for StderrExitHandler {
    fn on_actor_exit(&self, pid: Pid, exit_reason: &ExitReason) {
        if exit_reason.is_failure() {
            eprintln!("[{}] terminated: {}", pid, exit_reason.pp());
        }
    }
}

impl ExitHandler for NoopExitHandler {
    fn on_actor_exit(&self, _pid: Pid, _exit_reason: &ExitReason) {}
}
