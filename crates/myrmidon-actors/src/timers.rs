use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;

use crate::pid::Pid;
use crate::system::{System, SystemWeakRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Default)]
pub(crate) struct Timers {
    next_id: AtomicU64,
    active: Mutex<HashMap<TimerId, AbortHandle>>,
}

impl Timers {
    fn next_id(&self) -> TimerId {
        TimerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn cancel(&self, timer_id: TimerId) -> bool {
        self.active.lock().remove(&timer_id).map(|handle| handle.abort()).is_some()
    }

    fn forget(&self, timer_id: TimerId) {
        self.active.lock().remove(&timer_id);
    }

    pub fn cancel_all(&self) {
        for (_, handle) in self.active.lock().drain() {
            handle.abort();
        }
    }
}

impl System {
    /// Send `data` to `to` once `delay` has elapsed.
    pub fn send_after(&self, to: Pid, delay: Duration, data: impl Into<Bytes>) -> TimerId {
        let data = data.into();
        self.start_timer(move |timer_id, system| async move {
            tokio::time::sleep(delay).await;
            if let Some(system) = system.rc_upgrade() {
                log::trace!("[{}] timer {} fired", to, timer_id);
                system.send(to, data);
                system.timers().forget(timer_id);
            }
        })
    }

    /// Send `data` to `to` every `period`, until cancelled or until `to` terminates.
    ///
    /// A tick the mailbox rejects (e.g. when full) is skipped.
    pub fn send_interval(&self, to: Pid, period: Duration, data: impl Into<Bytes>) -> TimerId {
        let data = data.into();
        self.start_timer(move |timer_id, system| async move {
            let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                let Some(system) = system.rc_upgrade() else { break };
                if system.send(to, data.clone()) {
                    continue
                }
                if !system.is_alive(to) {
                    log::trace!("[{}] timer {} stopped: recipient is gone", to, timer_id);
                    system.timers().forget(timer_id);
                    break
                }
                log::trace!("[{}] timer {} skipped a tick", to, timer_id);
            }
        })
    }

    /// Returns `true` if the timer was still pending.
    pub fn cancel_timer(&self, timer_id: TimerId) -> bool {
        self.timers().cancel(timer_id)
    }

    fn start_timer<F, Fut>(&self, make_task: F) -> TimerId
    where
        F: FnOnce(TimerId, SystemWeakRef) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let timer_id = self.timers().next_id();
        let task = make_task(timer_id, self.rc_downgrade());

        // registered under the lock, so that a timer firing right away cannot be forgotten
        // before it is known
        let mut active = self.timers().active.lock();
        let handle = self.runtime().spawn(task).abort_handle();
        active.insert(timer_id, handle);

        timer_id
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}
