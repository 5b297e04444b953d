use std::time::Duration;

use futures::{SinkExt, StreamExt};
use myrmidon_actors::{ExitReason, Pid, SystemMessage};
use myrmidon_utils::future_timeout_ext::FutureTimeoutExt;
use myrmidon_utils::std_error_pp::StdErrorPP;
use tokio::time::{Instant, MissedTickBehavior};

use crate::frame::{Frame, FrameKind};
use crate::transport::{Connection, Transport, TransportError};

impl Transport {
    /// Deliver a [`SystemMessage::Down`] to `watcher` once the actor `pid` at `addr` terminates,
    /// or once the connection to `addr` is lost.
    ///
    /// If the subscription cannot be made, the `Down` (with [`ExitReason::ConnectionLost`]) is
    /// delivered right away and `false` is returned. The subscription is dropped when the
    /// watcher terminates. Returns `false` without subscribing if `watcher` is not alive.
    pub async fn monitor_remote(&self, watcher: Pid, addr: &str, pid: Pid) -> bool {
        let system = self.system().to_owned();
        if !system.is_alive(watcher) {
            log::debug!("[{}] not alive, not monitoring {} at {}", watcher, pid, addr);
            return false
        }

        let connection = match self.subscribe(addr, pid).await {
            Ok(connection) => connection,
            Err(reason) => {
                log::warn!("[{}] cannot monitor {} at {}: {}", watcher, pid, addr, reason.pp());
                system.send_system(
                    watcher,
                    SystemMessage::Down { pid, reason: ExitReason::ConnectionLost },
                );
                return false
            },
        };

        let watcher_exited = system.join(watcher);
        let config = self.config();
        let watching = watch(connection, pid, config.heartbeat_interval, config.heartbeat_timeout);
        let cancel = self.0.cancel.child_token();

        tokio::spawn(async move {
            tokio::select! {
                exit_reason = watching => {
                    log::trace!("[{}] remote {} down: {}", watcher, pid, exit_reason);
                    system.send_system(watcher, SystemMessage::Down { pid, reason: exit_reason });
                },
                _ = watcher_exited => {
                    log::trace!("[{}] gone, dropping the subscription to {}", watcher, pid);
                },
                _ = cancel.cancelled() => (),
            }
        });

        true
    }

    /// Wait for the actor `pid` at `addr` to terminate.
    ///
    /// Returns [`ExitReason::ConnectionLost`] if the node cannot be reached or stops answering.
    pub async fn watch_remote(&self, addr: &str, pid: Pid) -> ExitReason {
        match self.subscribe(addr, pid).await {
            Ok(connection) => {
                let config = self.config();
                watch(connection, pid, config.heartbeat_interval, config.heartbeat_timeout).await
            },
            Err(reason) => {
                log::warn!("[transport] cannot watch {} at {}: {}", pid, addr, reason.pp());
                ExitReason::ConnectionLost
            },
        }
    }

    async fn subscribe(&self, addr: &str, pid: Pid) -> Result<Connection, TransportError> {
        let mut connection = self.connect(addr).await?;
        connection
            .send(Frame::monitor_sub(pid))
            .timeout(self.config().request_timeout)
            .await
            .map_err(|_| TransportError::Timeout)??;
        Ok(connection)
    }
}

async fn watch(
    connection: Connection,
    pid: Pid,
    heartbeat_interval: Duration,
    heartbeat_timeout: Duration,
) -> ExitReason {
    let (mut sink, mut frames) = connection.split();

    let mut ticks = tokio::time::interval(heartbeat_interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(Ok(frame)) if frame.kind == FrameKind::Down && frame.target == pid => {
                    break frame.exit_reason().unwrap_or_else(|reason| {
                        log::warn!("[transport] bad Down for {}: {}", pid, reason.pp());
                        ExitReason::ConnectionLost
                    })
                },
                Some(Ok(frame)) if frame.kind == FrameKind::Heartbeat => last_seen = Instant::now(),
                Some(Ok(frame)) => log::trace!("[transport] ignoring {:?} while watching {}", frame.kind, pid),
                Some(Err(reason)) => {
                    log::warn!("[transport] lost {}: {}", pid, reason.pp());
                    break ExitReason::ConnectionLost
                },
                None => {
                    log::debug!("[transport] lost {}: connection closed", pid);
                    break ExitReason::ConnectionLost
                },
            },
            _ = ticks.tick() => {
                if last_seen.elapsed() > heartbeat_timeout {
                    log::warn!("[transport] lost {}: no heartbeat for {:?}", pid, last_seen.elapsed());
                    break ExitReason::ConnectionLost
                }
                if let Err(reason) = sink.send(Frame::heartbeat()).await {
                    log::warn!("[transport] lost {}: {}", pid, reason.pp());
                    break ExitReason::ConnectionLost
                }
            },
        }
    }
}
