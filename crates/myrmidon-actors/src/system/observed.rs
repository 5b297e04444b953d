use std::time::Duration;

use myrmidon_utils::future_timeout_ext::FutureTimeoutExt;

use super::*;
use crate::system::actor_entry::ObservedMailbox;

impl System {
    /// Receive from an observed actor's mailbox the oldest message satisfying `matcher`.
    ///
    /// Returns `Ok(None)` if no matching message arrives within `timeout` (`None` waits for as
    /// long as the actor lives). The messages that do not match stay queued, in order.
    pub async fn selective_recv<F>(
        &self,
        pid: Pid,
        matcher: F,
        timeout: Option<Duration>,
    ) -> Result<Option<Message>, RecvError>
    where
        F: FnMut(&Message) -> bool + Send,
    {
        let observed = self.observed_mailbox(pid)?;
        let received = async move { observed.lock().await.selective_recv(matcher).await }
            .timeout_opt(timeout)
            .await;
        Ok(received.ok().flatten())
    }

    /// Take every message currently queued in an observed actor's mailbox.
    pub async fn take_messages(&self, pid: Pid) -> Result<Vec<Message>, RecvError> {
        let observed = self.observed_mailbox(pid)?;
        let messages = observed.lock().await.drain();
        Ok(messages)
    }

    fn observed_mailbox(&self, pid: Pid) -> Result<ObservedMailbox, RecvError> {
        let entry = self.actor_entry_read(pid).ok_or(RecvError::NoActor)?;
        let occupied = entry.running(pid).ok_or(RecvError::NoActor)?;
        occupied.observed.to_owned().ok_or(RecvError::NotObserved)
    }
}
