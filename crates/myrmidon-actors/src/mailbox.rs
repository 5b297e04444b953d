//! Per-actor message queue.
//!
//! A single FIFO holds both data and system messages, so messages from one sender are observed
//! in send order whatever their kind. The capacity limit applies to data messages only: when the
//! mailbox is full, the newest data message is rejected; system messages are always accepted.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use myrmidon_utils::future_timeout_ext::FutureTimeoutExt;
use myrmidon_utils::reductions::Reductions;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::message::Message;
use crate::pid::Pid;


/// Why an enqueue has been refused. The message is handed back.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Mailbox closed")]
    Closed(Message),

    #[error("Mailbox full")]
    Full(Message),
}

/// The sending half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MailboxSender(Arc<Shared>);

/// The receiving half, owned by the actor (or by the observer of an observed actor).
#[derive(Debug)]
pub struct Mailbox {
    pid: Pid,
    shared: Arc<Shared>,
    reductions: Reductions,
}

#[derive(Debug)]
struct Shared {
    capacity: Option<usize>,
    queue: Mutex<Queue>,
    arrived: Notify,
}

#[derive(Debug, Default)]
struct Queue {
    messages: VecDeque<Message>,
    data_len: usize,
    closed: bool,
}

pub(crate) fn channel(pid: Pid, capacity: Option<usize>, budget: usize) -> (MailboxSender, Mailbox) {
    let shared =
        Arc::new(Shared { capacity, queue: Mutex::new(Default::default()), arrived: Notify::new() });
    let tx = MailboxSender(Arc::clone(&shared));
    let rx = Mailbox { pid, shared, reductions: Reductions::new(budget) };
    (tx, rx)
}

impl MailboxSender {
    /// Enqueue a message. Data messages are subject to the capacity limit.
    pub fn send(&self, message: Message) -> Result<(), SendError> {
        {
            let mut queue = self.0.queue.lock();
            if queue.closed {
                return Err(SendError::Closed(message))
            }
            if !message.is_system() {
                if self.0.capacity.map(|cap| queue.data_len >= cap).unwrap_or(false) {
                    return Err(SendError::Full(message))
                }
                queue.data_len += 1;
            }
            queue.messages.push_back(message);
        }
        self.0.arrived.notify_one();
        Ok(())
    }

    /// No more messages are accepted; the queued ones remain receivable.
    pub fn close(&self) {
        self.0.queue.lock().closed = true;
        self.0.arrived.notify_one();
    }

    /// Drop every queued message. Returns how many have been dropped.
    pub fn clear(&self) -> usize {
        let dropped = {
            let mut queue = self.0.queue.lock();
            queue.data_len = 0;
            std::mem::take(&mut queue.messages)
        };
        self.0.arrived.notify_one();
        dropped.len()
    }

    pub fn is_closed(&self) -> bool {
        self.0.queue.lock().closed
    }

    pub fn len(&self) -> usize {
        self.0.queue.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Mailbox {
    /// The actor this mailbox belongs to.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn len(&self) -> usize {
        self.shared.queue.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive the oldest message. `None` once the mailbox is closed and empty.
    pub async fn recv(&mut self) -> Option<Message> {
        self.selective_recv(|_| true).await
    }

    /// Receive the oldest message, or `None` if nothing arrives within `timeout`.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<Message> {
        self.recv().timeout(timeout).await.ok().flatten()
    }

    pub fn try_recv(&mut self) -> Option<Message> {
        let mut queue = self.shared.queue.lock();
        queue.take(0)
    }

    /// Receive the oldest message satisfying `matcher`, leaving the others in place and in order.
    ///
    /// Waits for a matching message to arrive. Returns `None` if the mailbox gets closed without
    /// one. The matcher runs while the queue is locked, so it must not send into this mailbox.
    pub async fn selective_recv<F>(&mut self, mut matcher: F) -> Option<Message>
    where
        F: FnMut(&Message) -> bool,
    {
        self.reductions.spend().await;

        let mut scanned = 0;
        loop {
            let arrived = self.shared.arrived.notified();
            {
                let mut queue = self.shared.queue.lock();
                if scanned > queue.messages.len() {
                    scanned = 0;
                }
                let found =
                    queue.messages.iter().skip(scanned).position(&mut matcher).map(|idx| idx + scanned);
                if let Some(idx) = found {
                    return queue.take(idx)
                }
                scanned = queue.messages.len();
                if queue.closed {
                    return None
                }
            }
            arrived.await;
        }
    }

    /// Same as [`selective_recv`](Self::selective_recv), bounded by `timeout`.
    pub async fn selective_recv_timeout<F>(
        &mut self,
        matcher: F,
        timeout: Option<Duration>,
    ) -> Option<Message>
    where
        F: FnMut(&Message) -> bool,
    {
        self.selective_recv(matcher).timeout_opt(timeout).await.ok().flatten()
    }

    /// Take every message queued at the moment.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut queue = self.shared.queue.lock();
        queue.data_len = 0;
        queue.messages.drain(..).collect()
    }
}

impl Queue {
    fn take(&mut self, idx: usize) -> Option<Message> {
        let message = self.messages.remove(idx)?;
        if !message.is_system() {
            self.data_len -= 1;
        }
        Some(message)
    }
}
