use std::collections::HashMap;
use std::sync::Arc;

use myrmidon_actors::Pid;
use parking_lot::RwLock;
use tokio::sync::watch;

use crate::paths::Paths;

type State = Option<Pid>;

#[derive(Debug, Clone, Default)]
pub struct NameRegistry(pub(crate) Arc<Inner>);

#[derive(Debug, Default)]
pub(crate) struct Inner {
    names: RwLock<HashMap<String, watch::Sender<State>>>,
    pub(crate) paths: RwLock<Paths>,
}

/// Keeps a name bound for as long as it lives.
///
/// Upon drop the name is unbound, unless it has been rebound to another actor meanwhile.
#[derive(Debug)]
#[must_use = "the name is unbound as soon as the guard is dropped"]
pub struct RegGuard {
    registry: NameRegistry,
    name: String,
    pid: Pid,
}

impl NameRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Bind `name` to `pid`, replacing the previous binding, if any.
    pub fn register(&self, name: impl Into<String>, pid: Pid) {
        let name = name.into();
        log::trace!("[reg] {} -> {}", name, pid);
        self.with_slot(name, |tx| {
            tx.send_replace(Some(pid));
        });
    }

    /// Returns the pid the name was bound to.
    pub fn unregister(&self, name: &str) -> Option<Pid> {
        let mut names = self.0.names.write();
        let tx = names.get(name)?;
        let previous = tx.send_replace(None);
        if tx.receiver_count() == 0 {
            names.remove(name);
        }
        previous
    }

    /// Remove every binding pointing at `pid`. Returns the number of bindings removed.
    pub fn unregister_pid(&self, pid: Pid) -> usize {
        let mut names = self.0.names.write();
        let mut removed = 0;
        names.retain(|_, tx| {
            if *tx.borrow() == Some(pid) {
                tx.send_replace(None);
                removed += 1;
                tx.receiver_count() > 0
            } else {
                true
            }
        });
        removed
    }

    /// Bind `name` to `pid` until the returned guard is dropped.
    pub fn register_scoped(&self, name: impl Into<String>, pid: Pid) -> RegGuard {
        let name = name.into();
        self.register(name.to_owned(), pid);
        RegGuard { registry: self.to_owned(), name, pid }
    }

    pub fn resolve(&self, name: &str) -> Option<Pid> {
        self.0.names.read().get(name).and_then(|tx| *tx.borrow())
    }

    /// Wait until the name gets bound.
    pub async fn wait(&self, name: &str) -> Pid {
        let mut rx = self.with_slot(name.to_owned(), |tx| tx.subscribe());
        loop {
            if let Some(pid) = *rx.borrow_and_update() {
                break pid
            }
            // the sender lives in the table for as long as this receiver does
            let _ = rx.changed().await;
        }
    }

    pub fn names(&self) -> Vec<(String, Pid)> {
        self.0
            .names
            .read()
            .iter()
            .filter_map(|(name, tx)| tx.borrow().map(|pid| (name.to_owned(), pid)))
            .collect()
    }

    fn with_slot<F, R>(&self, name: String, f: F) -> R
    where
        F: FnOnce(&watch::Sender<State>) -> R,
    {
        if let Some(tx) = self.0.names.read().get(&name) {
            return f(tx)
        }
        let mut names = self.0.names.write();
        let tx = names.entry(name).or_insert_with(|| watch::channel(None).0);
        f(tx)
    }
}

impl RegGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

impl Drop for RegGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.registry.0.names.read().get(&self.name) {
            tx.send_if_modified(|v| {
                if matches!(v, Some(this) if *this == self.pid) {
                    *v = None;
                    true
                } else {
                    false
                }
            });
        }
    }
}
