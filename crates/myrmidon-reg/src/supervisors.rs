use std::collections::BTreeMap;
use std::sync::Arc;

use myrmidon_actors::{
    BoxError, Pid, RestartIntensity, RestartStrategy, Supervisor, SupervisorError, System,
};
use parking_lot::Mutex;

use crate::names::NameRegistry;
use crate::paths::{normalize, PathError};

#[derive(Debug, thiserror::Error)]
pub enum PathSupervisorError {
    #[error("Invalid path")]
    Path(#[source] PathError),

    #[error("No supervisor at {:?}", _0)]
    NoSupervisor(String),

    #[error("Supervisor error")]
    Supervisor(#[source] SupervisorError),
}

/// [`Supervisor`]s keyed by path, e.g. one per subtree such as `/workers`.
///
/// Cheap to clone: all the clones refer to the same table.
#[derive(Debug, Clone)]
pub struct PathSupervisors(Arc<Inner>);

#[derive(Debug)]
struct Inner {
    system: System,
    registry: NameRegistry,
    intensity: RestartIntensity,
    table: Mutex<BTreeMap<String, Supervisor>>,
}

impl PathSupervisors {
    pub fn new(system: &System, registry: &NameRegistry, intensity: RestartIntensity) -> Self {
        Self(Arc::new(Inner {
            system: system.to_owned(),
            registry: registry.to_owned(),
            intensity,
            table: Default::default(),
        }))
    }

    /// The supervisor at `path`; it is created with `strategy` unless there already is a live one.
    pub fn create(&self, path: &str, strategy: RestartStrategy) -> Result<Supervisor, PathError> {
        let path = normalize(path)?;
        let mut table = self.0.table.lock();

        if let Some(existing) = table.get(&path).filter(|sup| !sup.is_exhausted()) {
            return Ok(existing.to_owned())
        }
        log::trace!("[reg] supervisor at {} [strategy: {:?}]", path, strategy);
        let sup = Supervisor::new(&self.0.system, strategy, self.0.intensity);
        table.insert(path, sup.to_owned());
        Ok(sup)
    }

    pub fn get(&self, path: &str) -> Option<Supervisor> {
        let path = normalize(path).ok()?;
        self.0.table.lock().get(&path).cloned()
    }

    /// Take the supervisor at `path` out of the table. Its children keep running until it is
    /// [shut down](Supervisor::shutdown).
    pub fn remove(&self, path: &str) -> Option<Supervisor> {
        let path = normalize(path).ok()?;
        self.0.table.lock().remove(&path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.0.table.lock().keys().cloned().collect()
    }

    /// Count `pid` among the children of the supervisor at `path`, without restarting it.
    pub fn watch(&self, path: &str, pid: Pid) -> Result<(), PathSupervisorError> {
        self.existing(path)?.watch(pid).map_err(PathSupervisorError::Supervisor)
    }

    /// Put `pid` under the supervisor at `path`, restarting it with `factory`. The supervisor is
    /// created with `strategy` if there is none yet.
    pub fn supervise_with_factory<F, E>(
        &self,
        path: &str,
        pid: Pid,
        factory: F,
        strategy: RestartStrategy,
    ) -> Result<(), PathSupervisorError>
    where
        F: Fn(&System) -> Result<Pid, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let sup = self.create(path, strategy).map_err(PathSupervisorError::Path)?;
        sup.supervise(pid, factory).map_err(PathSupervisorError::Supervisor)
    }

    /// The current children of the supervisor at `path`; none if there is no such supervisor.
    pub fn children(&self, path: &str) -> Vec<Pid> {
        self.get(path).map(|sup| sup.child_pids()).unwrap_or_default()
    }

    /// Watch every live actor registered below `prefix` with the supervisor at `prefix` (created
    /// if needed). Once such an actor terminates, its path is unregistered.
    ///
    /// Returns the number of actors newly watched.
    pub fn watch_path(&self, prefix: &str) -> Result<usize, PathSupervisorError> {
        let sup =
            self.create(prefix, RestartStrategy::RestartOne).map_err(PathSupervisorError::Path)?;
        let known = sup.child_pids();

        // an actor may be bound to several paths below `prefix`
        let mut fresh = Vec::new();
        for (path, pid) in self.0.registry.list_children(prefix) {
            if known.contains(&pid) {
                continue
            }
            if !fresh.contains(&pid) {
                if sup.watch(pid).is_err() {
                    continue
                }
                fresh.push(pid);
            }

            let registry = self.0.registry.to_owned();
            let join = self.0.system.join(pid);
            self.0.system.runtime().spawn(async move {
                let exit_reason = join.await;
                if registry.unbind_path(&path, pid) {
                    log::trace!("[reg] {} at {} is gone: {}", pid, path, exit_reason);
                }
            });
        }
        Ok(fresh.len())
    }

    fn existing(&self, path: &str) -> Result<Supervisor, PathSupervisorError> {
        let normalized = normalize(path).map_err(PathSupervisorError::Path)?;
        self.0
            .table
            .lock()
            .get(&normalized)
            .cloned()
            .ok_or(PathSupervisorError::NoSupervisor(normalized))
    }
}
