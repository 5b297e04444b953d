use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use myrmidon_actors::{
    BoxError, BufferError, BufferId, BufferLease, BufferPool, ExitReason, HotSwapError, Message,
    Pid, PullHandler, PushHandler, RecvError, RestartStrategy, SysSpawnError, System,
};
use myrmidon_net::{Transport, TransportError};
use myrmidon_reg::{NameRegistry, PathError, PathSupervisorError, PathSupervisors};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::block_in_place;

use crate::runtime_config::RuntimeConfig;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Failed to build the tokio runtime")]
    Io(#[source] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PathSpawnError {
    #[error("Invalid path")]
    Path(#[source] PathError),

    #[error("Failed to spawn")]
    Spawn(#[source] SysSpawnError),
}

/// The node: an actor [`System`], its [`NameRegistry`], [`BufferPool`] and [`Transport`], all
/// running on a tokio runtime.
///
/// The tokio runtime is either owned by the [`Runtime`] (see [`Runtime::new`]) or borrowed (see
/// [`Runtime::with_handle`]).
///
/// The `*_blocking` methods drive the corresponding future to completion on the calling thread.
/// They may be called from any thread except the workers of a current-thread tokio runtime.
#[derive(Debug)]
pub struct Runtime {
    handle: Handle,
    owned: Option<tokio::runtime::Runtime>,
    system: System,
    registry: NameRegistry,
    supervisors: PathSupervisors,
    transport: Transport,
}

impl Runtime {
    /// Start a node on its own multi-thread tokio runtime.
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        if let Some(worker_threads) = config.worker_threads {
            builder.worker_threads(worker_threads);
        }
        let owned = builder.enable_all().build().map_err(RuntimeError::Io)?;
        let handle = owned.handle().to_owned();

        let mut runtime = Self::with_handle(config, handle);
        runtime.owned = Some(owned);
        Ok(runtime)
    }

    /// Start a node on an existing tokio runtime.
    pub fn with_handle(config: RuntimeConfig, handle: Handle) -> Self {
        let RuntimeConfig { system, transport, path_supervisor_intensity, .. } = config;

        let system = System::with_runtime(system, handle.to_owned());
        let registry = NameRegistry::new();
        let supervisors = PathSupervisors::new(&system, &registry, path_supervisor_intensity);
        let transport = Transport::new(system.to_owned(), registry.to_owned(), transport);

        log::debug!("[node:{}] started", system.node_id());
        Self { handle, owned: None, system, registry, supervisors, transport }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
    pub fn system(&self) -> &System {
        &self.system
    }
    pub fn registry(&self) -> &NameRegistry {
        &self.registry
    }
    pub fn path_supervisors(&self) -> &PathSupervisors {
        &self.supervisors
    }
    pub fn transport(&self) -> &Transport {
        &self.transport
    }
    pub fn buffers(&self) -> &BufferPool {
        self.system.buffers()
    }
    pub fn node_id(&self) -> u32 {
        self.system.node_id()
    }
}

impl Runtime {
    pub fn spawn(&self, handler: impl PushHandler, budget: usize) -> Result<Pid, SysSpawnError> {
        self.system.spawn(handler, budget)
    }

    pub fn spawn_with_mailbox(
        &self,
        handler: impl PullHandler,
        budget: usize,
    ) -> Result<Pid, SysSpawnError> {
        self.system.spawn_with_mailbox(handler, budget)
    }

    pub fn spawn_observed(&self, budget: usize) -> Result<Pid, SysSpawnError> {
        self.system.spawn_observed(budget)
    }

    pub fn hot_swap(&self, pid: Pid, handler: impl PushHandler) -> Result<(), HotSwapError> {
        self.system.hot_swap(pid, handler)
    }

    pub fn stop(&self, pid: Pid) -> bool {
        self.system.stop(pid)
    }

    pub fn send(&self, to: Pid, data: impl Into<Bytes>) -> bool {
        self.system.send(to, data)
    }

    /// Send to the actor the `name` is bound to in the local registry.
    pub fn send_named(&self, name: &str, data: impl Into<Bytes>) -> bool {
        match self.registry.resolve(name) {
            Some(pid) => self.system.send(pid, data),
            None => {
                log::trace!("[node:{}] no actor named {:?}", self.node_id(), name);
                false
            },
        }
    }

    pub fn register(&self, name: impl Into<String>, pid: Pid) {
        self.registry.register(name, pid)
    }

    pub fn unregister(&self, name: &str) -> Option<Pid> {
        self.registry.unregister(name)
    }

    pub fn resolve(&self, name: &str) -> Option<Pid> {
        self.registry.resolve(name)
    }

    pub fn whereis(&self, name: &str) -> Option<Pid> {
        self.resolve(name)
    }

    pub fn register_path(&self, path: &str, pid: Pid) -> Result<(), PathError> {
        self.registry.register_path(path, pid)
    }

    pub fn unregister_path(&self, path: &str) -> Option<Pid> {
        self.registry.unregister_path(path)
    }

    pub fn whereis_path(&self, path: &str) -> Option<Pid> {
        self.registry.whereis_path(path)
    }

    pub fn list_children(&self, prefix: &str) -> Vec<(String, Pid)> {
        self.registry.list_children(prefix)
    }

    pub fn list_children_direct(&self, prefix: &str) -> Vec<(String, Pid)> {
        self.registry.list_children_direct(prefix)
    }

    /// Spawn an observed actor and bind it to `path`.
    pub fn spawn_with_path_observed(
        &self,
        budget: usize,
        path: &str,
    ) -> Result<Pid, PathSpawnError> {
        let pid = self.system.spawn_observed(budget).map_err(PathSpawnError::Spawn)?;
        if let Err(reason) = self.registry.register_path(path, pid) {
            self.system.stop(pid);
            return Err(PathSpawnError::Path(reason))
        }
        Ok(pid)
    }

    /// Create a [`RestartStrategy::RestartOne`] supervisor at `path`, unless there is one.
    pub fn create_path_supervisor(&self, path: &str) -> Result<(), PathError> {
        self.supervisors.create(path, RestartStrategy::RestartOne).map(drop)
    }

    pub fn path_supervisor_watch(&self, path: &str, pid: Pid) -> Result<(), PathSupervisorError> {
        self.supervisors.watch(path, pid)
    }

    pub fn path_supervise_with_factory<F, E>(
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
        self.supervisors.supervise_with_factory(path, pid, factory, strategy)
    }

    pub fn path_supervisor_children(&self, path: &str) -> Vec<Pid> {
        self.supervisors.children(path)
    }

    /// See [`PathSupervisors::watch_path`].
    pub fn watch_path(&self, prefix: &str) -> Result<usize, PathSupervisorError> {
        self.supervisors.watch_path(prefix)
    }

    pub fn allocate_buffer(&self, size: usize) -> Result<BufferLease, BufferError> {
        self.system.allocate_buffer(size)
    }

    pub fn send_buffer(&self, to: Pid, buffer: BufferId) -> bool {
        self.system.send_buffer(to, buffer)
    }
}

impl Runtime {
    pub async fn join(&self, pid: Pid) -> ExitReason {
        self.system.join(pid).await
    }

    pub async fn selective_recv<F>(
        &self,
        pid: Pid,
        matcher: F,
        timeout: Option<Duration>,
    ) -> Result<Option<Message>, RecvError>
    where
        F: FnMut(&Message) -> bool + Send,
    {
        self.system.selective_recv(pid, matcher, timeout).await
    }

    pub async fn listen(&self, addr: &str) -> Result<SocketAddr, TransportError> {
        self.transport.listen(addr).await
    }

    pub async fn send_remote(&self, addr: &str, to: Pid, data: impl Into<Bytes>) -> bool {
        self.transport.send_remote(addr, to, data).await
    }

    pub async fn resolve_remote(&self, addr: &str, name: &str) -> Option<Pid> {
        self.transport.resolve_remote(addr, name).await
    }

    pub async fn is_node_up(&self, addr: &str) -> bool {
        self.transport.is_node_up(addr).await
    }

    pub async fn monitor_remote(&self, watcher: Pid, addr: &str, pid: Pid) -> bool {
        self.transport.monitor_remote(watcher, addr, pid).await
    }

    /// Remove the supervisor at `path`, stopping its children. Returns `false` if there was none.
    pub async fn remove_path_supervisor(&self, path: &str) -> bool {
        match self.supervisors.remove(path) {
            Some(sup) => {
                sup.shutdown().await;
                true
            },
            None => false,
        }
    }

    /// Close the transport, then stop every actor (see [`System::shutdown`]).
    pub async fn shutdown(&self, timeout: Duration) {
        self.transport.shutdown();
        self.system.shutdown(timeout).await;
        log::debug!("[node:{}] shut down", self.node_id());
    }
}

impl Runtime {
    pub fn join_blocking(&self, pid: Pid) -> ExitReason {
        self.block_on(self.join(pid))
    }

    pub fn selective_recv_blocking<F>(
        &self,
        pid: Pid,
        matcher: F,
        timeout: Option<Duration>,
    ) -> Result<Option<Message>, RecvError>
    where
        F: FnMut(&Message) -> bool + Send,
    {
        self.block_on(self.selective_recv(pid, matcher, timeout))
    }

    pub fn listen_blocking(&self, addr: &str) -> Result<SocketAddr, TransportError> {
        self.block_on(self.listen(addr))
    }

    pub fn send_remote_blocking(&self, addr: &str, to: Pid, data: impl Into<Bytes>) -> bool {
        self.block_on(self.send_remote(addr, to, data))
    }

    pub fn resolve_remote_blocking(&self, addr: &str, name: &str) -> Option<Pid> {
        self.block_on(self.resolve_remote(addr, name))
    }

    pub fn is_node_up_blocking(&self, addr: &str) -> bool {
        self.block_on(self.is_node_up(addr))
    }

    pub fn monitor_remote_blocking(&self, watcher: Pid, addr: &str, pid: Pid) -> bool {
        self.block_on(self.monitor_remote(watcher, addr, pid))
    }

    pub fn remove_path_supervisor_blocking(&self, path: &str) -> bool {
        self.block_on(self.remove_path_supervisor(path))
    }

    pub fn shutdown_blocking(&self, timeout: Duration) {
        self.block_on(self.shutdown(timeout))
    }

    fn block_on<F: Future>(&self, f: F) -> F::Output {
        match Handle::try_current().map(|current| current.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => block_in_place(|| self.handle.block_on(f)),
            // outside of any runtime; a current-thread worker cannot block (tokio panics)
            _ => self.handle.block_on(f),
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.transport.shutdown();
        if let Some(owned) = self.owned.take() {
            owned.shutdown_background();
        }
    }
}
