use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use myrmidon_actors::{Pid, System};
use myrmidon_reg::NameRegistry;
use myrmidon_utils::future_timeout_ext::FutureTimeoutExt;
use myrmidon_utils::std_error_pp::StdErrorPP;
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use crate::frame::{Frame, FrameCodec, FrameError, FrameKind};
use crate::transport_config::TransportConfig;

mod inbound;
mod monitor;
mod outbound;

pub(crate) type Connection = Framed<TcpStream, FrameCodec>;

/// Pause after a failed `accept`, so that a persistent error (e.g. out of descriptors) does not
/// spin the accept loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O")]
    Io(#[source] std::io::Error),

    #[error("Frame")]
    Frame(#[source] FrameError),

    #[error("Timeout")]
    Timeout,

    #[error("Connection closed")]
    Closed,

    #[error("Transport is shut down")]
    Shutdown,
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
impl From<FrameError> for TransportError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

/// The node's endpoint towards the other nodes.
///
/// Serves the local [`System`] and [`NameRegistry`] to the inbound connections, and keeps a pool
/// of outbound connections, one per remote address, for the remote sends.
#[derive(Debug, Clone)]
pub struct Transport(Arc<Inner>);

#[derive(Debug)]
struct Inner {
    system: System,
    registry: NameRegistry,
    config: TransportConfig,
    links: Mutex<HashMap<String, mpsc::UnboundedSender<Frame>>>,
    cancel: CancellationToken,
}

impl Transport {
    pub fn new(system: System, registry: NameRegistry, config: TransportConfig) -> Self {
        let inner = Inner {
            system,
            registry,
            config,
            links: Default::default(),
            cancel: CancellationToken::new(),
        };
        Self(Arc::new(inner))
    }

    pub fn system(&self) -> &System {
        &self.0.system
    }

    pub fn registry(&self) -> &NameRegistry {
        &self.0.registry
    }

    pub fn config(&self) -> &TransportConfig {
        &self.0.config
    }

    pub fn is_shut_down(&self) -> bool {
        self.0.cancel.is_cancelled()
    }

    /// Accept connections on `addr` until [`shutdown`](Transport::shutdown).
    ///
    /// Returns the address actually bound (useful with port `0`).
    pub async fn listen(&self, addr: impl ToSocketAddrs) -> Result<SocketAddr, TransportError> {
        if self.is_shut_down() {
            return Err(TransportError::Shutdown)
        }
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        log::debug!("[transport] listening on {}", local_addr);

        let transport = self.to_owned();
        let cancel = self.0.cancel.to_owned();
        tokio::spawn(async move {
            tokio::select! {
                _ = transport.accept_loop(listener) => (),
                _ = cancel.cancelled() => {
                    log::debug!("[transport] listener on {} closed", local_addr);
                },
            }
        });

        Ok(local_addr)
    }

    /// Send `data` to the actor `to` living on the node at `addr`.
    ///
    /// Fire-and-forget: `true` means that the frame has been queued onto a connection to `addr`,
    /// not that it has been delivered. `false` if no connection could be established.
    pub async fn send_remote(&self, addr: &str, to: Pid, data: impl Into<Bytes>) -> bool {
        outbound::send(self, addr, Frame::data(to, data)).await
    }

    /// Ask the node at `addr` what the `name` is bound to. `None` on any failure.
    pub async fn resolve_remote(&self, addr: &str, name: &str) -> Option<Pid> {
        match self.request(addr, Frame::resolve_req(name), FrameKind::ResolveResp).await {
            Ok(response) => response.resolved(),
            Err(reason) => {
                log::warn!("[transport] failed to resolve {:?} at {}: {}", name, addr, reason.pp());
                None
            },
        }
    }

    /// Connect to `addr` and exchange heartbeats. Never fails: an unreachable node is down.
    pub async fn is_node_up(&self, addr: &str) -> bool {
        match self.request(addr, Frame::heartbeat(), FrameKind::Heartbeat).await {
            Ok(_) => true,
            Err(reason) => {
                log::debug!("[transport] node {} is down: {}", addr, reason.pp());
                false
            },
        }
    }

    /// Close the listeners, the outbound connections and the remote monitors.
    pub fn shutdown(&self) {
        log::debug!("[transport] shutting down");
        self.0.cancel.cancel();
        self.0.links.lock().clear();
    }
}

impl Transport {
    async fn accept_loop(&self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    log::debug!("[transport] accepted {}", peer);
                    if let Err(reason) = stream.set_nodelay(true) {
                        log::warn!("[transport] set_nodelay [peer: {}]: {}", peer, reason.pp());
                    }
                    tokio::spawn(inbound::serve(self.to_owned(), stream, peer));
                },
                Err(reason) => {
                    log::warn!("[transport] accept: {}", reason.pp());
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                },
            }
        }
    }

    pub(crate) async fn connect(&self, addr: &str) -> Result<Connection, TransportError> {
        if self.is_shut_down() {
            return Err(TransportError::Shutdown)
        }
        let stream = TcpStream::connect(addr)
            .timeout(self.0.config.connect_timeout)
            .await
            .map_err(|_| TransportError::Timeout)??;
        stream.set_nodelay(true)?;

        log::debug!("[transport] connected to {}", addr);
        Ok(Framed::new(stream, self.codec()))
    }

    pub(crate) fn codec(&self) -> FrameCodec {
        FrameCodec::new(self.0.config.max_frame_len)
    }

    /// A single request over a dedicated connection.
    async fn request(
        &self,
        addr: &str,
        request: Frame,
        response_kind: FrameKind,
    ) -> Result<Frame, TransportError> {
        let connection = self.connect(addr).await?;

        exchange(connection, request, response_kind)
            .timeout(self.0.config.request_timeout)
            .await
            .map_err(|_| TransportError::Timeout)?
    }
}

async fn exchange(
    mut connection: Connection,
    request: Frame,
    response_kind: FrameKind,
) -> Result<Frame, TransportError> {
    connection.send(request).await?;
    while let Some(frame) = connection.next().await {
        let frame = frame?;
        if frame.kind == response_kind {
            return Ok(frame)
        }
        log::trace!("[transport] skipping {:?} while waiting for {:?}", frame.kind, response_kind);
    }
    Err(TransportError::Closed)
}
