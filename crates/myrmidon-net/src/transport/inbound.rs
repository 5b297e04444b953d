use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use myrmidon_utils::std_error_pp::StdErrorPP;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::codec::Framed;

use crate::frame::{Frame, FrameKind};
use crate::transport::Transport;

/// Serve a connection accepted by the listener: deliver its data frames, answer its requests,
/// report the termination of the actors it subscribes to.
pub(super) async fn serve(transport: Transport, stream: TcpStream, peer: SocketAddr) {
    let (mut sink, mut frames) = Framed::new(stream, transport.codec()).split();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<Frame>();

    tokio::spawn(async move {
        while let Some(frame) = reply_rx.recv().await {
            if let Err(reason) = sink.send(frame).await {
                log::debug!("[transport] write to {}: {}", peer, reason.pp());
                break
            }
        }
    });

    let cancel = transport.0.cancel.child_token();
    let mut monitors = JoinSet::new();

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            Some(_) = monitors.join_next(), if !monitors.is_empty() => continue,
            frame = frames.next() => frame,
        };

        match frame {
            None => {
                log::debug!("[transport] {} disconnected", peer);
                break
            },
            Some(Err(reason)) => {
                log::warn!("[transport] dropping connection from {}: {}", peer, reason.pp());
                break
            },
            Some(Ok(frame)) => handle_frame(&transport, peer, frame, &reply_tx, &mut monitors),
        }
    }
}

fn handle_frame(
    transport: &Transport,
    peer: SocketAddr,
    frame: Frame,
    reply_tx: &mpsc::UnboundedSender<Frame>,
    monitors: &mut JoinSet<()>,
) {
    let system = transport.system();

    match frame.kind {
        FrameKind::Data => {
            let to = frame.target;
            if !system.send(to, frame.payload) {
                log::debug!("[transport] message from {} to {} dropped", peer, to);
            }
        },
        FrameKind::ResolveReq => {
            let resolved = frame.name().ok().and_then(|name| transport.registry().resolve(name));
            log::trace!("[transport] {} resolves {:?}: {:?}", peer, frame.name().ok(), resolved);
            let _ = reply_tx.send(Frame::resolve_resp(resolved));
        },
        FrameKind::Heartbeat => {
            let _ = reply_tx.send(Frame::heartbeat());
        },
        FrameKind::MonitorSub => {
            let pid = frame.target;
            log::trace!("[transport] {} monitors {}", peer, pid);

            let exited = system.join(pid);
            let reply_tx = reply_tx.to_owned();
            monitors.spawn(async move {
                let exit_reason = exited.await;
                let _ = reply_tx.send(Frame::down(pid, &exit_reason));
            });
        },
        unexpected @ (FrameKind::ResolveResp | FrameKind::Down) => {
            log::warn!("[transport] unexpected {:?} from {}", unexpected, peer);
        },
    }
}
