use futures::{SinkExt, StreamExt};
use myrmidon_utils::std_error_pp::StdErrorPP;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::frame::Frame;
use crate::transport::{Connection, Transport};

/// Queue `frame` onto the pooled connection to `addr`, establishing it if necessary.
pub(super) async fn send(transport: &Transport, addr: &str, frame: Frame) -> bool {
    if transport.is_shut_down() {
        return false
    }

    let existing = transport.0.links.lock().get(addr).cloned();
    let frame = match existing {
        None => frame,
        Some(link) => match link.send(frame) {
            Ok(()) => return true,
            Err(mpsc::error::SendError(frame)) => {
                let mut links = transport.0.links.lock();
                if links.get(addr).map_or(false, |current| current.same_channel(&link)) {
                    links.remove(addr);
                }
                frame
            },
        },
    };

    let connection = match transport.connect(addr).await {
        Ok(connection) => connection,
        Err(reason) => {
            log::warn!("[transport] cannot reach {}: {}", addr, reason.pp());
            return false
        },
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let link = transport.0.links.lock().entry(addr.to_owned()).or_insert(tx).clone();
    tokio::spawn(run_link(addr.to_owned(), connection, rx, transport.0.cancel.child_token()));

    link.send(frame).is_ok()
}

/// Write the queued frames until the connection breaks. The peer is not expected to talk back
/// on this connection: reading only detects the disconnection.
async fn run_link(
    addr: String,
    connection: Connection,
    mut rx: mpsc::UnboundedReceiver<Frame>,
    cancel: CancellationToken,
) {
    let (mut sink, mut frames) = connection.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            outbound = rx.recv() => {
                let Some(frame) = outbound else { break };
                if let Err(reason) = sink.send(frame).await {
                    log::warn!("[transport] link to {} broken: {}", addr, reason.pp());
                    break
                }
            },
            inbound = frames.next() => match inbound {
                Some(Ok(frame)) => log::trace!("[transport] ignoring {:?} from {}", frame.kind, addr),
                Some(Err(reason)) => {
                    log::warn!("[transport] link to {} broken: {}", addr, reason.pp());
                    break
                },
                None => {
                    log::debug!("[transport] link to {} closed by peer", addr);
                    break
                },
            },
        }
    }
}
