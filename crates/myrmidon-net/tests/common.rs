use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use myrmidon_actors::{Message, Pid, System, SystemConfig};
use myrmidon_net::{Transport, TransportConfig};
use myrmidon_reg::NameRegistry;
use tokio::sync::mpsc;

#[allow(unused)]
pub const SMALL_SYSTEM_SIZE: usize = 10;

#[allow(unused)]
pub const SMALL_TIMEOUT: Duration = Duration::from_millis(300);
#[allow(unused)]
pub const EXIT_TIMEOUT: Duration = Duration::from_secs(5);

#[allow(unused)]
macro_rules! myrmidon_test {
    ($test_name: ident, $code: expr) => {
        #[cfg(test)]
        mod $test_name {
            #[allow(unused_imports)]
            use super::*;

            fn test() -> impl std::future::Future {
                $code
            }

            #[test]
            fn mt() {
                $crate::common::run(true, test());
            }
            #[test]
            fn st() {
                $crate::common::run(false, test());
            }
        }
    };
}

#[allow(unused)]
pub fn transport_config() -> TransportConfig {
    TransportConfig {
        connect_timeout: Duration::from_secs(1),
        request_timeout: Duration::from_secs(1),
        heartbeat_interval: Duration::from_millis(50),
        heartbeat_timeout: Duration::from_millis(300),
        ..Default::default()
    }
}

/// A system with its registry and transport, not listening yet.
#[allow(unused)]
pub fn node(node_id: u32) -> Transport {
    let exit_handler = Arc::new(myrmidon_actors::exit_handlers::LogExitHandler);
    let system = System::new(SystemConfig {
        node_id: Some(node_id),
        max_actors: SMALL_SYSTEM_SIZE,
        exit_handler,
        ..Default::default()
    });
    Transport::new(system, NameRegistry::new(), transport_config())
}

/// A node listening on an ephemeral port of the loopback interface.
#[allow(unused)]
pub async fn listening_node(node_id: u32) -> (Transport, String) {
    let transport = node(node_id);
    let addr = transport.listen("127.0.0.1:0").await.expect("Failed to listen");
    (transport, addr.to_string())
}

/// An address nothing listens on.
#[allow(unused)]
pub async fn dead_addr() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = listener.local_addr().expect("local_addr");
    drop(listener);
    addr.to_string()
}

#[allow(unused)]
pub fn forwarder(system: &System) -> (Pid, mpsc::UnboundedReceiver<Message>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pid = system
        .spawn(
            move |message: Message| {
                let tx = tx.to_owned();
                async move {
                    let _ = tx.send(message);
                }
            },
            10,
        )
        .expect("Failed to spawn forwarder");
    (pid, rx)
}

#[allow(unused)]
pub async fn recv(rx: &mut mpsc::UnboundedReceiver<Message>) -> Message {
    tokio::time::timeout(EXIT_TIMEOUT, rx.recv())
        .await
        .expect("Timed out waiting for a message")
        .expect("Channel closed")
}

#[allow(unused)]
pub fn run<F>(multi_thread: bool, f: F) -> F::Output
where
    F: Future,
{
    let _ = dotenv::dotenv();
    let _ = pretty_env_logger::try_init_timed();

    if multi_thread {
        tokio::runtime::Builder::new_multi_thread()
    } else {
        tokio::runtime::Builder::new_current_thread()
    }
    .enable_all()
    .build()
    .expect("Failed to create runtime")
    .block_on(f)
}
