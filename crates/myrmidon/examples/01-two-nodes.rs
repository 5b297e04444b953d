//! Two nodes in one process: node B resolves an actor of node A by name, sends it a message and
//! monitors it until it terminates.
//!
//! `RUST_LOG=myrmidon_net=debug cargo run --example 01-two-nodes`

use std::time::Duration;

use myrmidon::actors::{Mailbox, Message, SystemMessage};
use myrmidon::{Runtime, RuntimeConfig};

fn main() {
    let _ = dotenv::dotenv();
    let _ = pretty_env_logger::try_init_timed();

    let node_a = Runtime::new(RuntimeConfig::default()).expect("Failed to start node A");
    let node_b = Runtime::new(RuntimeConfig::default()).expect("Failed to start node B");

    let addr = node_a.listen_blocking("127.0.0.1:0").expect("Failed to listen").to_string();

    let greeter = node_a
        .spawn_with_mailbox(
            |mut mailbox: Mailbox| async move {
                let message = mailbox.recv().await?;
                let text = String::from_utf8_lossy(message.as_data()?).into_owned();
                log::info!("[{}] received {:?}", mailbox.pid(), text);
                Some(())
            },
            10,
        )
        .expect("Failed to spawn the greeter");
    node_a.register("greeter", greeter);

    let greeter = node_b.resolve_remote_blocking(&addr, "greeter").expect("greeter not found");
    let watcher = node_b.spawn_observed(10).expect("Failed to spawn the watcher");
    assert!(node_b.monitor_remote_blocking(watcher, &addr, greeter));

    node_b.send_remote_blocking(&addr, greeter, &b"Hello from Node B!"[..]);

    let down = node_b
        .selective_recv_blocking(watcher, |m: &Message| m.is_system(), Some(Duration::from_secs(5)))
        .expect("recv error");
    match down.as_ref().and_then(Message::as_system) {
        Some(SystemMessage::Down { pid, reason }) => eprintln!("{} is down: {}", pid, reason),
        _ => eprintln!("no Down within 5s"),
    }

    node_b.shutdown_blocking(Duration::from_secs(1));
    node_a.shutdown_blocking(Duration::from_secs(1));
}
