use std::time::Duration;

use myrmidon_actors::{ExitReason, Message, Pid, System, SystemMessage};

#[macro_use]
mod common;

async fn next_down(system: &System, watcher: Pid) -> Option<(Pid, ExitReason)> {
    let message = system
        .selective_recv(watcher, |m: &Message| m.is_system(), Some(common::EXIT_TIMEOUT))
        .await
        .expect("recv error")?;
    match message.as_system() {
        Some(SystemMessage::Down { pid, reason }) => Some((*pid, reason.to_owned())),
        _ => None,
    }
}

myrmidon_test!(remote_actor_stops, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);
    let (pid, _rx) = common::forwarder(node_a.system());
    let watcher = node_b.system().spawn_observed(10).expect("spawn");

    assert!(node_b.monitor_remote(watcher, &addr, pid).await);
    tokio::time::sleep(common::SMALL_TIMEOUT).await;
    node_a.system().stop(pid);

    assert_eq!(next_down(node_b.system(), watcher).await, Some((pid, ExitReason::Shutdown)));
});

myrmidon_test!(remote_actor_unknown, async {
    let (_node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);
    let watcher = node_b.system().spawn_observed(10).expect("spawn");
    let ghost = Pid::new(1, 7);

    assert!(node_b.monitor_remote(watcher, &addr, ghost).await);
    assert_eq!(next_down(node_b.system(), watcher).await, Some((ghost, ExitReason::NoActor)));
});

myrmidon_test!(node_unreachable, async {
    let node_b = common::node(2);
    let watcher = node_b.system().spawn_observed(10).expect("spawn");
    let pid = Pid::new(1, 0);

    assert!(!node_b.monitor_remote(watcher, &common::dead_addr().await, pid).await);
    assert_eq!(
        next_down(node_b.system(), watcher).await,
        Some((pid, ExitReason::ConnectionLost))
    );
});

myrmidon_test!(watcher_not_alive, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);
    let (pid, _rx) = common::forwarder(node_a.system());
    let watcher = node_b.system().spawn_observed(10).expect("spawn");
    node_b.system().stop(watcher);
    node_b.system().join(watcher).await;

    assert!(!node_b.monitor_remote(watcher, &addr, pid).await);
    assert!(!node_b.monitor_remote(Pid::new(2, 9), &addr, pid).await);
    assert!(node_a.system().is_alive(pid));
});

myrmidon_test!(node_goes_away, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);
    let (pid, _rx) = common::forwarder(node_a.system());
    let watcher = node_b.system().spawn_observed(10).expect("spawn");

    assert!(node_b.monitor_remote(watcher, &addr, pid).await);
    node_a.shutdown();

    assert_eq!(
        next_down(node_b.system(), watcher).await,
        Some((pid, ExitReason::ConnectionLost))
    );
});

myrmidon_test!(silent_node, async {
    // accepts the connection, never answers the heartbeats
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr").to_string();
    let _silent = tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.expect("accept");
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    let node_b = common::node(2);
    let started = tokio::time::Instant::now();
    let exit_reason = node_b.watch_remote(&addr, Pid::new(1, 0)).await;

    assert_eq!(exit_reason, ExitReason::ConnectionLost);
    assert!(started.elapsed() >= common::transport_config().heartbeat_timeout);
});

myrmidon_test!(watch_remote_reason, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);
    let (pid, _rx) = common::forwarder(node_a.system());

    let watching = {
        let node_b = node_b.to_owned();
        let addr = addr.to_owned();
        tokio::spawn(async move { node_b.watch_remote(&addr, pid).await })
    };
    tokio::time::sleep(common::SMALL_TIMEOUT).await;
    node_a.system().exit(pid, ExitReason::custom_text("boom"));

    let exit_reason = tokio::time::timeout(common::EXIT_TIMEOUT, watching)
        .await
        .expect("timeout")
        .expect("join error");
    assert_eq!(exit_reason, ExitReason::custom_text("boom"));
});

myrmidon_test!(subscription_dropped_with_watcher, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);
    let (pid, _rx) = common::forwarder(node_a.system());
    let watcher = node_b.system().spawn_observed(10).expect("spawn");

    assert!(node_b.monitor_remote(watcher, &addr, pid).await);
    node_b.system().stop(watcher);
    node_b.system().join(watcher).await;

    node_a.system().stop(pid);
    node_a.system().join(pid).await;
    assert!(!node_b.system().is_alive(watcher));
});
