use std::time::Duration;

use myrmidon_actors::{
    ExitReason, Handler, Message, Pid, SpawnOpts, SysSpawnError, System, SystemMessage,
};

#[macro_use]
mod common;

async fn next_system_message(system: &System, observer: Pid) -> Option<SystemMessage> {
    system
        .selective_recv(observer, |m: &Message| m.is_system(), Some(common::EXIT_TIMEOUT))
        .await
        .expect("recv error")
        .and_then(|m| m.as_system().cloned())
}

myrmidon_test!(failure_propagates_along_links, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let (left, _left_rx) = common::forwarder(&system);
    let (right, _right_rx) = common::forwarder(&system);

    system.link(left, right);
    system.exit(left, ExitReason::custom_text("crash"));

    assert_eq!(system.join(left).await, ExitReason::custom_text("crash"));
    assert_eq!(
        system.join(right).await,
        ExitReason::linked(left, ExitReason::custom_text("crash"))
    );
});

myrmidon_test!(shutdown_does_not_propagate, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let (left, _left_rx) = common::forwarder(&system);
    let (right, mut right_rx) = common::forwarder(&system);

    system.link(left, right);
    system.stop(left);
    assert_eq!(system.join(left).await, ExitReason::Shutdown);

    assert!(system.send(right, "alive"));
    assert_eq!(common::recv_data(&mut right_rx).await, b"alive");
    assert!(system.is_alive(right));
});

myrmidon_test!(unlinked_actors_are_independent, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let (left, _left_rx) = common::forwarder(&system);
    let (right, _right_rx) = common::forwarder(&system);

    system.link(left, right);
    system.unlink(left, right);
    system.exit(left, ExitReason::Kill);
    assert_eq!(system.join(left).await, ExitReason::Kill);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(system.is_alive(right));
});

myrmidon_test!(trapped_exit_becomes_a_message, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let (left, _left_rx) = common::forwarder(&system);
    let trapper = system
        .spawn_with_opts(Handler::observed(), SpawnOpts::new().with_trap_exit(true))
        .expect("Failed to spawn");

    system.link(left, trapper);
    system.exit(left, ExitReason::Kill);

    assert_eq!(
        next_system_message(&system, trapper).await,
        Some(SystemMessage::Exit { from: left, reason: ExitReason::Kill })
    );
    assert!(system.is_alive(trapper));
});

myrmidon_test!(link_to_nobody, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let (pid, _rx) = common::forwarder(&system);

    system.link(pid, Pid::new(system.node_id(), pid.slot() + 1));
    assert_eq!(
        system.join(pid).await,
        ExitReason::linked(Pid::new(system.node_id(), pid.slot() + 1), ExitReason::NoActor)
    );
});

myrmidon_test!(monitor_delivers_down, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let watcher = system.spawn_observed(10).expect("Failed to spawn");
    let (watched, _rx) = common::forwarder(&system);

    assert!(system.monitor(watcher, watched));
    system.stop(watched);

    assert_eq!(
        next_system_message(&system, watcher).await,
        Some(SystemMessage::Down { pid: watched, reason: ExitReason::Shutdown })
    );
});

myrmidon_test!(monitor_nobody, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let watcher = system.spawn_observed(10).expect("Failed to spawn");
    let nobody = Pid::new(system.node_id(), watcher.slot() + 1);

    assert!(!system.monitor(watcher, nobody));
    assert_eq!(
        next_system_message(&system, watcher).await,
        Some(SystemMessage::Down { pid: nobody, reason: ExitReason::NoActor })
    );
});

myrmidon_test!(demonitor, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let watcher = system.spawn_observed(10).expect("Failed to spawn");
    let (watched, _rx) = common::forwarder(&system);

    assert!(system.monitor(watcher, watched));
    assert!(system.demonitor(watcher, watched));
    system.stop(watched);
    system.join(watched).await;

    let down = system
        .selective_recv(watcher, |m: &Message| m.is_system(), Some(Duration::from_millis(100)))
        .await
        .expect("recv error");
    assert!(down.is_none());
});

myrmidon_test!(children_stop_with_their_parent, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let (parent, _rx) = common::forwarder(&system);
    let child = system.spawn_child(parent, Handler::observed(), 10).expect("Failed to spawn");

    let mut registered = false;
    for _ in 0..100 {
        let info = system.actor_info(parent).await.expect("no info");
        if info.children.contains(&child) {
            registered = true;
            break
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(registered);
    assert_eq!(system.actor_info(child).await.expect("no info").parent, Some(parent));

    system.exit(parent, ExitReason::custom_text("done"));
    assert_eq!(system.join(child).await, ExitReason::Shutdown);
});

myrmidon_test!(child_of_a_stopping_parent, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let (parent, _rx) = common::forwarder(&system);

    let child = system.spawn_child(parent, Handler::observed(), 10).expect("Failed to spawn");
    system.stop(parent);

    let exit = tokio::time::timeout(common::EXIT_TIMEOUT, system.join(child)).await;
    assert!(exit.expect("child outlived its parent").is_shutdown());
    assert_eq!(system.join(parent).await, ExitReason::Shutdown);

    assert!(matches!(
        system.spawn_child(parent, Handler::observed(), 10),
        Err(SysSpawnError::NoParent(p)) if p == parent
    ));
});
