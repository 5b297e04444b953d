use std::time::{Duration, Instant};

use myrmidon_actors::{Message, Pid, RecvError};

#[macro_use]
mod common;

myrmidon_test!(selective_recv_picks_the_match, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let pid = system.spawn_observed(10).expect("Failed to spawn");

    assert!(system.send(pid, "noise"));
    assert!(system.send(pid, "HEAVY:1"));
    assert!(system.send(pid, "more noise"));

    let found = system
        .selective_recv(pid, |m: &Message| m.starts_with(b"HEAVY"), Some(common::SMALL_TIMEOUT))
        .await
        .expect("recv error")
        .expect("no match");
    assert_eq!(&found.as_data().expect("data")[..], b"HEAVY:1");

    let rest = system.take_messages(pid).await.expect("recv error");
    let rest = rest.iter().map(|m| m.as_data().expect("data").to_vec()).collect::<Vec<_>>();
    assert_eq!(rest, [b"noise".to_vec(), b"more noise".to_vec()]);
});

myrmidon_test!(selective_recv_timeout, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let pid = system.spawn_observed(10).expect("Failed to spawn");
    assert!(system.send(pid, "noise"));

    let t0 = Instant::now();
    let found = system
        .selective_recv(pid, |m: &Message| m.starts_with(b"X"), Some(Duration::from_millis(100)))
        .await
        .expect("recv error");
    let elapsed = t0.elapsed();

    assert!(found.is_none());
    assert!(elapsed >= Duration::from_millis(100), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(200), "{:?}", elapsed);
    assert_eq!(system.mailbox_size(pid), Some(1));
});

myrmidon_test!(selective_recv_waits_for_arrival, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let pid = system.spawn_observed(10).expect("Failed to spawn");

    let sender = {
        let system = system.to_owned();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            system.send(pid, "late")
        })
    };

    let found = system
        .selective_recv(pid, |_: &Message| true, Some(common::EXIT_TIMEOUT))
        .await
        .expect("recv error");
    assert!(found.is_some());
    assert!(sender.await.expect("join error"));
});

myrmidon_test!(selective_recv_errors, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let (pushed, _rx) = common::forwarder(&system);

    let not_observed = system.selective_recv(pushed, |_: &Message| true, None).await;
    assert!(matches!(not_observed, Err(RecvError::NotObserved)));

    let nobody = Pid::new(system.node_id(), pushed.slot() + 1);
    let no_actor = system.selective_recv(nobody, |_: &Message| true, None).await;
    assert!(matches!(no_actor, Err(RecvError::NoActor)));
    assert!(matches!(system.take_messages(nobody).await, Err(RecvError::NoActor)));
});

myrmidon_test!(observed_actor_stops_at_once, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let pid = system.spawn_observed(10).expect("Failed to spawn");
    assert!(system.send(pid, "unread"));

    system.stop(pid);
    let exit = tokio::time::timeout(common::SMALL_TIMEOUT, system.join(pid)).await;
    assert!(exit.expect("did not stop").is_shutdown());
});
