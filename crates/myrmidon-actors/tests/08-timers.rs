use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use myrmidon_actors::{Handler, Message, SpawnOpts};

#[macro_use]
mod common;

myrmidon_test!(send_after, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let pid = system.spawn_observed(10).expect("Failed to spawn");

    let t0 = Instant::now();
    system.send_after(pid, Duration::from_millis(50), "tick");

    let tick = system
        .selective_recv(pid, |m: &Message| m.starts_with(b"tick"), Some(common::EXIT_TIMEOUT))
        .await
        .expect("recv error");
    assert!(tick.is_some());
    assert!(t0.elapsed() >= Duration::from_millis(50));
});

myrmidon_test!(cancelled_timer_does_not_fire, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let pid = system.spawn_observed(10).expect("Failed to spawn");

    let timer = system.send_after(pid, Duration::from_millis(50), "tick");
    assert!(system.cancel_timer(timer));
    assert!(!system.cancel_timer(timer));

    let tick = system
        .selective_recv(pid, |_: &Message| true, Some(Duration::from_millis(150)))
        .await
        .expect("recv error");
    assert!(tick.is_none());
});

myrmidon_test!(send_interval, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let pid = system.spawn_observed(10).expect("Failed to spawn");

    let timer = system.send_interval(pid, Duration::from_millis(20), "tick");
    for _ in 0..3 {
        let tick = system
            .selective_recv(pid, |m: &Message| m.starts_with(b"tick"), Some(common::EXIT_TIMEOUT))
            .await
            .expect("recv error");
        assert!(tick.is_some());
    }
    assert!(system.cancel_timer(timer));
});

myrmidon_test!(interval_stops_with_the_recipient, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let pid = system.spawn_observed(10).expect("Failed to spawn");

    let timer = system.send_interval(pid, Duration::from_millis(10), "tick");
    system.stop(pid);
    system.join(pid).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!system.cancel_timer(timer));
});

myrmidon_test!(interval_survives_a_full_mailbox, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let handled = Arc::new(AtomicUsize::new(0));
    let pid = {
        let handled = Arc::clone(&handled);
        system
            .spawn_with_opts(
                Handler::push(move |_message: Message| {
                    let handled = Arc::clone(&handled);
                    async move {
                        tokio::time::sleep(Duration::from_millis(60)).await;
                        handled.fetch_add(1, Ordering::SeqCst);
                    }
                }),
                SpawnOpts::new().with_budget(10).with_mailbox_capacity(1),
            )
            .expect("Failed to spawn")
    };

    let timer = system.send_interval(pid, Duration::from_millis(10), "tick");
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(system.is_alive(pid));
    assert!(handled.load(Ordering::SeqCst) >= 5, "handled {}", handled.load(Ordering::SeqCst));
    assert!(system.cancel_timer(timer));
});
