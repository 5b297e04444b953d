use myrmidon_actors::{BufferStats, Message, Payload};

#[macro_use]
mod common;

const TEN_MB: usize = 10 * 1024 * 1024;

myrmidon_test!(heavy_buffer_is_handed_over_without_copying, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let (pid, mut rx) = common::forwarder(&system);

    let lease = system.allocate_buffer(TEN_MB).expect("Failed to allocate");
    lease.write_at(0, b"HEAVY").expect("Failed to write");
    let region_ptr = lease.view_mut().expect("writable").as_ptr();

    assert!(system.send_buffer(pid, lease.id()));
    assert!(lease.is_sealed());
    assert!(lease.view_mut().is_none());

    let received = tokio::time::timeout(common::EXIT_TIMEOUT, rx.recv())
        .await
        .expect("timeout")
        .expect("channel closed");
    let Some(Payload::Buffer(buffer)) = received.into_data() else {
        panic!("expected a buffer payload")
    };
    assert_eq!(buffer.len(), TEN_MB);
    assert_eq!(&buffer[..5], b"HEAVY");
    assert_eq!(buffer.as_ptr(), region_ptr);
    assert_eq!(buffer.id(), lease.id());

    drop(lease);
    assert_eq!(system.buffers().stats().live_regions, 1);
    drop(buffer);
    assert_eq!(system.buffers().stats(), BufferStats::default());
});

myrmidon_test!(buffer_to_nobody_stays_with_the_producer, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let (pid, _rx) = common::forwarder(&system);
    system.stop(pid);
    system.join(pid).await;

    let lease = system.allocate_buffer(1024).expect("Failed to allocate");
    assert!(!system.send_buffer(pid, lease.id()));
    assert!(!lease.is_sealed());
    lease.write_at(0, b"still mine").expect("Failed to write");
});

myrmidon_test!(buffer_can_be_sent_once, async {
    let system = common::system(common::SMALL_SYSTEM_SIZE);
    let observer = system.spawn_observed(10).expect("Failed to spawn");

    let lease = system.allocate_buffer(64).expect("Failed to allocate");
    assert!(system.send_buffer(observer, lease.id()));
    assert!(!system.send_buffer(observer, lease.id()));

    let messages = system.take_messages(observer).await.expect("recv error");
    assert_eq!(messages.len(), 1);
    let shared = messages[0].as_data().and_then(Payload::as_buffer).expect("buffer");
    assert_eq!(shared.ref_count(), 1);

    let copy: Message = messages[0].clone();
    assert_eq!(shared.ref_count(), 2);
    drop(copy);
});
