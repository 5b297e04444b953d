#[macro_use]
mod common;

myrmidon_test!(resolve_remote_name, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);
    let (pid, _rx) = common::forwarder(node_a.system());

    assert_eq!(node_b.resolve_remote(&addr, "svc").await, None);

    node_a.registry().register("svc", pid);
    assert_eq!(node_b.resolve_remote(&addr, "svc").await, Some(pid));

    node_a.registry().unregister("svc");
    assert_eq!(node_b.resolve_remote(&addr, "svc").await, None);
});

myrmidon_test!(resolve_then_send, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);
    let (pid, mut rx) = common::forwarder(node_a.system());
    node_a.registry().register("echo", pid);

    let resolved = node_b.resolve_remote(&addr, "echo").await.expect("not resolved");
    assert!(node_b.send_remote(&addr, resolved, &b"ping"[..]).await);
    assert_eq!(&common::recv(&mut rx).await.as_data().expect("data")[..], b"ping");
});

myrmidon_test!(resolve_unreachable, async {
    let node_b = common::node(2);
    let addr = common::dead_addr().await;
    assert_eq!(node_b.resolve_remote(&addr, "svc").await, None);
});

myrmidon_test!(node_up_check, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);

    assert!(node_b.is_node_up(&addr).await);
    assert!(!node_b.is_node_up(&common::dead_addr().await).await);
    assert!(!node_b.is_node_up("not an address").await);

    node_a.shutdown();
    // the listener stops accepting once cancelled
    let mut down = false;
    for _ in 0..50 {
        if !node_b.is_node_up(&addr).await {
            down = true;
            break
        }
        tokio::time::sleep(common::SMALL_TIMEOUT / 10).await;
    }
    assert!(down);
});
