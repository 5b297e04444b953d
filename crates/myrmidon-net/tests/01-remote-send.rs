use myrmidon_actors::Pid;

#[macro_use]
mod common;

myrmidon_test!(hello_from_node_b, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);

    let (pid, mut rx) = common::forwarder(node_a.system());
    assert_eq!(pid.node(), 1);

    assert!(node_b.send_remote(&addr, pid, &b"Hello from Node B!"[..]).await);

    let message = common::recv(&mut rx).await;
    assert_eq!(&message.as_data().expect("data")[..], b"Hello from Node B!");

    node_b.shutdown();
    node_a.shutdown();
});

myrmidon_test!(per_connection_order, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);
    let (pid, mut rx) = common::forwarder(node_a.system());

    for i in 0..100u32 {
        assert!(node_b.send_remote(&addr, pid, i.to_be_bytes().to_vec()).await);
    }
    for i in 0..100u32 {
        let message = common::recv(&mut rx).await;
        assert_eq!(&message.as_data().expect("data")[..], &i.to_be_bytes());
    }
});

myrmidon_test!(unreachable_node, async {
    let node_b = common::node(2);
    let addr = common::dead_addr().await;

    assert!(!node_b.send_remote(&addr, Pid::new(1, 0), &b"lost"[..]).await);
});

myrmidon_test!(dead_remote_actor_is_fire_and_forget, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);
    let (pid, _rx) = common::forwarder(node_a.system());

    node_a.system().stop(pid);
    node_a.system().join(pid).await;

    assert!(node_b.send_remote(&addr, pid, &b"nobody home"[..]).await);
    assert!(!node_a.system().is_alive(pid));
});

myrmidon_test!(one_link_per_address, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);
    let (pid, mut rx) = common::forwarder(node_a.system());

    assert!(node_b.send_remote(&addr, pid, &b"first"[..]).await);
    assert_eq!(&common::recv(&mut rx).await.as_data().expect("data")[..], b"first");

    node_a.shutdown();
    let (node_c, addr_c) = common::listening_node(3).await;
    let (pid_c, mut rx_c) = common::forwarder(node_c.system());

    assert!(node_b.send_remote(&addr_c, pid_c, &b"second"[..]).await);
    assert_eq!(&common::recv(&mut rx_c).await.as_data().expect("data")[..], b"second");
});

myrmidon_test!(shut_down_transport_sends_nothing, async {
    let (node_a, addr) = common::listening_node(1).await;
    let node_b = common::node(2);
    let (pid, _rx) = common::forwarder(node_a.system());

    node_b.shutdown();
    assert!(!node_b.send_remote(&addr, pid, &b"late"[..]).await);
    assert!(node_b.listen("127.0.0.1:0").await.is_err());
});
