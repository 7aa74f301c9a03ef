//! End-to-end watch scenarios against a real gRPC server.

use std::time::Duration;

use localnet_watch::proto::Set;

use crate::commons::endpoint;
use crate::commons::store_contents;
use crate::commons::sync_all;
use crate::commons::Subscriber;
use crate::commons::TestServer;
use crate::enable_logger;

#[tokio::test]
async fn test_subscriber_mirrors_store_across_rounds() {
    enable_logger();
    let server = TestServer::start().await;
    let store = server.store.clone();
    sync_all(&store);

    let mut subscriber = Subscriber::connect(server.addr).await;

    for round in 0u32..8 {
        store.update(|tx| {
            let node = format!("node-{}", round % 3);
            tx.set(Set::GlobalNodeInfos, &node, endpoint("10.0.0.1", round))
                .unwrap();
            tx.set(
                Set::GlobalServiceInfos,
                &format!("default/svc-{}", round % 4),
                endpoint("10.96.0.1", 80),
            )
            .unwrap();
            tx.set(
                Set::GlobalEndpointInfos,
                &format!("default/svc-{}/ep-{}", round % 4, round),
                endpoint("10.244.0.7", 8080 + round),
            )
            .unwrap();
            if round >= 2 {
                tx.delete(
                    Set::GlobalEndpointInfos,
                    &format!("default/svc-{}/ep-{}", (round - 2) % 4, round - 2),
                );
            }
        });

        subscriber.poll_round().await;
        assert_eq!(subscriber.state, store_contents(&store).await, "round {round}");
    }

    subscriber.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_late_subscriber_gets_full_state_early_one_gets_diff() {
    enable_logger();
    let server = TestServer::start().await;
    let store = server.store.clone();
    store.update(|tx| {
        tx.set(Set::GlobalNodeInfos, "node-a", endpoint("10.0.0.1", 0))
            .unwrap();
        tx.set(Set::GlobalServiceInfos, "default/web", endpoint("10.96.0.10", 80))
            .unwrap();
    });
    sync_all(&store);

    let mut early = Subscriber::connect(server.addr).await;
    assert_eq!(early.poll_round().await, 2);

    store.update(|tx| {
        tx.set(Set::GlobalNodeInfos, "node-b", endpoint("10.0.0.2", 0))
            .unwrap();
    });

    let mut late = Subscriber::connect(server.addr).await;
    assert_eq!(late.poll_round().await, 3);
    assert_eq!(early.poll_round().await, 1);

    let expected = store_contents(&store).await;
    assert_eq!(early.state, expected);
    assert_eq!(late.state, expected);

    early.close().await;
    late.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_nothing_is_sent_until_every_set_is_synced() {
    enable_logger();
    let server = TestServer::start().await;
    let store = server.store.clone();
    store.update(|tx| {
        tx.set(Set::GlobalNodeInfos, "node-a", endpoint("10.0.0.1", 0))
            .unwrap();
        tx.set_sync(Set::GlobalNodeInfos, true);
        tx.set_sync(Set::GlobalServiceInfos, true);
    });

    let mut subscriber = Subscriber::connect(server.addr).await;
    subscriber.request().await;
    subscriber.expect_quiet(Duration::from_millis(200)).await;

    store.update(|tx| tx.set_sync(Set::GlobalEndpointInfos, true));
    assert_eq!(subscriber.poll_round().await, 1);
    assert_eq!(subscriber.state, store_contents(&store).await);

    subscriber.close().await;
    server.stop().await;
}
