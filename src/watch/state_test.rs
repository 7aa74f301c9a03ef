use std::sync::Arc;

use prost::Message;
use tokio::sync::mpsc;

use super::*;
use crate::diffstore::ResetMode;
use crate::proto::op_item::Op;
use crate::proto::OpItem;
use crate::proto::Set;
use crate::proxystore::ProxyStore;
use crate::test_utils::enable_logger;
use crate::test_utils::info;
use crate::test_utils::sync_all;
use crate::test_utils::RecordingSink;
use crate::test_utils::TestInfo;
use crate::WatchError;

async fn observe_and_close<S: OpSink>(
    state: &mut WatchState<S, TestInfo>,
    store: &ProxyStore<TestInfo>,
) {
    store.view(0, |tx| state.observe(tx)).await;
    state.reset(ResetMode::TrackDeletes);
}

#[tokio::test]
async fn test_two_partition_round_emits_one_set_and_sync() {
    enable_logger();
    let store = ProxyStore::new();
    store.update(|tx| {
        tx.set(Set::GlobalNodeInfos, "n1", info("n1", 10250)).unwrap();
    });
    sync_all(&store);

    let sink = RecordingSink::new();
    let mut state = WatchState::new(
        sink.clone(),
        &[Set::GlobalNodeInfos, Set::GlobalServiceInfos],
    );
    observe_and_close(&mut state, &store).await;

    assert_eq!(state.send_updates(Set::GlobalNodeInfos).await, 1);
    assert_eq!(state.send_updates(Set::GlobalServiceInfos).await, 0);
    assert!(state.send_sync().await);

    let ops = sink.take();
    assert_eq!(ops.len(), 2);
    match &ops[0].op {
        Some(Op::Set(value)) => {
            let r = value.r#ref.as_ref().unwrap();
            assert_eq!(r.set(), Set::GlobalNodeInfos);
            assert_eq!(r.path, "n1");
            let decoded = TestInfo::decode(value.bytes.clone()).unwrap();
            assert_eq!(decoded, info("n1", 10250));
        }
        other => panic!("expected a set op, got {other:?}"),
    }
    assert!(ops[1].is_sync());
    assert!(state.err().is_none());
}

#[tokio::test]
async fn test_unchanged_round_sends_nothing() {
    let store = ProxyStore::new();
    store.update(|tx| {
        tx.set(Set::GlobalServiceInfos, "ns/a", info("a", 80)).unwrap();
    });

    let sink = RecordingSink::new();
    let mut state = WatchState::new(sink.clone(), &Set::ALL);
    observe_and_close(&mut state, &store).await;
    assert_eq!(state.send_updates(Set::GlobalServiceInfos).await, 1);
    sink.take();

    observe_and_close(&mut state, &store).await;
    for set in Set::ALL {
        assert_eq!(state.send_updates(set).await, 0);
        assert_eq!(state.send_deletes(set).await, 0);
    }
    assert!(sink.ops().is_empty());
}

#[tokio::test]
async fn test_removed_entry_is_sent_as_delete() {
    let store = ProxyStore::new();
    store.update(|tx| {
        tx.set(Set::GlobalEndpointInfos, "ns/a/ep1", info("ep1", 8080))
            .unwrap();
        tx.set(Set::GlobalEndpointInfos, "ns/a/ep2", info("ep2", 8080))
            .unwrap();
    });

    let sink = RecordingSink::new();
    let mut state = WatchState::new(sink.clone(), &[Set::GlobalEndpointInfos]);
    observe_and_close(&mut state, &store).await;
    assert_eq!(state.send_updates(Set::GlobalEndpointInfos).await, 2);
    sink.take();

    store.update(|tx| {
        tx.delete(Set::GlobalEndpointInfos, "ns/a/ep1");
    });
    observe_and_close(&mut state, &store).await;

    assert_eq!(state.send_updates(Set::GlobalEndpointInfos).await, 0);
    assert_eq!(state.send_deletes(Set::GlobalEndpointInfos).await, 1);
    assert_eq!(
        sink.take_summary(),
        vec![(
            "delete",
            Some((Set::GlobalEndpointInfos, "ns/a/ep1".to_string()))
        )]
    );
}

#[tokio::test]
async fn test_send_error_is_sticky() {
    let store = ProxyStore::new();
    store.update(|tx| {
        tx.set(Set::GlobalNodeInfos, "n1", info("n1", 1)).unwrap();
        tx.set(Set::GlobalNodeInfos, "n2", info("n2", 2)).unwrap();
    });

    let mut sink = MockOpSink::new();
    sink.expect_send()
        .times(1)
        .returning(|_| Err(WatchError::SendFailed("connection reset".to_string())));

    let mut state = WatchState::new(sink, &Set::ALL);
    observe_and_close(&mut state, &store).await;

    assert_eq!(state.send_updates(Set::GlobalNodeInfos).await, 0);
    assert!(state.is_failed());
    assert_eq!(state.send_deletes(Set::GlobalNodeInfos).await, 0);
    assert!(!state.send_sync().await);

    match state.into_err() {
        Some(WatchError::SendFailed(msg)) => assert_eq!(msg, "connection reset"),
        other => panic!("expected send failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_error_wins() {
    let store = ProxyStore::new();
    store.update(|tx| {
        tx.set(Set::GlobalNodeInfos, "n1", info("n1", 1)).unwrap();
        tx.set(Set::GlobalNodeInfos, "n2", info("n2", 2)).unwrap();
    });

    let sink = RecordingSink::failing_after(1);
    let mut state = WatchState::new(sink.clone(), &Set::ALL);
    observe_and_close(&mut state, &store).await;

    assert_eq!(state.send_updates(Set::GlobalNodeInfos).await, 1);
    assert!(state.is_failed());
    assert_eq!(sink.ops().len(), 1);
    assert_eq!(
        state.err().map(|e| e.to_string()),
        Some("send error: recording sink closed".to_string())
    );
}

#[test]
#[should_panic(expected = "not watching set")]
fn test_store_for_unknown_set_panics() {
    let mut state: WatchState<RecordingSink, TestInfo> =
        WatchState::new(RecordingSink::new(), &[Set::GlobalNodeInfos]);
    state.store_for(Set::GlobalEndpointInfos);
}

#[test]
fn test_store_for_returns_engine_of_set() {
    let mut state: WatchState<RecordingSink, TestInfo> =
        WatchState::new(RecordingSink::new(), &[Set::GlobalServiceInfos]);

    state
        .store_for(Set::GlobalServiceInfos)
        .set(b"ns/a", 7, Arc::new(info("a", 80)));
    state.reset(ResetMode::TrackDeletes);

    assert_eq!(state.store_for(Set::GlobalServiceInfos).updated_len(), 1);
    assert_eq!(state.sets(), &[Set::GlobalServiceInfos]);
}

#[tokio::test]
async fn test_stream_sender_reports_closed_receiver() {
    let (tx, rx) = mpsc::channel::<Result<OpItem, tonic::Status>>(1);
    drop(rx);

    let result = OpSink::send(&tx, OpItem::sync()).await;
    assert!(matches!(result, Err(WatchError::SendFailed(_))));
}

#[tokio::test]
async fn test_stream_sender_delivers_ok_items() {
    let (tx, mut rx) = mpsc::channel::<Result<OpItem, tonic::Status>>(1);

    OpSink::send(&tx, OpItem::sync()).await.unwrap();
    let item = rx.recv().await.unwrap().unwrap();
    assert!(item.is_sync());
}
