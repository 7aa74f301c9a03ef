use bytes::Bytes;
use prost::Message;

use crate::proto::op_item::Op;
use crate::proto::OpItem;
use crate::proto::Set;

#[test]
fn test_set_op_carries_ref_and_bytes() {
    let item = OpItem::set_op(Set::GlobalNodeInfos, "node-a", Bytes::from_static(b"\x0a\x01x"));

    assert_eq!(item.target(), Some((Set::GlobalNodeInfos, "node-a")));
    assert_eq!(item.kind(), "set");
    match item.op {
        Some(Op::Set(value)) => assert_eq!(value.bytes, Bytes::from_static(b"\x0a\x01x")),
        other => panic!("unexpected op: {:?}", other),
    }
}

#[test]
fn test_delete_op_target() {
    let item = OpItem::delete_op(Set::GlobalEndpointInfos, "ns/svc/ep");
    assert_eq!(item.target(), Some((Set::GlobalEndpointInfos, "ns/svc/ep")));
    assert!(!item.is_sync());
}

#[test]
fn test_sync_has_no_target() {
    let item = OpItem::sync();
    assert!(item.is_sync());
    assert_eq!(item.target(), None);
    assert_eq!(item.kind(), "sync");
}

#[test]
fn test_sync_survives_wire_encoding() {
    let encoded = OpItem::sync().encode_to_vec();
    let decoded = OpItem::decode(encoded.as_slice()).unwrap();
    assert!(decoded.is_sync());
}
