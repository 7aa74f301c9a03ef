//! Protocol buffer definitions and generated code for the watch service.
//!
//! The bindings in `src/generated` are produced by [`tonic-build`] from
//! `proto/localnet.proto`; the [`exts`] module adds helpers on top of them.

pub mod localnetv1 {
    include!("../generated/localnetv1.rs");
}

mod exts;

pub use localnetv1::global_client;
pub use localnetv1::global_server;
pub use localnetv1::op_item;
pub use localnetv1::EmptyOp;
pub use localnetv1::OpItem;
pub use localnetv1::Ref;
pub use localnetv1::Set;
pub use localnetv1::Value;
pub use localnetv1::WatchReq;
