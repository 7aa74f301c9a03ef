//! Revision-stamped store of proxy state.
//!
//! Writers apply batches through [`ProxyStore::update`]; every batch that
//! changes something advances the store revision by one. Readers take a
//! consistent snapshot with [`ProxyStore::view`], which first waits for the
//! store to reach a minimum revision.
//!
//! Values are hashed when written: each entry owns a [`BufferLeaf`] holding
//! its protobuf encoding, and the entry hash is the leaf's content hash.
//! Rewriting an entry with an identical encoding does not advance the
//! revision.
//!
//! [`BufferLeaf`]: crate::diffstore::BufferLeaf

mod store;
mod tx;

pub use store::*;
pub use tx::*;
