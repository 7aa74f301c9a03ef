//! Change detection and incremental watch streaming for proxy state.
//!
//! - [`diffstore`]: generational diff engines that classify keys as
//!   updated or deleted between rounds.
//! - [`proxystore`]: the revision-stamped in-memory store writers feed.
//! - [`watch`]: per-subscriber sessions that turn store snapshots into
//!   `Set`/`Delete`/`Sync` operations.
//! - [`start_rpc_server`]: the `localnetv1.Global` gRPC endpoint.

mod config;
pub mod diffstore;
mod errors;
pub mod metrics;
mod network;
pub mod proto;
pub mod proxystore;
pub mod watch;

pub use config::*;
pub use errors::*;
pub use network::*;
pub use proxystore::ProxyStore;
pub use watch::OpSink;
pub use watch::WatchSession;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
