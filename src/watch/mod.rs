//! Watch coordinator
//!
//! Drives one set of [`DiffStore`]s per subscriber against the shared
//! [`ProxyStore`] and turns each round's diff into protocol operations.
//!
//! # Round lifecycle
//!
//! ```text
//!  WaitingTrigger ──trigger──> Snapshotting ──not synced──> WaitingTrigger
//!        ▲                          │
//!        │                       synced
//!        │                          ▼
//!    Resetting <──── Sync ──── Emitting (Set..., Delete..., Sync)
//!
//!  any send failure / stream end ──> Closed
//! ```
//!
//! Rounds are pull based: the server only starts a round when the subscriber
//! sends a [`WatchReq`](crate::proto::WatchReq). Operations of one round are
//! always followed by exactly one sync marker, and a round whose snapshot is
//! not fully synced emits nothing and leaves every engine untouched.
//!
//! [`DiffStore`]: crate::diffstore::DiffStore
//! [`ProxyStore`]: crate::proxystore::ProxyStore

mod session;
mod sink;
mod state;

pub use session::*;
pub use sink::*;
pub use state::*;

#[cfg(test)]
mod state_test;
