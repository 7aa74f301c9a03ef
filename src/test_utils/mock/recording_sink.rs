use std::sync::Arc;

use parking_lot::Mutex;
use tonic::async_trait;

use crate::proto::OpItem;
use crate::proto::Set;
use crate::watch::OpSink;
use crate::WatchError;

/// [`OpSink`] that keeps every delivered op, optionally failing once a
/// number of ops went through.
#[derive(Clone, Default)]
pub struct RecordingSink {
    ops: Arc<Mutex<Vec<OpItem>>>,
    fail_after: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(limit: usize) -> Self {
        Self {
            ops: Arc::default(),
            fail_after: Some(limit),
        }
    }

    pub fn ops(&self) -> Vec<OpItem> {
        self.ops.lock().clone()
    }

    pub fn take(&self) -> Vec<OpItem> {
        std::mem::take(&mut *self.ops.lock())
    }

    /// `(kind, set, path)` of each delivered op; sync markers have no target.
    pub fn take_summary(&self) -> Vec<(&'static str, Option<(Set, String)>)> {
        self.take()
            .iter()
            .map(|op| {
                (
                    op.kind(),
                    op.target().map(|(set, path)| (set, path.to_string())),
                )
            })
            .collect()
    }
}

#[async_trait]
impl OpSink for RecordingSink {
    async fn send(
        &self,
        op: OpItem,
    ) -> Result<(), WatchError> {
        let mut ops = self.ops.lock();
        if let Some(limit) = self.fail_after {
            if ops.len() >= limit {
                return Err(WatchError::SendFailed("recording sink closed".to_string()));
            }
        }
        ops.push(op);
        Ok(())
    }
}
