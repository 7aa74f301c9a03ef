#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;
use tonic::async_trait;
use tonic::Status;

use crate::proto::OpItem;
use crate::WatchError;

/// Sender half of a subscriber's response stream.
pub type StreamResponseSender = mpsc::Sender<std::result::Result<OpItem, Status>>;

/// Outbound side of a watch session.
///
/// Each call delivers exactly one fully encoded operation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OpSink: Send + Sync + 'static {
    async fn send(
        &self,
        op: OpItem,
    ) -> std::result::Result<(), WatchError>;
}

#[async_trait]
impl OpSink for StreamResponseSender {
    async fn send(
        &self,
        op: OpItem,
    ) -> std::result::Result<(), WatchError> {
        mpsc::Sender::send(self, Ok(op))
            .await
            .map_err(|_| WatchError::SendFailed("subscriber stream closed".to_string()))
    }
}
