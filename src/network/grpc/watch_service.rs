use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use prost::Message;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Request;
use tonic::Response;
use tonic::Status;
use tonic::Streaming;
use tracing::debug;

use crate::proto::global_server::Global;
use crate::proto::OpItem;
use crate::proto::WatchReq;
use crate::proxystore::ProxyStore;
use crate::watch::WatchSession;
use crate::WatchConfig;

/// `localnetv1.Global` implementation: one [`WatchSession`] per call.
pub struct GlobalWatchService<V> {
    store: Arc<ProxyStore<V>>,
    config: WatchConfig,
    shutdown_signal: watch::Receiver<()>,
    next_session_id: AtomicU64,
}

impl<V> GlobalWatchService<V> {
    pub fn new(
        store: Arc<ProxyStore<V>>,
        config: WatchConfig,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        Self {
            store,
            config,
            shutdown_signal,
            next_session_id: AtomicU64::new(1),
        }
    }
}

#[tonic::async_trait]
impl<V> Global for GlobalWatchService<V>
where
    V: Message + 'static,
{
    type WatchStream = ReceiverStream<std::result::Result<OpItem, Status>>;

    /// Opens a watch session. Each [`WatchReq`] on the request stream
    /// triggers one round; the session ends with the request stream, the
    /// response stream, or server shutdown.
    #[tracing::instrument(skip_all)]
    async fn watch(
        &self,
        request: Request<Streaming<WatchReq>>,
    ) -> std::result::Result<Response<Self::WatchStream>, Status> {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let requests = request.into_inner();

        let (resp_tx, resp_rx) = mpsc::channel(self.config.response_buffer_size);
        let status_tx = resp_tx.clone();
        let session = WatchSession::new(session_id, self.store.clone(), resp_tx);
        let shutdown = self.shutdown_signal.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                result = session.run(requests, shutdown) => result,
                _ = status_tx.closed() => {
                    debug!(session = session_id, "subscriber dropped response stream");
                    Ok(())
                }
            };
            if let Err(status) = result {
                let _ = status_tx.send(Err(status)).await;
            }
        });

        Ok(Response::new(ReceiverStream::new(resp_rx)))
    }
}
