//! Prometheus collectors for watch sessions and the `/metrics` endpoint.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

lazy_static! {
    pub static ref WATCH_OPS_SENT: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_ops_sent", "Operations delivered to subscribers"),
        &["op", "set"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_ROUNDS: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_rounds", "Watch rounds by outcome"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_SESSIONS_ACTIVE: IntGauge =
        IntGauge::new("watch_sessions_active", "Currently open watch sessions")
            .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

pub(crate) fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(WATCH_OPS_SENT.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_ROUNDS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_SESSIONS_ACTIVE.clone()))
        .expect("collector can be registered");
}

/// Text exposition of every registered collector.
pub fn gather_text() -> String {
    REGISTER.call_once(|| register_custom_metrics(&REGISTRY));

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    }
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}

/// Serves `/metrics` on `port` until `shutdown_signal` fires.
pub async fn start_server(
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) {
    REGISTER.call_once(|| register_custom_metrics(&REGISTRY));

    let metrics_route = warp::path!("metrics").and_then(metrics_handler);

    info!("metrics server listening on port {}", port);
    let (_, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            let _ = shutdown_signal.changed().await;
        });
    server.await;
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    Ok(gather_text())
}

#[cfg(test)]
mod metrics_test;
