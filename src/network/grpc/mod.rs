//! gRPC server hosting the `localnetv1.Global` watch service.
//!
//! The server is started with [`start_rpc_server`] and runs until the
//! shutdown signal fires. Alongside the watch service it registers the
//! standard gRPC health service.

mod watch_service;

pub use watch_service::*;


//-------------------------------------------------------------------------------
// Start RPC Server
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use prost::Message;
use rcgen::generate_simple_self_signed;
use rcgen::CertifiedKey;
use tokio::sync::watch;
use tonic::codec::CompressionEncoding;
use tonic::transport::Identity;
use tonic::transport::ServerTlsConfig;
use tonic_health::server::health_reporter;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::metrics;
use crate::proto::global_server::GlobalServer;
use crate::proxystore::ProxyStore;
use crate::Result;
use crate::Settings;
use crate::SystemError;
use crate::TlsConfig;

/// Serves watch subscribers from `store` until `shutdown_signal` fires.
///
/// Every accepted `Watch` call gets its own session; sessions stop when
/// their subscriber goes away or on shutdown.
///
/// `settings` is validated first; an invalid value is returned as
/// [`Error::InvalidConfig`](crate::Error::InvalidConfig) before anything binds.
pub async fn start_rpc_server<V>(
    store: Arc<ProxyStore<V>>,
    settings: Settings,
    mut shutdown_signal: watch::Receiver<()>,
) -> Result<()>
where
    V: Message + 'static,
{
    let settings = settings.validate()?;

    let (mut health_reporter, health_service) = health_reporter();
    health_reporter
        .set_serving::<GlobalServer<GlobalWatchService<V>>>()
        .await;

    let server_config = &settings.server;
    let listen_address = server_config.listen_address;

    let mut server_builder = tonic::transport::Server::builder()
        .tcp_keepalive(Some(Duration::from_secs(server_config.tcp_keepalive_in_secs)))
        .http2_keepalive_interval(Some(Duration::from_secs(
            server_config.http2_keep_alive_interval_in_secs,
        )))
        .http2_keepalive_timeout(Some(Duration::from_secs(
            server_config.http2_keep_alive_timeout_in_secs,
        )))
        .tcp_nodelay(server_config.tcp_nodelay);

    if settings.tls.enable_tls {
        if settings.tls.generate_self_signed_certificates {
            if Path::new(&settings.tls.server_certificate_path).exists() {
                warn!("Server certificate already exists, remove the file if you want to generate new certificates. Skipping self signed certificates generation.");
            } else {
                info!("Generating self signed certificates");
                generate_self_signed_certificates(&settings.tls)?;
            }
        }
        let cert = read_pem(&settings.tls.server_certificate_path)?;
        let key = read_pem(&settings.tls.server_private_key_path)?;
        let tls = ServerTlsConfig::new().identity(Identity::from_pem(cert, key));
        server_builder = server_builder
            .tls_config(tls)
            .map_err(SystemError::Transport)?;
        info!("gRPC TLS enabled");
    }

    if settings.monitoring.prometheus_enabled {
        tokio::spawn(metrics::start_server(
            settings.monitoring.prometheus_port,
            shutdown_signal.clone(),
        ));
    }

    let service = GlobalWatchService::new(store, settings.watch.clone(), shutdown_signal.clone());

    info!("watch server listening on {}", listen_address);
    if let Err(e) = server_builder
        .add_service(health_service)
        .add_service(
            GlobalServer::new(service)
                .accept_compressed(CompressionEncoding::Gzip)
                .send_compressed(CompressionEncoding::Gzip)
                .max_decoding_message_size(server_config.max_decoding_message_size),
        )
        .serve_with_shutdown(
            listen_address,
            shutdown_signal.changed().map(|_s| {
                warn!("Stopping RPC server. {}", listen_address);
            }),
        )
        .await
    {
        error!("error to start watch rpc server :{:?}.", e);
        return Err(SystemError::ServerUnavailable.into());
    }
    debug!("rpc service finished!");
    Ok(())
}

fn read_pem(path: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| {
        SystemError::PathError {
            path: path.into(),
            source,
        }
        .into()
    })
}

fn generate_self_signed_certificates(config: &TlsConfig) -> Result<()> {
    let subject_alt_names = vec!["localhost".to_string()];
    let CertifiedKey { cert, key_pair } =
        generate_simple_self_signed(subject_alt_names).map_err(SystemError::Certificate)?;

    write_pem(&config.server_certificate_path, cert.pem())?;
    write_pem(&config.server_private_key_path, key_pair.serialize_pem())
}

fn write_pem(
    path: &str,
    contents: String,
) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent).map_err(|source| SystemError::PathError {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| {
        SystemError::PathError {
            path: path.into(),
            source,
        }
        .into()
    })
}
