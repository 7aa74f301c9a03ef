use std::net::SocketAddr;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the gRPC server binds to
    /// Default: 127.0.0.1:12090
    #[serde(default = "default_listen_address")]
    pub listen_address: SocketAddr,

    #[serde(default = "default_tcp_nodelay")]
    pub tcp_nodelay: bool,

    #[serde(default = "default_tcp_keepalive")]
    pub tcp_keepalive_in_secs: u64,

    /// Interval of HTTP/2 PING frames on idle watch streams
    #[serde(default = "default_h2_keep_alive_interval")]
    pub http2_keep_alive_interval_in_secs: u64,

    /// How long to wait for a PING ack before closing the connection
    #[serde(default = "default_h2_keep_alive_timeout")]
    pub http2_keep_alive_timeout_in_secs: u64,

    /// Largest inbound message accepted, in bytes
    #[serde(default = "default_max_decoding_message_size")]
    pub max_decoding_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            tcp_nodelay: default_tcp_nodelay(),
            tcp_keepalive_in_secs: default_tcp_keepalive(),
            http2_keep_alive_interval_in_secs: default_h2_keep_alive_interval(),
            http2_keep_alive_timeout_in_secs: default_h2_keep_alive_timeout(),
            max_decoding_message_size: default_max_decoding_message_size(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.http2_keep_alive_timeout_in_secs == 0 {
            return Err(Error::InvalidConfig(
                "http2_keep_alive_timeout_in_secs must be greater than 0".into(),
            ));
        }

        if self.http2_keep_alive_timeout_in_secs >= self.http2_keep_alive_interval_in_secs {
            return Err(Error::InvalidConfig(format!(
                "http2_keep_alive_timeout_in_secs ({}) must be less than http2_keep_alive_interval_in_secs ({})",
                self.http2_keep_alive_timeout_in_secs, self.http2_keep_alive_interval_in_secs
            )));
        }

        if self.max_decoding_message_size == 0 {
            return Err(Error::InvalidConfig(
                "max_decoding_message_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 12090))
}
fn default_tcp_nodelay() -> bool {
    true
}
fn default_tcp_keepalive() -> u64 {
    3600
}
fn default_h2_keep_alive_interval() -> u64 {
    300
}
fn default_h2_keep_alive_timeout() -> u64 {
    20
}
fn default_max_decoding_message_size() -> usize {
    4 * 1024 * 1024
}
