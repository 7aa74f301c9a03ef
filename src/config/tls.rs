use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TlsConfig {
    /// Enables TLS on the gRPC listener
    /// Default: false (disabled)
    #[serde(default = "default_enable_tls")]
    pub enable_tls: bool,

    /// Generates a self-signed certificate for `localhost` on startup when
    /// none exists at `server_certificate_path`
    /// Default: false (requires pre-configured certificates)
    #[serde(default = "default_generate_self_signed")]
    pub generate_self_signed_certificates: bool,

    /// Server certificate chain path in PEM format
    /// Default: "./certs/server.pem"
    #[serde(default = "default_server_cert_path")]
    pub server_certificate_path: String,

    /// Server private key path in PEM format
    /// Default: "./certs/server.key"
    #[serde(default = "default_server_key_path")]
    pub server_private_key_path: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enable_tls: default_enable_tls(),
            generate_self_signed_certificates: default_generate_self_signed(),
            server_certificate_path: default_server_cert_path(),
            server_private_key_path: default_server_key_path(),
        }
    }
}

impl TlsConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.enable_tls || self.generate_self_signed_certificates {
            return Ok(());
        }

        for path in [&self.server_certificate_path, &self.server_private_key_path] {
            if !Path::new(path).exists() {
                return Err(Error::InvalidConfig(format!(
                    "TLS is enabled but {} does not exist",
                    path
                )));
            }
        }
        Ok(())
    }
}

fn default_enable_tls() -> bool {
    false
}
fn default_generate_self_signed() -> bool {
    false
}
fn default_server_cert_path() -> String {
    "./certs/server.pem".into()
}
fn default_server_key_path() -> String {
    "./certs/server.key".into()
}
