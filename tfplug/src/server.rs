//! Server module for running Terraform providers
//!
//! Starts the gRPC service over TLS on a loopback port and prints the
//! go-plugin handshake line Terraform reads from stdout.

use crate::error::{Result, TfplugError};
use crate::grpc::GrpcProviderServer;
use crate::proto::ProviderServer;
use crate::provider::Provider;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Certificate, Identity, Server, ServerTlsConfig};
use tracing::info;

/// Shared with Terraform so a plugin binary refuses to run standalone
pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

/// PEM certificate Terraform presents as a client when it runs with
/// automatic mutual TLS
pub const CLIENT_CERT_ENV: &str = "PLUGIN_CLIENT_CERT";

const PROTOCOL_VERSION: u32 = 6;

/// Server configuration for running a Terraform provider
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to TLS certificate file
    pub cert_path: PathBuf,
    /// Path to TLS key file
    pub key_path: PathBuf,
    /// Maximum message size in bytes
    pub max_message_size: usize,
    /// Skip the magic cookie check; for running the binary by hand
    pub allow_standalone: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from("./certs/localhost.pem"),
            key_path: PathBuf::from("./certs/localhost-key.pem"),
            max_message_size: 256 << 20, // 256MB
            allow_standalone: false,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cert_path(mut self, path: PathBuf) -> Self {
        self.cert_path = path;
        self
    }

    pub fn with_key_path(mut self, path: PathBuf) -> Self {
        self.key_path = path;
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn allow_standalone(mut self) -> Self {
        self.allow_standalone = true;
        self
    }
}

/// Whether the process was started by Terraform
pub fn magic_cookie_matches(value: Option<&str>) -> bool {
    value == Some(MAGIC_COOKIE_VALUE)
}

/// go-plugin handshake: core version, protocol version, network, address,
/// wire protocol
pub fn handshake_line(addr: std::net::SocketAddr) -> String {
    format!("1|{}|tcp|{}|grpc", PROTOCOL_VERSION, addr)
}

/// Main entry point for running a provider
pub async fn serve<P: Provider + 'static>(provider: P, config: ServerConfig) -> Result<()> {
    let cookie = std::env::var(MAGIC_COOKIE_KEY).ok();
    if !config.allow_standalone && !magic_cookie_matches(cookie.as_deref()) {
        return Err(TfplugError::Custom(
            "This binary is a Terraform plugin. It is started by Terraform and is not meant \
             to be run directly"
                .to_string(),
        ));
    }

    // Already installed when the host process set up rustls itself
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cert = tokio::fs::read(&config.cert_path)
        .await
        .map_err(|e| TfplugError::TlsError(format!("Failed to read certificate: {}", e)))?;
    let key = tokio::fs::read(&config.key_path)
        .await
        .map_err(|e| TfplugError::TlsError(format!("Failed to read key: {}", e)))?;

    let mut tls_config = ServerTlsConfig::new().identity(Identity::from_pem(cert, key));
    if let Ok(client_cert) = std::env::var(CLIENT_CERT_ENV) {
        tls_config = tls_config.client_ca_root(Certificate::from_pem(client_cert));
    }

    let service = ProviderServer::new(GrpcProviderServer::new(provider))
        .max_decoding_message_size(config.max_message_size)
        .max_encoding_message_size(config.max_message_size);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    println!("{}", handshake_line(addr));
    info!(%addr, "provider server listening");

    Server::builder()
        .tls_config(tls_config)?
        .add_service(service)
        .serve_with_incoming(TcpListenerStream::new(listener))
        .await?;

    Ok(())
}
