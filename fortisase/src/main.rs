use fortisase::{logging, FortiSaseProvider};
use std::env;
use std::path::PathBuf;
use tfplug::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    logging::init();

    // certs/ next to the binary
    let exe = env::current_exe()?;
    let certs = exe
        .parent()
        .map(|dir| dir.join("certs"))
        .unwrap_or_else(|| PathBuf::from("certs"));

    let config = ServerConfig::new()
        .with_cert_path(certs.join("localhost.pem"))
        .with_key_path(certs.join("localhost-key.pem"));

    tfplug::serve(FortiSaseProvider::new(), config).await?;

    Ok(())
}
