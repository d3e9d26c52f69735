//! Download the attendance log through the session manager
//!
//! ```text
//! DEVICE_IP=192.168.1.201 RUST_LOG=zkattend=debug cargo run --example fetch_attendance
//! ```

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use zkattend::{DeviceManager, Endpoint};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let endpoint = endpoint_from_env()?;
    let mut manager = DeviceManager::new(endpoint.clone());

    let records = manager.get_attendance().await;
    manager.disconnect().await;

    let records = records.with_context(|| format!("fetching attendance from {}", endpoint))?;

    println!("{} records from {}", records.len(), endpoint);
    for record in &records {
        println!("{}", record);
    }

    Ok(())
}

fn endpoint_from_env() -> anyhow::Result<Endpoint> {
    let ip = std::env::var("DEVICE_IP").unwrap_or_else(|_| "192.168.1.201".to_string());

    match std::env::var("DEVICE_PORT") {
        Ok(port) => {
            let port = port.parse().context("DEVICE_PORT must be a port number")?;
            Ok(Endpoint::new(ip, port))
        }
        Err(_) => Ok(Endpoint::with_default_port(ip)),
    }
}
