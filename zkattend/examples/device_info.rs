//! Print the device summary over a single transport

use std::time::Duration;

use anyhow::bail;
use tracing_subscriber::EnvFilter;
use zkattend::{Device, DeviceInfo, DeviceInfoField, Endpoint, TransportMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let ip = std::env::var("DEVICE_IP").unwrap_or_else(|_| "192.168.1.201".to_string());
    let mode = match std::env::var("DEVICE_TRANSPORT").as_deref() {
        Ok("tcp") => TransportMode::Tcp,
        _ => TransportMode::Udp,
    };

    let mut device = Device::new(Endpoint::with_default_port(ip), mode).with_timeout(Duration::from_secs(10));

    if !device.connect().await? {
        bail!("{} did not answer over {}", device.endpoint(), mode);
    }
    println!("Connected over {}", mode);

    let mut info = DeviceInfo::unavailable();
    for field in DeviceInfoField::ALL {
        info.set(field, device.get_device_info(field).await?);
    }

    for (key, value) in info.entries() {
        println!("{:>16}: {}", key, value);
    }

    if let Some(clock) = device.get_time().await? {
        println!("{:>16}: {}", "clock", clock);
    }

    device.disconnect().await?;
    Ok(())
}
