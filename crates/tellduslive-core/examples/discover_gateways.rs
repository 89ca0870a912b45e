//! Example: Discovering TellStick Gateways
//!
//! Broadcasts a discovery request on the local network and prints every
//! gateway that answers within five seconds.
//!
//! Run with: `cargo run --example discover_gateways`

use tellduslive_core::Discovery;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let gateways = Discovery::default().discover().await?;
    if gateways.is_empty() {
        println!("No gateways found.");
        return Ok(());
    }

    for gateway in gateways {
        println!(
            "{:<16} {:<18} {} (firmware {}, local API: {})",
            gateway.address,
            gateway.product,
            gateway.mac,
            gateway.firmware,
            if gateway.supports_local_api() { "yes" } else { "no" }
        );
    }
    Ok(())
}
