//! Example: Listing Devices and Sensors
//!
//! This example reads the stored credentials (`~/.tellduslive.conf`),
//! connects to Telldus Live or a local TellStick, and prints every device
//! and sensor with its current state.
//!
//! Run with: `cargo run --example list_devices`

use tellduslive_core::{Credentials, Session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let credentials = Credentials::read_default();
    let session = Session::connect(&credentials).await?;

    println!("Fetching devices...");
    session.update().await?;

    for device in session.devices().await {
        println!("{}", device);
        if let Some(battery) = &device.battery {
            println!("    battery: {}", battery);
        }
    }

    Ok(())
}
