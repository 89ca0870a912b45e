//! Device command implementation.
//!
//! Sends a single command to one device. There is no confirmation polling
//! and no retry; a command the server rejects is an error.

use anyhow::{Context, Result};
use tellduslive_core::{Error, Session};
use tracing::info;

use crate::cli::{DeviceAction, DeviceCommand};

pub async fn cmd_device(session: &Session, command: &DeviceCommand) -> Result<()> {
    let id = command.id.as_str();
    let device = session
        .device(id)
        .await
        .ok_or_else(|| Error::device_not_found(id))?;

    info!(
        "Sending {} to device {} ({})",
        command.action.name(),
        id,
        device.display_name()
    );

    let sent = match command.action {
        DeviceAction::On => session.turn_on(id).await,
        DeviceAction::Off => session.turn_off(id).await,
        DeviceAction::Up => session.up(id).await,
        DeviceAction::Down => session.down(id).await,
        DeviceAction::Stop => session.stop(id).await,
        DeviceAction::Dim { level } => session.dim(id, level).await,
    };
    sent.with_context(|| format!("Failed to send '{}' to device {}", command.action.name(), id))
}
