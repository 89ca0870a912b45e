//! Session event channel.
//!
//! Events pushed by a TellStick gateway are delivered to a single consumer
//! over an mpsc channel, so handlers never run concurrently with each other
//! or with the consumer's own rendering.

use std::net::SocketAddr;

use tokio::sync::mpsc;

use crate::codec::Packet;

/// Events emitted while a session is listening for pushed updates.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SessionEvent {
    /// The gateway pushed a packet (a sensor reading or a device change).
    Packet { from: SocketAddr, packet: Packet },
    /// The listener stopped and no further events will arrive.
    ListenerStopped { reason: String },
}

impl SessionEvent {
    /// Short description for logging.
    pub fn summary(&self) -> String {
        match self {
            SessionEvent::Packet { from, packet } => {
                format!("{} from {}", packet.command, from)
            }
            SessionEvent::ListenerStopped { reason } => format!("listener stopped: {}", reason),
        }
    }
}

/// Sender for session events.
pub type EventSender = mpsc::Sender<SessionEvent>;

/// Receiver for session events.
pub type EventReceiver = mpsc::Receiver<SessionEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(capacity)
}

/// Create a default event channel with capacity 100.
pub fn default_event_channel() -> (EventSender, EventReceiver) {
    event_channel(100)
}
