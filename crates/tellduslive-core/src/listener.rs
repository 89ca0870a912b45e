//! UDP listener for packets pushed by a TellStick Net gateway.
//!
//! The gateway only sends events to clients that registered with a
//! `reglistener` command, and forgets them after a while, so the listener
//! re-registers periodically. Received packets are decoded and delivered as
//! [`SessionEvent`]s through a channel.

use std::net::{Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::{self, Packet};
use crate::error::{Error, Result};
use crate::events::{EventReceiver, EventSender, SessionEvent, default_event_channel};

/// Port the gateway accepts commands on.
pub const COMMAND_PORT: u16 = 42314;

/// How often the listener registers itself with the gateway.
pub const REGISTRATION_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// How long a single receive waits before the registration is rechecked.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolve a gateway host name or address to its command socket.
///
/// A port in `host` (as in `10.0.0.5:80`) is ignored.
pub async fn resolve_gateway(host: &str) -> Result<SocketAddr> {
    let name = match host.parse::<SocketAddr>() {
        Ok(addr) => addr.ip().to_string(),
        Err(_) => host
            .rsplit_once(':')
            .filter(|(_, port)| port.parse::<u16>().is_ok())
            .map_or(host, |(name, _)| name)
            .to_string(),
    };
    tokio::net::lookup_host((name.as_str(), COMMAND_PORT))
        .await?
        .next()
        .ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("could not resolve gateway '{}'", host),
            ))
        })
}

/// A running listener task and the receiving end of its event channel.
///
/// Dropping the listener stops the task.
pub struct Listener {
    receiver: EventReceiver,
    handle: tokio::task::JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl Listener {
    /// Bind a local UDP socket and start listening for packets from `gateway`.
    pub async fn start(gateway: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        Ok(Self::spawn(socket, gateway))
    }

    /// Start listening on an already bound socket.
    pub fn spawn(socket: UdpSocket, gateway: SocketAddr) -> Self {
        let (tx, rx) = default_event_channel();
        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();

        info!("Starting asynchronous listener for {}", gateway);
        let handle = tokio::spawn(run(socket, gateway, tx, task_token));

        Self {
            receiver: rx,
            handle,
            cancel_token,
        }
    }

    /// Wait for the next event. `None` once the listener has stopped.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }

    /// Token that stops the listener task when cancelled. The channel then
    /// yields [`SessionEvent::ListenerStopped`] and ends.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Check if the background task is still running.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl Stream for Listener {
    type Item = SessionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

async fn register(socket: &UdpSocket, gateway: SocketAddr) -> bool {
    info!("Registering self as listener for device at {}", gateway);
    let packet = Packet::new("reglistener").encode();
    match socket.send_to(&packet, gateway).await {
        Ok(_) => true,
        Err(e) => {
            // e.g. network unreachable; retried on the next receive timeout
            debug!("Registration failed: {}", e);
            false
        }
    }
}

async fn run(socket: UdpSocket, gateway: SocketAddr, tx: EventSender, cancel: CancellationToken) {
    let mut last_registration: Option<Instant> = None;
    let mut buf = [0u8; 1024];

    loop {
        if last_registration.is_none_or(|at| at.elapsed() > REGISTRATION_INTERVAL)
            && register(&socket, gateway).await
        {
            last_registration = Some(Instant::now());
        }

        let received = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Listener cancelled, stopping gracefully");
                break;
            }
            received = tokio::time::timeout(RECEIVE_TIMEOUT, socket.recv_from(&mut buf)) => received,
        };

        let (len, from) = match received {
            Err(_) => continue,
            Ok(Err(e)) => {
                warn!("Receive failed: {}", e);
                continue;
            }
            Ok(Ok(r)) => r,
        };

        if from.ip() != gateway.ip() {
            debug!("Ignoring packet from {}", from);
            continue;
        }

        let packet = match codec::decode_packet(&buf[..len]) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(
                    "Failed to decode packet, skipping: {} <{}>",
                    e,
                    String::from_utf8_lossy(&buf[..len])
                );
                continue;
            }
        };

        debug!("Received {} from {}", packet.command, from);
        if tx.send(SessionEvent::Packet { from, packet }).await.is_err() {
            debug!("Event receiver dropped, stopping listener");
            return;
        }
    }

    let _ = tx
        .send(SessionEvent::ListenerStopped {
            reason: "cancelled".into(),
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn gateway_socket() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    #[tokio::test]
    async fn test_registers_and_delivers_packets() {
        let (gateway, gateway_addr) = gateway_socket().await;
        let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let mut listener = Listener::spawn(client, gateway_addr);

        let mut buf = [0u8; 64];
        let (len, client_addr) = gateway.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"B:reglistener");

        let pushed = Packet::new("RawData")
            .with_arg("protocol", "arctech")
            .with_arg("data", 0x2A_i64);
        gateway.send_to(&pushed.encode(), client_addr).await.unwrap();

        match listener.recv().await {
            Some(SessionEvent::Packet { packet, .. }) => assert_eq!(packet, pushed),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_skips_undecodable_packets() {
        let (gateway, gateway_addr) = gateway_socket().await;
        let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let mut listener = Listener::spawn(client, gateway_addr);

        let mut buf = [0u8; 64];
        let (_, client_addr) = gateway.recv_from(&mut buf).await.unwrap();

        gateway.send_to(b"garbage", client_addr).await.unwrap();
        gateway.send_to(b"9:zwaveinfohs", client_addr).await.unwrap();

        match listener.recv().await {
            Some(SessionEvent::Packet { packet, .. }) => assert_eq!(packet.command, "zwaveinfo"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancel_stops_task() {
        let (_gateway, gateway_addr) = gateway_socket().await;
        let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let mut listener = Listener::spawn(client, gateway_addr);

        listener.cancellation_token().cancel();
        assert!(matches!(
            listener.recv().await,
            Some(SessionEvent::ListenerStopped { .. })
        ));
        assert!(listener.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_listener_as_stream() {
        use futures::StreamExt;

        let (gateway, gateway_addr) = gateway_socket().await;
        let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let mut listener = Listener::spawn(client, gateway_addr);

        let mut buf = [0u8; 64];
        let (_, client_addr) = gateway.recv_from(&mut buf).await.unwrap();
        gateway
            .send_to(
                &Packet::new("RawData").with_arg("protocol", "arctech").encode(),
                client_addr,
            )
            .await
            .unwrap();

        let event = listener.next().await.unwrap();
        assert!(matches!(event, SessionEvent::Packet { ref packet, .. } if packet.command == "RawData"));

        listener.cancellation_token().cancel();
        let rest: Vec<SessionEvent> = listener.collect().await;
        assert!(matches!(rest.as_slice(), [SessionEvent::ListenerStopped { .. }]));
    }

    #[tokio::test]
    async fn test_resolve_gateway_ignores_port() {
        let addr = resolve_gateway("127.0.0.1:80").await.unwrap();
        assert_eq!(addr, "127.0.0.1:42314".parse().unwrap());
        let addr = resolve_gateway("127.0.0.1").await.unwrap();
        assert_eq!(addr.port(), COMMAND_PORT);
    }
}
