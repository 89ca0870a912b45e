//! UDP broadcast autodiscovery of TellStick gateways.
//!
//! A discovery request is the single byte `D` broadcast to port 30303.
//! Every TellStick on the segment answers with
//! `<product>:<mac>:<activation code>:<firmware>`.
//!
//! Discovery is a capability: builds without the `discovery` feature get
//! [`Discovery::Unavailable`], which fails every request with
//! [`Error::DiscoveryUnavailable`].

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::local::supports_local_api;

/// Port TellStick gateways answer discovery on.
pub const DISCOVERY_PORT: u16 = 30303;

/// Discovery request payload.
pub const DISCOVERY_PAYLOAD: &[u8] = b"D";

/// How long replies are collected by default.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Products this client can talk to.
pub const SUPPORTED_PRODUCTS: [&str; 4] = [
    "TellStickNet",
    "TellstickZnetLite",
    "TellstickZnet",
    "TellstickNetV2",
];

/// Oldest TellStick Net firmware that supports listeners.
pub const MIN_TELLSTICKNET_FIRMWARE: u32 = 17;

/// A gateway that answered discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gateway {
    pub address: IpAddr,
    pub product: String,
    pub mac: String,
    pub code: String,
    pub firmware: String,
}

impl Gateway {
    /// Whether the gateway exposes the local REST API.
    pub fn supports_local_api(&self) -> bool {
        supports_local_api(&self.product)
    }

    /// Address usable as a session host.
    pub fn host(&self) -> String {
        self.address.to_string()
    }
}

/// Parse a discovery reply. Malformed replies and unsupported products or
/// firmware yield `None`.
pub fn parse_reply(address: IpAddr, data: &[u8]) -> Option<Gateway> {
    let text = std::str::from_utf8(data).ok()?;
    let fields: Vec<&str> = text.trim().split(':').collect();
    let [product, mac, code, firmware] = fields.as_slice() else {
        info!("Malformed reply from {}", address);
        return None;
    };

    info!(
        "Found {} device with firmware {} at {}",
        product, firmware, address
    );

    if !SUPPORTED_PRODUCTS.contains(product) {
        info!("Unsupported product {}", product);
        return None;
    }
    if *product == "TellStickNet"
        && firmware
            .parse::<u32>()
            .map_or(true, |v| v < MIN_TELLSTICKNET_FIRMWARE)
    {
        info!("Unsupported firmware version: {}", firmware);
        return None;
    }

    Some(Gateway {
        address,
        product: product.to_string(),
        mac: mac.to_string(),
        code: code.to_string(),
        firmware: firmware.to_string(),
    })
}

/// The discovery capability selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    /// Send the request to `target` (normally the broadcast address) and
    /// wait up to `timeout` for replies.
    Udp { target: SocketAddr, timeout: Duration },
    /// Discovery is not compiled in.
    Unavailable,
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new(DISCOVERY_TIMEOUT)
    }
}

impl Discovery {
    /// UDP broadcast discovery when the `discovery` feature is enabled.
    pub fn new(timeout: Duration) -> Self {
        if cfg!(feature = "discovery") {
            Self::Udp {
                target: broadcast_target(),
                timeout,
            }
        } else {
            Self::Unavailable
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Udp { .. })
    }

    /// All gateways that answer within the timeout, in arrival order.
    pub async fn discover(&self) -> Result<Vec<Gateway>> {
        match self {
            Self::Udp { target, timeout } => discover_at(*target, *timeout, None).await,
            Self::Unavailable => Err(Error::DiscoveryUnavailable),
        }
    }

    /// The first gateway that answers.
    pub async fn discover_first(&self) -> Result<Gateway> {
        let found = match self {
            Self::Udp { target, timeout } => discover_at(*target, *timeout, Some(1)).await?,
            Self::Unavailable => return Err(Error::DiscoveryUnavailable),
        };
        found.into_iter().next().ok_or(Error::NoGatewayFound)
    }
}

fn broadcast_target() -> SocketAddr {
    SocketAddr::from((std::net::Ipv4Addr::BROADCAST, DISCOVERY_PORT))
}

#[cfg(feature = "discovery")]
async fn discover_at(
    target: SocketAddr,
    timeout: Duration,
    limit: Option<usize>,
) -> Result<Vec<Gateway>> {
    use tokio::net::UdpSocket;
    use tokio::time::Instant;

    info!("Discovering TellStick devices");
    let socket = UdpSocket::bind((std::net::Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket.set_broadcast(true)?;
    socket.send_to(DISCOVERY_PAYLOAD, target).await?;

    let deadline = Instant::now() + timeout;
    let mut found = Vec::new();
    let mut buf = [0u8; 1024];

    while limit.is_none_or(|n| found.len() < n) {
        let (len, from) = match tokio::time::timeout_at(deadline, socket.recv_from(&mut buf)).await
        {
            Err(_) => break,
            Ok(received) => received?,
        };
        if let Some(gateway) = parse_reply(from.ip(), &buf[..len]) {
            found.push(gateway);
        }
    }
    Ok(found)
}

#[cfg(not(feature = "discovery"))]
async fn discover_at(
    _target: SocketAddr,
    _timeout: Duration,
    _limit: Option<usize>,
) -> Result<Vec<Gateway>> {
    Err(Error::DiscoveryUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))
    }

    // ==========================================================================
    // Reply parsing
    // ==========================================================================

    #[test]
    fn test_parse_znet_reply() {
        let gateway = parse_reply(addr(), b"TellstickZnet:ACCA54000001:ABCDEFGHIJ:1.1.0").unwrap();
        assert_eq!(gateway.product, "TellstickZnet");
        assert_eq!(gateway.mac, "ACCA54000001");
        assert_eq!(gateway.firmware, "1.1.0");
        assert!(gateway.supports_local_api());
        assert_eq!(gateway.host(), "192.168.1.20");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_reply(addr(), b"TellstickZnet:ACCA54000001").is_none());
        assert!(parse_reply(addr(), b"a:b:c:d:e").is_none());
        assert!(parse_reply(addr(), &[0xff, 0xfe]).is_none());
    }

    #[test]
    fn test_parse_rejects_unsupported_product() {
        assert!(parse_reply(addr(), b"TellStickDuo:ACCA54000001:CODE:20").is_none());
    }

    #[test]
    fn test_parse_checks_tellsticknet_firmware() {
        assert!(parse_reply(addr(), b"TellStickNet:ACCA54000001:CODE:16").is_none());
        assert!(parse_reply(addr(), b"TellStickNet:ACCA54000001:CODE:x").is_none());

        let gateway = parse_reply(addr(), b"TellStickNet:ACCA54000001:CODE:17").unwrap();
        assert!(!gateway.supports_local_api());
    }

    // ==========================================================================
    // Capability
    // ==========================================================================

    #[tokio::test]
    async fn test_unavailable_capability() {
        let discovery = Discovery::Unavailable;
        assert!(!discovery.is_available());
        assert!(matches!(
            discovery.discover().await,
            Err(Error::DiscoveryUnavailable)
        ));
        assert!(matches!(
            discovery.discover_first().await,
            Err(Error::DiscoveryUnavailable)
        ));
    }

    #[cfg(feature = "discovery")]
    #[tokio::test]
    async fn test_discover_collects_replies() {
        use tokio::net::UdpSocket;

        let gateway = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let target = gateway.local_addr().unwrap();

        let responder = tokio::spawn(async move {
            let mut buf = [0u8; 16];
            let (len, from) = gateway.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[..len], DISCOVERY_PAYLOAD);
            gateway
                .send_to(b"TellStickDuo:000000000000:X:1", from)
                .await
                .unwrap();
            gateway
                .send_to(b"TellstickNetV2:ACCA54000002:CODE:1.3.0", from)
                .await
                .unwrap();
        });

        let found = discover_at(target, Duration::from_millis(500), None)
            .await
            .unwrap();
        responder.await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product, "TellstickNetV2");
        assert_eq!(found[0].address, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[cfg(feature = "discovery")]
    #[tokio::test]
    async fn test_discover_nothing_found() {
        use tokio::net::UdpSocket;

        // Bound but silent.
        let silent = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let found = discover_at(
            silent.local_addr().unwrap(),
            Duration::from_millis(100),
            Some(1),
        )
        .await
        .unwrap();
        assert!(found.is_empty());
    }

    #[cfg(feature = "discovery")]
    #[tokio::test]
    async fn test_discover_first_without_reply() {
        use tokio::net::UdpSocket;

        let silent = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let discovery = Discovery::Udp {
            target: silent.local_addr().unwrap(),
            timeout: Duration::from_millis(100),
        };

        assert!(matches!(
            discovery.discover_first().await,
            Err(Error::NoGatewayFound)
        ));
        assert!(discovery.discover().await.unwrap().is_empty());
    }

    #[test]
    fn test_new_broadcasts() {
        match Discovery::new(Duration::from_secs(1)) {
            Discovery::Udp { target, timeout } => {
                assert_eq!(target.port(), DISCOVERY_PORT);
                assert_eq!(timeout, Duration::from_secs(1));
            }
            Discovery::Unavailable => assert!(!cfg!(feature = "discovery")),
        }
    }
}
