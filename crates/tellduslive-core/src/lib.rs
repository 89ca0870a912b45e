//! Client library for Telldus Live and local TellStick gateways.
//!
//! This crate talks to the Telldus Live JSON API (OAuth 1.0a signed) and to
//! the REST API of TellStick ZNet / Net v2 gateways on the local network
//! (bearer token), keeps a snapshot of devices and sensors, and sends
//! commands.
//!
//! # Features
//!
//! - **Sessions**: one [`Session`] per connection, over either transport
//! - **Authorization**: OAuth and local token flows producing [`Credentials`]
//! - **Discovery**: find gateways with a UDP broadcast (`discovery` feature)
//! - **Push listener**: receive TellStick Net packets as [`SessionEvent`]s
//! - **Testing**: [`MockTransport`] with canned responses
//!
//! # Quick Start
//!
//! ```no_run
//! use tellduslive_core::{Credentials, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::read_default();
//!     let session = Session::connect(&credentials).await?;
//!     session.update().await?;
//!
//!     for device in session.devices().await {
//!         println!("{}", device);
//!     }
//!
//!     session.turn_on("123456").await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod credentials;
pub mod discovery;
pub mod error;
pub mod events;
pub mod listener;
pub mod live;
pub mod local;
pub mod mock;
pub mod oauth;
pub mod session;
pub mod transport;
pub mod wire;

// Re-export the data model
pub use tellduslive_types::types;
pub use tellduslive_types::{
    BatteryStatus, Device, DeviceKind, Method, Methods, Parameter, ParseError, SensorItem,
};

pub use codec::{Packet, decode_packet, encode_packet};
pub use credentials::{Credentials, ListenConfig, TransportKind};
pub use discovery::{Discovery, Gateway};
pub use error::{CodecError, Error, Result};
pub use events::{EventReceiver, EventSender, SessionEvent};
pub use listener::Listener;
pub use live::{LiveAuthorizer, LiveTransport};
pub use local::{LocalAuthorizer, LocalTransport};
pub use mock::MockTransport;
pub use oauth::OAuthSigner;
pub use session::Session;
pub use transport::{AccessToken, Authorizer, Transport};
