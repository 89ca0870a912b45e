//! Command-line client for Telldus Live and TellStick gateways.
//!
//! Lists devices and sensors, sends commands to devices, and authorizes the
//! client against either Telldus Live (OAuth 1.0) or the local API of a
//! TellStick ZNet gateway.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `list` | Show devices and sensors, once or with `-r` continuously |
//! | `<ID> on\|off\|up\|down\|stop\|dim <LEVEL>` | Send a command to a device |
//! | `discover` | Find TellStick gateways on the local network |
//! | `authorize` | Obtain and store an access token |
//!
//! # Credentials
//!
//! Credentials are read from `.tellduslive.conf`, next to the executable or
//! in the home directory. Local access needs `host` and `token`; Telldus
//! Live needs `public_key`, `private_key`, `token` and `token_secret`.
//!
//! # Configuration
//!
//! Preferences live in `<config dir>/tellduslive/config.toml`:
//!
//! - `delay`: seconds between polls in `list -r`
//! - `no_color`: disable colored output
//! - `application`: application name sent to the server
//! - `discovery_timeout`: seconds to wait for discovery replies
//!
//! # Environment Variables
//!
//! - `TELLDUS_HOST`: gateway host (overridden by `-H`)
//! - `NO_COLOR`: disable colored output when set
//! - `RUST_LOG`: log filter when no `-v` is given
//!
//! # Examples
//!
//! ```bash
//! tellduslive -H 192.168.1.20 authorize
//! tellduslive list -r -d 10
//! tellduslive 101 dim 128
//! tellduslive -D -L controllers.yml list -r
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod format;
pub mod logging;
pub mod style;
pub mod util;

// Re-export core dependencies for convenience
pub use tellduslive_core;
pub use tellduslive_types;
