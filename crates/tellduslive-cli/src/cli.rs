//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tellduslive")]
#[command(
    author,
    version,
    about = "Command-line client for Telldus Live and TellStick gateways",
    long_about = None,
    after_help = "To send a command to a device: tellduslive <ID> (on|off|up|down|stop|dim <LEVEL>)"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Gateway host, overrides the stored host
    #[arg(short = 'H', long, global = true, env = "TELLDUS_HOST")]
    pub host: Option<String>,

    /// Local YAML config file listing TellStick Net controllers
    #[arg(short = 'L', long = "local-config", global = true, value_name = "CONFIG_YML")]
    pub local_config: Option<PathBuf>,

    /// Find the gateway host with UDP autodiscovery
    #[arg(short = 'D', long, global = true)]
    pub autodiscover: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Omit the header row of tables
    #[arg(long, global = true)]
    pub no_header: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List devices and sensors
    List {
        /// Keep polling for updates until interrupted
        #[arg(short, long)]
        repeat: bool,

        /// Seconds between polls [default: 5]
        #[arg(short, long, value_name = "DELAY", value_parser = clap::value_parser!(u64).range(1..))]
        delay: Option<u64>,
    },

    /// Find TellStick gateways on the local network
    Discover {
        /// Seconds to wait for replies [default: 5]
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Authorize this client and store the credentials
    Authorize,

    /// Send a command to a device: <ID> (on|off|up|down|stop|dim <LEVEL>)
    #[command(external_subcommand)]
    Device(Vec<String>),
}

/// `<ID> <ACTION>`, parsed from the arguments of [`Commands::Device`].
#[derive(Debug, Parser)]
#[command(name = "tellduslive <ID>", no_binary_name = true)]
pub struct DeviceCommand {
    /// Device id
    pub id: String,

    #[command(subcommand)]
    pub action: DeviceAction,
}

/// Commands that can be sent to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum DeviceAction {
    /// Turn the device on
    On,
    /// Turn the device off
    Off,
    /// Raise a blind
    Up,
    /// Lower a blind
    Down,
    /// Stop a moving blind
    Stop,
    /// Dim the device
    Dim {
        /// Dim level, 0-255
        level: u8,
    },
}

impl DeviceAction {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceAction::On => "on",
            DeviceAction::Off => "off",
            DeviceAction::Up => "up",
            DeviceAction::Down => "down",
            DeviceAction::Stop => "stop",
            DeviceAction::Dim { .. } => "dim",
        }
    }
}
