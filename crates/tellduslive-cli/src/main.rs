use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tellduslive_cli::cli::{Cli, Commands, DeviceCommand};
use tellduslive_cli::commands::{ListArgs, cmd_authorize, cmd_device, cmd_discover, cmd_list};
use tellduslive_cli::config::{Config, resolve_delay, resolve_discovery_timeout};
use tellduslive_cli::credentials::{CredentialArgs, open_session, resolve_credentials};
use tellduslive_cli::format::FormatOptions;
use tellduslive_cli::logging::{LogConfig, LogStyle};
use tellduslive_cli::style;
use tellduslive_cli::util::confirm_continue;
use tellduslive_core::{Credentials, Discovery};

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    let config = Config::load();

    let no_color = cli.no_color || config.no_color;
    LogConfig::new(cli.verbose, LogStyle::detect(no_color)).install()?;
    let opts = FormatOptions::new(!style::should_color(no_color)).with_no_header(cli.no_header);
    let discovery = Discovery::new(resolve_discovery_timeout(None, &config));

    let credential_args = CredentialArgs {
        host: cli.host.as_deref(),
        local_config: cli.local_config.as_deref(),
        autodiscover: cli.autodiscover,
        listen: false,
        application: Some(config.application()),
    };

    match &cli.command {
        Commands::Discover { timeout } => {
            let discovery = Discovery::new(resolve_discovery_timeout(*timeout, &config));
            cmd_discover(&discovery, &opts, &mut io::stdout()).await?;
        }
        Commands::Authorize => {
            let credentials =
                resolve_credentials(Credentials::read_default(), &credential_args, &discovery)
                    .await?;
            let application = credentials
                .application
                .clone()
                .unwrap_or_else(|| config.application().to_string());
            let path = tellduslive_core::credentials::default_path()
                .context("Could not determine the home directory")?;
            cmd_authorize(credentials, &application, &path, opts.no_color, |url| {
                println!("Visit the following URL and grant access:\n\n    {}\n", url);
                confirm_continue("Access granted?")
            })
            .await?;
        }
        Commands::List { repeat, delay } => {
            let args = CredentialArgs {
                listen: *repeat,
                ..credential_args
            };
            let credentials =
                resolve_credentials(Credentials::read_default(), &args, &discovery).await?;
            let session = open_session(&credentials).await?;
            let list_args = ListArgs {
                repeat: *repeat,
                delay: resolve_delay(*delay, &config),
            };
            cmd_list(&session, list_args, &opts, &mut io::stdout(), async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;
        }
        Commands::Device(args) => {
            let command = DeviceCommand::try_parse_from(args).unwrap_or_else(|e| e.exit());
            let credentials =
                resolve_credentials(Credentials::read_default(), &credential_args, &discovery)
                    .await?;
            let session = open_session(&credentials).await?;
            cmd_device(&session, &command).await?;
        }
    }

    Ok(())
}
