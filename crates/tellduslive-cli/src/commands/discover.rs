//! Discover command implementation.

use std::io::Write;

use anyhow::{Context, Result};
use tellduslive_core::Discovery;

use crate::format::{FormatOptions, format_gateway_table};
use crate::style;
use crate::util::write_output;

pub async fn cmd_discover<W: Write>(
    discovery: &Discovery,
    opts: &FormatOptions,
    out: &mut W,
) -> Result<()> {
    let gateways = discovery
        .discover()
        .await
        .context("Autodiscovery failed")?;

    if gateways.is_empty() {
        eprintln!("{}", style::format_info("No TellStick gateways found.", opts.no_color));
        return Ok(());
    }
    write_output(out, &format_gateway_table(&gateways, opts))
}
