//! Utility functions for CLI operations.

use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result, bail};
use dialoguer::{Confirm, theme::ColorfulTheme};

/// Write `content` to `out` and flush.
pub fn write_output<W: Write>(out: &mut W, content: &str) -> Result<()> {
    out.write_all(content.as_bytes())
        .context("Failed to write output")?;
    out.flush()?;
    Ok(())
}

/// Ask the user to confirm before continuing, e.g. after granting access
/// in a browser.
///
/// Fails without prompting when stdin is not a terminal, and when the user
/// declines.
pub fn confirm_continue(prompt: &str) -> Result<()> {
    confirm_with(io::stdin().is_terminal(), || {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(true)
            .interact()
            .context("Failed to read confirmation")
    })
}

fn confirm_with(interactive: bool, ask: impl FnOnce() -> Result<bool>) -> Result<()> {
    if !interactive {
        bail!("Cannot prompt for confirmation in non-interactive mode. Run this command in a terminal.");
    }
    if !ask()? {
        bail!("Cancelled");
    }
    Ok(())
}
