//! List command implementation.
//!
//! Renders the device table once, or keeps polling. While polling, packets
//! pushed by a TellStick Net gateway trigger an extra update and render.
//! A burst of packets (one per repeated RF transmission) is collapsed into a
//! single refresh. Both paths run on this task, so renders never interleave.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use futures::{FutureExt, Stream, StreamExt};
use tellduslive_core::{Session, SessionEvent};
use tracing::{debug, info, warn};

use crate::format::{FormatOptions, format_device_table};
use crate::util::write_output;

/// How long to wait for the rest of a burst of pushed packets before
/// refreshing.
pub const PUSH_SETTLE: Duration = Duration::from_millis(200);

/// Arguments for the list command.
#[derive(Debug, Clone, Copy)]
pub struct ListArgs {
    pub repeat: bool,
    pub delay: Duration,
}

enum Wake {
    Shutdown,
    Timer,
    Push(Option<SessionEvent>),
}

async fn next_event<S>(events: &mut Option<S>) -> Option<SessionEvent>
where
    S: Stream<Item = SessionEvent> + Unpin,
{
    match events {
        Some(events) => events.next().await,
        None => std::future::pending().await,
    }
}

/// Take every event already queued. Returns the number of packets taken and
/// whether the stream is still open.
fn drain<S>(events: &mut S) -> (usize, bool)
where
    S: Stream<Item = SessionEvent> + Unpin,
{
    let mut packets = 0;
    loop {
        match events.next().now_or_never() {
            None => return (packets, true),
            Some(None) => return (packets, false),
            Some(Some(SessionEvent::ListenerStopped { reason })) => {
                info!("Listener stopped ({}), polling only", reason);
                return (packets, false);
            }
            Some(Some(SessionEvent::Packet { .. })) => packets += 1,
            Some(Some(event)) => debug!("Ignoring {}", event.summary()),
        }
    }
}

async fn render<W: Write>(session: &Session, opts: &FormatOptions, out: &mut W) -> Result<()> {
    let devices = session.devices().await;
    write_output(out, &format_device_table(&devices, opts))
}

/// Render the snapshot; with `repeat`, poll every `delay` until `shutdown`
/// completes.
///
/// The session must already hold a snapshot. Failed updates while polling
/// are logged and the previous snapshot is rendered again.
pub async fn cmd_list<W, F>(
    session: &Session,
    args: ListArgs,
    opts: &FormatOptions,
    out: &mut W,
    shutdown: F,
) -> Result<()>
where
    W: Write,
    F: Future<Output = ()>,
{
    render(session, opts, out).await?;
    if !args.repeat {
        return Ok(());
    }

    let listener = match session.listen().await {
        Ok(listener) => listener,
        Err(e) => {
            warn!("Could not start listener, polling only: {}", e);
            None
        }
    };
    poll_loop(session, args.delay, opts, out, shutdown, listener).await
}

/// Update and render every `delay`, and whenever `events` yields a packet,
/// until `shutdown` completes.
///
/// Without `events`, or once it ends, only the timer drives updates. Nothing
/// is rendered before the first wake-up.
pub async fn poll_loop<W, F, S>(
    session: &Session,
    delay: Duration,
    opts: &FormatOptions,
    out: &mut W,
    shutdown: F,
    mut events: Option<S>,
) -> Result<()>
where
    W: Write,
    F: Future<Output = ()>,
    S: Stream<Item = SessionEvent> + Unpin,
{
    tokio::pin!(shutdown);
    loop {
        let wake = tokio::select! {
            _ = &mut shutdown => Wake::Shutdown,
            _ = tokio::time::sleep(delay) => Wake::Timer,
            event = next_event(&mut events) => Wake::Push(event),
        };

        match wake {
            Wake::Shutdown => {
                debug!("Stopping list loop");
                return Ok(());
            }
            Wake::Timer => {}
            Wake::Push(Some(SessionEvent::ListenerStopped { reason })) => {
                info!("Listener stopped ({}), polling only", reason);
                events = None;
                continue;
            }
            Wake::Push(Some(SessionEvent::Packet { from, packet })) => {
                debug!("Got {} from {}", packet.command, from);
                tokio::select! {
                    _ = &mut shutdown => {
                        debug!("Stopping list loop");
                        return Ok(());
                    }
                    _ = tokio::time::sleep(PUSH_SETTLE) => {}
                }
                let open = match events.as_mut() {
                    Some(stream) => {
                        let (more, open) = drain(stream);
                        if more > 0 {
                            debug!("Coalesced {} more packets", more);
                        }
                        open
                    }
                    None => true,
                };
                if !open {
                    events = None;
                }
            }
            Wake::Push(Some(event)) => {
                debug!("Ignoring {}", event.summary());
                continue;
            }
            Wake::Push(None) => {
                info!("Listener closed, polling only");
                events = None;
                continue;
            }
        }

        if let Err(e) = session.update().await {
            warn!("Could not update status from server: {}", e);
        }
        render(session, opts, out).await?;
    }
}
