//! Start command implementation.

use anyhow::{bail, Context, Result};
use std::io::{IsTerminal, Write};
use std::path::Path;
use std::time::Duration;

use crate::blocklist;
use crate::compiler::compile;
use crate::config::Config;
use crate::error::GuardError;
use crate::guard::HostsFileGuard;
use crate::session::{EndReason, GuardEvent, RevertOutcome, SessionEnd, SessionHandle};
use crate::signal::shutdown_signal;
use crate::utils::{format_countdown, format_duration_label, parse_duration};

/// Run the start command
pub async fn run(duration: Option<&str>, list: Option<&Path>, config: &Config) -> Result<()> {
    let duration = parse_duration(duration.unwrap_or(&config.default_duration))?;
    if duration.is_zero() {
        bail!("Block duration must be greater than zero");
    }

    let list_path = list.unwrap_or(&config.blocklist_file);
    let raw = blocklist::load_or_create(list_path)?;
    let entries = compile(&raw);
    if entries.is_empty() {
        bail!("Blocklist {:?} lists no websites", list_path);
    }

    let guard = HostsFileGuard::from_config(config);
    let handle = match guard.apply(&entries, duration) {
        Ok(handle) => handle,
        Err(e @ GuardError::AlreadyActive { .. }) => {
            return Err(e)
                .context("Run 'restraint status' to see it or 'restraint resume' to wait on it");
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "[OK] Blocking {} hosts for {} (until {})",
        entries.len(),
        describe(duration),
        handle.expires_at().format("%H:%M:%S UTC")
    );
    println!("     Press Ctrl-C to lift the block early");

    watch(handle).await
}

/// Follow a running session in the foreground until it ends or the user
/// interrupts it.
pub(crate) async fn watch(mut handle: SessionHandle) -> Result<()> {
    let live = std::io::stdout().is_terminal();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let interrupted = loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(GuardEvent::Tick { remaining }) if live => {
                    print!("\r     {} remaining ", format_countdown(remaining));
                    let _ = std::io::stdout().flush();
                }
                Some(GuardEvent::Started { .. }) | Some(GuardEvent::Tick { .. }) => {}
                Some(GuardEvent::Ended { .. }) | Some(GuardEvent::RevertFailed { .. }) | None => {
                    break false;
                }
            },
            _ = &mut shutdown => break true,
        }
    };
    if live {
        println!();
    }

    let end = if interrupted {
        handle.cancel().await
    } else {
        handle.wait().await
    };
    let end = end.context("Failed to lift the block. Run 'restraint stop' to retry")?;
    report(end);
    Ok(())
}

fn describe(duration: Duration) -> String {
    match duration.as_secs() {
        1 => "1 second".to_string(),
        n if n < 60 => format!("{} seconds", n),
        _ => format_duration_label(duration),
    }
}

fn report(end: SessionEnd) {
    match (end.reason, end.outcome) {
        (_, RevertOutcome::Superseded) => {
            println!("A newer block replaced this one and stays in place");
        }
        (_, RevertOutcome::NotActive) => {
            println!("[OK] Block was already lifted");
        }
        (reason, RevertOutcome::Removed { truncated }) => {
            match reason {
                EndReason::Expired => println!("[OK] Time is up, websites unblocked"),
                EndReason::Cancelled => println!("[OK] Block lifted early"),
            }
            if truncated {
                println!(
                    "[WARN] The end marker was missing; everything after the start marker was removed"
                );
            }
        }
    }
}
