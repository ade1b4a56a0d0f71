//! Status command implementation.

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::config::Config;
use crate::guard::{BlockStatus, HostsFileGuard};
use crate::utils::format_countdown;

/// Run the status command
pub async fn run(json: bool, config: &Config) -> Result<()> {
    let guard = HostsFileGuard::from_config(config);
    let status = guard.inspect()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&to_json(&status))?);
        return Ok(());
    }

    println!();
    match status {
        BlockStatus::Idle => {
            println!("Block: INACTIVE");
            println!("Hosts file: {:?}", guard.hosts_path());
        }
        BlockStatus::Active {
            hosts,
            expires_at,
            truncated,
        } => {
            println!("Block: ACTIVE");
            println!("Hosts file: {:?}", guard.hosts_path());
            println!("Blocked hosts: {}", hosts.len());
            match expires_at {
                Some(at) => {
                    let remaining = (at - Utc::now()).to_std().unwrap_or_default();
                    println!(
                        "Expires: {} ({} remaining)",
                        at.to_rfc3339_opts(SecondsFormat::Secs, true),
                        format_countdown(remaining)
                    );
                    if remaining.is_zero() {
                        println!();
                        println!("The timer has run out. Run 'restraint resume' to clear it.");
                    }
                }
                None => println!("Expires: unknown"),
            }
            if truncated {
                println!("[WARN] End marker is missing");
            }
        }
    }
    println!();

    Ok(())
}

fn to_json(status: &BlockStatus) -> serde_json::Value {
    match status {
        BlockStatus::Idle => json!({ "active": false }),
        BlockStatus::Active {
            hosts,
            expires_at,
            truncated,
        } => {
            let remaining = expires_at
                .map(|at| (at - Utc::now()).to_std().unwrap_or_default().as_secs());
            json!({
                "active": true,
                "hosts": hosts,
                "expires_at": expires_at.map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
                "remaining_secs": remaining,
                "truncated": truncated,
            })
        }
    }
}
