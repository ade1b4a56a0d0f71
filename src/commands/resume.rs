//! Resume command implementation.

use anyhow::Result;

use crate::config::Config;
use crate::guard::HostsFileGuard;

use super::start::watch;

/// Run the resume command
pub async fn run(config: &Config) -> Result<()> {
    let guard = HostsFileGuard::from_config(config);
    let was_active = guard.inspect()?.is_active();

    match guard.resume()? {
        Some(handle) => {
            println!(
                "[OK] Resumed block of {} hosts, lifting at {}",
                handle.hosts(),
                handle.expires_at().format("%H:%M:%S UTC")
            );
            watch(handle).await
        }
        None if was_active => {
            println!("[OK] Expired block removed from {:?}", guard.hosts_path());
            Ok(())
        }
        None => {
            println!("No block to resume");
            Ok(())
        }
    }
}
