//! Stop command implementation.

use anyhow::Result;

use crate::config::Config;
use crate::guard::HostsFileGuard;
use crate::session::RevertOutcome;

/// Run the stop command
pub async fn run(config: &Config) -> Result<()> {
    let guard = HostsFileGuard::from_config(config);

    match guard.revert()? {
        RevertOutcome::Removed { truncated } => {
            println!("[OK] Block removed from {:?}", guard.hosts_path());
            if truncated {
                println!("     End marker was missing; removed through end of file");
            }
        }
        // A plain revert never compares sessions
        RevertOutcome::NotActive | RevertOutcome::Superseded => {
            println!("No block is active in {:?}", guard.hosts_path());
        }
    }

    Ok(())
}
