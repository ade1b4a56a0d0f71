//! Restore-backup command implementation.

use anyhow::Result;

use crate::config::Config;
use crate::guard::HostsFileGuard;

/// Run the restore-backup command
pub async fn run(config: &Config) -> Result<()> {
    if !config.backup {
        println!("Backups are disabled in the config");
        return Ok(());
    }

    let guard = HostsFileGuard::from_config(config);
    if guard.restore_backup()? {
        println!(
            "[OK] Restored {:?} from {:?}",
            guard.hosts_path(),
            config.backup_path()
        );
    } else {
        println!("No backup found at {:?}", config.backup_path());
    }

    Ok(())
}
