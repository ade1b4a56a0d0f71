//! List command implementation.

use anyhow::Result;

use crate::blocklist;
use crate::cli::ListAction;
use crate::config::Config;

/// Run the list command
pub async fn run(action: ListAction, config: &Config) -> Result<()> {
    let path = &config.blocklist_file;
    match action {
        ListAction::Show => {
            let text = blocklist::load_or_create(path)?;
            let mut count = 0;
            for entry in blocklist::listed(&text) {
                println!("{}", entry);
                count += 1;
            }
            if count == 0 {
                println!("Blocklist {:?} is empty", path);
            }
        }
        ListAction::Add { domain } => {
            if blocklist::add(path, &domain)? {
                println!("[OK] Added {} to the blocklist", domain);
            } else {
                println!("{} is already in the blocklist", domain);
            }
        }
        ListAction::Remove { domain } => {
            if blocklist::remove(path, &domain)? {
                println!("[OK] Removed {} from the blocklist", domain);
            } else {
                println!("{} was not in the blocklist", domain);
            }
        }
    }
    Ok(())
}
