//! Compile command implementation.

use anyhow::Result;
use std::path::Path;

use crate::blocklist;
use crate::compiler::compile;
use crate::config::Config;
use crate::region::NULL_ADDRESS;

/// Run the compile command
pub async fn run(list: Option<&Path>, config: &Config) -> Result<()> {
    let list_path = list.unwrap_or(&config.blocklist_file);
    let raw = blocklist::load_or_create(list_path)?;
    let entries = compile(&raw);

    for entry in &entries {
        println!("{}\t{}", NULL_ADDRESS, entry);
    }
    eprintln!("{} hosts from {:?}", entries.len(), list_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_compile_creates_default_list() {
        let temp_dir = TempDir::new().unwrap();
        let list = temp_dir.path().join("blocklist");
        run(Some(list.as_path()), &Config::default()).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&list).unwrap(),
            blocklist::DEFAULT_BLOCKLIST
        );
    }
}
