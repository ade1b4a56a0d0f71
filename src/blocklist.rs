//! The user's blocklist file: plain text, one domain per line.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use crate::compiler::HostEntry;

/// Contents written when no blocklist exists yet.
pub const DEFAULT_BLOCKLIST: &str = "# Add one website per line #\nexample.com\n";

/// Read the blocklist, creating it with [`DEFAULT_BLOCKLIST`] if missing.
pub fn load_or_create(path: &Path) -> Result<String> {
    if !path.exists() {
        save(path, DEFAULT_BLOCKLIST)?;
        info!("Created blocklist at {:?}", path);
        return Ok(DEFAULT_BLOCKLIST.to_string());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read blocklist: {:?}", path))
}

/// Write the blocklist atomically.
pub fn save(path: &Path, text: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create blocklist directory: {:?}", parent))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .context("Failed to create temporary file for blocklist")?;
    temp_file.write_all(text.as_bytes())?;
    temp_file.as_file().sync_all()?;
    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist blocklist: {:?}", path))?;
    Ok(())
}

/// Add a domain to the blocklist. Returns `false` if it was already listed.
pub fn add(path: &Path, domain: &str) -> Result<bool> {
    let entry = HostEntry::parse(domain)
        .ok_or_else(|| anyhow::anyhow!("Invalid domain: {:?}", domain))?;

    let mut text = load_or_create(path)?;
    if listed(&text).any(|e| e == entry) {
        return Ok(false);
    }
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(entry.as_str());
    text.push('\n');
    save(path, &text)?;
    Ok(true)
}

/// Remove every line naming `domain`. Returns `false` if none matched.
pub fn remove(path: &Path, domain: &str) -> Result<bool> {
    let entry = HostEntry::parse(domain)
        .ok_or_else(|| anyhow::anyhow!("Invalid domain: {:?}", domain))?;

    let text = load_or_create(path)?;
    let kept: Vec<&str> = text
        .split_inclusive('\n')
        .filter(|line| HostEntry::parse(line).as_ref() != Some(&entry))
        .collect();
    let updated = kept.concat();
    if updated.len() == text.len() {
        return Ok(false);
    }
    save(path, &updated)?;
    Ok(true)
}

/// Domains listed in blocklist text, as written (no `www.` variants).
pub fn listed(text: &str) -> impl Iterator<Item = HostEntry> + '_ {
    text.lines().filter_map(HostEntry::parse)
}
