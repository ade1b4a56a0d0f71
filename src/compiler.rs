//! Blocklist compilation: raw user text to an ordered, deduplicated set of hosts.

use std::collections::HashSet;
use std::fmt;

const WWW_PREFIX: &str = "www.";

/// A single normalized host name.
///
/// Always non-empty, lower-case and free of whitespace, so it can be written
/// as one hosts-file line without further escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostEntry(String);

impl HostEntry {
    /// Normalize a single line of user input into a host entry.
    ///
    /// Returns `None` for empty lines, comments, and anything that does not
    /// reduce to a host name.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        // Hosts-style lines ("0.0.0.0 example.com") keep the name only
        let token = line.split_whitespace().last()?;
        let mut host = token.to_lowercase();

        if let Some(idx) = host.find("://") {
            host.drain(..idx + 3);
        }
        if let Some(idx) = host.find('/') {
            host.truncate(idx);
        }
        if let Some(idx) = host.rfind(':') {
            if host[idx + 1..].chars().all(|c| c.is_ascii_digit()) {
                host.truncate(idx);
            }
        }
        let host = host.trim_end_matches('.');

        if host.is_empty() || host.starts_with('#') || host.contains(char::is_whitespace) {
            None
        } else {
            Some(Self(host.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `www.`-toggled counterpart of this entry.
    ///
    /// Parsed entries never end in `.`, so stripping the prefix cannot leave
    /// an empty name.
    pub fn www_variant(&self) -> HostEntry {
        match self.0.strip_prefix(WWW_PREFIX) {
            Some(bare) => HostEntry(bare.to_string()),
            None => HostEntry(format!("{}{}", WWW_PREFIX, self.0)),
        }
    }
}

impl fmt::Display for HostEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HostEntry {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered set of host entries; first insertion wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSet {
    entries: Vec<HostEntry>,
    seen: HashSet<HostEntry>,
}

impl BlockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning `false` if it was already present.
    pub fn insert(&mut self, entry: HostEntry) -> bool {
        if self.seen.contains(&entry) {
            return false;
        }
        self.seen.insert(entry.clone());
        self.entries.push(entry);
        true
    }

    pub fn contains(&self, host: &str) -> bool {
        self.entries.iter().any(|e| e.as_str() == host)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostEntry> {
        self.entries.iter()
    }
}

impl FromIterator<HostEntry> for BlockSet {
    fn from_iter<I: IntoIterator<Item = HostEntry>>(iter: I) -> Self {
        let mut set = BlockSet::new();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}

impl<'a> IntoIterator for &'a BlockSet {
    type Item = &'a HostEntry;
    type IntoIter = std::slice::Iter<'a, HostEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Compile raw blocklist text into the set of hosts to block.
///
/// Every retained domain is emitted together with its `www.`-toggled
/// counterpart. An empty result means there is nothing to block.
pub fn compile(raw: &str) -> BlockSet {
    let mut set = BlockSet::new();
    for entry in raw.lines().filter_map(HostEntry::parse) {
        let variant = entry.www_variant();
        set.insert(entry);
        set.insert(variant);
    }
    set
}
