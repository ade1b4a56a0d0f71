//! The managed region: the marker-delimited block of lines restraint owns
//! inside the hosts file.
//!
//! Readers work on raw bytes: the hosts file may hold text in any encoding
//! outside the region, and those bytes are passed through untouched. The
//! same marker constants are used by the writer and the stripper.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::compiler::BlockSet;

/// First line of the managed region. Must never change between releases.
pub const START_MARKER: &str =
    "# restraint blocklist. DO NOT EDIT OR MODIFY THE CONTENTS OF THIS BLOCK";

/// Last line of the managed region.
pub const END_MARKER: &str = "# end restraint blocklist";

/// Address every blocked host is pointed at.
pub const NULL_ADDRESS: &str = "0.0.0.0";

const NOTICE: &str = "# restraint will remove this block when the timer has ended";
const EXPIRES_PREFIX: &str = "# expires: ";

/// Lines of `content`, each keeping its `\n` terminator.
fn lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    content.split_inclusive(|&b| b == b'\n')
}

/// A line without its terminator.
fn body(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    &line[..end]
}

fn is_start(line: &[u8]) -> bool {
    body(line) == START_MARKER.as_bytes()
}

fn is_end(line: &[u8]) -> bool {
    body(line) == END_MARKER.as_bytes()
}

/// Whether `content` holds a managed region.
pub fn contains_region(content: &[u8]) -> bool {
    lines(content).any(is_start)
}

/// Line terminator used by an existing file (CRLF if any line uses it).
pub fn detect_newline(content: &[u8]) -> &'static str {
    if content.windows(2).any(|w| w == b"\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Render the text appended to the hosts file for a block.
///
/// The leading newline either adds a blank separator line or terminates an
/// unterminated last line; [`strip`] undoes both.
pub fn render(entries: &BlockSet, expires_at: DateTime<Utc>, newline: &str) -> String {
    let mut out = String::with_capacity(128 + entries.len() * 32);
    out.push_str(newline);
    for line in [
        START_MARKER.to_string(),
        NOTICE.to_string(),
        format!(
            "{}{}",
            EXPIRES_PREFIX,
            expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
    ] {
        out.push_str(&line);
        out.push_str(newline);
    }
    for entry in entries {
        out.push_str(NULL_ADDRESS);
        out.push('\t');
        out.push_str(entry.as_str());
        out.push_str(newline);
    }
    out.push_str(END_MARKER);
    out.push_str(newline);
    out
}

/// Result of removing managed regions from file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stripped {
    pub content: Vec<u8>,
    /// A start marker was seen.
    pub found: bool,
    /// A region ran to end of file without its end marker.
    pub truncated: bool,
}

/// Remove every managed region from `content`.
///
/// Lines outside the region are kept byte for byte, whatever their encoding.
/// A region with no end marker is treated as running to end of file.
pub fn strip(content: &[u8]) -> Stripped {
    let mut kept: Vec<&[u8]> = Vec::new();
    let mut inside = false;
    let mut found = false;
    // Index of the kept line that `render` may have terminated
    let mut terminated: Option<usize> = None;

    for line in lines(content) {
        if inside {
            if is_end(line) {
                inside = false;
            }
            continue;
        }
        if is_start(line) {
            inside = true;
            found = true;
            terminated = None;
            match kept.last() {
                Some(prev) if body(prev).is_empty() => {
                    kept.pop();
                }
                Some(_) => terminated = Some(kept.len() - 1),
                None => {}
            }
            continue;
        }
        kept.push(line);
    }

    let mut out: Vec<u8> = kept.concat();
    if let Some(idx) = terminated {
        if idx + 1 == kept.len() {
            let trimmed = body(&out).len();
            out.truncate(trimmed);
        }
    }

    Stripped {
        content: out,
        found,
        truncated: inside,
    }
}

/// What a managed region on disk records about its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub hosts: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub truncated: bool,
}

/// Read the first managed region in `content`, if any.
pub fn parse(content: &[u8]) -> Option<RegionInfo> {
    let mut lines = lines(content).skip_while(|l| !is_start(l));
    lines.next()?;

    let mut info = RegionInfo {
        hosts: Vec::new(),
        expires_at: None,
        truncated: true,
    };
    for line in lines {
        let line = body(line);
        if line == END_MARKER.as_bytes() {
            info.truncated = false;
            break;
        }
        let line = String::from_utf8_lossy(line);
        if let Some(stamp) = line.strip_prefix(EXPIRES_PREFIX) {
            info.expires_at = DateTime::parse_from_rfc3339(stamp.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc));
            continue;
        }
        let mut fields = line.split_whitespace();
        if fields.next() == Some(NULL_ADDRESS) {
            if let Some(host) = fields.next() {
                info.hosts.push(host.to_string());
            }
        }
    }
    Some(info)
}
