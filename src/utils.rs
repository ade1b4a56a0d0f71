//! Common utility functions used across modules.
//!
//! - [`parse_duration`] - Parse block lengths like `45m` or `1h30m`
//! - [`format_countdown`] - Format remaining time as `HH:MM:SS`
//! - [`format_duration_label`] - Human label such as `1 hour, 15 minutes`

use anyhow::{bail, Result};
use std::time::Duration;

/// Parse a duration made of `<number><unit>` groups.
///
/// Units: `s` (seconds), `m` (minutes), `h` (hours), `d` (days).
/// Requires ASCII-only input.
///
/// # Examples
/// ```
/// use restraint::utils::parse_duration;
/// use std::time::Duration;
/// assert_eq!(parse_duration("45m").unwrap(), Duration::from_secs(45 * 60));
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
/// assert!(parse_duration("4x").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.is_empty() {
        bail!("Duration cannot be empty");
    }
    if !input.is_ascii() {
        bail!("Invalid duration '{}'. Only ASCII characters allowed", input);
    }

    let mut total: u64 = 0;
    let mut number = String::new();
    for c in input.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        let unit: u64 = match c {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            _ => bail!(
                "Invalid duration '{}'. Unit must be s, m, h, or d",
                input
            ),
        };
        if number.is_empty() {
            bail!("Invalid duration '{}'. Missing number before '{}'", input, c);
        }
        let value: u64 = number
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration '{}'. Number too large", input))?;
        total = value
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| anyhow::anyhow!("Invalid duration '{}'. Too long", input))?;
        number.clear();
    }

    if !number.is_empty() {
        bail!(
            "Invalid duration '{}'. Use format like '45m', '1h30m', '1d'",
            input
        );
    }

    Ok(Duration::from_secs(total))
}

/// Format remaining time as a countdown.
///
/// # Examples
/// ```
/// use restraint::utils::format_countdown;
/// use std::time::Duration;
/// assert_eq!(format_countdown(Duration::from_secs(3725)), "01:02:05");
/// ```
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Describe a block length in words, to the minute.
///
/// # Examples
/// ```
/// use restraint::utils::format_duration_label;
/// use std::time::Duration;
/// assert_eq!(format_duration_label(Duration::from_secs(75 * 60)), "1 hour, 15 minutes");
/// assert_eq!(format_duration_label(Duration::ZERO), "Disabled");
/// ```
pub fn format_duration_label(duration: Duration) -> String {
    let minutes = duration.as_secs() / 60;
    if minutes == 0 {
        return "Disabled".to_string();
    }

    let hours = minutes / 60;
    let rest = minutes % 60;
    let minute_part = plural(rest, "minute");
    match hours {
        0 => minute_part,
        _ => format!("{}, {}", plural(hours, "hour"), minute_part),
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}
