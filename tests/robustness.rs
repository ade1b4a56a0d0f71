//! Robustness tests for edge cases and error conditions.
//!
//! These tests verify that restraint leaves the hosts file in a sane state
//! under hostile input and failure modes.

use std::fs;
use std::time::Duration;

use restraint::region::{self, END_MARKER, START_MARKER};
use restraint::utils::parse_duration;
use restraint::{compile, Config, GuardError, HostsFileGuard, RevertOutcome};
use tempfile::TempDir;

const ORIGINAL: &str = "127.0.0.1\tlocalhost\n";

/// Check if running as root
#[cfg(unix)]
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Test that large blocklists compile and round-trip through the hosts file
#[tokio::test]
async fn test_large_blocklist() {
    let raw: String = (0..20_000).map(|i| format!("site{}.example\n", i)).collect();
    let set = compile(&raw);
    assert_eq!(set.len(), 40_000);

    let temp_dir = TempDir::new().unwrap();
    let hosts = temp_dir.path().join("hosts");
    fs::write(&hosts, ORIGINAL).unwrap();
    let guard = HostsFileGuard::new(&hosts);

    let handle = guard.apply(&set, Duration::from_secs(60)).unwrap();
    handle.cancel().await.unwrap();
    assert_eq!(fs::read_to_string(&hosts).unwrap(), ORIGINAL);
}

/// Test Unicode handling in blocklist input
#[test]
fn test_unicode_handling() {
    let set = compile("Bücher.DE\n例え.jp\n\u{200B}\n");
    assert!(set.contains("bücher.de"));
    assert!(set.contains("www.bücher.de"));
    assert!(set.contains("例え.jp"));
    for entry in &set {
        assert!(!entry.as_str().contains('\n'));
        assert!(!entry.as_str().contains(char::is_whitespace));
    }
}

/// Test empty and whitespace inputs
#[test]
fn test_empty_and_whitespace() {
    assert!(compile("").is_empty());
    assert!(compile("   \n\t\n\r\n").is_empty());
    assert!(compile("# just a comment\n  # indented comment").is_empty());
    assert!(compile("https://").is_empty());
    assert!(compile("...").is_empty());
}

/// Test that input cannot smuggle marker lines into the region
#[test]
fn test_marker_injection_is_harmless() {
    let raw = format!("{}\n{}\nexample.com\n", END_MARKER, START_MARKER);
    let set = compile(&raw);
    assert_eq!(set.len(), 2);

    let rendered = region::render(&set, chrono::Utc::now(), "\n");
    assert_eq!(rendered.matches(START_MARKER).count(), 1);
    assert_eq!(rendered.matches(END_MARKER).count(), 1);
}

/// Test that only one of many concurrent applies wins
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_applies() {
    let temp_dir = TempDir::new().unwrap();
    let hosts = temp_dir.path().join("hosts");
    fs::write(&hosts, ORIGINAL).unwrap();
    let guard = HostsFileGuard::new(&hosts);

    let mut tasks = vec![];
    for i in 0..16 {
        let guard = guard.clone();
        tasks.push(tokio::spawn(async move {
            guard.apply(
                &compile(&format!("site{}.example", i)),
                Duration::from_secs(60),
            )
        }));
    }

    let mut winners = vec![];
    for task in tasks {
        match task.await.unwrap() {
            Ok(handle) => winners.push(handle),
            Err(e) => assert!(matches!(e, GuardError::AlreadyActive { .. })),
        }
    }
    assert_eq!(winners.len(), 1);

    let content = fs::read_to_string(&hosts).unwrap();
    assert_eq!(content.matches(START_MARKER).count(), 1);

    for handle in winners {
        handle.cancel().await.unwrap();
    }
    assert_eq!(fs::read_to_string(&hosts).unwrap(), ORIGINAL);
}

/// Test that a cancel racing the timer still reverts exactly once
#[tokio::test]
async fn test_cancel_after_expiry() {
    let temp_dir = TempDir::new().unwrap();
    let hosts = temp_dir.path().join("hosts");
    fs::write(&hosts, ORIGINAL).unwrap();
    let guard = HostsFileGuard::new(&hosts);

    let handle = guard
        .apply(&compile("example.com"), Duration::from_millis(50))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let end = handle.cancel().await.unwrap();
    assert_eq!(end.outcome, RevertOutcome::Removed { truncated: false });
    assert_eq!(fs::read_to_string(&hosts).unwrap(), ORIGINAL);
}

/// Test that an old session never lifts a newer block
#[tokio::test]
async fn test_stale_session_leaves_new_block() {
    let temp_dir = TempDir::new().unwrap();
    let hosts = temp_dir.path().join("hosts");
    fs::write(&hosts, ORIGINAL).unwrap();
    let guard = HostsFileGuard::new(&hosts);

    let first = guard
        .apply(&compile("example.com"), Duration::from_millis(200))
        .unwrap();
    assert!(matches!(
        guard.revert().unwrap(),
        RevertOutcome::Removed { .. }
    ));
    let second = guard
        .apply(&compile("reddit.com"), Duration::from_secs(60))
        .unwrap();

    let end = first.wait().await.unwrap();
    assert_eq!(end.outcome, RevertOutcome::Superseded);
    assert!(fs::read_to_string(&hosts).unwrap().contains("reddit.com"));

    second.cancel().await.unwrap();
    assert_eq!(fs::read_to_string(&hosts).unwrap(), ORIGINAL);
}

/// Test that several stray regions are all removed
#[test]
fn test_multiple_regions_removed() {
    let temp_dir = TempDir::new().unwrap();
    let hosts = temp_dir.path().join("hosts");
    let region = region::render(&compile("example.com"), chrono::Utc::now(), "\n");
    fs::write(
        &hosts,
        format!("{}{}10.0.0.1\tnas\n{}", ORIGINAL, region, region),
    )
    .unwrap();

    let guard = HostsFileGuard::new(&hosts);
    guard.revert().unwrap();
    assert_eq!(
        fs::read_to_string(&hosts).unwrap(),
        format!("{}10.0.0.1\tnas\n", ORIGINAL)
    );
}

/// Test that the missing hosts file is an I/O error, not a panic
#[tokio::test]
async fn test_missing_hosts_file() {
    let temp_dir = TempDir::new().unwrap();
    let guard = HostsFileGuard::new(temp_dir.path().join("nonexistent/hosts"));

    let err = guard
        .apply(&compile("example.com"), Duration::from_secs(1))
        .unwrap_err();
    assert_eq!(err.kind(), "IOFailure");
    assert!(guard.revert().is_err());
    assert!(guard.inspect().is_err());
}

/// Test that a read-only hosts file reports PermissionDenied and is untouched
#[cfg(unix)]
#[tokio::test]
async fn test_read_only_hosts_file() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("Skipping test_read_only_hosts_file: root ignores permissions");
        return;
    }

    let temp_dir = TempDir::new().unwrap();
    let hosts = temp_dir.path().join("hosts");
    fs::write(&hosts, ORIGINAL).unwrap();
    fs::set_permissions(&hosts, fs::Permissions::from_mode(0o444)).unwrap();

    let guard = HostsFileGuard::new(&hosts);
    let err = guard
        .apply(&compile("example.com"), Duration::from_secs(60))
        .unwrap_err();
    assert_eq!(err.kind(), "PermissionDenied");
    assert_eq!(fs::read_to_string(&hosts).unwrap(), ORIGINAL);
}

/// Test that config parsing handles malformed input
#[test]
fn test_config_malformed_input() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");

    fs::write(&path, "{{{{not valid yaml").unwrap();
    assert!(Config::load(&path).is_err());

    fs::write(&path, "default_duration: forever\n").unwrap();
    assert!(Config::load(&path).is_err());

    fs::write(&path, "unknown_key: 1\nbackup: false\n").unwrap();
    let config = Config::load(&path).unwrap();
    assert!(!config.backup);
}

/// Test overflow protection in duration parsing
#[test]
fn test_duration_overflow_protection() {
    assert!(parse_duration("18446744073709551615s").is_ok());
    assert!(parse_duration("18446744073709551616s").is_err());
    assert!(parse_duration("18446744073709551615m").is_err());
}

/// Test that an absurdly long block does not overflow the expiry
#[tokio::test]
async fn test_huge_duration() {
    let temp_dir = TempDir::new().unwrap();
    let hosts = temp_dir.path().join("hosts");
    fs::write(&hosts, ORIGINAL).unwrap();
    let guard = HostsFileGuard::new(&hosts);

    let handle = guard
        .apply(&compile("example.com"), Duration::from_secs(u64::MAX))
        .unwrap();
    assert!(handle.remaining() > Duration::from_secs(3600 * 24 * 365));
    handle.cancel().await.unwrap();
    assert_eq!(fs::read_to_string(&hosts).unwrap(), ORIGINAL);
}
