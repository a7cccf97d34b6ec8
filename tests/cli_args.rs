//! Integration tests for the rankwatch binary
//!
//! Runs the compiled CLI against a temporary cache directory with no provider
//! configured, so nothing leaves the machine.

use std::path::Path;
use std::process::Command;

use chrono::Utc;
use tempfile::TempDir;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_rankwatch"))
        .args(args)
        .env_remove("TRANCO_API_BASE_URL")
        .env_remove("CACHE_TTL_HOURS")
        .env_remove("RANKWATCH_CACHE_DIR")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute rankwatch")
}

/// Writes a cached document for `domain` refreshed just now
fn seed_cache(dir: &Path, domain: &str, rows: &[(&str, u32)]) {
    let refreshed_at = Utc::now().to_rfc3339();
    let rows: Vec<serde_json::Value> = rows
        .iter()
        .map(|(date, rank)| {
            serde_json::json!({"date": date, "rank": rank, "refreshed_at": refreshed_at})
        })
        .collect();
    let document = serde_json::json!({"domain": domain, "rows": rows});
    std::fs::write(
        dir.join(format!("{}.json", domain)),
        serde_json::to_string_pretty(&document).unwrap(),
    )
    .expect("Failed to seed cache");
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rankwatch"), "Help should mention rankwatch");
    assert!(stdout.contains("--ttl-hours"), "Help should mention --ttl-hours");
    assert!(stdout.contains("--provider-url"), "Help should mention --provider-url");
}

#[test]
fn test_missing_domains_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}

#[test]
fn test_blank_domain_list_prints_error_and_exits() {
    let output = run_cli(&[" , ,"]);
    assert!(!output.status.success(), "Expected blank list to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("No domains"),
        "Should explain the domain list is empty: {}",
        stderr
    );
}

#[test]
fn test_cached_domain_is_served_without_provider() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    seed_cache(temp_dir.path(), "example.com", &[("2024-01-02", 9), ("2024-01-01", 11)]);

    let output = run_cli(&[
        " Example.COM ",
        "--cache-dir",
        temp_dir.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(
        json,
        serde_json::json!({"example.com": {
            "domain": "example.com",
            "labels": ["2024-01-01", "2024-01-02"],
            "ranks": [11, 9],
            "outOfTop1M": false
        }})
    );
}

#[test]
fn test_uncached_domain_without_provider_reports_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let output = run_cli(&[
        "new-domain.test",
        "--cache-dir",
        temp_dir.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let report = &json["new-domain.test"];
    assert_eq!(report["outOfTop1M"], true);
    assert!(report["error"]
        .as_str()
        .unwrap()
        .contains("TRANCO_API_BASE_URL"));
}

#[test]
fn test_sparkline_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    seed_cache(temp_dir.path(), "example.com", &[("2024-01-01", 100), ("2024-01-02", 10)]);

    let output = run_cli(&[
        "example.com",
        "--sparkline",
        "--cache-dir",
        temp_dir.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim_end(), "example.com  ▁█  (best 10, latest 10)");
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use rankwatch::cli::{Cli, CliError, OutputFormat, StartupConfig};

    #[test]
    fn test_cli_domains_are_kept_raw() {
        let cli = Cli::parse_from(["rankwatch", "a.com, B.com"]);
        assert_eq!(cli.domains, "a.com, B.com");
    }

    #[test]
    fn test_startup_config_defaults_to_json() {
        let cli = Cli::parse_from(["rankwatch", "a.com"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.output, OutputFormat::Json);
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_startup_config_blank_list_is_error() {
        let cli = Cli::parse_from(["rankwatch", ",,"]);
        assert!(matches!(
            StartupConfig::from_cli(&cli),
            Err(CliError::NoDomains)
        ));
    }
}
