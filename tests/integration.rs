//! Integration tests for the `ebs-snapshot` binary.
//!
//! These tests exercise the CLI layer end-to-end: they spawn the compiled
//! binary and assert on exit codes, stdout, and stderr.  No AWS access is
//! needed; they cover argument parsing, config loading, `init`,
//! `--print-config`, and the error paths that must abort before any API call.
//!
//! # Running
//!
//! ```sh
//! cargo test --test integration
//! ```

use std::{fs, path::Path, process::Command};

const BIN: &str = env!("CARGO_BIN_EXE_ebs-snapshot");

/// An `aws_bin` that cannot exist.  If a test that expects zero API calls
/// ever reaches the provider, the run reports a spawn failure instead of the
/// expected message.
const NO_AWS: &str = "/nonexistent/ebs-snapshot-test-aws";

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Run `ebs-snapshot` with `args` in `dir`, isolated from the user's own
/// global config and log settings.
///
/// Returns `(exit_success, stdout, stderr)`.
fn run_in(args: &[&str], dir: &Path) -> (bool, String, String) {
    let out = Command::new(BIN)
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("EBS_SNAPSHOT_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn {BIN}: {e}"));

    (
        out.status.success(),
        String::from_utf8_lossy(&out.stdout).into_owned(),
        String::from_utf8_lossy(&out.stderr).into_owned(),
    )
}

fn run(args: &[&str]) -> (bool, String, String) {
    let dir = tempfile::tempdir().unwrap();
    run_in(args, dir.path())
}

/// A temp dir holding a `snapshot.toml` that points at [`NO_AWS`].
fn dir_without_aws() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("snapshot.toml"),
        format!("[provider]\naws_bin = \"{NO_AWS}\"\n"),
    )
    .unwrap();
    dir
}

// ─── --help / --version ───────────────────────────────────────────────────────

#[test]
fn help_exits_zero() {
    let (ok, stdout, _) = run(&["--help"]);
    assert!(ok, "--help should exit 0");
    assert!(stdout.contains("ebs-snapshot"));
}

#[test]
fn version_exits_zero() {
    let (ok, stdout, _) = run(&["--version"]);
    assert!(ok);
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn snapshot_help_lists_every_action() {
    let (ok, stdout, _) = run(&["snapshot", "--help"]);
    assert!(ok);
    for action in [
        "listVolumes",
        "listSnapshots",
        "takeSnapshot",
        "pruneSnapshots",
        "backupAllVolumes",
    ] {
        assert!(stdout.contains(action), "help should list {action}:\n{stdout}");
    }
}

#[test]
fn no_subcommand_prints_help() {
    let (ok, stdout, _) = run(&[]);
    assert!(ok);
    assert!(stdout.contains("snapshot"));
}

// ─── init ─────────────────────────────────────────────────────────────────────

#[test]
fn init_creates_snapshot_toml() {
    let dir = tempfile::tempdir().unwrap();
    let (ok, _, _) = run_in(&["init"], dir.path());
    assert!(ok, "init should exit 0");

    let content = fs::read_to_string(dir.path().join("snapshot.toml")).unwrap();
    assert!(content.contains("[provider]"));
    assert!(content.contains("[policy]"));
    toml::from_str::<toml::Value>(&content).expect("generated snapshot.toml must be valid TOML");
}

#[test]
fn init_with_custom_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let custom = dir.path().join("custom.toml");
    let (ok, _, _) = run_in(&["--config", custom.to_str().unwrap(), "init"], dir.path());
    assert!(ok);
    assert!(custom.exists());
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.toml");
    fs::write(&path, "# existing").unwrap();

    let (ok, stdout, stderr) = run_in(&["init"], dir.path());
    assert!(!ok, "init should fail when snapshot.toml already exists");
    assert_eq!(fs::read_to_string(&path).unwrap(), "# existing");

    let combined = format!("{stdout}{stderr}");
    assert!(combined.contains("already exists"), "got: {combined}");
}

// ─── --print-config ───────────────────────────────────────────────────────────

#[test]
fn print_config_with_missing_config_shows_defaults() {
    let (ok, stdout, _) = run(&["--print-config"]);
    assert!(ok);
    assert!(stdout.contains("eu-west-1"), "{stdout}");
    assert!(stdout.contains("min_interval_hours: 23"), "{stdout}");
}

#[test]
fn print_config_reads_specified_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("other.toml");
    fs::write(&cfg, "[provider]\nregion = \"ap-southeast-2\"\n").unwrap();

    let (ok, stdout, _) = run_in(
        &["--config", cfg.to_str().unwrap(), "--print-config"],
        dir.path(),
    );
    assert!(ok);
    assert!(stdout.contains("ap-southeast-2"), "{stdout}");
}

/// `dirs-next` honours `XDG_CONFIG_HOME` on Linux only.
#[cfg(target_os = "linux")]
#[test]
fn print_config_merges_global_config() {
    let dir = tempfile::tempdir().unwrap();
    let global = dir.path().join(".config").join("ebs-snapshot");
    fs::create_dir_all(&global).unwrap();
    fs::write(global.join("config.toml"), "[provider]\nprofile = \"ops\"\n").unwrap();
    fs::write(
        dir.path().join("snapshot.toml"),
        "[policy]\nmax_age_days = 14\n",
    )
    .unwrap();

    let (ok, stdout, _) = run_in(&["--print-config"], dir.path());
    assert!(ok);
    assert!(stdout.contains("\"ops\""), "{stdout}");
    assert!(stdout.contains("max_age_days: 14"), "{stdout}");
}

#[test]
fn region_flag_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("snapshot.toml"),
        "[provider]\nregion = \"eu-west-1\"\n",
    )
    .unwrap();

    let (ok, stdout, _) = run_in(&["--region", "us-east-1", "--print-config"], dir.path());
    assert!(ok);
    assert!(stdout.contains("us-east-1"), "{stdout}");
    assert!(!stdout.contains("eu-west-1"), "{stdout}");
}

#[test]
fn print_config_wins_over_subcommand() {
    let dir = dir_without_aws();
    for args in [
        &["--print-config", "snapshot", "pruneSnapshots"][..],
        &["snapshot", "listVolumes", "--print-config"][..],
    ] {
        let (ok, stdout, stderr) = run_in(args, dir.path());
        assert!(ok, "{args:?} failed; stderr:\n{stderr}");
        assert!(stdout.contains("min_interval_hours: 23"), "{stdout}");
        assert!(!stdout.contains("General AWS error"), "{stdout}");
    }
}

#[test]
fn print_config_errors_on_invalid_toml() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("snapshot.toml"), "not valid toml ][[[").unwrap();

    let (ok, _, _) = run_in(&["--print-config"], dir.path());
    assert!(!ok, "invalid TOML should cause a non-zero exit");
}

// ─── Argument validation ──────────────────────────────────────────────────────

#[test]
fn list_snapshots_without_volume_fails_before_any_call() {
    let dir = dir_without_aws();
    let (ok, _, stderr) = run_in(&["snapshot", "listSnapshots"], dir.path());
    assert!(!ok, "missing volume must exit non-zero");
    assert!(stderr.contains("Please specify the volume"), "{stderr}");
    assert!(!stderr.contains("failed to spawn"), "{stderr}");
}

#[test]
fn take_snapshot_without_volume_fails_before_any_call() {
    let dir = dir_without_aws();
    let (ok, _, stderr) = run_in(&["snapshot", "takeSnapshot"], dir.path());
    assert!(!ok);
    assert!(stderr.contains("Please specify the volume to snapshot"), "{stderr}");
    assert!(!stderr.contains("failed to spawn"), "{stderr}");
}

#[test]
fn unknown_action_exits_nonzero() {
    let dir = dir_without_aws();
    let (ok, _, stderr) = run_in(&["snapshot", "frobnicate"], dir.path());
    assert!(!ok, "unknown action should be rejected");
    assert!(stderr.contains("frobnicate"), "{stderr}");
}

#[test]
fn unknown_flag_exits_nonzero() {
    let (ok, _, _) = run(&["--this-flag-does-not-exist"]);
    assert!(!ok);
}

// ─── Provider faults ──────────────────────────────────────────────────────────

#[test]
fn unreachable_aws_client_is_reported_but_exits_zero() {
    let dir = dir_without_aws();
    let (ok, stdout, _) = run_in(&["snapshot", "listVolumes"], dir.path());
    assert!(ok, "provider faults are reported, not fatal");
    assert!(stdout.contains("General AWS error"), "{stdout}");
}
