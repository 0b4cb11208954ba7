//! Terminal UI: spinners, captured `aws` execution, fault lines, and the
//! backup summary banner.
//!
//! - **Clean by default.** While an API call is in flight the user sees only a spinner on stderr.
//!   The client's raw output is captured and decoded, never shown directly.
//! - **Reports stay on stdout.** The policy engine writes its plain-text report to stdout;
//!   everything styled here is either transient (spinner) or a summary line.

use std::{
    process::{Command, Output, Stdio},
    time::Duration,
};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

// ─── Icons ───────────────────────────────────────────────────────────────────

/// Braille spinner frames, in the style of indicatif's default.
static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn icon_ok() -> console::StyledObject<&'static str> {
    style("✓").green().bold()
}
fn icon_err() -> console::StyledObject<&'static str> {
    style("✗").red().bold()
}
fn icon_done() -> console::StyledObject<&'static str> {
    style("✓").cyan().bold()
}

// ─── Per-volume outcome ───────────────────────────────────────────────────────

/// The result of backing up one volume, as shown in the summary banner.
#[derive(Debug)]
pub struct VolumeOutcome {
    /// Volume id.
    pub label: String,
    /// `false` only when the volume could not be handled at all.
    pub success: bool,
    /// What happened, e.g. `"created snap-0abc"` or `"fresh: snap-0abc"`.
    pub detail: String,
    /// The error message, if any.
    pub error: Option<String>,
}

impl VolumeOutcome {
    /// Print the one-line summary (✓/✗ + volume + detail) to stdout.
    pub fn print(&self) {
        if self.success {
            println!(
                "  {}  {}  {}",
                icon_ok(),
                style(&self.label).bold(),
                style(&self.detail).dim()
            );
        } else {
            println!("  {}  {}", icon_err(), style(&self.label).bold());
            if let Some(ref msg) = self.error {
                eprintln!("     {} {}", style("Error:").red().bold(), msg);
            }
        }
    }

    /// Returns `true` if the volume was not handled.
    pub const fn failed(&self) -> bool {
        !self.success
    }
}

// ─── Spinner ──────────────────────────────────────────────────────────────────

/// Create and start an indeterminate spinner for `label`.
///
/// indicatif draws to stderr and hides itself when stderr is not a terminal,
/// so cron runs and tests see nothing.
fn make_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(s) = ProgressStyle::with_template("  {spinner:.cyan}  {msg}") {
        pb.set_style(s.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(format!("{}", style(label).dim()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ─── Captured execution ───────────────────────────────────────────────────────

/// Run a command, capturing both stdout and stderr.
///
/// Returns `(success, stdout_text, stderr_text)`.  An error means the command
/// could not be spawned at all.
pub fn run_captured(args: &[String]) -> Result<(bool, String, String)> {
    let (prog, rest) = args.split_first().context("cannot run an empty command")?;

    let output: Output = Command::new(prog)
        .args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("failed to spawn: {prog}"))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    Ok((output.status.success(), stdout, stderr))
}

/// [`run_captured`] behind a spinner labelled `label`.
pub fn run_with_spinner(label: &str, args: &[String]) -> Result<(bool, String, String)> {
    let spinner = make_spinner(label);
    let result = run_captured(args);
    spinner.finish_and_clear();
    result
}

// ─── Summary ──────────────────────────────────────────────────────────────────

/// Print the summary after `backupAllVolumes`.
///
/// Shows a success banner when every volume was handled, or a failure banner
/// listing the volumes that failed.
pub fn print_summary(outcomes: &[VolumeOutcome]) {
    println!();
    for o in outcomes {
        o.print();
    }

    let failed: Vec<&VolumeOutcome> = outcomes.iter().filter(|o| o.failed()).collect();
    println!();
    if outcomes.is_empty() {
        println!(
            "  {} {}",
            icon_done(),
            style("No volumes tagged AutoSnapshot=True.").cyan().bold()
        );
    } else if failed.is_empty() {
        println!(
            "  {} {}",
            icon_done(),
            style(format!("All {} volumes handled.", outcomes.len()))
                .cyan()
                .bold()
        );
    } else {
        eprintln!(
            "  {}  {}",
            icon_err(),
            style(format!(
                "{} of {} volumes failed.",
                failed.len(),
                outcomes.len()
            ))
            .red()
            .bold()
        );
        for o in &failed {
            eprintln!("    {} {}", icon_err(), style(&o.label).red());
        }
    }
    println!();
}

// ─── Tests ────────────────────────────────────────────────────────────────────
