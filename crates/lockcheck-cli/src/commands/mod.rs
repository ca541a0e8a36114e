pub mod accept;
pub mod check;
pub mod lock;
pub mod repair;
pub mod requirements;
pub mod validate;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use lockcheck_core::{Engine, Issue, IssueKind};
use lockcheck_store::FsStore;
use std::io::{stderr, stdin, IsTerminal};
use std::time::Duration;

pub type ProjectEngine = Engine<FsStore>;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;
pub const EXIT_ISSUES: u8 = 4;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn is_interactive() -> bool {
    stdin().is_terminal() && stderr().is_terminal()
}

fn plain_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn spinner(msg: &str) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(plain_style());
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(plain_style());
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_kind(kind: IssueKind) -> String {
    match kind {
        IssueKind::Missing => Style::new().red().bold().apply_to("missing").to_string(),
        IssueKind::Mismatch => Style::new().yellow().apply_to("mismatch").to_string(),
    }
}

pub fn describe_issue(issue: &Issue) -> String {
    match &issue.actual_version {
        Some(actual) => format!(
            "{:<10} {} installed {}, required {}",
            colorize_kind(issue.kind()),
            issue.package,
            actual,
            Style::new().green().apply_to(&issue.expected_version)
        ),
        None => format!(
            "{:<10} {} not installed, required {}",
            colorize_kind(issue.kind()),
            issue.package,
            Style::new().green().apply_to(&issue.expected_version)
        ),
    }
}
