//! `CodeRabbit` CLI as the external reviewer

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use crate::ports::{ExternalReviewer, ReviewReport, ReviewStatus};

const BINARY: &str = "coderabbit";

/// Install locations checked when the binary isn't on `PATH`
const WELL_KNOWN_DIRS: &[&str] = &["/usr/local/bin", "/opt/homebrew/bin"];

/// Marker the CLI prints on stderr when throttled
const RATE_LIMIT_MARKER: &str = "Rate limit exceeded";

/// Locate the `CodeRabbit` CLI
///
/// An explicit path wins; otherwise `PATH`, `~/.local/bin` and the usual
/// install directories are searched.
#[must_use]
pub fn find_coderabbit(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.is_file().then(|| path.to_path_buf());
    }
    if let Ok(path) = which::which(BINARY) {
        return Some(path);
    }

    let home_bin = directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".local/bin"));
    home_bin
        .into_iter()
        .chain(WELL_KNOWN_DIRS.iter().map(PathBuf::from))
        .map(|dir| dir.join(BINARY))
        .find(|path| path.is_file())
}

/// Runs `coderabbit review --plain` in the reviewed directory
pub struct CodeRabbitReviewer {
    program: Option<PathBuf>,
    timeout: Duration,
}

impl CodeRabbitReviewer {
    #[must_use]
    pub const fn new(program: Option<PathBuf>, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    /// Build a reviewer from an optional configured path
    #[must_use]
    pub fn discover(explicit: Option<&Path>, timeout: Duration) -> Self {
        let program = find_coderabbit(explicit);
        match &program {
            Some(path) => tracing::debug!(path = %path.display(), "found CodeRabbit CLI"),
            None => tracing::warn!("CodeRabbit CLI not found, reviews will fail"),
        }
        Self::new(program, timeout)
    }
}

#[async_trait(?Send)]
impl ExternalReviewer for CodeRabbitReviewer {
    async fn review_directory(&self, dir: &Path) -> ReviewReport {
        let Some(program) = &self.program else {
            return ReviewReport::new(ReviewStatus::Error, "CodeRabbit CLI is not installed");
        };

        tracing::info!(program = %program.display(), dir = %dir.display(), "running code review");
        let child = Command::new(program)
            .args(["review", "--plain"])
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let child = match child {
            Ok(child) => child,
            Err(e) => {
                return ReviewReport::new(
                    ReviewStatus::Error,
                    format!("failed to start CodeRabbit: {e}"),
                );
            }
        };

        // Dropping the child on timeout kills it
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return ReviewReport::new(ReviewStatus::Error, format!("CodeRabbit failed: {e}"));
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "code review timed out");
                return ReviewReport::new(
                    ReviewStatus::Timeout,
                    format!("review timed out after {}s", self.timeout.as_secs()),
                );
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        classify_output(output.status.success(), stdout, stderr)
    }
}

/// Map a finished run to a report
fn classify_output(success: bool, stdout: String, stderr: String) -> ReviewReport {
    if success {
        return ReviewReport::new(ReviewStatus::Completed, stdout);
    }
    if stderr.contains(RATE_LIMIT_MARKER) || stdout.contains(RATE_LIMIT_MARKER) {
        tracing::warn!("CodeRabbit rate limit exceeded");
        return ReviewReport::new(ReviewStatus::RateLimited, stderr);
    }
    tracing::warn!(stderr = %stderr, "CodeRabbit review failed");
    ReviewReport::new(ReviewStatus::Error, stderr)
}
