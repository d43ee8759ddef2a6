//! System clipboard via the platform's paste command

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use crate::ports::Clipboard;
use crate::{Error, Result};

const PASTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Paste commands to try, in order, for the current platform
fn paste_commands() -> &'static [(&'static str, &'static [&'static str])] {
    if cfg!(target_os = "macos") {
        &[("pbpaste", &[])]
    } else if cfg!(target_os = "windows") {
        &[("powershell", &["-NoProfile", "-Command", "Get-Clipboard"])]
    } else {
        &[
            ("xclip", &["-selection", "clipboard", "-o"]),
            ("xsel", &["--clipboard", "--output"]),
            ("wl-paste", &["--no-newline"]),
        ]
    }
}

/// Reads text from the system clipboard
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[async_trait(?Send)]
impl Clipboard for SystemClipboard {
    async fn read(&self) -> Result<String> {
        let mut last_error = String::from("no clipboard command available");

        for (program, args) in paste_commands() {
            if which::which(program).is_err() {
                continue;
            }

            let output = Command::new(program)
                .args(*args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output();

            match timeout(PASTE_TIMEOUT, output).await {
                Ok(Ok(output)) if output.status.success() => {
                    let text = String::from_utf8_lossy(&output.stdout).into_owned();
                    tracing::debug!(program, chars = text.len(), "read clipboard");
                    return Ok(text);
                }
                Ok(Ok(output)) => {
                    last_error = format!(
                        "{program} exited with {}: {}",
                        output.status.code().unwrap_or(-1),
                        String::from_utf8_lossy(&output.stderr).trim()
                    );
                }
                Ok(Err(e)) => last_error = format!("{program} failed: {e}"),
                Err(_) => last_error = format!("{program} timed out"),
            }
        }

        Err(Error::Clipboard(last_error))
    }
}
