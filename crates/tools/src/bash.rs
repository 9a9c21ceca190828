//! Bash tool — shell command execution inside the workspace.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use ferrocode_core::error::ToolError;
use ferrocode_core::tool::{Tool, ToolResult};
use tokio::process::Command;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MAX_TIMEOUT_SECS: u64 = 600;
const MAX_OUTPUT_CHARS: usize = 30_000;

/// Programs that modify the file system. A command mentioning any of
/// these, or containing a shell redirection, is treated as mutating.
const MUTATING_PROGRAMS: &[&str] = &[
    "rm", "mv", "cp", "mkdir", "rmdir", "touch", "tee", "truncate", "ln", "chmod", "chown", "dd",
    "sed", "patch", "tar", "unzip", "git", "make", "install",
];

/// Decide whether a shell command can modify the workspace. Every token is
/// scanned so commands behind pipes and separators are caught as well.
pub(crate) fn command_mutates(command: &str) -> bool {
    if command.contains('>') {
        return true;
    }
    command
        .split(|c: char| c.is_whitespace() || matches!(c, '|' | ';' | '&' | '(' | ')'))
        .filter(|token| !token.is_empty())
        .any(|token| {
            let basename = token.rsplit('/').next().unwrap_or(token);
            MUTATING_PROGRAMS.contains(&basename)
        })
}

pub struct BashTool {
    root: PathBuf,
}

impl BashTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Execute a bash command in the workspace root with stdout and stderr merged. Prefer the dedicated read, glob, and grep tools over 'cat', 'find', and 'grep'."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The bash command to execute"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in seconds (default 120, capped at 600)"
                },
                "run_in_background": {
                    "type": "boolean",
                    "description": "Set to true to run this command in the background. Default is false"
                },
                "summary": {
                    "type": "string",
                    "description": "Short description of the command for the audit log, like a commit title"
                }
            },
            "required": ["command"]
        })
    }

    fn is_mutating(&self, arguments: &serde_json::Value) -> bool {
        command_mutates(
            arguments
                .get("command")
                .and_then(|v| v.as_str())
                .unwrap_or(""),
        )
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let command = arguments
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;
        let timeout_secs = arguments
            .get("timeout")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .min(MAX_TIMEOUT_SECS);
        let run_in_background = arguments
            .get("run_in_background")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        debug!(
            command,
            timeout_secs, run_in_background, "executing shell command"
        );

        if run_in_background {
            return match Command::new("sh")
                .arg("-c")
                .arg(command)
                .current_dir(&self.root)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                Ok(child) => {
                    let pid = child
                        .id()
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "unknown".into());
                    Ok(ToolResult::ok(
                        "",
                        format!("Command started in background with PID: {pid}"),
                    ))
                }
                Err(e) => Ok(ToolResult::error(
                    "",
                    format!("Failed to start command: {e}"),
                )),
            };
        }

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output =
            match tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output()).await {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    return Ok(ToolResult::error(
                        "",
                        format!("Failed to execute command: {e}"),
                    ));
                }
                Err(_) => {
                    return Ok(ToolResult::error(
                        "",
                        format!("Command timed out after {timeout_secs} seconds"),
                    ));
                }
            };

        let mut text = String::new();
        text.push_str(&String::from_utf8_lossy(&output.stdout));
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        if text.chars().count() > MAX_OUTPUT_CHARS {
            text = text.chars().take(MAX_OUTPUT_CHARS).collect();
        }

        if output.status.success() {
            Ok(ToolResult::ok("", text))
        } else {
            let code = output.status.code().unwrap_or(-1);
            warn!(command, code, "shell command failed");
            Ok(ToolResult::error(
                "",
                format!("Command failed with exit code {code}:\n{text}"),
            ))
        }
    }
}
