//! run_command tool - shell execution in the workspace

use async_trait::async_trait;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolResult};

/// Grace window between SIGTERM and SIGKILL
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Output size kept before truncation
const MAX_OUTPUT: usize = 30_000;

/// Execute a shell command in the workspace
pub struct RunCommandTool;

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &'static str {
        "run_command"
    }

    fn description(&self) -> &'static str {
        "Execute a shell command in the workspace. Use for git, build tools, tests. Commands must not require interactive input."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    fn is_write(&self) -> bool {
        true
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let command = match input["command"].as_str() {
            Some(c) => c,
            None => return ToolResult::error("command is required"),
        };

        let mut child = match tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&ctx.workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(c) => c,
            Err(e) => return ToolResult::error(format!("Failed to execute command: {}", e)),
        };

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();

        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });

        let timeout = ctx.command_timeout;
        let status = tokio::select! {
            res = tokio::time::timeout(timeout, child.wait()) => match res {
                Ok(Ok(status)) => status,
                Ok(Err(e)) => return ToolResult::error(format!("Failed to wait for command: {}", e)),
                Err(_) => {
                    debug!(%command, "RunCommandTool::execute: timed out");
                    terminate_gracefully(&mut child).await;
                    return ToolResult::error(format!("Command timed out after {}ms", timeout.as_millis()));
                }
            },
            _ = ctx.cancel.cancelled() => {
                debug!(%command, "RunCommandTool::execute: cancelled");
                terminate_gracefully(&mut child).await;
                return ToolResult::error("Command cancelled");
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        let mut merged = String::from_utf8_lossy(&stdout).to_string();
        let stderr_text = String::from_utf8_lossy(&stderr);
        if !stderr_text.is_empty() {
            if !merged.is_empty() && !merged.ends_with('\n') {
                merged.push('\n');
            }
            merged.push_str(&stderr_text);
        }

        let truncated = if merged.len() > MAX_OUTPUT {
            let total = merged.len();
            let mut cut = MAX_OUTPUT;
            while !merged.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}...\n[truncated, {} chars total]", &merged[..cut], total)
        } else {
            merged
        };

        if status.success() {
            ToolResult::success(truncated)
        } else {
            ToolResult::error(format!("Exit code: {}\n{}", status.code().unwrap_or(-1), truncated))
        }
    }
}

/// SIGTERM, wait out the grace window, then SIGKILL
pub(crate) async fn terminate_gracefully(child: &mut tokio::process::Child) {
    if let Some(pid) = child.id() {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_ok() {
            return;
        }
    }
    let _ = child.kill().await;
}
