//! Verification
//!
//! Language-aware build and test checks, selected dynamically from the
//! files touched since the last checkpoint. `verify` returns the first
//! failing result; a modified set with no recognized code extension is a
//! no-op success.

mod language;

pub use language::{CheckCommand, Language, build_commands, detect_languages, test_commands};

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::events::EventEmitter;
use crate::tools::builtin::terminate_gracefully;

/// Outcome of one verifier
#[derive(Debug, Clone)]
pub struct VerifierResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl VerifierResult {
    /// A passing result
    pub fn ok() -> Self {
        Self {
            success: true,
            output: String::new(),
            error: None,
        }
    }

    /// A failing result with the check's output
    pub fn fail(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            error: Some(error.into()),
        }
    }
}

/// Everything a verifier needs to run
#[derive(Clone)]
pub struct VerifyContext {
    /// Workspace root
    pub workspace: PathBuf,

    /// Files touched since the last checkpoint, workspace-relative
    pub modified_files: Vec<PathBuf>,

    /// Per-verifier timeout
    pub timeout: Duration,

    /// Lint command; lint never runs unless this is set
    pub lint_command: Option<String>,

    /// Optional event emitter
    pub emitter: Option<EventEmitter>,

    /// Cancellation signal
    pub cancel: CancellationToken,
}

impl VerifyContext {
    /// Create a context with defaults
    pub fn new(workspace: PathBuf, modified_files: Vec<PathBuf>) -> Self {
        Self {
            workspace,
            modified_files,
            timeout: Duration::from_secs(600),
            lint_command: None,
            emitter: None,
            cancel: CancellationToken::new(),
        }
    }
}

/// A language-aware check
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Verifier name for events and logs
    fn name(&self) -> &'static str;

    /// Run the check; `Ok` with a failing result is a normal outcome
    async fn run(&self, ctx: &VerifyContext) -> eyre::Result<VerifierResult>;
}

/// Compiles every language detected in the modified set
pub struct BuildVerifier;

#[async_trait]
impl Verifier for BuildVerifier {
    fn name(&self) -> &'static str {
        "build"
    }

    async fn run(&self, ctx: &VerifyContext) -> eyre::Result<VerifierResult> {
        for language in detect_languages(&ctx.modified_files) {
            for check in build_commands(language, &ctx.workspace, &ctx.modified_files) {
                debug!(language = %language, command = %check.command, "BuildVerifier: running check");
                let result = run_check(&check, ctx).await?;
                if !result.success {
                    return Ok(result);
                }
            }
        }
        Ok(VerifierResult::ok())
    }
}

/// Runs tests for every language detected in the modified set
pub struct TestVerifier;

#[async_trait]
impl Verifier for TestVerifier {
    fn name(&self) -> &'static str {
        "test"
    }

    async fn run(&self, ctx: &VerifyContext) -> eyre::Result<VerifierResult> {
        for language in detect_languages(&ctx.modified_files) {
            for check in test_commands(language, &ctx.workspace, &ctx.modified_files) {
                debug!(language = %language, command = %check.command, "TestVerifier: running check");
                let result = run_check(&check, ctx).await?;
                if !result.success {
                    return Ok(result);
                }
            }
        }
        Ok(VerifierResult::ok())
    }
}

/// Runs a configured lint command; never auto-selected
pub struct LintVerifier {
    command: String,
}

impl LintVerifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl Verifier for LintVerifier {
    fn name(&self) -> &'static str {
        "lint"
    }

    async fn run(&self, ctx: &VerifyContext) -> eyre::Result<VerifierResult> {
        let check = CheckCommand {
            command: self.command.clone(),
            dir: ctx.workspace.clone(),
        };
        run_check(&check, ctx).await
    }
}

/// Run the applicable verifiers, returning the first failure
///
/// Build runs before tests; lint runs last and only when configured.
/// No recognized code extension in the modified set means no subprocess
/// is spawned at all.
pub async fn verify(ctx: &VerifyContext) -> eyre::Result<VerifierResult> {
    if detect_languages(&ctx.modified_files).is_empty() && ctx.lint_command.is_none() {
        info!("No code files in modified set, skipping verification");
        return Ok(VerifierResult::ok());
    }

    let mut verifiers: Vec<Box<dyn Verifier>> = vec![Box::new(BuildVerifier), Box::new(TestVerifier)];
    if let Some(lint) = &ctx.lint_command {
        verifiers.push(Box::new(LintVerifier::new(lint.clone())));
    }

    for verifier in verifiers {
        let result = verifier.run(ctx).await?;
        if let Some(emitter) = &ctx.emitter {
            emitter.validation(verifier.name(), result.success);
        }
        if !result.success {
            info!(verifier = verifier.name(), "Verification failed");
            return Ok(result);
        }
    }

    Ok(VerifierResult::ok())
}

/// Run one shell check with timeout and cancellation
async fn run_check(check: &CheckCommand, ctx: &VerifyContext) -> eyre::Result<VerifierResult> {
    if ctx.cancel.is_cancelled() {
        eyre::bail!("verification cancelled");
    }

    let mut child = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(&check.command)
        .current_dir(&check.dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

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

    let status = tokio::select! {
        res = tokio::time::timeout(ctx.timeout, child.wait()) => match res {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                terminate_gracefully(&mut child).await;
                return Ok(VerifierResult::fail(
                    String::new(),
                    format!("'{}' timed out after {}ms", check.command, ctx.timeout.as_millis()),
                ));
            }
        },
        _ = ctx.cancel.cancelled() => {
            terminate_gracefully(&mut child).await;
            eyre::bail!("verification cancelled");
        }
    };

    let stdout = String::from_utf8_lossy(&stdout_task.await.unwrap_or_default()).to_string();
    let stderr = String::from_utf8_lossy(&stderr_task.await.unwrap_or_default()).to_string();

    let mut output = stdout;
    if !stderr.is_empty() {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&stderr);
    }

    if status.success() {
        Ok(VerifierResult {
            success: true,
            output,
            error: None,
        })
    } else {
        Ok(VerifierResult::fail(
            output,
            format!("'{}' exited with code {}", check.command, status.code().unwrap_or(-1)),
        ))
    }
}
