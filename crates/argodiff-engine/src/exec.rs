//! Process execution — the seam between the dispatcher and the argocd CLI.
//!
//! The `Executor` trait is what the dispatcher actually depends on; tests
//! substitute instrumented fakes. `ArgoCli` is the real implementation:
//! it spawns the argocd binary with captured stdio and appends the
//! connection flags to every call.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;

use argodiff_types::RawResult;

use crate::config::Config;

/// Runs one command line and captures the raw result.
///
/// Implementations must not block sibling tasks and must hand back raw,
/// unredacted output; redaction applies only to text destined for display.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn run(&self, command: &str) -> RawResult;
}

/// The argocd CLI, invoked as `<bin> <command…> --auth-token=… --server=…`.
pub struct ArgoCli {
    bin: PathBuf,
    server_url: String,
    auth_token: String,
    extra_args: Vec<String>,
}

impl ArgoCli {
    /// An executor for the installed binary at `bin`, connecting per `config`.
    pub fn new(bin: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            bin: bin.into(),
            server_url: config.server_url.clone(),
            auth_token: config.auth_token.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    /// Build the full argv for one call: the subcommand split on
    /// whitespace, then the connection flags, then any extra args.
    fn argv(&self, command: &str) -> Vec<String> {
        let mut argv: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        argv.push(format!("--auth-token={}", self.auth_token));
        argv.push(format!("--server={}", self.server_url));
        argv.extend(self.extra_args.iter().cloned());
        argv
    }
}

#[async_trait]
impl Executor for ArgoCli {
    async fn run(&self, command: &str) -> RawResult {
        let mut cmd = tokio::process::Command::new(&self.bin);
        cmd.args(self.argv(command));
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        match cmd.output().await {
            Ok(output) => {
                let code = output.status.code().unwrap_or(-1) as i64;
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                RawResult::from_output(code, stdout, stderr)
            }
            Err(err) => RawResult::spawn_failure(format!("{}: {}", self.bin.display(), err)),
        }
    }
}
