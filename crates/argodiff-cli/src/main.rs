//! argodiff CLI entry point.
//!
//! Usage:
//!   argodiff --server=argocd.example.com --auth-token=... --repo=git@...:org/deploys.git
//!
//! Lists the ArgoCD applications for the repo, runs `argocd app diff` for
//! each under a concurrency cap, and posts the aggregated diff report as a
//! PR comment. Exits non-zero iff at least one diff invocation failed.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use argodiff_engine::{
    diff_command, install, render_comment, run_diffs, ArgoCli, Config, Executor, GithubPoster,
    Redactor, ReportContext,
};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

/// Everything parsed from the command line and environment.
struct Options {
    config: Config,
    argocd_bin: Option<PathBuf>,
    arch: String,
    github_token: String,
    github_repo: Option<String>,
    pr_number: Option<u64>,
    commit_sha: Option<String>,
    dry_run: bool,
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(ExitCode::SUCCESS);
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("argodiff {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    let options = parse_options(&args)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(options))
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut config = Config {
        server_url: env::var("ARGOCD_SERVER_URL").unwrap_or_default(),
        auth_token: env::var("ARGOCD_TOKEN").unwrap_or_default(),
        ..Config::default()
    };
    let mut argocd_bin = None;
    let mut arch = env::var("ARCH").unwrap_or_else(|_| "linux".to_string());
    let mut github_token = env::var("GITHUB_TOKEN").unwrap_or_default();
    let mut github_repo = None;
    let mut pr_number = None;
    let mut commit_sha = None;
    let mut dry_run = false;
    let mut plaintext = false;

    for arg in args {
        if let Some(value) = arg.strip_prefix("--server=") {
            config.server_url = value.to_string();
        } else if let Some(value) = arg.strip_prefix("--auth-token=") {
            config.auth_token = value.to_string();
        } else if let Some(value) = arg.strip_prefix("--argocd-version=") {
            config.version = value.to_string();
        } else if let Some(value) = arg.strip_prefix("--argocd-bin=") {
            argocd_bin = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--arch=") {
            arch = value.to_string();
        } else if let Some(value) = arg.strip_prefix("--environment=") {
            config.environment = value.to_string();
        } else if let Some(value) = arg.strip_prefix("--repo=") {
            config.repo_url = value.to_string();
        } else if let Some(value) = arg.strip_prefix("--extra-cli-args=") {
            config.extra_args = value.split_whitespace().map(str::to_string).collect();
        } else if arg == "--plaintext" {
            plaintext = true;
        } else if let Some(value) = arg.strip_prefix("--limit=") {
            config.limit = value
                .parse()
                .with_context(|| format!("--limit: not a number: {value}"))?;
        } else if let Some(value) = arg.strip_prefix("--deadline-secs=") {
            let secs: u64 = value
                .parse()
                .with_context(|| format!("--deadline-secs: not a number: {value}"))?;
            config.deadline = Some(Duration::from_secs(secs));
        } else if let Some(value) = arg.strip_prefix("--github-token=") {
            github_token = value.to_string();
        } else if let Some(value) = arg.strip_prefix("--github-repo=") {
            github_repo = Some(value.to_string());
        } else if let Some(value) = arg.strip_prefix("--pr-number=") {
            pr_number = Some(
                value
                    .parse()
                    .with_context(|| format!("--pr-number: not a number: {value}"))?,
            );
        } else if let Some(value) = arg.strip_prefix("--commit-sha=") {
            commit_sha = Some(value.to_string());
        } else if arg == "--dry-run" {
            dry_run = true;
        } else {
            bail!("Unknown option: {arg}\nRun 'argodiff --help' for usage.");
        }
    }

    if plaintext {
        config.extra_args.push("--plaintext".to_string());
    }
    if config.server_url.is_empty() {
        bail!("--server (or ARGOCD_SERVER_URL) is required");
    }
    if config.repo_url.is_empty() {
        bail!("--repo is required");
    }

    Ok(Options {
        config,
        argocd_bin,
        arch,
        github_token,
        github_repo,
        pr_number,
        commit_sha,
        dry_run,
    })
}

async fn run_async(options: Options) -> Result<ExitCode> {
    let config = &options.config;
    let redactor = Redactor::new(vec![config.auth_token.clone()]);

    // Setup: either a pre-installed binary or a fresh download.
    let bin = match &options.argocd_bin {
        Some(bin) => bin.clone(),
        None => install::install_argocd(&config.version, &options.arch, Path::new("bin/argocd"))
            .await
            .context("Failed to install the argocd binary")?,
    };

    let executor: Arc<dyn Executor> = Arc::new(ArgoCli::new(bin, config));

    // Inventory. A failed or malformed listing aborts the whole run;
    // nothing derived from it would be trustworthy.
    tracing::info!("listing applications");
    let listing = executor.run(&config.list_command()).await;
    if !listing.ok() {
        tracing::debug!("stdout: {}", redactor.redact(&listing.out));
        tracing::debug!("stderr: {}", redactor.redact(&listing.err));
        let reason = listing
            .spawn_error
            .unwrap_or_else(|| format!("exit code {}: {}", listing.code, listing.err));
        bail!("listing applications failed: {}", redactor.redact(&reason));
    }

    let aggregate = run_diffs(
        &listing.out,
        &config.dispatch_options(),
        diff_command,
        executor,
    )
    .await?;

    // Report. The rendered text is redacted before it leaves the process.
    let ctx = ReportContext {
        environment: config.environment.clone(),
        server_url: config.server_url.clone(),
        commit_sha: options.commit_sha.clone(),
        commit_url: commit_url(&options),
    };
    if let Some(comment) = render_comment(&aggregate, &ctx) {
        let comment = redactor.redact(&comment);
        match (&options.github_repo, options.pr_number) {
            (Some(repo), Some(number)) if !options.dry_run => {
                GithubPoster::new(&options.github_token)
                    .post_comment(repo, number, &comment)
                    .await
                    .context("Failed to post the diff comment")?;
                tracing::info!("posted diff comment to {repo}#{number}");
            }
            _ => {
                println!("{comment}");
            }
        }
    } else {
        tracing::info!("all apps clean; nothing to report");
    }

    let failed = aggregate.failed_count();
    if failed > 0 {
        eprintln!("argocd diff failed: encountered {failed} errors");
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn commit_url(options: &Options) -> Option<String> {
    match (&options.github_repo, options.pr_number, &options.commit_sha) {
        (Some(repo), Some(number), Some(sha)) => Some(format!(
            "https://github.com/{repo}/pull/{number}/commits/{sha}"
        )),
        _ => None,
    }
}

fn print_help() {
    println!(
        r#"argodiff v{}

Runs `argocd app diff` for every app in an ArgoCD inventory and posts the
aggregated diff report as a PR comment.

Usage:
  argodiff --server=<host> --repo=<url> [OPTIONS]

Options:
  --server=<host>           ArgoCD server host (env: ARGOCD_SERVER_URL)
  --auth-token=<token>      ArgoCD auth token (env: ARGOCD_TOKEN)
  --repo=<url>              Repository URL the app listing is filtered by
  --argocd-version=<v>      argocd release to download (default: v2.6.7)
  --argocd-bin=<path>       Use an existing argocd binary, skip download
  --arch=<arch>             Release architecture (env: ARCH, default: linux)
  --environment=<name>      Environment label for the report heading
  --extra-cli-args=<args>   Extra args appended to every argocd call
  --plaintext               Connect to the server without TLS
  --limit=<n>               Max concurrent diffs (default: 8)
  --deadline-secs=<n>       Fail tasks not started within this deadline
  --github-token=<token>    Token for posting the comment (env: GITHUB_TOKEN)
  --github-repo=<o/r>       GitHub repository to comment on
  --pr-number=<n>           Pull request number to comment on
  --commit-sha=<sha>        Head commit linked from the report
  --dry-run                 Print the comment instead of posting it
  -h, --help                Show this help
  -V, --version             Show version
"#,
        env!("CARGO_PKG_VERSION")
    );
}
