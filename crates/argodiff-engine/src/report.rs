//! Report rendering and publication.
//!
//! The engine's obligation ends at handing over the finalized aggregate;
//! this module is the reporting collaborator that renders it as a Markdown
//! PR comment and posts it. Clean apps are omitted: a comment is only
//! worth posting when something changed or failed.

use reqwest::header::USER_AGENT;

use argodiff_types::Outcome;

use crate::aggregate::Aggregate;
use crate::error::EngineError;

/// Context the rendered comment links back to.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    /// Environment label, e.g. `production`.
    pub environment: String,
    /// ArgoCD server host, used for per-app links.
    pub server_url: String,
    /// Head commit of the change under review.
    pub commit_sha: Option<String>,
    /// Link target for the commit reference.
    pub commit_url: Option<String>,
}

/// Render the aggregate as a Markdown comment.
///
/// Returns `None` when every app came back clean, since there is nothing
/// worth posting. The returned text is unredacted; pass it through a
/// [`crate::Redactor`] before it leaves the process.
pub fn render_comment(aggregate: &Aggregate, ctx: &ReportContext) -> Option<String> {
    let reportable: Vec<_> = aggregate
        .entries()
        .iter()
        .filter(|(_, outcome)| !matches!(outcome, Outcome::Clean))
        .collect();
    if reportable.is_empty() {
        return None;
    }

    let mut out = String::new();
    match (&ctx.commit_sha, &ctx.commit_url) {
        (Some(sha), Some(url)) => {
            let short = &sha[..sha.len().min(7)];
            out.push_str(&format!(
                "## ArgoCD Diff on {} for commit [`{short}`]({url})\n",
                ctx.environment
            ));
        }
        _ => {
            out.push_str(&format!("## ArgoCD Diff on {}\n", ctx.environment));
        }
    }

    for (task, outcome) in reportable {
        let failed = outcome.is_failure();
        out.push_str(&format!(
            "\nApp: [`{name}`](https://{server}/applications/{name})\n",
            name = task.name,
            server = ctx.server_url
        ));
        out.push_str(&format!(
            "YAML generation: {}\n",
            if failed { "Error 🛑" } else { "Success 🟢" }
        ));
        out.push_str(&format!(
            "App sync status: {}\n",
            if task.app.is_synced() {
                "Synced ✅"
            } else {
                "Out of Sync ⚠️"
            }
        ));

        match outcome {
            Outcome::Failed { stderr, detail } => {
                out.push_str(&format!("\n**`stderr:`**\n```\n{stderr}\n```\n"));
                let detail = serde_json::to_string_pretty(detail)
                    .unwrap_or_else(|_| format!("{detail:?}"));
                out.push_str(&format!("\n**`error:`**\n```json\n{detail}\n```\n"));
            }
            Outcome::DiffFound { diff } => {
                out.push_str(&format!("\n<details>\n\n```diff\n{diff}\n```\n\n</details>\n"));
            }
            Outcome::Clean => {}
        }
        out.push_str("\n---\n");
    }

    out.push_str(
        "\n| Legend | Status |\n\
         | :---:  | :---   |\n\
         | ✅     | The app is synced in ArgoCD, and diffs you see are solely from this PR. |\n\
         | ⚠️      | The app is out-of-sync in ArgoCD, and the diffs you see include those changes plus any from this PR. |\n\
         | 🛑     | There was an error generating the ArgoCD diffs due to changes in this PR. |\n",
    );

    Some(out)
}

/// Posts rendered comments to the GitHub issue-comment endpoint.
pub struct GithubPoster {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl GithubPoster {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            api_base: "https://api.github.com".to_string(),
        }
    }

    /// Point at a different API base (tests, GitHub Enterprise).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Post `body` as a new comment on `owner/repo#number`.
    pub async fn post_comment(
        &self,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), EngineError> {
        let url = format!("{}/repos/{}/issues/{}/comments", self.api_base, repo, number);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(USER_AGENT, "argodiff")
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Post(format!("{url} returned {status}")));
        }
        Ok(())
    }
}
