//! Run configuration.
//!
//! One explicit struct, constructed once at startup and passed by reference
//! into the driver, dispatcher, and executor. Core logic never reads
//! configuration from ambient process state.

use std::time::Duration;

use argodiff_schema::AppRecord;

use crate::dispatch::DispatchOptions;

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct Config {
    /// ArgoCD server host, e.g. `argocd.example.com`.
    pub server_url: String,
    /// ArgoCD auth token. Appended to every CLI call; masked by the
    /// redactor in any displayed text.
    pub auth_token: String,
    /// Pinned argocd release version to install, e.g. `v2.6.7`.
    pub version: String,
    /// Environment label shown in the report heading.
    pub environment: String,
    /// Repository URL the inventory listing is filtered by.
    pub repo_url: String,
    /// Extra CLI args appended to every argocd call.
    pub extra_args: Vec<String>,
    /// Maximum concurrent diff invocations.
    pub limit: usize,
    /// Optional dispatch deadline; tasks not started in time are recorded
    /// as failed.
    pub deadline: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            auth_token: String::new(),
            version: "v2.6.7".to_string(),
            environment: String::new(),
            repo_url: String::new(),
            extra_args: Vec::new(),
            limit: DispatchOptions::default().limit,
            deadline: None,
        }
    }
}

impl Config {
    /// The dispatcher parameters this config implies.
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            limit: self.limit,
            deadline: self.deadline,
        }
    }

    /// The inventory listing command.
    pub fn list_command(&self) -> String {
        format!("app list --output=json --repo={}", self.repo_url)
    }
}

/// The per-app diff command: `app diff <name> --local=<path>`.
///
/// Apps without a `spec.source.path` are diffed against their configured
/// source instead; the `--local` flag is omitted rather than interpolating
/// a missing value.
pub fn diff_command(app: &AppRecord) -> String {
    match app.local_path() {
        Some(path) => format!("app diff {} --local={}", app.name(), path),
        None => format!("app diff {}", app.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argodiff_types::DomainValue;
    use serde_json::json;

    fn app(name: &str, path: Option<&str>) -> AppRecord {
        let mut doc = json!({"metadata": {"name": name}, "spec": {"source": {}}});
        if let Some(path) = path {
            doc["spec"]["source"]["path"] = json!(path);
        }
        AppRecord::new(DomainValue::from_json(&doc))
    }

    #[test]
    fn diff_command_matches_template() {
        assert_eq!(
            diff_command(&app("guestbook", Some("apps/guestbook"))),
            "app diff guestbook --local=apps/guestbook"
        );
    }

    #[test]
    fn diff_command_omits_local_without_path() {
        assert_eq!(diff_command(&app("billing", None)), "app diff billing");
    }

    #[test]
    fn list_command_filters_by_repo() {
        let config = Config {
            repo_url: "git@example.com:org/deploys.git".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.list_command(),
            "app list --output=json --repo=git@example.com:org/deploys.git"
        );
    }
}
