//! argocd binary installation.
//!
//! Downloads the pinned release binary once at startup and marks it
//! executable. Everything after setup goes through [`crate::ArgoCli`].

use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// Release asset URL for a pinned version and architecture.
pub fn release_url(version: &str, arch: &str) -> String {
    format!(
        "https://github.com/argoproj/argo-cd/releases/download/{version}/argocd-{arch}-amd64"
    )
}

/// Download the argocd binary to `dest` and make it executable.
pub async fn install_argocd(
    version: &str,
    arch: &str,
    dest: &Path,
) -> Result<PathBuf, EngineError> {
    let url = release_url(version, arch);
    tracing::info!("downloading argocd cli from: {url}");

    let response = reqwest::get(&url).await?.error_for_status()?;
    let bytes = response.bytes().await?;

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(dest, &bytes).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = tokio::fs::metadata(dest).await?.permissions();
        permissions.set_mode(0o755);
        tokio::fs::set_permissions(dest, permissions).await?;
    }

    tracing::info!("download complete");
    Ok(dest.to_path_buf())
}
