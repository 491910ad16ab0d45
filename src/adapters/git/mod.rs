//! Git-backed registry source.
//!
//! A shallow clone of the registry repository is cached under a directory
//! named after a hash of the clone URL and then served by a
//! [`FilesystemAdapter`]. The first access in a run clones (depth 1, pinned
//! to the configured ref); later runs fetch only that ref and check out the
//! fetched head. Sync happens at most once per adapter instance.

pub mod command;

use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use self::command::{GIT_TIMEOUT_SECS, GitFailure, MAX_OUTPUT_BYTES, run_git};
use super::{AdapterFuture, DataAdapter, FilesystemAdapter};
use crate::artifact::{ArtifactBundle, ArtifactMeta, ArtifactType};
use crate::error::{ForgeError, Result};

pub const DEFAULT_REF: &str = "main";

#[derive(Debug, Clone)]
pub struct GitSourceOptions {
    pub url: String,
    pub git_ref: String,
    /// Name of an environment variable holding an HTTPS access token.
    pub token_env: Option<String>,
    /// Restrict the checkout to these paths (sparse checkout).
    pub sparse_paths: Vec<String>,
    pub timeout: Duration,
}

impl GitSourceOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            git_ref: DEFAULT_REF.to_string(),
            token_env: None,
            sparse_paths: Vec::new(),
            timeout: Duration::from_secs(GIT_TIMEOUT_SECS),
        }
    }
}

pub struct GitAdapter {
    name: String,
    options: GitSourceOptions,
    checkout_dir: PathBuf,
    inner: FilesystemAdapter,
    synced: OnceCell<()>,
}

impl GitAdapter {
    pub fn new(name: impl Into<String>, options: GitSourceOptions, cache_root: &Path) -> Self {
        let name = name.into();
        let checkout_dir = cache_root.join(cache_key(&options.url));
        let inner = FilesystemAdapter::new(name.clone(), &checkout_dir);
        Self {
            name,
            options,
            checkout_dir,
            inner,
            synced: OnceCell::new(),
        }
    }

    pub fn checkout_dir(&self) -> &Path {
        &self.checkout_dir
    }

    async fn ensure_synced(&self) -> Result<()> {
        self.synced.get_or_try_init(|| self.sync()).await?;
        Ok(())
    }

    async fn sync(&self) -> Result<()> {
        let url = self.clone_url(|key| std::env::var(key).ok());
        if tokio::fs::try_exists(self.checkout_dir.join(".git")).await? {
            self.fetch(&url).await
        } else {
            self.clone_fresh(&url).await
        }
    }

    async fn clone_fresh(&self, url: &str) -> Result<()> {
        if let Some(parent) = self.checkout_dir.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let dir = self.checkout_dir.to_string_lossy().into_owned();

        let mut args = vec![
            "clone".to_string(),
            "--depth".into(),
            "1".into(),
            "--branch".into(),
            self.options.git_ref.clone(),
        ];
        if !self.options.sparse_paths.is_empty() {
            args.push("--sparse".into());
        }
        args.push(url.to_string());
        args.push(dir);
        self.git(&args, None).await?;

        // Keep the token out of .git/config; fetches pass the URL explicitly.
        let plain = ["remote", "set-url", "origin", self.options.url.as_str()].map(String::from);
        self.git(&plain, Some(&self.checkout_dir)).await?;
        self.apply_sparse().await?;

        info!(
            adapter = %self.name,
            url = %redact(&self.options.url),
            git_ref = %self.options.git_ref,
            "cloned registry"
        );
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<()> {
        let fetch = [
            "fetch",
            "--depth",
            "1",
            url,
            self.options.git_ref.as_str(),
        ]
        .map(String::from);
        self.git(&fetch, Some(&self.checkout_dir)).await?;
        self.apply_sparse().await?;

        let checkout = ["checkout", "--force", "FETCH_HEAD"].map(String::from);
        self.git(&checkout, Some(&self.checkout_dir)).await?;
        debug!(adapter = %self.name, git_ref = %self.options.git_ref, "fetched registry");
        Ok(())
    }

    async fn apply_sparse(&self) -> Result<()> {
        if self.options.sparse_paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["sparse-checkout".to_string(), "set".into()];
        args.extend(self.options.sparse_paths.iter().cloned());
        self.git(&args, Some(&self.checkout_dir)).await?;
        Ok(())
    }

    async fn git(&self, args: &[String], cwd: Option<&Path>) -> Result<String> {
        let subcommand = args.first().map_or("git", String::as_str);
        match run_git(args, cwd, self.options.timeout, MAX_OUTPUT_BYTES).await {
            Ok(output) => Ok(output.stdout),
            Err(failure) => {
                let message = self.scrub(&format!("git {subcommand} {failure}"));
                let suggestion = self.suggestion_for(&failure);
                Err(ForgeError::Adapter {
                    adapter: self.name.clone(),
                    message,
                    suggestion: Some(suggestion),
                })
            }
        }
    }

    /// Clone URL with the access token injected, when one is configured and
    /// present. A missing token degrades to anonymous access.
    fn clone_url(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        let Some(var) = self.options.token_env.as_deref() else {
            return self.options.url.clone();
        };
        match lookup(var).filter(|token| !token.trim().is_empty()) {
            Some(token) => authenticated_url(&self.options.url, token.trim()),
            None => {
                warn!(
                    adapter = %self.name,
                    token_env = var,
                    "token variable is not set; cloning without authentication"
                );
                self.options.url.clone()
            }
        }
    }

    /// Removes any configured token from text that may reach logs or errors.
    fn scrub(&self, text: &str) -> String {
        let token = self
            .options
            .token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|t| !t.trim().is_empty());
        match token {
            Some(token) => text.replace(token.trim(), "***"),
            None => text.to_string(),
        }
    }

    fn suggestion_for(&self, failure: &GitFailure) -> String {
        let url = redact(&self.options.url);
        match failure {
            GitFailure::Spawn(_) => "install git and make sure it is on PATH".into(),
            GitFailure::TimedOut(_) => format!("check network access to {url}"),
            GitFailure::OutputTooLarge => {
                "restrict the checkout with `sparse` paths in forge.toml".into()
            }
            GitFailure::Exit { stderr, .. } => {
                let lower = stderr.to_ascii_lowercase();
                if lower.contains("authentication") || lower.contains("could not read username") {
                    match &self.options.token_env {
                        Some(var) => format!("export {var} with a token that can read {url}"),
                        None => format!("set `token_env` for {url} in forge.toml"),
                    }
                } else if lower.contains("not found") && lower.contains("branch") {
                    format!("check that ref '{}' exists in {url}", self.options.git_ref)
                } else {
                    format!("verify that {url} is a reachable git repository")
                }
            }
            GitFailure::Io(_) => "retry the command".into(),
        }
    }
}

impl DataAdapter for GitAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self, kind: ArtifactType) -> AdapterFuture<'_, Vec<ArtifactMeta>> {
        Box::pin(async move {
            self.ensure_synced().await?;
            self.inner.list(kind).await
        })
    }

    fn read<'a>(&'a self, kind: ArtifactType, id: &'a str) -> AdapterFuture<'a, ArtifactBundle> {
        Box::pin(async move {
            self.ensure_synced().await?;
            self.inner.read(kind, id).await
        })
    }

    fn exists<'a>(&'a self, kind: ArtifactType, id: &'a str) -> AdapterFuture<'a, bool> {
        Box::pin(async move {
            self.ensure_synced().await?;
            self.inner.exists(kind, id).await
        })
    }

    /// Writes into the working copy only; nothing is committed or pushed.
    fn write<'a>(
        &'a self,
        kind: ArtifactType,
        id: &'a str,
        bundle: &'a ArtifactBundle,
    ) -> AdapterFuture<'a, ()> {
        Box::pin(async move {
            self.ensure_synced().await?;
            self.inner.write(kind, id, bundle).await
        })
    }
}

/// Deterministic cache directory name for a clone URL.
pub fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(url.trim().as_bytes());
    hex::encode(&digest[..8])
}

/// Injects `token` into an HTTPS URL. Other schemes are returned unchanged.
pub fn authenticated_url(url: &str, token: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.scheme() != "https" {
        return url.to_string();
    }
    if parsed.set_username("x-access-token").is_err() || parsed.set_password(Some(token)).is_err() {
        return url.to_string();
    }
    parsed.to_string()
}

/// URL with any embedded password replaced by `***`.
pub fn redact(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}
