use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::PivotalError;
use crate::model::story::Story;

/// Local source-control operations used by the commands.
#[async_trait]
pub trait Vcs: Send + Sync {
    async fn repository_root(&self) -> Result<PathBuf>;
    async fn branch_name(&self) -> Result<String>;
    async fn local_branches(&self) -> Result<Vec<String>>;
    /// Creates `name` from the current branch and checks it out.
    async fn create_branch(&self, name: &str) -> Result<()>;
    async fn checkout(&self, name: &str) -> Result<()>;
    async fn delete_branch(&self, name: &str) -> Result<()>;
    async fn remote_branch_exists(&self, name: &str) -> Result<bool>;
    async fn delete_remote_branch(&self, name: &str) -> Result<()>;
    async fn ensure_clean(&self) -> Result<()>;
    async fn merge(&self, branch: &str, message: &str) -> Result<()>;
    async fn create_commit(&self, message: &str, story: &Story) -> Result<()>;
    async fn create_release_tag(&self, version: &str, story: &Story) -> Result<()>;
    async fn push(&self, refs: &[&str]) -> Result<()>;
    async fn push_upstream(&self, branch: &str) -> Result<()>;
    /// Returns the pull request URL.
    async fn create_pull_request(&self, base: &str, head: &str, title: &str, body: &str)
        -> Result<String>;
}

/// Commit message body line linking a change to its story.
pub fn story_reference(message: &str, story: &Story) -> String {
    format!("{message}\n\n[#{}]", story.id)
}

pub fn release_tag(version: &str) -> String {
    format!("v{version}")
}

pub struct GitCli {
    cwd: PathBuf,
    remote: String,
}

impl GitCli {
    pub fn new(cwd: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            cwd: cwd.into(),
            remote: remote.into(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.cwd, args).await
    }
}

async fn run_git(cwd: &Path, args: &[&str]) -> Result<String> {
    debug!(cwd = %cwd.display(), "git {}", args.join(" "));
    let output = tokio::process::Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .await
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };
        return Err(PivotalError::Git {
            command: args.first().unwrap_or(&"").to_string(),
            message,
        }
        .into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[async_trait]
impl Vcs for GitCli {
    async fn repository_root(&self) -> Result<PathBuf> {
        let root = self
            .git(&["rev-parse", "--show-toplevel"])
            .await
            .context("Not inside a git repository")?;
        Ok(PathBuf::from(root))
    }

    async fn branch_name(&self) -> Result<String> {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"]).await
    }

    async fn local_branches(&self) -> Result<Vec<String>> {
        let out = self
            .git(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])
            .await?;
        Ok(out.lines().map(str::to_string).collect())
    }

    async fn create_branch(&self, name: &str) -> Result<()> {
        info!(branch = name, "creating branch");
        self.git(&["checkout", "--quiet", "-b", name]).await?;
        Ok(())
    }

    async fn checkout(&self, name: &str) -> Result<()> {
        self.git(&["checkout", "--quiet", name]).await?;
        Ok(())
    }

    async fn delete_branch(&self, name: &str) -> Result<()> {
        info!(branch = name, "deleting branch");
        self.git(&["branch", "--quiet", "-d", name]).await?;
        Ok(())
    }

    async fn remote_branch_exists(&self, name: &str) -> Result<bool> {
        let tracking = format!("refs/remotes/{}/{name}", self.remote);
        let output = tokio::process::Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", &tracking])
            .current_dir(&self.cwd)
            .output()
            .await
            .context("Failed to run git rev-parse")?;
        Ok(output.status.success())
    }

    async fn delete_remote_branch(&self, name: &str) -> Result<()> {
        info!(remote = %self.remote, branch = name, "deleting remote branch");
        self.git(&["push", "--quiet", "--delete", &self.remote, name])
            .await?;
        Ok(())
    }

    async fn ensure_clean(&self) -> Result<()> {
        let status = self
            .git(&["status", "--porcelain", "--untracked-files=no"])
            .await?;
        if !status.is_empty() {
            return Err(PivotalError::DirtyWorkingTree.into());
        }
        Ok(())
    }

    async fn merge(&self, branch: &str, message: &str) -> Result<()> {
        info!(branch, "merging");
        self.git(&["merge", "--quiet", "--no-ff", "-m", message, branch])
            .await
            .with_context(|| {
                format!("Merge of {branch} stopped; resolve the conflicts or run `git merge --abort`")
            })?;
        Ok(())
    }

    async fn create_commit(&self, message: &str, story: &Story) -> Result<()> {
        let message = story_reference(message, story);
        self.git(&[
            "commit",
            "--quiet",
            "--all",
            "--allow-empty",
            "--message",
            &message,
        ])
        .await?;
        Ok(())
    }

    async fn create_release_tag(&self, version: &str, story: &Story) -> Result<()> {
        let root_branch = self.branch_name().await?;
        let release_branch = format!("pivotal-release/{version}");
        let tag = release_tag(version);
        info!(%tag, "tagging release");

        self.git(&["checkout", "--quiet", "-b", &release_branch])
            .await?;
        let message = format!("{version} Release");
        self.create_commit(&message, story).await?;
        self.git(&[
            "tag",
            "--annotate",
            "--message",
            &story_reference(&message, story),
            &tag,
        ])
        .await?;
        self.git(&["checkout", "--quiet", &root_branch]).await?;
        self.git(&["branch", "--quiet", "-D", &release_branch])
            .await?;
        Ok(())
    }

    async fn push(&self, refs: &[&str]) -> Result<()> {
        info!(remote = %self.remote, ?refs, "pushing");
        let mut args = vec!["push", "--quiet", self.remote.as_str()];
        args.extend_from_slice(refs);
        self.git(&args).await?;
        Ok(())
    }

    async fn push_upstream(&self, branch: &str) -> Result<()> {
        info!(remote = %self.remote, branch, "pushing with upstream");
        self.git(&["push", "--quiet", "--set-upstream", &self.remote, branch])
            .await?;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<String> {
        info!(base, head, "opening pull request");
        let output = tokio::process::Command::new("gh")
            .args([
                "pr", "create", "--base", base, "--head", head, "--title", title, "--body", body,
            ])
            .current_dir(&self.cwd)
            .output()
            .await
            .context("Failed to run gh CLI")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("gh pr create failed: {}", stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
