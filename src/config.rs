use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::interaction::{ask_required, Interaction};
use crate::tracker::Tracker;

pub const TOKEN_ENV: &str = "PIVOTAL_API_TOKEN";
const DEFAULT_REMOTE: &str = "origin";
const DEFAULT_BASE_BRANCH: &str = "main";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub branches: BTreeMap<String, BranchRecord>,
}

/// What `start` remembers about a feature branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecord {
    pub story_id: u64,
    pub root_branch: String,
}

/// Repository settings in `.git/pivotal.toml` layered over the user's
/// `~/.pivotal/config.toml`. The token can also come from the environment.
#[derive(Debug)]
pub struct Configuration {
    repo_path: PathBuf,
    repo: Settings,
    user_path: Option<PathBuf>,
    user: Settings,
    env_token: Option<String>,
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pivotal").join("config.toml"))
}

pub fn repo_config_path(repo_root: &Path) -> PathBuf {
    repo_root.join(".git").join("pivotal.toml")
}

fn read_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(settings)?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    debug!(path = %path.display(), "saved settings");
    Ok(())
}

impl Configuration {
    pub fn load(repo_root: &Path) -> Result<Self> {
        let env_token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self::from_paths(repo_config_path(repo_root), user_config_path(), env_token)
    }

    pub fn from_paths(
        repo_path: PathBuf,
        user_path: Option<PathBuf>,
        env_token: Option<String>,
    ) -> Result<Self> {
        let repo = read_settings(&repo_path)?;
        let user = match &user_path {
            Some(path) => read_settings(path)?,
            None => Settings::default(),
        };
        Ok(Self {
            repo_path,
            repo,
            user_path,
            user,
            env_token,
        })
    }

    pub fn remote(&self) -> &str {
        self.repo.remote.as_deref().unwrap_or(DEFAULT_REMOTE)
    }

    pub fn base_branch(&self) -> &str {
        self.repo
            .base_branch
            .as_deref()
            .unwrap_or(DEFAULT_BASE_BRANCH)
    }

    pub fn stored_api_token(&self) -> Option<&str> {
        self.env_token
            .as_deref()
            .or(self.repo.api_token.as_deref())
            .or(self.user.api_token.as_deref())
    }

    pub async fn api_token(&mut self, ui: &dyn Interaction) -> Result<String> {
        if let Some(token) = self.stored_api_token() {
            return Ok(token.to_string());
        }
        let token = ask_required(
            ui,
            "Pivotal API Token (found at https://www.pivotaltracker.com/profile):",
            "API token",
        )
        .await?;
        match &self.user_path {
            Some(path) => {
                self.user.api_token = Some(token.clone());
                write_settings(path, &self.user)?;
            }
            None => {
                self.repo.api_token = Some(token.clone());
                write_settings(&self.repo_path, &self.repo)?;
            }
        }
        Ok(token)
    }

    pub async fn project_id(&mut self, ui: &dyn Interaction, tracker: &dyn Tracker) -> Result<u64> {
        if let Some(id) = self.repo.project_id {
            return Ok(id);
        }
        let mut projects = tracker.projects().await?;
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        let choices: Vec<String> = projects
            .iter()
            .map(|p| format!("{} ({})", p.name, p.id))
            .collect();
        let index = ui.choose("Choose a project", &choices).await?;
        let id = projects[index].id;
        self.repo.project_id = Some(id);
        write_settings(&self.repo_path, &self.repo)?;
        Ok(id)
    }

    pub fn branch(&self, name: &str) -> Option<&BranchRecord> {
        self.repo.branches.get(name)
    }

    pub fn branches(&self) -> impl Iterator<Item = (&String, &BranchRecord)> {
        self.repo.branches.iter()
    }

    pub fn record_branch(&mut self, name: &str, record: BranchRecord) -> Result<()> {
        self.repo.branches.insert(name.to_string(), record);
        write_settings(&self.repo_path, &self.repo)
    }

    pub fn forget_branch(&mut self, name: &str) -> Result<()> {
        if self.repo.branches.remove(name).is_some() {
            write_settings(&self.repo_path, &self.repo)?;
        }
        Ok(())
    }
}
