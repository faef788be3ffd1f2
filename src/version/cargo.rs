use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::VersionUpdater;

/// `version` key of the `[package]` table in `Cargo.toml`. Edits the line in
/// place so comments and formatting survive.
pub struct Cargo {
    manifest: PathBuf,
}

impl Cargo {
    pub fn new(repo_root: &Path) -> Self {
        Self {
            manifest: repo_root.join("Cargo.toml"),
        }
    }

    fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.manifest)
            .with_context(|| format!("Failed to read {}", self.manifest.display()))
    }
}

/// Line index and value of the package version.
fn package_version(contents: &str) -> Option<(usize, String)> {
    let mut in_package = false;
    for (index, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_package = trimmed == "[package]";
            continue;
        }
        if !in_package {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        if key.trim() != "version" {
            continue;
        }
        // `version.workspace = true` has no literal to bump.
        let value = value.trim();
        if let Some(literal) = value.strip_prefix('"').and_then(|v| v.split('"').next()) {
            return Some((index, literal.to_string()));
        }
    }
    None
}

impl VersionUpdater for Cargo {
    fn name(&self) -> &str {
        "cargo"
    }

    fn supports(&self) -> bool {
        self.read()
            .map(|contents| package_version(&contents).is_some())
            .unwrap_or(false)
    }

    fn current_version(&self) -> Result<String> {
        let contents = self.read()?;
        package_version(&contents)
            .map(|(_, version)| version)
            .with_context(|| format!("No package version in {}", self.manifest.display()))
    }

    fn update_version(&self, version: &str) -> Result<()> {
        let contents = self.read()?;
        let (target, _) = package_version(&contents)
            .with_context(|| format!("No package version in {}", self.manifest.display()))?;
        let mut updated: Vec<String> = contents
            .lines()
            .enumerate()
            .map(|(index, line)| {
                if index == target {
                    let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
                    format!("{indent}version = \"{version}\"")
                } else {
                    line.to_string()
                }
            })
            .collect();
        if contents.ends_with('\n') {
            updated.push(String::new());
        }
        std::fs::write(&self.manifest, updated.join("\n"))
            .with_context(|| format!("Failed to write {}", self.manifest.display()))
    }
}
