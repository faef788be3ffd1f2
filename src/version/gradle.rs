use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::VersionUpdater;

/// `version=` entry of `gradle.properties`.
pub struct Gradle {
    properties: PathBuf,
}

impl Gradle {
    pub fn new(repo_root: &Path) -> Self {
        Self {
            properties: repo_root.join("gradle.properties"),
        }
    }

    fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.properties)
            .with_context(|| format!("Failed to read {}", self.properties.display()))
    }
}

fn version_value(line: &str) -> Option<&str> {
    let (key, value) = line.split_once('=')?;
    (key.trim() == "version").then(|| value.trim())
}

impl VersionUpdater for Gradle {
    fn name(&self) -> &str {
        "gradle"
    }

    fn supports(&self) -> bool {
        self.read()
            .map(|contents| contents.lines().any(|l| version_value(l).is_some()))
            .unwrap_or(false)
    }

    fn current_version(&self) -> Result<String> {
        let contents = self.read()?;
        contents
            .lines()
            .find_map(version_value)
            .map(str::to_string)
            .with_context(|| format!("No version in {}", self.properties.display()))
    }

    fn update_version(&self, version: &str) -> Result<()> {
        let contents = self.read()?;
        let mut updated: Vec<String> = contents
            .lines()
            .map(|line| match version_value(line) {
                Some(_) => format!("version={version}"),
                None => line.to_string(),
            })
            .collect();
        if contents.ends_with('\n') {
            updated.push(String::new());
        }
        std::fs::write(&self.properties, updated.join("\n"))
            .with_context(|| format!("Failed to write {}", self.properties.display()))
    }
}
