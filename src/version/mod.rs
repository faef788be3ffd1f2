pub mod cargo;
pub mod gradle;

use std::path::Path;

use anyhow::Result;

use crate::error::PivotalError;

/// Reads and writes the version identifier of one build layout.
pub trait VersionUpdater: Send + Sync {
    fn name(&self) -> &str;
    fn supports(&self) -> bool;
    fn current_version(&self) -> Result<String>;
    fn update_version(&self, version: &str) -> Result<()>;
}

/// Candidates in priority order.
pub fn candidates(repo_root: &Path) -> Vec<Box<dyn VersionUpdater>> {
    vec![
        Box::new(gradle::Gradle::new(repo_root)),
        Box::new(cargo::Cargo::new(repo_root)),
    ]
}

/// First candidate that supports the repository.
pub fn detect<'a>(
    updaters: &'a [Box<dyn VersionUpdater>],
    repo_root: &Path,
) -> Result<&'a dyn VersionUpdater> {
    updaters
        .iter()
        .find(|u| u.supports())
        .map(|u| u.as_ref())
        .ok_or_else(|| PivotalError::UnsupportedLayout(repo_root.to_path_buf()).into())
}
