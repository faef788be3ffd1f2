use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::{Command, Options, Workspace};
use crate::git::release_tag;
use crate::interaction::ask_required;
use crate::version;

pub struct Release {
    options: Options,
}

impl Release {
    pub fn build(options: Options) -> Box<dyn Command> {
        Box::new(Self { options })
    }
}

#[async_trait]
impl Command for Release {
    async fn run(&mut self, ws: &mut Workspace, _args: &[String]) -> Result<()> {
        let story = match self.options.story_id {
            Some(id) => ws.story(Some(id)).await?,
            None => ws.select_story(Some("release"), 1).await?,
        };
        ws.pretty_print(&story).await?;

        let updater = version::detect(&ws.updaters, &ws.repo_root)?;
        // Release commits use --all; the tree must start clean
        ws.vcs.ensure_clean().await?;
        let current = updater.current_version()?;
        let release = ask_required(
            ws.ui.as_ref(),
            &format!("Enter release version (current: {current}):"),
            "release version",
        )
        .await?;
        let next = ask_required(
            ws.ui.as_ref(),
            &format!("Enter next development version (current: {release}):"),
            "next development version",
        )
        .await?;
        info!(updater = updater.name(), %release, %next, "releasing");

        // Tag the release version, then move on to the next one
        updater.update_version(&release)?;
        ws.vcs.create_release_tag(&release, &story).await?;
        updater.update_version(&next)?;
        ws.vcs
            .create_commit(&format!("{next} Development"), &story)
            .await?;

        let branch = ws.vcs.branch_name().await?;
        let tag = release_tag(&release);
        ws.vcs.push(&[branch.as_str(), tag.as_str()]).await?;
        ws.ui.say(&format!("Released {tag}; now on {next}"));
        Ok(())
    }
}
