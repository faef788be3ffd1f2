use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::info;

use super::{Command, Options, Workspace};
use crate::model::story::{Story, StoryState};

pub struct Finish {
    options: Options,
}

impl Finish {
    pub fn build(options: Options) -> Box<dyn Command> {
        Box::new(Self { options })
    }

    fn trailer(&self, story: &Story) -> String {
        if self.options.no_complete {
            format!("[#{}]", story.id)
        } else {
            format!("[Completes #{}]", story.id)
        }
    }

    async fn complete(&self, ws: &Workspace, story: &Story) -> Result<()> {
        if self.options.no_complete {
            return Ok(());
        }
        ws.mark(story, StoryState::Finished).await?;
        ws.ui.say(&format!("Finished story #{}", story.id));
        Ok(())
    }

    async fn open_pull_request(
        &self,
        ws: &Workspace,
        story: &Story,
        branch: &str,
        root: &str,
    ) -> Result<()> {
        ws.vcs.push_upstream(branch).await?;
        let title = format!("[#{}] {}", story.id, story.name);
        let body = format!("{}\n\n{}", story.url, self.trailer(story));
        let url = ws.vcs.create_pull_request(root, branch, &title, &body).await?;
        ws.ui.say(&format!("Opened pull request {url}"));
        Ok(())
    }

    async fn merge(&self, ws: &Workspace, story: &Story, branch: &str, root: &str) -> Result<()> {
        ws.vcs.ensure_clean().await?;
        ws.vcs.checkout(root).await?;
        let message = format!("Merge {branch} to {root}\n\n{}", self.trailer(story));
        ws.vcs.merge(branch, &message).await?;
        ws.vcs.push(&[root]).await?;
        info!(%branch, %root, "merged feature branch");
        Ok(())
    }

    async fn delete_branch(&self, ws: &mut Workspace, branch: &str) -> Result<()> {
        ws.vcs.delete_branch(branch).await?;
        if ws.vcs.remote_branch_exists(branch).await? {
            ws.vcs.delete_remote_branch(branch).await?;
        }
        ws.config.forget_branch(branch)?;
        Ok(())
    }
}

#[async_trait]
impl Command for Finish {
    async fn run(&mut self, ws: &mut Workspace, _args: &[String]) -> Result<()> {
        let branch = ws.vcs.branch_name().await?;
        let root = ws.root_branch(&branch);
        let merging = !self.options.no_merge;

        // Nothing to merge or propose from the root itself
        if branch == root && (merging || self.options.pull_request) {
            bail!("Already on {root}; check out the feature branch to finish it");
        }
        let story = ws.story(self.options.story_id).await?;

        if self.options.pull_request {
            self.open_pull_request(ws, &story, &branch, &root).await?;
            return self.complete(ws, &story).await;
        }

        if merging {
            self.merge(ws, &story, &branch, &root).await?;
        }
        self.complete(ws, &story).await?;

        // Only a merged branch is safe to delete
        if !self.options.no_delete {
            if merging {
                self.delete_branch(ws, &branch).await?;
            } else {
                ws.ui
                    .say(&format!("Keeping branch {branch} because it was not merged"));
            }
        }
        Ok(())
    }
}
