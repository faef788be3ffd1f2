use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::estimate::estimate_story;
use super::{Command, Options, Workspace};
use crate::branch::{branch_name, is_feature_branch};
use crate::config::BranchRecord;
use crate::model::story::StoryState;
use crate::story::CANDIDATE_LIMIT;

pub struct Start {
    options: Options,
}

impl Start {
    pub fn build(options: Options) -> Box<dyn Command> {
        Box::new(Self { options })
    }
}

#[async_trait]
impl Command for Start {
    async fn run(&mut self, ws: &mut Workspace, args: &[String]) -> Result<()> {
        let filter = args.first().map(String::as_str);
        let current = ws.vcs.branch_name().await?;
        let reuse_branch = self.options.use_current && is_feature_branch(&current);

        let explicit = self
            .options
            .story_id
            .or_else(|| filter.and_then(|f| f.parse().ok()));
        let story = if explicit.is_some() || reuse_branch {
            ws.story(explicit).await?
        } else {
            ws.select_story(filter, CANDIDATE_LIMIT).await?
        };
        ws.pretty_print(&story).await?;

        if reuse_branch {
            info!(branch = %current, "starting on the current branch");
        } else {
            let branch = branch_name(&story);
            ws.vcs.create_branch(&branch).await?;
            ws.config.record_branch(
                &branch,
                BranchRecord {
                    story_id: story.id,
                    root_branch: current,
                },
            )?;
            ws.ui.say(&format!("Switched to a new branch '{branch}'"));
        }

        let story = if story.needs_estimate() {
            estimate_story(ws, &story, None).await?
        } else {
            story
        };
        ws.mark(&story, StoryState::Started).await?;
        ws.ui.say(&format!("Started story #{}", story.id));
        Ok(())
    }
}
