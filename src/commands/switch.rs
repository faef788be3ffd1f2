use anyhow::Result;
use async_trait::async_trait;

use super::{Command, Options, Workspace};
use crate::branch::story_id_from_branch;
use crate::error::PivotalError;

pub struct Switch {
    options: Options,
}

impl Switch {
    pub fn build(options: Options) -> Box<dyn Command> {
        Box::new(Self { options })
    }
}

/// Local branch of a story: a recorded branch first, then any `<id>-...` branch.
fn branch_for(ws: &Workspace, local: &[String], story_id: u64) -> Option<String> {
    let recorded = ws
        .config
        .branches()
        .filter(|(_, record)| record.story_id == story_id)
        .map(|(name, _)| name)
        .find(|name| local.contains(name));
    recorded
        .or_else(|| {
            local
                .iter()
                .find(|b| story_id_from_branch(b) == Some(story_id))
        })
        .cloned()
}

#[async_trait]
impl Command for Switch {
    async fn run(&mut self, ws: &mut Workspace, args: &[String]) -> Result<()> {
        let story_id = match (self.options.story_id, args.first()) {
            (Some(id), _) => id,
            (None, Some(raw)) => raw
                .parse()
                .map_err(|_| PivotalError::InvalidOption(format!("story id {raw}")))?,
            (None, None) => return Err(PivotalError::MissingArgument("story id".into()).into()),
        };
        let local = ws.vcs.local_branches().await?;
        let Some(branch) = branch_for(ws, &local, story_id) else {
            return Err(PivotalError::NoChoices(format!(
                "No local branch for story #{story_id}; start it first"
            ))
            .into());
        };
        ws.vcs.checkout(&branch).await?;
        ws.ui.say(&format!("Switched to branch '{branch}'"));
        Ok(())
    }
}
