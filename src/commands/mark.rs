use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{Command, Options, Workspace};
use crate::error::PivotalError;
use crate::model::story::StoryState;

pub struct Mark {
    options: Options,
}

impl Mark {
    pub fn build(options: Options) -> Box<dyn Command> {
        Box::new(Self { options })
    }
}

async fn choose_state(ws: &Workspace) -> Result<StoryState> {
    let choices: Vec<String> = StoryState::MARKABLE
        .iter()
        .map(|s| s.as_str().to_string())
        .collect();
    let index = ws.ui.choose("Choose story state", &choices).await?;
    StoryState::MARKABLE
        .get(index)
        .copied()
        .context("State choice out of range")
}

#[async_trait]
impl Command for Mark {
    async fn run(&mut self, ws: &mut Workspace, args: &[String]) -> Result<()> {
        let story = ws.story(self.options.story_id).await?;
        let state = match args.first() {
            Some(raw) => {
                let state: StoryState = raw.parse().map_err(PivotalError::InvalidOption)?;
                if !StoryState::MARKABLE.contains(&state) {
                    return Err(PivotalError::InvalidOption(format!(
                        "stories cannot be marked {state}"
                    ))
                    .into());
                }
                state
            }
            None => choose_state(ws).await?,
        };
        let updated = ws.mark(&story, state).await?;
        ws.ui
            .say(&format!("Marked story #{} {}", updated.id, updated.current_state));
        Ok(())
    }
}
