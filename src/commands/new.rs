use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::{Command, Options, Workspace};
use crate::interaction::ask_required;
use crate::model::story::StoryType;
use crate::tracker::NewStory;

pub struct New;

impl New {
    pub fn build(_options: Options) -> Box<dyn Command> {
        Box::new(Self)
    }
}

fn creatable_type(arg: &str) -> Option<StoryType> {
    arg.parse()
        .ok()
        .filter(|t| StoryType::CREATABLE.contains(t))
}

async fn choose_type(ws: &Workspace) -> Result<StoryType> {
    let choices: Vec<String> = StoryType::CREATABLE
        .iter()
        .map(|t| t.as_str().to_string())
        .collect();
    let index = ws.ui.choose("Choose story type", &choices).await?;
    StoryType::CREATABLE
        .get(index)
        .copied()
        .context("Story type choice out of range")
}

#[async_trait]
impl Command for New {
    async fn run(&mut self, ws: &mut Workspace, args: &[String]) -> Result<()> {
        let (story_type, words) = match args.first().and_then(|a| creatable_type(a)) {
            Some(story_type) => (story_type, &args[1..]),
            None => (choose_type(ws).await?, args),
        };

        let name = words.join(" ").trim().to_string();
        let name = if name.is_empty() {
            ask_required(ws.ui.as_ref(), "Enter story name:", "story name").await?
        } else {
            name
        };

        let story = ws
            .tracker
            .create_story(ws.project_id, &NewStory { name, story_type })
            .await?;
        info!(story = story.id, %story_type, "created story");
        ws.pretty_print(&story).await?;
        Ok(())
    }
}
