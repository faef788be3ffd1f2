use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::{Command, Options, Workspace};
use crate::interaction::ask_required;

pub struct Comment {
    options: Options,
}

impl Comment {
    pub fn build(options: Options) -> Box<dyn Command> {
        Box::new(Self { options })
    }
}

#[async_trait]
impl Command for Comment {
    async fn run(&mut self, ws: &mut Workspace, args: &[String]) -> Result<()> {
        let story = ws.story(self.options.story_id).await?;
        let text = args.join(" ").trim().to_string();
        let text = if text.is_empty() {
            ask_required(ws.ui.as_ref(), "Enter comment:", "comment").await?
        } else {
            text
        };
        ws.tracker
            .add_comment(ws.project_id, story.id, &text)
            .await?;
        info!(story = story.id, "added comment");
        ws.ui.say(&format!("Commented on story #{}", story.id));
        Ok(())
    }
}
