use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{Command, Options, Workspace};

pub struct Open {
    options: Options,
}

impl Open {
    pub fn build(options: Options) -> Box<dyn Command> {
        Box::new(Self { options })
    }
}

#[async_trait]
impl Command for Open {
    async fn run(&mut self, ws: &mut Workspace, _args: &[String]) -> Result<()> {
        let story = ws.story(self.options.story_id).await?;
        if story.url.is_empty() {
            bail!("Story #{} has no URL", story.id);
        }
        ws.ui.open_url(&story.url).await
    }
}
