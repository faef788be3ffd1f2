use anyhow::Result;
use async_trait::async_trait;

use super::{Command, Options, Workspace};

pub struct Info {
    options: Options,
}

impl Info {
    pub fn build(options: Options) -> Box<dyn Command> {
        Box::new(Self { options })
    }
}

#[async_trait]
impl Command for Info {
    async fn run(&mut self, ws: &mut Workspace, _args: &[String]) -> Result<()> {
        let story = ws.story(self.options.story_id).await?;
        ws.pretty_print(&story).await
    }
}
