use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::{Command, Options, Workspace};
use crate::error::PivotalError;
use crate::model::story::Story;
use crate::tracker::StoryUpdate;

pub struct Estimate {
    options: Options,
}

impl Estimate {
    pub fn build(options: Options) -> Box<dyn Command> {
        Box::new(Self { options })
    }
}

/// Sets the estimate to `points`, or to a value picked from the project's
/// point scale. Values outside the scale are rejected.
pub async fn estimate_story(ws: &Workspace, story: &Story, points: Option<&str>) -> Result<Story> {
    let project = ws.tracker.project(ws.project_id).await?;
    let scale = project.points();
    let estimate = match points {
        Some(raw) => {
            let value: Option<u32> = raw.trim().parse().ok();
            match value.filter(|v| scale.contains(v)) {
                Some(v) => v,
                None => {
                    let allowed: Vec<String> = scale.iter().map(u32::to_string).collect();
                    return Err(PivotalError::InvalidOption(format!(
                        "estimate {raw} is not one of {}",
                        allowed.join(", ")
                    ))
                    .into());
                }
            }
        }
        None => {
            let choices: Vec<String> = scale.iter().map(u32::to_string).collect();
            let index = ws
                .ui
                .choose(&format!("Story #{} needs an estimate", story.id), &choices)
                .await?;
            *scale.get(index).context("Estimate choice out of range")?
        }
    };
    info!(story = story.id, estimate, "estimating story");
    let update = StoryUpdate {
        estimate: Some(estimate),
        ..Default::default()
    };
    ws.tracker.update_story(ws.project_id, story.id, &update).await
}

#[async_trait]
impl Command for Estimate {
    async fn run(&mut self, ws: &mut Workspace, args: &[String]) -> Result<()> {
        let story = ws.story(self.options.story_id).await?;
        let updated = estimate_story(ws, &story, args.first().map(String::as_str)).await?;
        if let Some(points) = updated.estimate {
            ws.ui
                .say(&format!("Estimated story #{} at {points} points", story.id));
        }
        Ok(())
    }
}
