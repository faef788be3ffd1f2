use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::{Command, Options, Workspace};
use crate::error::PivotalError;
use crate::model::story::Person;
use crate::tracker::StoryUpdate;

pub struct Assign {
    options: Options,
}

impl Assign {
    pub fn build(options: Options) -> Box<dyn Command> {
        Box::new(Self { options })
    }
}

/// Narrows `members` by `query`; one match is taken as is, several are offered.
async fn pick_member(ws: &Workspace, members: Vec<Person>, query: &str) -> Result<Person> {
    let mut candidates: Vec<Person> = if query.is_empty() {
        members
    } else {
        members.into_iter().filter(|m| m.matches(query)).collect()
    };
    if candidates.is_empty() {
        let message = if query.is_empty() {
            "The project has no members".to_string()
        } else {
            format!("No project member matches {query}")
        };
        return Err(PivotalError::NoChoices(message).into());
    }
    if candidates.len() == 1 && !query.is_empty() {
        return Ok(candidates.swap_remove(0));
    }
    let choices: Vec<String> = candidates
        .iter()
        .map(|m| format!("{} ({})", m.name, m.initials))
        .collect();
    let index = ws.ui.choose("Choose owner", &choices).await?;
    candidates
        .into_iter()
        .nth(index)
        .context("Owner choice out of range")
}

#[async_trait]
impl Command for Assign {
    async fn run(&mut self, ws: &mut Workspace, args: &[String]) -> Result<()> {
        let story = ws.story(self.options.story_id).await?;
        let members = ws.tracker.members(ws.project_id).await?;
        let query = args.join(" ");
        let owner = pick_member(ws, members, query.trim()).await?;

        info!(story = story.id, owner = owner.id, "assigning story");
        let update = StoryUpdate {
            owner_ids: Some(vec![owner.id]),
            ..Default::default()
        };
        ws.tracker
            .update_story(ws.project_id, story.id, &update)
            .await?;
        ws.ui
            .say(&format!("Assigned story #{} to {}", story.id, owner.name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{person, story, Harness};

    fn team(h: &Harness) {
        h.tracker.clone().with_story(story(15, "Dark mode")).with_members(vec![
            person(1, "Ada Lovelace", "AL", "ada"),
            person(2, "Alan Turing", "AT", "alan"),
            person(3, "Grace Hopper", "GH", "grace"),
            person(4, "Anna Taylor", "AT", "anna"),
        ]);
    }

    #[tokio::test]
    async fn unique_match_is_assigned_directly() {
        let h = Harness::new("15-dark-mode");
        team(&h);
        let mut ws = h.workspace();

        Assign::build(Options::default())
            .run(&mut ws, &["gh".to_string()])
            .await
            .unwrap();

        assert!(h.ui.menus().is_empty());
        assert_eq!(
            h.journal.matching("tracker.update_story"),
            vec![r#"tracker.update_story 15 {"owner_ids":[3]}"#]
        );
        assert_eq!(h.ui.said(), vec!["Assigned story #15 to Grace Hopper"]);
    }

    #[tokio::test]
    async fn ambiguous_match_offers_only_the_matches() {
        let h = Harness::new("15-dark-mode");
        team(&h);
        h.ui.clone().pick(1);
        let mut ws = h.workspace();

        Assign::build(Options::default())
            .run(&mut ws, &["at".to_string()])
            .await
            .unwrap();

        assert_eq!(
            h.ui.menus()[0].1,
            vec!["Alan Turing (AT)", "Anna Taylor (AT)"]
        );
        assert_eq!(h.tracker.updates()[0].1.owner_ids, Some(vec![4]));
    }

    #[tokio::test]
    async fn unknown_member_aborts() {
        let h = Harness::new("15-dark-mode");
        team(&h);
        let mut ws = h.workspace();

        let err = Assign::build(Options::default())
            .run(&mut ws, &["linus".to_string()])
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "No project member matches linus");
        assert!(h.tracker.updates().is_empty());
    }
}
