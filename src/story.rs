use anyhow::{Context, Result};
use crossterm::style::Stylize;
use tracing::info;

use crate::error::PivotalError;
use crate::interaction::Interaction;
use crate::model::story::{Comment, Person, Story, StoryState, StoryType};
use crate::tracker::{StoryQuery, StoryUpdate, Tracker};

pub const CANDIDATE_LIMIT: usize = 5;
const DEFAULT_WIDTH: usize = 80;

/// Finds a story by numeric filter, or lets the user pick one of the
/// unstarted stories (optionally of the type named by `filter`).
pub async fn select_story(
    tracker: &dyn Tracker,
    ui: &dyn Interaction,
    project_id: u64,
    filter: Option<&str>,
    limit: usize,
) -> Result<Story> {
    if let Some(id) = filter.and_then(|f| f.parse::<u64>().ok()) {
        return tracker.story(project_id, id).await;
    }
    let story_type = filter
        .map(str::parse::<StoryType>)
        .transpose()
        .map_err(PivotalError::InvalidOption)?;
    let query = StoryQuery {
        story_type,
        states: vec![StoryState::Unstarted, StoryState::Unscheduled],
        limit,
    };
    let mut candidates = tracker.stories(project_id, &query).await?;
    if candidates.is_empty() {
        let kind = story_type.map_or("unstarted".to_string(), |t| format!("unstarted {t}"));
        return Err(PivotalError::NoChoices(format!("No {kind} stories available")).into());
    }
    if limit == 1 {
        return Ok(candidates.swap_remove(0));
    }
    let choices: Vec<String> = candidates.iter().map(describe).collect();
    let index = ui.choose("Choose story", &choices).await?;
    candidates
        .into_iter()
        .nth(index)
        .context("Story choice out of range")
}

pub fn describe(story: &Story) -> String {
    format!("{:<8} {}", story.story_type.as_str(), story.name)
}

pub async fn mark(
    tracker: &dyn Tracker,
    project_id: u64,
    story: &Story,
    state: StoryState,
) -> Result<Story> {
    info!(story = story.id, %state, "changing story state");
    let update = StoryUpdate {
        current_state: Some(state),
        ..Default::default()
    };
    tracker.update_story(project_id, story.id, &update).await
}

pub async fn pretty_print(
    tracker: &dyn Tracker,
    ui: &dyn Interaction,
    project_id: u64,
    story: &Story,
) -> Result<()> {
    let comments = tracker.comments(project_id, story.id).await?;
    let members = if comments.iter().any(|c| c.person_id.is_some()) {
        tracker.members(project_id).await?
    } else {
        Vec::new()
    };
    let width = crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .unwrap_or(DEFAULT_WIDTH);
    for line in pretty_lines(story, &comments, &members, width) {
        ui.say(&line);
    }
    Ok(())
}

/// Label/value rows with values wrapped to `width`. Comment authors are looked
/// up in `members`.
pub fn pretty_lines(
    story: &Story,
    comments: &[Comment],
    members: &[Person],
    width: usize,
) -> Vec<String> {
    let mut rows: Vec<(String, String)> = vec![
        ("Story".into(), format!("#{} {}", story.id, story.name)),
        ("Type".into(), story.story_type.to_string()),
        ("State".into(), story.current_state.to_string()),
    ];
    if let Some(estimate) = story.estimate {
        rows.push(("Estimate".into(), estimate.to_string()));
    }
    if !story.labels.is_empty() {
        let labels: Vec<&str> = story.labels.iter().map(|l| l.name.as_str()).collect();
        rows.push(("Labels".into(), labels.join(", ")));
    }
    if let Some(description) = story.description.as_deref().filter(|d| !d.trim().is_empty()) {
        rows.push(("Description".into(), description.trim().to_string()));
    }
    let mut comments: Vec<&Comment> = comments.iter().collect();
    comments.sort_by_key(|c| c.created_at);
    for (i, comment) in comments.iter().enumerate() {
        let date = comment.created_at.format("%Y-%m-%d");
        let author = comment
            .person_id
            .and_then(|id| members.iter().find(|m| m.id == id));
        let value = match author {
            Some(person) => format!("{date} {}: {}", person.name, comment.text.trim()),
            None => format!("{date} {}", comment.text.trim()),
        };
        rows.push((format!("Comment {}", i + 1), value));
    }
    if !story.url.is_empty() {
        rows.push(("URL".into(), story.url.clone()));
    }

    let label_width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0) + 2;
    let value_width = width.saturating_sub(label_width).max(20);
    let mut lines = Vec::new();
    for (label, value) in rows {
        let head = format!("{:>w$}", format!("{label}: "), w = label_width);
        for (i, wrapped) in wrap(&value, value_width).into_iter().enumerate() {
            if i == 0 {
                lines.push(format!("{}{wrapped}", head.as_str().bold()));
            } else {
                lines.push(format!("{}{wrapped}", " ".repeat(label_width)));
            }
        }
    }
    lines
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
                out.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        out.push(line);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}
