pub mod pivotal;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::model::story::{Comment, Person, Project, Story, StoryState, StoryType};

/// Search parameters for candidate stories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryQuery {
    pub story_type: Option<StoryType>,
    pub states: Vec<StoryState>,
    pub limit: usize,
}

impl StoryQuery {
    /// Tracker search syntax, e.g. `current_state:unstarted,unscheduled story_type:bug`.
    pub fn filter(&self) -> String {
        let mut parts = Vec::new();
        if !self.states.is_empty() {
            let states: Vec<&str> = self.states.iter().map(|s| s.as_str()).collect();
            parts.push(format!("current_state:{}", states.join(",")));
        }
        if let Some(story_type) = self.story_type {
            parts.push(format!("story_type:{story_type}"));
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<StoryState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_ids: Option<Vec<u64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStory {
    pub name: String,
    pub story_type: StoryType,
}

#[async_trait]
pub trait Tracker: Send + Sync {
    async fn projects(&self) -> Result<Vec<Project>>;
    async fn project(&self, project_id: u64) -> Result<Project>;
    async fn story(&self, project_id: u64, story_id: u64) -> Result<Story>;
    async fn stories(&self, project_id: u64, query: &StoryQuery) -> Result<Vec<Story>>;
    async fn create_story(&self, project_id: u64, story: &NewStory) -> Result<Story>;
    async fn update_story(&self, project_id: u64, story_id: u64, update: &StoryUpdate)
        -> Result<Story>;
    async fn comments(&self, project_id: u64, story_id: u64) -> Result<Vec<Comment>>;
    async fn add_comment(&self, project_id: u64, story_id: u64, text: &str) -> Result<Comment>;
    async fn members(&self, project_id: u64) -> Result<Vec<Person>>;
}
