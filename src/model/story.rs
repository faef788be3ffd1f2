use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryType {
    Feature,
    Bug,
    Chore,
    Release,
}

impl StoryType {
    /// Types a developer can create with `new`.
    pub const CREATABLE: [StoryType; 3] = [StoryType::Feature, StoryType::Bug, StoryType::Chore];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryType::Feature => "feature",
            StoryType::Bug => "bug",
            StoryType::Chore => "chore",
            StoryType::Release => "release",
        }
    }
}

impl fmt::Display for StoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "feature" => Ok(StoryType::Feature),
            "bug" => Ok(StoryType::Bug),
            "chore" => Ok(StoryType::Chore),
            "release" => Ok(StoryType::Release),
            other => Err(format!("unknown story type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryState {
    Unscheduled,
    Unstarted,
    Planned,
    Started,
    Finished,
    Delivered,
    Accepted,
    Rejected,
}

impl StoryState {
    /// States a story can be explicitly moved to, in menu order.
    pub const MARKABLE: [StoryState; 6] = [
        StoryState::Unstarted,
        StoryState::Started,
        StoryState::Finished,
        StoryState::Delivered,
        StoryState::Accepted,
        StoryState::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryState::Unscheduled => "unscheduled",
            StoryState::Unstarted => "unstarted",
            StoryState::Planned => "planned",
            StoryState::Started => "started",
            StoryState::Finished => "finished",
            StoryState::Delivered => "delivered",
            StoryState::Accepted => "accepted",
            StoryState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for StoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StoryState::MARKABLE
            .iter()
            .chain(&[StoryState::Unscheduled, StoryState::Planned])
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown story state: {s}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: u64,
    pub name: String,
    pub story_type: StoryType,
    pub current_state: StoryState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub owner_ids: Vec<u64>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Story {
    pub fn needs_estimate(&self) -> bool {
        self.story_type == StoryType::Feature && self.estimate.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub initials: String,
    #[serde(default)]
    pub username: String,
}

impl Person {
    pub fn matches(&self, query: &str) -> bool {
        [&self.name, &self.initials, &self.username]
            .iter()
            .any(|field| !field.is_empty() && field.eq_ignore_ascii_case(query))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default = "default_point_scale")]
    pub point_scale: String,
}

fn default_point_scale() -> String {
    "0,1,2,3".to_string()
}

impl Project {
    pub fn points(&self) -> Vec<u32> {
        self.point_scale
            .split(',')
            .filter_map(|p| p.trim().parse().ok())
            .collect()
    }
}
