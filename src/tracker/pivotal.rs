use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{NewStory, StoryQuery, StoryUpdate, Tracker};
use crate::error::PivotalError;
use crate::model::story::{Comment, Person, Project, Story};

const API_URL: &str = "https://www.pivotaltracker.com/services/v5";

pub struct PivotalTracker {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
}

impl PivotalTracker {
    pub fn new(api_token: String) -> Self {
        Self {
            base_url: API_URL.to_string(),
            api_token,
            client: reqwest::Client::new(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-TrackerToken", &self.api_token)
            .header("Accept", "application/json")
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "GET");
        let resp = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .context("Pivotal Tracker request failed")?;
        decode(resp).await
    }

    async fn send_json<B, T>(&self, request: RequestBuilder, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .authorized(request)
            .json(body)
            .send()
            .await
            .context("Pivotal Tracker request failed")?;
        decode(resp).await
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    general_problem: Option<String>,
}

#[derive(Deserialize)]
struct Membership {
    person: Person,
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(ErrorBody {
                general_problem: Some(problem),
                ..
            }) => problem,
            Ok(ErrorBody {
                error: Some(error), ..
            }) => error,
            _ => text,
        };
        return Err(PivotalError::Tracker {
            status: status.as_u16(),
            message,
        }
        .into());
    }
    resp.json()
        .await
        .context("Failed to parse Pivotal Tracker response")
}

#[async_trait]
impl Tracker for PivotalTracker {
    async fn projects(&self) -> Result<Vec<Project>> {
        self.get("/projects").await
    }

    async fn project(&self, project_id: u64) -> Result<Project> {
        self.get(&format!("/projects/{project_id}")).await
    }

    async fn story(&self, project_id: u64, story_id: u64) -> Result<Story> {
        self.get(&format!("/projects/{project_id}/stories/{story_id}"))
            .await
    }

    async fn stories(&self, project_id: u64, query: &StoryQuery) -> Result<Vec<Story>> {
        let mut path = format!(
            "/projects/{project_id}/stories?filter={}",
            urlencoding::encode(&query.filter())
        );
        if query.limit > 0 {
            path.push_str(&format!("&limit={}", query.limit));
        }
        self.get(&path).await
    }

    async fn create_story(&self, project_id: u64, story: &NewStory) -> Result<Story> {
        let url = format!("{}/projects/{project_id}/stories", self.base_url);
        debug!(%url, name = %story.name, "POST");
        self.send_json(self.client.post(&url), story).await
    }

    async fn update_story(
        &self,
        project_id: u64,
        story_id: u64,
        update: &StoryUpdate,
    ) -> Result<Story> {
        let url = format!("{}/projects/{project_id}/stories/{story_id}", self.base_url);
        debug!(%url, ?update, "PUT");
        self.send_json(self.client.put(&url), update).await
    }

    async fn comments(&self, project_id: u64, story_id: u64) -> Result<Vec<Comment>> {
        self.get(&format!(
            "/projects/{project_id}/stories/{story_id}/comments"
        ))
        .await
    }

    async fn add_comment(&self, project_id: u64, story_id: u64, text: &str) -> Result<Comment> {
        let url = format!(
            "{}/projects/{project_id}/stories/{story_id}/comments",
            self.base_url
        );
        let body = serde_json::json!({ "text": text });
        self.send_json(self.client.post(&url), &body).await
    }

    async fn members(&self, project_id: u64) -> Result<Vec<Person>> {
        let memberships: Vec<Membership> = self
            .get(&format!("/projects/{project_id}/memberships"))
            .await?;
        Ok(memberships.into_iter().map(|m| m.person).collect())
    }
}
