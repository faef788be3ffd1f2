//! Scripted collaborators for command tests. Every side-effecting call lands
//! in a shared [`Journal`] so ordering across git, tracker and version files
//! can be asserted.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use tempfile::TempDir;

use crate::commands::Workspace;
use crate::config::Configuration;
use crate::error::PivotalError;
use crate::git::{story_reference, Vcs};
use crate::interaction::Interaction;
use crate::model::story::{Comment, Person, Project, Story, StoryState, StoryType};
use crate::tracker::{NewStory, StoryQuery, StoryUpdate, Tracker};
use crate::version::VersionUpdater;

pub const PROJECT_ID: u64 = 1000;

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }
}

pub fn story(id: u64, name: &str) -> Story {
    Story {
        id,
        name: name.to_string(),
        story_type: StoryType::Feature,
        current_state: StoryState::Unstarted,
        estimate: Some(2),
        description: None,
        url: format!("https://www.pivotaltracker.com/story/show/{id}"),
        owner_ids: vec![],
        labels: vec![],
    }
}

pub fn person(id: u64, name: &str, initials: &str, username: &str) -> Person {
    Person {
        id,
        name: name.into(),
        initials: initials.into(),
        username: username.into(),
    }
}

#[derive(Default)]
struct TrackerState {
    stories: HashMap<u64, Story>,
    candidates: Vec<Story>,
    projects: Vec<Project>,
    members: Vec<Person>,
    comments: Vec<Comment>,
    updates: Vec<(u64, StoryUpdate)>,
    next_id: u64,
}

#[derive(Clone)]
pub struct MockTracker {
    journal: Journal,
    state: Arc<Mutex<TrackerState>>,
}

impl MockTracker {
    pub fn new(journal: Journal) -> Self {
        let state = TrackerState {
            next_id: 900,
            projects: vec![Project {
                id: PROJECT_ID,
                name: "Test Project".into(),
                point_scale: "0,1,2,3".into(),
            }],
            ..Default::default()
        };
        Self {
            journal,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_story(self, story: Story) -> Self {
        self.state.lock().unwrap().stories.insert(story.id, story);
        self
    }

    /// Stories returned by searches, in order.
    pub fn with_candidates(self, stories: Vec<Story>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for story in &stories {
                state.stories.insert(story.id, story.clone());
            }
            state.candidates = stories;
        }
        self
    }

    pub fn with_projects(self, projects: Vec<Project>) -> Self {
        self.state.lock().unwrap().projects = projects;
        self
    }

    pub fn with_members(self, members: Vec<Person>) -> Self {
        self.state.lock().unwrap().members = members;
        self
    }

    pub fn updates(&self) -> Vec<(u64, StoryUpdate)> {
        self.state.lock().unwrap().updates.clone()
    }
}

#[async_trait]
impl Tracker for MockTracker {
    async fn projects(&self) -> Result<Vec<Project>> {
        Ok(self.state.lock().unwrap().projects.clone())
    }

    async fn project(&self, project_id: u64) -> Result<Project> {
        self.state
            .lock()
            .unwrap()
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .cloned()
            .ok_or_else(|| anyhow!("no project {project_id}"))
    }

    async fn story(&self, _project_id: u64, story_id: u64) -> Result<Story> {
        self.journal.record(format!("tracker.story {story_id}"));
        self.state
            .lock()
            .unwrap()
            .stories
            .get(&story_id)
            .cloned()
            .ok_or_else(|| {
                PivotalError::Tracker {
                    status: 404,
                    message: format!("story {story_id} not found"),
                }
                .into()
            })
    }

    async fn stories(&self, _project_id: u64, query: &StoryQuery) -> Result<Vec<Story>> {
        self.journal.record(format!(
            "tracker.stories {} limit={}",
            query.filter(),
            query.limit
        ));
        let state = self.state.lock().unwrap();
        let mut found: Vec<Story> = state
            .candidates
            .iter()
            .filter(|s| query.story_type.map_or(true, |t| s.story_type == t))
            .cloned()
            .collect();
        if query.limit > 0 {
            found.truncate(query.limit);
        }
        Ok(found)
    }

    async fn create_story(&self, _project_id: u64, new: &NewStory) -> Result<Story> {
        self.journal.record(format!(
            "tracker.create_story {} {}",
            new.story_type, new.name
        ));
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let mut created = story(state.next_id, &new.name);
        created.story_type = new.story_type;
        created.estimate = None;
        state.stories.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_story(
        &self,
        _project_id: u64,
        story_id: u64,
        update: &StoryUpdate,
    ) -> Result<Story> {
        self.journal.record(format!(
            "tracker.update_story {story_id} {}",
            serde_json::to_string(update)?
        ));
        let mut state = self.state.lock().unwrap();
        state.updates.push((story_id, update.clone()));
        let mut updated = state
            .stories
            .get(&story_id)
            .cloned()
            .unwrap_or_else(|| story(story_id, "unknown"));
        if let Some(s) = update.current_state {
            updated.current_state = s;
        }
        if let Some(e) = update.estimate {
            updated.estimate = Some(e);
        }
        if let Some(owners) = &update.owner_ids {
            updated.owner_ids = owners.clone();
        }
        state.stories.insert(story_id, updated.clone());
        Ok(updated)
    }

    async fn comments(&self, _project_id: u64, _story_id: u64) -> Result<Vec<Comment>> {
        Ok(self.state.lock().unwrap().comments.clone())
    }

    async fn add_comment(&self, _project_id: u64, story_id: u64, text: &str) -> Result<Comment> {
        self.journal
            .record(format!("tracker.add_comment {story_id} {text}"));
        let mut state = self.state.lock().unwrap();
        let comment = Comment {
            id: state.comments.len() as u64 + 1,
            text: text.to_string(),
            person_id: None,
            created_at: chrono::Utc::now(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn members(&self, _project_id: u64) -> Result<Vec<Person>> {
        Ok(self.state.lock().unwrap().members.clone())
    }
}

struct VcsState {
    branch: String,
    branches: Vec<String>,
    remote_branches: Vec<String>,
    dirty: bool,
    merge_conflict: bool,
}

#[derive(Clone)]
pub struct MockVcs {
    journal: Journal,
    root: PathBuf,
    state: Arc<Mutex<VcsState>>,
}

impl MockVcs {
    pub fn new(journal: Journal, root: &Path, branch: &str) -> Self {
        Self {
            journal,
            root: root.to_path_buf(),
            state: Arc::new(Mutex::new(VcsState {
                branch: branch.to_string(),
                branches: vec![branch.to_string()],
                remote_branches: vec![],
                dirty: false,
                merge_conflict: false,
            })),
        }
    }

    pub fn with_branches(self, names: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for name in names {
                if !state.branches.iter().any(|b| b == name) {
                    state.branches.push(name.to_string());
                }
            }
        }
        self
    }

    pub fn with_remote_branch(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .remote_branches
            .push(name.to_string());
        self
    }

    pub fn dirty(self) -> Self {
        self.state.lock().unwrap().dirty = true;
        self
    }

    pub fn with_merge_conflict(self) -> Self {
        self.state.lock().unwrap().merge_conflict = true;
        self
    }

    pub fn current_branch(&self) -> String {
        self.state.lock().unwrap().branch.clone()
    }
}

#[async_trait]
impl Vcs for MockVcs {
    async fn repository_root(&self) -> Result<PathBuf> {
        Ok(self.root.clone())
    }

    async fn branch_name(&self) -> Result<String> {
        Ok(self.current_branch())
    }

    async fn local_branches(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().branches.clone())
    }

    async fn create_branch(&self, name: &str) -> Result<()> {
        self.journal.record(format!("git.create_branch {name}"));
        let mut state = self.state.lock().unwrap();
        if state.branches.iter().any(|b| b == name) {
            return Err(PivotalError::Git {
                command: "checkout".into(),
                message: format!("a branch named '{name}' already exists"),
            }
            .into());
        }
        state.branches.push(name.to_string());
        state.branch = name.to_string();
        Ok(())
    }

    async fn checkout(&self, name: &str) -> Result<()> {
        self.journal.record(format!("git.checkout {name}"));
        let mut state = self.state.lock().unwrap();
        if !state.branches.iter().any(|b| b == name) {
            bail!("pathspec '{name}' did not match");
        }
        state.branch = name.to_string();
        Ok(())
    }

    async fn delete_branch(&self, name: &str) -> Result<()> {
        self.journal.record(format!("git.delete_branch {name}"));
        self.state.lock().unwrap().branches.retain(|b| b != name);
        Ok(())
    }

    async fn remote_branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .remote_branches
            .iter()
            .any(|b| b == name))
    }

    async fn delete_remote_branch(&self, name: &str) -> Result<()> {
        self.journal
            .record(format!("git.delete_remote_branch {name}"));
        Ok(())
    }

    async fn ensure_clean(&self) -> Result<()> {
        self.journal.record("git.ensure_clean");
        if self.state.lock().unwrap().dirty {
            return Err(PivotalError::DirtyWorkingTree.into());
        }
        Ok(())
    }

    async fn merge(&self, branch: &str, message: &str) -> Result<()> {
        self.journal
            .record(format!("git.merge {branch} {}", message.replace('\n', "|")));
        if self.state.lock().unwrap().merge_conflict {
            return Err(PivotalError::Git {
                command: "merge".into(),
                message: "CONFLICT (content): Merge conflict in README.md".into(),
            }
            .into());
        }
        Ok(())
    }

    async fn create_commit(&self, message: &str, story: &Story) -> Result<()> {
        self.journal.record(format!(
            "git.create_commit {}",
            story_reference(message, story).replace('\n', "|")
        ));
        Ok(())
    }

    async fn create_release_tag(&self, version: &str, story: &Story) -> Result<()> {
        self.journal
            .record(format!("git.create_release_tag {version} #{}", story.id));
        Ok(())
    }

    async fn push(&self, refs: &[&str]) -> Result<()> {
        self.journal.record(format!("git.push {}", refs.join(" ")));
        Ok(())
    }

    async fn push_upstream(&self, branch: &str) -> Result<()> {
        self.journal.record(format!("git.push_upstream {branch}"));
        Ok(())
    }

    async fn create_pull_request(
        &self,
        base: &str,
        head: &str,
        title: &str,
        _body: &str,
    ) -> Result<String> {
        self.journal
            .record(format!("git.create_pull_request {base} {head} {title}"));
        Ok("https://github.com/acme/app/pull/1".into())
    }
}

#[derive(Default)]
struct UiState {
    answers: VecDeque<String>,
    picks: VecDeque<usize>,
    prompts: Vec<String>,
    menus: Vec<(String, Vec<String>)>,
    said: Vec<String>,
    opened: Vec<String>,
}

/// Replays canned answers; running out of script is a test failure.
#[derive(Clone, Default)]
pub struct ScriptedInteraction {
    state: Arc<Mutex<UiState>>,
}

impl ScriptedInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(self, text: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .answers
            .push_back(text.to_string());
        self
    }

    pub fn pick(self, index: usize) -> Self {
        self.state.lock().unwrap().picks.push_back(index);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.lock().unwrap().prompts.clone()
    }

    pub fn menus(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().unwrap().menus.clone()
    }

    pub fn said(&self) -> Vec<String> {
        self.state.lock().unwrap().said.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }
}

#[async_trait]
impl Interaction for ScriptedInteraction {
    fn say(&self, line: &str) {
        self.state.lock().unwrap().said.push(line.to_string());
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.prompts.push(prompt.to_string());
        state
            .answers
            .pop_front()
            .ok_or_else(|| anyhow!("unexpected prompt: {prompt}"))
    }

    async fn choose(&self, prompt: &str, choices: &[String]) -> Result<usize> {
        if choices.is_empty() {
            return Err(PivotalError::NoChoices(format!("{prompt}: nothing to choose from")).into());
        }
        let mut state = self.state.lock().unwrap();
        state.menus.push((prompt.to_string(), choices.to_vec()));
        let index = state
            .picks
            .pop_front()
            .ok_or_else(|| anyhow!("unexpected menu: {prompt}"))?;
        if index >= choices.len() {
            bail!("scripted pick {index} out of range for {prompt}");
        }
        Ok(index)
    }

    async fn open_url(&self, url: &str) -> Result<()> {
        self.state.lock().unwrap().opened.push(url.to_string());
        Ok(())
    }
}

pub struct MockUpdater {
    journal: Journal,
    name: &'static str,
    supported: bool,
    current: String,
}

impl MockUpdater {
    pub fn new(journal: Journal, name: &'static str, supported: bool, current: &str) -> Self {
        Self {
            journal,
            name,
            supported,
            current: current.to_string(),
        }
    }
}

impl VersionUpdater for MockUpdater {
    fn name(&self) -> &str {
        self.name
    }

    fn supports(&self) -> bool {
        self.supported
    }

    fn current_version(&self) -> Result<String> {
        self.journal.record(format!("{}.current_version", self.name));
        Ok(self.current.clone())
    }

    fn update_version(&self, version: &str) -> Result<()> {
        self.journal
            .record(format!("{}.update_version {version}", self.name));
        Ok(())
    }
}

/// A workspace wired to mocks, with its config files in a temp dir.
pub struct Harness {
    pub journal: Journal,
    pub tracker: MockTracker,
    pub vcs: MockVcs,
    pub ui: ScriptedInteraction,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(branch: &str) -> Self {
        let journal = Journal::default();
        let dir = TempDir::new().unwrap();
        Self {
            tracker: MockTracker::new(journal.clone()),
            vcs: MockVcs::new(journal.clone(), dir.path(), branch),
            ui: ScriptedInteraction::new(),
            journal,
            dir,
        }
    }

    pub fn config(&self) -> Configuration {
        Configuration::from_paths(self.dir.path().join("pivotal.toml"), None, Some("token".into()))
            .unwrap()
    }

    pub fn workspace(&self) -> Workspace {
        self.workspace_with_updaters(vec![])
    }

    pub fn workspace_with_updaters(&self, updaters: Vec<Box<dyn VersionUpdater>>) -> Workspace {
        Workspace::new(
            self.config(),
            PROJECT_ID,
            self.dir.path().to_path_buf(),
            Box::new(self.vcs.clone()),
            Box::new(self.tracker.clone()),
            Box::new(self.ui.clone()),
            updaters,
        )
    }
}
