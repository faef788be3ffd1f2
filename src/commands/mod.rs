pub mod assign;
pub mod comment;
pub mod estimate;
pub mod finish;
pub mod info;
pub mod mark;
pub mod new;
pub mod open;
pub mod release;
pub mod start;
pub mod switch;

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::branch::story_id_from_branch;
use crate::config::Configuration;
use crate::git::{GitCli, Vcs};
use crate::interaction::{Interaction, Terminal};
use crate::model::story::{Story, StoryState};
use crate::story::{self, CANDIDATE_LIMIT};
use crate::tracker::pivotal::PivotalTracker;
use crate::tracker::Tracker;
use crate::version::{self, VersionUpdater};

/// Parsed command-line flags. Each command only sees the flags it registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub story_id: Option<u64>,
    pub use_current: bool,
    pub pull_request: bool,
    pub no_complete: bool,
    pub no_delete: bool,
    pub no_merge: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    UseCurrent,
    PullRequest,
    NoComplete,
    NoDelete,
    NoMerge,
}

impl Flag {
    pub fn long(&self) -> &'static str {
        match self {
            Flag::UseCurrent => "--use-current",
            Flag::PullRequest => "--pull-request",
            Flag::NoComplete => "--no-complete",
            Flag::NoDelete => "--no-delete",
            Flag::NoMerge => "--no-merge",
        }
    }

    pub fn apply(&self, options: &mut Options) {
        match self {
            Flag::UseCurrent => options.use_current = true,
            Flag::PullRequest => options.pull_request = true,
            Flag::NoComplete => options.no_complete = true,
            Flag::NoDelete => options.no_delete = true,
            Flag::NoMerge => options.no_merge = true,
        }
    }
}

#[async_trait]
pub trait Command: Send {
    async fn run(&mut self, ws: &mut Workspace, args: &[String]) -> Result<()>;
}

pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub flags: &'static [Flag],
    pub build: fn(Options) -> Box<dyn Command>,
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "assign",
        description: "Assign the story to a project member",
        flags: &[],
        build: assign::Assign::build,
    },
    CommandSpec {
        name: "comment",
        description: "Add a comment to the story",
        flags: &[],
        build: comment::Comment::build,
    },
    CommandSpec {
        name: "estimate",
        description: "Estimate the story in points",
        flags: &[],
        build: estimate::Estimate::build,
    },
    CommandSpec {
        name: "finish",
        description: "Finish the story on the current branch",
        flags: &[
            Flag::PullRequest,
            Flag::NoComplete,
            Flag::NoDelete,
            Flag::NoMerge,
        ],
        build: finish::Finish::build,
    },
    CommandSpec {
        name: "info",
        description: "Show details of the story",
        flags: &[],
        build: info::Info::build,
    },
    CommandSpec {
        name: "mark",
        description: "Change the state of the story",
        flags: &[],
        build: mark::Mark::build,
    },
    CommandSpec {
        name: "new",
        description: "Create a new story",
        flags: &[],
        build: new::New::build,
    },
    CommandSpec {
        name: "open",
        description: "Open the story in the browser",
        flags: &[],
        build: open::Open::build,
    },
    CommandSpec {
        name: "release",
        description: "Tag a release and bump to the next development version",
        flags: &[],
        build: release::Release::build,
    },
    CommandSpec {
        name: "start",
        description: "Start a story on a new branch",
        flags: &[Flag::UseCurrent],
        build: start::Start::build,
    },
    CommandSpec {
        name: "switch",
        description: "Check out the branch of a story",
        flags: &[],
        build: switch::Switch::build,
    },
];

pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Everything a command works against: settings, the tracker project, git,
/// and the person at the keyboard.
pub struct Workspace {
    pub config: Configuration,
    pub project_id: u64,
    pub repo_root: PathBuf,
    pub vcs: Box<dyn Vcs>,
    pub tracker: Box<dyn Tracker>,
    pub ui: Box<dyn Interaction>,
    pub updaters: Vec<Box<dyn VersionUpdater>>,
    story: Option<Story>,
}

impl Workspace {
    pub fn new(
        config: Configuration,
        project_id: u64,
        repo_root: PathBuf,
        vcs: Box<dyn Vcs>,
        tracker: Box<dyn Tracker>,
        ui: Box<dyn Interaction>,
        updaters: Vec<Box<dyn VersionUpdater>>,
    ) -> Self {
        Self {
            config,
            project_id,
            repo_root,
            vcs,
            tracker,
            ui,
            updaters,
            story: None,
        }
    }

    /// Resolves configuration (prompting for anything missing) for the
    /// repository containing the current directory.
    pub async fn open() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let repo_root = GitCli::new(&cwd, "origin").repository_root().await?;
        let mut config = Configuration::load(&repo_root)?;
        let ui: Box<dyn Interaction> = Box::new(Terminal::new());
        let token = config.api_token(ui.as_ref()).await?;
        let tracker = PivotalTracker::new(token);
        let project_id = config.project_id(ui.as_ref(), &tracker).await?;
        debug!(repo = %repo_root.display(), project_id, "workspace ready");
        let vcs = GitCli::new(&repo_root, config.remote());
        let updaters = version::candidates(&repo_root);
        Ok(Self::new(
            config,
            project_id,
            repo_root,
            Box::new(vcs),
            Box::new(tracker),
            ui,
            updaters,
        ))
    }

    /// The story this invocation is about: the explicit id, else the story
    /// recorded for (or encoded in) the current branch, else one the user picks.
    pub async fn story(&mut self, explicit: Option<u64>) -> Result<Story> {
        if let Some(story) = &self.story {
            return Ok(story.clone());
        }
        let story = match explicit {
            Some(id) => self.find_story(id).await?,
            None => {
                let branch = self.vcs.branch_name().await?;
                let recorded = self.config.branch(&branch).map(|r| r.story_id);
                match recorded.or_else(|| story_id_from_branch(&branch)) {
                    Some(id) => self.find_story(id).await?,
                    None => self.select_story(None, CANDIDATE_LIMIT).await?,
                }
            }
        };
        self.story = Some(story.clone());
        Ok(story)
    }

    pub async fn find_story(&self, id: u64) -> Result<Story> {
        self.tracker.story(self.project_id, id).await
    }

    pub async fn select_story(&self, filter: Option<&str>, limit: usize) -> Result<Story> {
        story::select_story(
            self.tracker.as_ref(),
            self.ui.as_ref(),
            self.project_id,
            filter,
            limit,
        )
        .await
    }

    pub async fn pretty_print(&self, story: &Story) -> Result<()> {
        story::pretty_print(self.tracker.as_ref(), self.ui.as_ref(), self.project_id, story).await
    }

    pub async fn mark(&self, story: &Story, state: StoryState) -> Result<Story> {
        story::mark(self.tracker.as_ref(), self.project_id, story, state).await
    }

    /// Branch a feature branch was started from.
    pub fn root_branch(&self, branch: &str) -> String {
        self.config
            .branch(branch)
            .map(|r| r.root_branch.clone())
            .unwrap_or_else(|| self.config.base_branch().to_string())
    }
}
