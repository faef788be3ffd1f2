use std::path::PathBuf;

use thiserror::Error;

/// Failures the tool reports to the user as-is.
#[derive(Error, Debug)]
pub enum PivotalError {
    #[error("Invalid command {0}.")]
    InvalidCommand(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    #[error("tracker request failed ({status}): {message}")]
    Tracker { status: u16, message: String },

    #[error("{0}")]
    NoChoices(String),

    #[error("working tree has uncommitted changes; commit or stash them first")]
    DirtyWorkingTree,

    #[error("no version updater supports the repository at {0}")]
    UnsupportedLayout(PathBuf),

    #[error("input closed")]
    InputClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_command_names_the_argument() {
        let err = PivotalError::InvalidCommand("frobnicate".into());
        assert_eq!(err.to_string(), "Invalid command frobnicate.");
    }

    #[test]
    fn git_error_carries_command_and_stderr() {
        let err = PivotalError::Git {
            command: "merge".into(),
            message: "CONFLICT (content)".into(),
        };
        assert_eq!(err.to_string(), "git merge failed: CONFLICT (content)");
    }
}
