use std::future::Future;

use anyhow::Result;

use crate::commands::{find_command, CommandSpec, Options, Workspace, COMMANDS};
use crate::error::PivotalError;

const MAIN_COMMANDS: [&str; 3] = ["new", "start", "finish"];

pub enum Invocation {
    Help,
    Run {
        command: &'static CommandSpec,
        options: Options,
        args: Vec<String>,
    },
}

/// Parses the arguments after the program name.
///
/// Supported forms:
///   pivotal start 123
///   pivotal finish --no-merge -S 123
///   pivotal comment -- --looks-like-a-flag
pub fn parse(args: &[String]) -> Result<Invocation, PivotalError> {
    let wants_help = args
        .iter()
        .take_while(|a| a.as_str() != "--")
        .any(|a| a == "-h" || a == "--help");
    let Some(name) = args.first() else {
        return Ok(Invocation::Help);
    };
    if wants_help {
        return Ok(Invocation::Help);
    }
    let command = find_command(name).ok_or_else(|| PivotalError::InvalidCommand(name.clone()))?;

    let mut options = Options::default();
    let mut positional = Vec::new();
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--" => {
                positional.extend(args[i + 1..].iter().cloned());
                break;
            }
            "-S" | "--story" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| PivotalError::MissingArgument(format!("{arg} <story-id>")))?;
                options.story_id = Some(parse_story_id(value)?);
            }
            _ if arg.starts_with("--story=") => {
                options.story_id = Some(parse_story_id(&arg["--story=".len()..])?);
            }
            _ if arg.starts_with('-') && arg.len() > 1 => {
                let flag = command
                    .flags
                    .iter()
                    .find(|f| f.long() == arg)
                    .ok_or_else(|| PivotalError::InvalidOption(arg.to_string()))?;
                flag.apply(&mut options);
            }
            _ => positional.push(arg.to_string()),
        }
        i += 1;
    }

    Ok(Invocation::Run {
        command,
        options,
        args: positional,
    })
}

fn parse_story_id(value: &str) -> Result<u64, PivotalError> {
    value
        .parse()
        .map_err(|_| PivotalError::InvalidOption(format!("story id {value}")))
}

pub fn usage() -> String {
    let width = COMMANDS.iter().map(|c| c.name.len()).max().unwrap_or(0);
    let line = |c: &CommandSpec| format!("  {:<width$}   {}", c.name, c.description);

    let mut lines = vec![
        "Usage: pivotal [--help] <command> [<args>]".to_string(),
        String::new(),
        "Main Commands".to_string(),
    ];
    lines.extend(MAIN_COMMANDS.iter().filter_map(|n| find_command(n)).map(line));
    lines.push(String::new());
    lines.push("Secondary Commands:".to_string());
    let mut secondary: Vec<&CommandSpec> = COMMANDS
        .iter()
        .filter(|c| !MAIN_COMMANDS.contains(&c.name))
        .collect();
    secondary.sort_by_key(|c| c.name);
    lines.extend(secondary.into_iter().map(line));
    lines.join("\n")
}

/// Opens the workspace for the current repository and runs the command.
pub async fn execute(command: &CommandSpec, options: Options, args: &[String]) -> Result<()> {
    // Resolve token, project and repository (may prompt)
    let mut workspace = Workspace::open().await?;

    // Build and run the command
    let mut runner = (command.build)(options);
    runner.run(&mut workspace, args).await
}

pub enum Outcome {
    Finished(Result<()>),
    Cancelled,
}

/// Runs `work` unless `cancel` completes first.
pub async fn until_cancelled<W, C>(work: W, cancel: C) -> Outcome
where
    W: Future<Output = Result<()>>,
    C: Future,
{
    tokio::select! {
        result = work => Outcome::Finished(result),
        _ = cancel => Outcome::Cancelled,
    }
}
