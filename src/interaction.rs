use std::io::Write;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use crossterm::style::Stylize;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

use crate::error::PivotalError;

/// Everything a command needs from the person at the keyboard.
#[async_trait]
pub trait Interaction: Send + Sync {
    fn say(&self, line: &str);
    async fn ask(&self, prompt: &str) -> Result<String>;
    /// Returns the index of the picked choice.
    async fn choose(&self, prompt: &str, choices: &[String]) -> Result<usize>;
    async fn open_url(&self, url: &str) -> Result<()>;
}

/// Asks and fails when the answer is blank.
pub async fn ask_required(ui: &dyn Interaction, prompt: &str, what: &str) -> Result<String> {
    let answer = ui.ask(prompt).await?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(PivotalError::MissingArgument(what.to_string()).into());
    }
    Ok(answer.to_string())
}

pub struct Terminal {
    stdin: Mutex<BufReader<Stdin>>,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            stdin: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    async fn read_line(&self) -> Result<String> {
        let mut line = String::new();
        let n = self
            .stdin
            .lock()
            .await
            .read_line(&mut line)
            .await
            .context("Failed to read from stdin")?;
        if n == 0 {
            return Err(PivotalError::InputClosed.into());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interaction for Terminal {
    fn say(&self, line: &str) {
        println!("{line}");
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        print!("{} ", prompt.bold());
        std::io::stdout().flush()?;
        self.read_line().await
    }

    async fn choose(&self, prompt: &str, choices: &[String]) -> Result<usize> {
        if choices.is_empty() {
            return Err(PivotalError::NoChoices(format!("{prompt}: nothing to choose from")).into());
        }
        for (i, choice) in choices.iter().enumerate() {
            println!("{:>3}. {choice}", i + 1);
        }
        loop {
            let answer = self.ask(&format!("{prompt} [1-{}]:", choices.len())).await?;
            match parse_choice(&answer, choices.len()) {
                Some(index) => return Ok(index),
                None => println!("Please enter a number between 1 and {}.", choices.len()),
            }
        }
    }

    async fn open_url(&self, url: &str) -> Result<()> {
        let opener = if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        let status = tokio::process::Command::new(opener)
            .arg(url)
            .status()
            .await
            .with_context(|| format!("Failed to run {opener}"))?;
        if !status.success() {
            bail!("{opener} {url} exited with {status}");
        }
        Ok(())
    }
}

/// One-based menu answer to a zero-based index.
fn parse_choice(answer: &str, len: usize) -> Option<usize> {
    match answer.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}
