//! Script lines: one command per line, parsed with clap.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

/// A single script line.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_subcommand = true)]
struct ScriptLine {
    #[command(subcommand)]
    command: Command,
}

/// Commands understood by the host.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Change a field, recording the change in its history.
    Set {
        field: String,
        /// JSON value; anything that is not valid JSON is taken as a string.
        #[arg(value_parser = parse_value)]
        value: Value,
    },
    /// Record a clear baseline for a field.
    Init {
        field: String,
        #[arg(value_parser = parse_value)]
        value: Value,
        /// Only record the baseline, keep the current value.
        #[arg(long)]
        default_only: bool,
    },
    Undo {
        field: Option<String>,
    },
    Redo {
        field: Option<String>,
    },
    /// Move several steps at once; negative goes back.
    Jump {
        #[arg(allow_negative_numbers = true)]
        steps: isize,
        field: Option<String>,
    },
    /// Jump to an absolute index in the past (0 is the oldest).
    Past {
        index: usize,
        field: Option<String>,
    },
    /// Jump to an absolute index in the future (0 is the nearest).
    Future {
        index: usize,
        field: Option<String>,
    },
    Clear {
        field: Option<String>,
    },
    /// Print the state and every timeline.
    Show,
}

impl Command {
    /// Lower-case command name, as typed in scripts.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set { .. } => "set",
            Command::Init { .. } => "init",
            Command::Undo { .. } => "undo",
            Command::Redo { .. } => "redo",
            Command::Jump { .. } => "jump",
            Command::Past { .. } => "past",
            Command::Future { .. } => "future",
            Command::Clear { .. } => "clear",
            Command::Show => "show",
        }
    }
}

fn parse_value(raw: &str) -> Result<Value, std::convert::Infallible> {
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}

/// Splits a line on whitespace. Single quotes group words into one token.
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_token = false;

    for c in line.chars() {
        match c {
            '\'' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if quoted {
        anyhow::bail!("unterminated quote");
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parses one script line. Blank lines and `#` comments yield `None`.
///
/// # Errors
///
/// Returns an error for unknown commands or bad arguments.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let tokens = tokenize(trimmed)?;
    let parsed = ScriptLine::try_parse_from(tokens).context("Invalid command")?;
    Ok(Some(parsed.command))
}
