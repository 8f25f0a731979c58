// Line commands typed at the screen's prompt

use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan,
    Connect(Target),
    Disconnect,
    List,
    Quit,
}

/// A row as displayed (1-based), or a peripheral identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Row(usize),
    Id(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0} (try scan, connect <row|id>, disconnect, list, quit)")]
    Unknown(String),
    #[error("Usage: connect <row|id>")]
    MissingTarget,
    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(Command::List);
        };
        let argument = words.next();
        if let Some(extra) = words.next() {
            return Err(CommandError::UnexpectedArgument(extra.to_string()));
        }

        let command = match verb.to_lowercase().as_str() {
            "connect" | "c" => {
                let target = argument.ok_or(CommandError::MissingTarget)?;
                return Ok(Command::Connect(Target::from(target)));
            }
            "scan" | "s" => Command::Scan,
            "disconnect" | "d" => Command::Disconnect,
            "list" | "l" => Command::List,
            "quit" | "q" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        match argument {
            Some(argument) => Err(CommandError::UnexpectedArgument(argument.to_string())),
            None => Ok(command),
        }
    }
}

impl From<&str> for Target {
    /// Numbers select rows; anything else is taken as an identifier.
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(index) => Target::Row(index),
            Err(_) => Target::Id(s.to_string()),
        }
    }
}
