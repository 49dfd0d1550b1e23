//! Line commands accepted on stdin.

use notekeep_core::{SortOrder, SortOrderParseError};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Generate(usize),
    DeleteAll,
    Sort(SortOrder),
    List,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Unknown(String),
    MissingArgument(&'static str),
    InvalidCount(String),
    SortOrder(SortOrderParseError),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(word) => write!(f, "unknown command `{word}`; try `help`"),
            Self::MissingArgument(command) => write!(f, "`{command}` needs an argument"),
            Self::InvalidCount(value) => write!(f, "`{value}` is not a positive count"),
            Self::SortOrder(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SortOrder(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SortOrderParseError> for CommandError {
    fn from(value: SortOrderParseError) -> Self {
        Self::SortOrder(value)
    }
}

pub const HELP: &str = "\
commands:
  generate [N]   add N random notes (default 1)
  delete-all     remove every note and schedule
  sort <ORDER>   BY_ETA | BY_CREATION_DATE | NONE
  list           print the sorted list
  help           show this text
  quit           exit";

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "generate" | "gen" => match words.next() {
            Some(value) => match value.parse::<usize>() {
                Ok(count) if count > 0 => Command::Generate(count),
                _ => return Err(CommandError::InvalidCount(value.to_string())),
            },
            None => Command::Generate(1),
        },
        "delete-all" | "clear" => Command::DeleteAll,
        "sort" => {
            let name = words.next().ok_or(CommandError::MissingArgument("sort"))?;
            Command::Sort(name.to_ascii_uppercase().parse()?)
        }
        "list" | "ls" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::{parse_command, Command, CommandError};
    use notekeep_core::{SortOrder, SortOrderParseError};

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn generate_defaults_to_one() {
        assert_eq!(parse_command("generate"), Ok(Some(Command::Generate(1))));
        assert_eq!(parse_command("gen 5"), Ok(Some(Command::Generate(5))));
        assert_eq!(
            parse_command("generate 0"),
            Err(CommandError::InvalidCount("0".to_string()))
        );
    }

    #[test]
    fn sort_names_are_case_insensitive() {
        assert_eq!(
            parse_command("sort by_creation_date"),
            Ok(Some(Command::Sort(SortOrder::ByCreationDate)))
        );
        assert_eq!(
            parse_command("sort"),
            Err(CommandError::MissingArgument("sort"))
        );
    }

    #[test]
    fn unknown_sort_order_is_rejected() {
        assert_eq!(
            parse_command("sort ALPHABETICAL"),
            Err(CommandError::SortOrder(SortOrderParseError(
                "ALPHABETICAL".to_string()
            )))
        );
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(matches!(
            parse_command("rename 3"),
            Err(CommandError::Unknown(word)) if word == "rename"
        ));
    }
}
