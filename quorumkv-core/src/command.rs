//! Client command grammar and the fixed response vocabulary.
//!
//! Commands are whitespace-delimited with at most three tokens; the third
//! token keeps the remainder of the line intact, so values may contain
//! spaces (`PUT weakness leg spin`). The operation verb is
//! case-insensitive. The same grammar is used on the learn path: the
//! leader-acceptor broadcasts the canonical `PUT k v` / `DELETE k` string
//! and every learner re-parses it before mutating its local map.

use std::fmt;

use crate::error::CommandError;

/// GET miss, malformed command, or any structural error.
pub const RESPONSE_NULL: &str = "NULL";
/// Unknown operation verb.
pub const RESPONSE_INVALID_COMMAND: &str = "Invalid command";
/// Write failed while being relayed into consensus.
pub const RESPONSE_ERROR: &str = "ERROR";
/// Write submitted before any proposer election completed.
pub const RESPONSE_NO_LEADER: &str = "ERROR: No leader Here";

/// A parsed client operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Put { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

impl Command {
    pub fn key(&self) -> &str {
        match self {
            Command::Put { key, .. } => key,
            Command::Get { key } => key,
            Command::Delete { key } => key,
        }
    }

    /// Whether this command must be committed through consensus before it
    /// is applied. Reads are served locally and never replicated.
    pub fn is_write(&self) -> bool {
        !matches!(self, Command::Get { .. })
    }
}

impl fmt::Display for Command {
    /// The canonical wire form re-parsed by learners.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Put { key, value } => write!(f, "PUT {key} {value}"),
            Command::Get { key } => write!(f, "GET {key}"),
            Command::Delete { key } => write!(f, "DELETE {key}"),
        }
    }
}

/// Split into at most three tokens; the last token keeps the remainder.
fn tokenize(input: &str) -> Vec<&str> {
    let mut tokens = Vec::with_capacity(3);
    let mut rest = input.trim();
    for _ in 0..2 {
        match rest.find(char::is_whitespace) {
            Some(split) => {
                tokens.push(&rest[..split]);
                rest = rest[split..].trim_start();
            }
            None => break,
        }
    }
    if !rest.is_empty() {
        tokens.push(rest);
    }
    tokens
}

/// Parse one client command line.
pub fn parse_command(input: &str) -> Result<Command, CommandError> {
    let tokens = tokenize(input);
    let Some(verb) = tokens.first() else {
        return Err(CommandError::Malformed(input.to_string()));
    };

    match verb.to_ascii_uppercase().as_str() {
        "PUT" => match (tokens.get(1), tokens.get(2)) {
            (Some(key), Some(value)) => Ok(Command::Put {
                key: (*key).to_string(),
                value: (*value).to_string(),
            }),
            _ => Err(CommandError::Malformed(input.to_string())),
        },
        "GET" => match tokens.get(1) {
            Some(key) => Ok(Command::Get {
                key: (*key).to_string(),
            }),
            None => Err(CommandError::Malformed(input.to_string())),
        },
        "DELETE" => match tokens.get(1) {
            Some(key) => Ok(Command::Delete {
                key: (*key).to_string(),
            }),
            None => Err(CommandError::Malformed(input.to_string())),
        },
        _ => Err(CommandError::UnknownOperation((*verb).to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_parses_three_tokens() {
        assert_eq!(
            parse_command("PUT color red"),
            Ok(Command::Put {
                key: "color".into(),
                value: "red".into()
            })
        );
    }

    #[test]
    fn value_keeps_remainder_of_line() {
        assert_eq!(
            parse_command("PUT weakness leg spin"),
            Ok(Command::Put {
                key: "weakness".into(),
                value: "leg spin".into()
            })
        );
    }

    #[test]
    fn verb_is_case_insensitive() {
        assert_eq!(
            parse_command("put player Kohli"),
            Ok(Command::Put {
                key: "player".into(),
                value: "Kohli".into()
            })
        );
        assert_eq!(
            parse_command("gEt player"),
            Ok(Command::Get {
                key: "player".into()
            })
        );
    }

    #[test]
    fn missing_arguments_are_malformed() {
        assert!(matches!(
            parse_command("PUT onlykey"),
            Err(CommandError::Malformed(_))
        ));
        assert!(matches!(
            parse_command("GET"),
            Err(CommandError::Malformed(_))
        ));
        assert!(matches!(
            parse_command("DELETE"),
            Err(CommandError::Malformed(_))
        ));
        assert!(matches!(
            parse_command("   "),
            Err(CommandError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_verb_is_rejected() {
        assert!(matches!(
            parse_command("FOO bar baz"),
            Err(CommandError::UnknownOperation(_))
        ));
    }

    #[test]
    fn wire_form_round_trips() {
        let cmd = Command::Put {
            key: "strength".into(),
            value: "placement".into(),
        };
        assert_eq!(parse_command(&cmd.to_string()), Ok(cmd));

        let del = Command::Delete { key: "x".into() };
        assert_eq!(del.to_string(), "DELETE x");
        assert_eq!(parse_command("DELETE x"), Ok(del));
    }
}
