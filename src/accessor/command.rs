//! Command resolution: configured command vs. per-message override.

use std::fmt;

use serde_json::Value;

use crate::error::EventError;
use crate::logger::NodeSink;
use crate::message::Message;

/// Operation applied to the persistent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Read,
    Write,
    Reset,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Read => "read",
            Command::Write => "write",
            Command::Reset => "reset",
        }
    }

    /// Parse an exact, normalized command name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "read" => Some(Command::Read),
            "write" => Some(Command::Write),
            "reset" => Some(Command::Reset),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands a configuration revision understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSet {
    /// `read` and `write`.
    Legacy,
    /// `read`, `write` and `reset`.
    Full,
}

impl CommandSet {
    pub fn commands(&self) -> &'static [Command] {
        match self {
            CommandSet::Legacy => &[Command::Read, Command::Write],
            CommandSet::Full => &[Command::Read, Command::Write, Command::Reset],
        }
    }

    pub fn supports(&self, command: Command) -> bool {
        self.commands().contains(&command)
    }

    /// Look up a name in this set.
    pub fn recognize(&self, name: &str) -> Option<Command> {
        Command::parse(name).filter(|command| self.supports(*command))
    }

    fn listing(&self) -> String {
        self.commands()
            .iter()
            .map(Command::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Determines the effective command of a message.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    configured: String,
    override_property: String,
    commands: CommandSet,
}

impl CommandResolver {
    /// # Arguments
    ///
    /// * `configured` - Command text from the configuration.
    /// * `override_property` - Message property that may carry an override.
    /// * `commands` - Commands recognized by the accessor.
    pub fn new(configured: impl Into<String>, override_property: impl Into<String>, commands: CommandSet) -> Self {
        Self {
            configured: configured.into(),
            override_property: override_property.into(),
            commands,
        }
    }

    /// Resolve the command for `msg`.
    ///
    /// A recognized override wins. An unrecognized override is reported as a
    /// warning and the configured command is used.
    ///
    /// # Errors
    ///
    /// [`EventError::UnsupportedCommand`] when the configured command itself
    /// is not recognized and no valid override is present.
    pub fn resolve(&self, msg: &Message, sink: &dyn NodeSink) -> Result<Command, EventError> {
        if let Some(raw) = msg.get(&self.override_property) {
            let normalized = match raw {
                Value::String(s) => s.trim().to_lowercase(),
                other => other.to_string(),
            };
            let recognized = match raw {
                Value::String(_) => self.commands.recognize(&normalized),
                _ => None,
            };
            match recognized {
                Some(command) => {
                    log::debug!("Command override '{}' via msg.{}", command, self.override_property);
                    return Ok(command);
                }
                None => sink.warn(&format!(
                    "Command '{}' set via msg.{} is not known / supported! \
                     Falling back to configured command. Supported commands: {}",
                    normalized,
                    self.override_property,
                    self.commands.listing()
                )),
            }
        }

        self.commands
            .recognize(&self.configured)
            .ok_or_else(|| EventError::UnsupportedCommand(self.configured.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::RecordingSink;
    use serde_json::json;

    fn msg(value: Value) -> Message {
        Message::from_value(value).unwrap()
    }

    #[test]
    fn test_configured_command_without_override() {
        let sink = RecordingSink::new();
        let resolver = CommandResolver::new("write", "command", CommandSet::Full);
        let command = resolver.resolve(&msg(json!({"payload": 1})), &sink).unwrap();
        assert_eq!(command, Command::Write);
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn test_override_is_trimmed_and_lowercased() {
        let sink = RecordingSink::new();
        let resolver = CommandResolver::new("read", "command", CommandSet::Full);
        let command = resolver
            .resolve(&msg(json!({"command": "   WRITE    "})), &sink)
            .unwrap();
        assert_eq!(command, Command::Write);
    }

    #[test]
    fn test_custom_override_property() {
        let sink = RecordingSink::new();
        let resolver = CommandResolver::new("write", "override_command", CommandSet::Full);
        let command = resolver
            .resolve(&msg(json!({"override_command": "read", "command": "reset"})), &sink)
            .unwrap();
        assert_eq!(command, Command::Read);
    }

    #[test]
    fn test_unknown_override_falls_back_with_warning() {
        let sink = RecordingSink::new();
        let resolver = CommandResolver::new("read", "command", CommandSet::Full);
        let command = resolver
            .resolve(
                &msg(json!({"command": {"invalid_command": "string instead of object type expected"}})),
                &sink,
            )
            .unwrap();
        assert_eq!(command, Command::Read);
        assert!(sink.warned("not known / supported"));
    }

    #[test]
    fn test_legacy_set_rejects_reset_override() {
        let sink = RecordingSink::new();
        let resolver = CommandResolver::new("read", "command", CommandSet::Legacy);
        let command = resolver.resolve(&msg(json!({"command": "reset"})), &sink).unwrap();
        assert_eq!(command, Command::Read);
        assert!(sink.warned("Supported commands: read, write"));
    }

    #[test]
    fn test_unsupported_configured_command() {
        let sink = RecordingSink::new();
        let resolver = CommandResolver::new("unsupported command", "command", CommandSet::Full);
        let err = resolver.resolve(&msg(json!({})), &sink).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown or unsupported persistent value command 'unsupported command' used!"
        );
    }

    #[test]
    fn test_valid_override_rescues_unsupported_configuration() {
        let sink = RecordingSink::new();
        let resolver = CommandResolver::new("reset", "command", CommandSet::Legacy);
        assert_eq!(
            resolver.resolve(&msg(json!({"command": "write"})), &sink),
            Ok(Command::Write)
        );
        assert!(resolver.resolve(&msg(json!({})), &sink).is_err());
    }
}
