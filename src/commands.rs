//! Slash command parsing for the terminal front-end.
//!
//! Input starting with `/` controls the client instead of being sent to the
//! service. Everything else is message text.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Stage an image file for the next message.
    Attach(String),

    /// Drop the staged image.
    Detach,

    /// Replay the conversation history from the service.
    Reload,

    /// Show the session identifier and where it is stored.
    Session,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a message.
///
/// # Examples
///
/// ```
/// # use chatline::commands::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert!(parse_command("/attach cat.png").is_some());
/// assert!(parse_command("Hello!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "attach" | "image" => match argument {
            Some(path) => ChatCommand::Attach(path.to_string()),
            None => ChatCommand::Invalid("/attach requires a file path".to_string()),
        },
        "detach" => ChatCommand::Detach,
        "reload" | "history" => ChatCommand::Reload,
        "session" => ChatCommand::Session,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /attach <file>         Attach an image to the next message
  /detach                Remove the attached image
  /reload                Reload the conversation history
  /session               Show the session identifier
  /help                  Show this help message
  /quit                  Exit the chat
Press Enter to send; an attached image may be sent with an empty line."#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_attach() {
        assert_eq!(
            parse_command("/attach photos/cat one.png"),
            Some(ChatCommand::Attach("photos/cat one.png".to_string()))
        );
        assert_eq!(
            parse_command("/ATTACH   cat.png  "),
            Some(ChatCommand::Attach("cat.png".to_string()))
        );
        assert_eq!(
            parse_command("/attach"),
            Some(ChatCommand::Invalid(
                "/attach requires a file path".to_string()
            ))
        );
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse_command("/detach"), Some(ChatCommand::Detach));
        assert_eq!(parse_command("/reload"), Some(ChatCommand::Reload));
        assert_eq!(parse_command("/history"), Some(ChatCommand::Reload));
        assert_eq!(parse_command("/session"), Some(ChatCommand::Session));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/model x"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello there"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/attach"));
        assert!(help.contains("/quit"));
        assert!(help.contains("/reload"));
    }
}
