//! Slash command parsing for the terminal client.
//!
//! Lines starting with `/` drive the sidebar and session controls instead of
//! being sent to the bridge.  Session numbers are 1-based on the command line
//! and converted to 0-based indices here.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Start a new session.
    New,

    /// Make the session at this index active.
    Select(usize),

    /// Delete the session at this index.
    Delete(usize),

    /// Toggle the options menu of the session at this index.
    Menu(usize),

    /// Clear the active session and the server's memory.
    Clear,

    /// Attach the image at this path to the next message.
    Attach(String),

    /// Show the sidebar.
    List,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use geminichat::chat::{parse_command, ChatCommand};
/// assert_eq!(parse_command("/select 2"), Some(ChatCommand::Select(1)));
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("Hello, Gemini!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" => ChatCommand::New,
        "select" | "s" => parse_session_command(argument, ChatCommand::Select, "/select"),
        "delete" | "del" => parse_session_command(argument, ChatCommand::Delete, "/delete"),
        "menu" => parse_session_command(argument, ChatCommand::Menu, "/menu"),
        "clear" => ChatCommand::Clear,
        "attach" | "image" => match argument {
            Some(path) => ChatCommand::Attach(path.to_string()),
            None => ChatCommand::Invalid("/attach requires a file path".to_string()),
        },
        "list" | "ls" => ChatCommand::List,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("unknown command: /{command}")),
    };

    Some(result)
}

fn parse_session_command(
    argument: Option<&str>,
    ctor: fn(usize) -> ChatCommand,
    name: &str,
) -> ChatCommand {
    match argument {
        Some(arg) => match arg.parse::<usize>() {
            Ok(number) if number >= 1 => ctor(number - 1),
            _ => ChatCommand::Invalid(format!("{name} expects a session number, got {arg:?}")),
        },
        None => ChatCommand::Invalid(format!("{name} requires a session number")),
    }
}

/// Returns help text for available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new             Start a new chat
  /list            Show all chats
  /select <n>      Switch to chat number n
  /delete <n>      Delete chat number n
  /menu <n>        Toggle the options menu of chat n
  /clear           Clear the current chat
  /attach <path>   Attach an image to the next message
  /help            Show this help message
  /quit            Exit the chat

Send an attached image with no text to have it described.
Type "resize to WxH" with an attached image to resize it."#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_command() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("  what is /new?"), None);
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse_command("/new"), Some(ChatCommand::New));
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/LIST"), Some(ChatCommand::List));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
    }

    #[test]
    fn session_numbers_are_one_based() {
        assert_eq!(parse_command("/select 1"), Some(ChatCommand::Select(0)));
        assert_eq!(parse_command("/delete 3"), Some(ChatCommand::Delete(2)));
        assert_eq!(parse_command("/menu  2 "), Some(ChatCommand::Menu(1)));
    }

    #[test]
    fn bad_session_numbers() {
        assert!(matches!(parse_command("/select 0"), Some(ChatCommand::Invalid(_))));
        assert!(matches!(parse_command("/select x"), Some(ChatCommand::Invalid(_))));
        assert!(matches!(parse_command("/delete"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn attach_takes_rest_of_line() {
        assert_eq!(
            parse_command("/attach my photos/cat.png"),
            Some(ChatCommand::Attach("my photos/cat.png".to_string()))
        );
        assert!(matches!(parse_command("/attach"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/frobnicate"),
            Some(ChatCommand::Invalid("unknown command: /frobnicate".to_string()))
        );
    }

    #[test]
    fn help_mentions_every_command() {
        let help = help_text();
        for command in ["/new", "/list", "/select", "/delete", "/menu", "/clear", "/attach", "/quit"] {
            assert!(help.contains(command), "{command} missing from help");
        }
    }
}
