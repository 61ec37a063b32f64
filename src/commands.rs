//! Slash-command parsing for the chat loop.

use crate::core::persona::Mode;
use crate::core::router::Tier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Clear the turn log; every other piece of session state survives.
    Reset,
    SetMode(Mode),
    SetTier(Tier),
    Unlock { token: String },
    /// Stage an image for the next submission.
    AttachImage { path: String },
    ClearImage,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Run(Command),
    /// Not a command; send to the model as a regular message.
    ProcessAsMessage(String),
    Invalid(String),
}

pub const HELP_TEXT: &str = "\
Commands:
  /mode <solver|hint-coach|concept-coach>  switch tutoring persona
  /tier <basic|elevated>                   switch model tier
  /unlock <token>                          unlock the elevated tier
  /image <path>                            attach an image to the next question
  /image clear                             drop the staged image
  /reset                                   clear the conversation
  /help                                    show this help
  /quit                                    exit";

pub fn parse_input(input: &str) -> CommandResult {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();

    match command {
        "/reset" => CommandResult::Run(Command::Reset),
        "/help" => CommandResult::Run(Command::Help),
        "/quit" | "/exit" => CommandResult::Run(Command::Quit),
        "/mode" => match rest.as_slice() {
            [mode] => match mode.parse::<Mode>() {
                Ok(mode) => CommandResult::Run(Command::SetMode(mode)),
                Err(err) => CommandResult::Invalid(err.to_string()),
            },
            _ => CommandResult::Invalid(
                "Usage: /mode <solver|hint-coach|concept-coach>".to_string(),
            ),
        },
        "/tier" => match rest.as_slice() {
            ["basic"] => CommandResult::Run(Command::SetTier(Tier::Basic)),
            ["elevated"] => CommandResult::Run(Command::SetTier(Tier::Elevated)),
            _ => CommandResult::Invalid("Usage: /tier <basic|elevated>".to_string()),
        },
        "/unlock" => match rest.as_slice() {
            [token] => CommandResult::Run(Command::Unlock {
                token: token.to_string(),
            }),
            _ => CommandResult::Invalid("Usage: /unlock <token>".to_string()),
        },
        "/image" => match rest.as_slice() {
            ["clear"] => CommandResult::Run(Command::ClearImage),
            [] => CommandResult::Invalid("Usage: /image <path> or /image clear".to_string()),
            // Paths may contain spaces; take everything after the command.
            _ => CommandResult::Run(Command::AttachImage {
                path: rest.join(" "),
            }),
        },
        other => CommandResult::Invalid(format!(
            "Unknown command: {other}. Try /help for the command list."
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through_as_a_message() {
        assert_eq!(
            parse_input("What is the derivative of x^2?"),
            CommandResult::ProcessAsMessage("What is the derivative of x^2?".to_string())
        );
    }

    #[test]
    fn reset_and_quit_parse() {
        assert_eq!(parse_input("/reset"), CommandResult::Run(Command::Reset));
        assert_eq!(parse_input("/quit"), CommandResult::Run(Command::Quit));
        assert_eq!(parse_input("/exit"), CommandResult::Run(Command::Quit));
    }

    #[test]
    fn mode_command_accepts_registered_modes_only() {
        assert_eq!(
            parse_input("/mode hint-coach"),
            CommandResult::Run(Command::SetMode(Mode::HintCoach))
        );
        assert!(matches!(
            parse_input("/mode oracle"),
            CommandResult::Invalid(msg) if msg.contains("oracle")
        ));
        assert!(matches!(
            parse_input("/mode"),
            CommandResult::Invalid(_)
        ));
    }

    #[test]
    fn tier_command_parses_both_tiers() {
        assert_eq!(
            parse_input("/tier basic"),
            CommandResult::Run(Command::SetTier(Tier::Basic))
        );
        assert_eq!(
            parse_input("/tier elevated"),
            CommandResult::Run(Command::SetTier(Tier::Elevated))
        );
        assert!(matches!(
            parse_input("/tier turbo"),
            CommandResult::Invalid(_)
        ));
    }

    #[test]
    fn image_command_keeps_paths_with_spaces() {
        assert_eq!(
            parse_input("/image /tmp/my homework.png"),
            CommandResult::Run(Command::AttachImage {
                path: "/tmp/my homework.png".to_string()
            })
        );
        assert_eq!(
            parse_input("/image clear"),
            CommandResult::Run(Command::ClearImage)
        );
    }

    #[test]
    fn unknown_commands_point_to_help() {
        assert!(matches!(
            parse_input("/frobnicate"),
            CommandResult::Invalid(msg) if msg.contains("/help")
        ));
    }
}
