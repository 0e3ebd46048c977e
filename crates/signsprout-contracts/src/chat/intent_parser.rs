use super::command_registry::{find_command, CommandShape};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Noop,
    Help,
    Quit,
    Plan,
    /// Opens entry `entry` (1-based, as printed) of the last plan.
    Open { entry: String },
    Verify { path: String },
    Target { word: String },
    NextWord,
    Story { action: Option<String> },
    View { name: String },
    Model { name: String },
    Models,
    /// Slash command that needs an argument but got none.
    MissingArgument { command: String },
    Unknown { command: String },
    /// Plain text: treated as the child's latest story action.
    StoryAction { text: String },
}

fn parse_path_arg(arg: &str) -> String {
    let parts = match shell_words::split(arg) {
        Ok(parts) => parts,
        Err(_) => arg.split_whitespace().map(str::to_string).collect(),
    };
    parts
        .into_iter()
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_command(text: &str) -> ChatCommand {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ChatCommand::Noop;
    }

    let Some(slash_tail) = trimmed.strip_prefix('/') else {
        return ChatCommand::StoryAction {
            text: trimmed.to_string(),
        };
    };

    let command_len = slash_tail
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .count();
    let command = slash_tail[..command_len].to_ascii_lowercase();
    let arg = slash_tail[command_len..].trim();

    let Some(spec) = find_command(&command) else {
        return ChatCommand::Unknown { command };
    };

    let needs_arg = matches!(spec.shape, CommandShape::Path | CommandShape::Text);
    let value = if spec.shape == CommandShape::Path {
        parse_path_arg(arg)
    } else {
        arg.to_string()
    };
    if needs_arg && value.is_empty() {
        return ChatCommand::MissingArgument { command };
    }

    match spec.command {
        "help" => ChatCommand::Help,
        "quit" | "exit" => ChatCommand::Quit,
        "plan" => ChatCommand::Plan,
        "next" => ChatCommand::NextWord,
        "verify" => ChatCommand::Verify { path: value },
        "target" => ChatCommand::Target {
            word: value.to_ascii_uppercase(),
        },
        "view" => ChatCommand::View { name: value },
        "model" => ChatCommand::Model { name: value },
        "models" => ChatCommand::Models,
        "open" => ChatCommand::Open { entry: value },
        "story" => ChatCommand::Story {
            action: Some(value).filter(|action| !action.is_empty()),
        },
        _ => ChatCommand::Unknown { command },
    }
}
