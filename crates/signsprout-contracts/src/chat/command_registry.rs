#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CommandShape {
    NoArg,
    /// Single path argument, shell-quoted paths allowed.
    Path,
    /// Free text taken verbatim.
    Text,
    /// Optional free text.
    OptionalText,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub shape: CommandShape,
}

pub(crate) const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "help",
        shape: CommandShape::NoArg,
    },
    CommandSpec {
        command: "quit",
        shape: CommandShape::NoArg,
    },
    CommandSpec {
        command: "exit",
        shape: CommandShape::NoArg,
    },
    CommandSpec {
        command: "plan",
        shape: CommandShape::NoArg,
    },
    CommandSpec {
        command: "next",
        shape: CommandShape::NoArg,
    },
    CommandSpec {
        command: "verify",
        shape: CommandShape::Path,
    },
    CommandSpec {
        command: "target",
        shape: CommandShape::Text,
    },
    CommandSpec {
        command: "view",
        shape: CommandShape::Text,
    },
    CommandSpec {
        command: "model",
        shape: CommandShape::Text,
    },
    CommandSpec {
        command: "story",
        shape: CommandShape::OptionalText,
    },
    CommandSpec {
        command: "open",
        shape: CommandShape::Text,
    },
    CommandSpec {
        command: "models",
        shape: CommandShape::NoArg,
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/plan",
    "/open <n>",
    "/verify <image>",
    "/target <WORD>",
    "/next",
    "/story [action]",
    "/view <dashboard|story|practice|parent|settings>",
    "/model <name>",
    "/models",
    "/help",
    "/quit",
];

pub(crate) fn find_command(command: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.command == command)
}
