#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "regenerate",
        action: "regenerate",
    },
    CommandSpec {
        command: "mic",
        action: "listen",
    },
    CommandSpec {
        command: "theme",
        action: "toggle_theme",
    },
    CommandSpec {
        command: "reset_prefs",
        action: "reset_preferences",
    },
    CommandSpec {
        command: "prefs",
        action: "show_preferences",
    },
];

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "name",
        action: "set_avatar_name",
    },
    CommandSpec {
        command: "image",
        action: "set_avatar_image",
    },
    CommandSpec {
        command: "media",
        action: "suggest_media",
    },
];

pub(crate) const HISTORY_COMMAND: CommandSpec = CommandSpec {
    command: "history",
    action: "history",
};

pub(crate) const SET_COMMAND: CommandSpec = CommandSpec {
    command: "set",
    action: "set_preference",
};

pub(crate) const EXPORT_COMMAND: CommandSpec = CommandSpec {
    command: "export",
    action: "export",
};

pub(crate) const DEFAULT_HISTORY_COUNT: u64 = 20;
pub(crate) const DEFAULT_EXPORT_FORMAT: &str = "text";

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/help",
    "/regenerate",
    "/mic",
    "/theme",
    "/reset_prefs",
    "/prefs",
    "/set",
    "/name",
    "/image",
    "/media",
    "/history",
    "/export",
];
