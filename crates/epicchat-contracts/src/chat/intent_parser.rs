use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, DEFAULT_EXPORT_FORMAT, DEFAULT_HISTORY_COUNT, EXPORT_COMMAND, HISTORY_COMMAND,
    NO_ARG_COMMANDS, RAW_ARG_COMMANDS, SET_COMMAND,
};
use super::media::{MediaType, MEDIA_REQUEST_PHRASES};

const MAX_KEYWORDS: usize = 5;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "with", "about", "of",
    "generate", "create", "make", "please", "would", "like", "want", "image", "picture", "photo",
    "showing",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Media(MediaType),
    Conversational,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub action: String,
    pub raw: String,
    pub args: BTreeMap<String, Value>,
}

impl Command {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            args: BTreeMap::new(),
        }
    }

    fn with_arg(mut self, key: &str, value: Value) -> Self {
        self.args.insert(key.to_string(), value);
        self
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }
}

/// What one line of user input asks the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatInput {
    Noop,
    Command(Command),
    Message(String),
}

/// Classify a free-text message as a media generation request or plain chat.
///
/// Matching is a case-insensitive substring scan of the phrase table; the
/// table order breaks ties when phrases for several types appear.
pub fn classify(message: &str) -> Intent {
    let lower = message.to_lowercase();
    MEDIA_REQUEST_PHRASES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|phrase| lower.contains(phrase)))
        .map(|(media_type, _)| Intent::Media(*media_type))
        .unwrap_or(Intent::Conversational)
}

pub fn extract_keywords(prompt: &str) -> Vec<String> {
    let cleaned: String = prompt
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || ch.is_whitespace())
        .collect();
    cleaned
        .split_whitespace()
        .filter(|word| word.len() > 2 && !STOP_WORDS.contains(word))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn split_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_single_arg(arg: &str) -> String {
    split_args(arg).join(" ")
}

pub fn parse_chat_input(text: &str) -> ChatInput {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return ChatInput::Noop;
    }

    let Some(slash_tail) = raw_trimmed.strip_prefix('/') else {
        return ChatInput::Message(raw_trimmed.to_string());
    };
    let command_len = slash_tail
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .count();
    if command_len == 0 {
        return ChatInput::Message(raw_trimmed.to_string());
    }

    let command = slash_tail[..command_len].to_ascii_lowercase();
    let arg = slash_tail[command_len..].trim();

    if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
        return ChatInput::Command(Command::new(action, text));
    }

    if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
        let key = match action {
            "set_avatar_name" => "name",
            "set_avatar_image" => "image",
            _ => "media_type",
        };
        return ChatInput::Command(
            Command::new(action, text).with_arg(key, Value::String(parse_single_arg(arg))),
        );
    }

    if command == HISTORY_COMMAND.command {
        let count = arg
            .split_whitespace()
            .next()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_HISTORY_COUNT);
        return ChatInput::Command(
            Command::new(HISTORY_COMMAND.action, text).with_arg("count", Value::from(count)),
        );
    }

    if command == SET_COMMAND.command {
        let mut parts = split_args(arg).into_iter();
        let key = parts.next().unwrap_or_default();
        let value = parts.collect::<Vec<String>>().join(" ");
        return ChatInput::Command(
            Command::new(SET_COMMAND.action, text)
                .with_arg("key", Value::String(key))
                .with_arg("value", Value::String(value)),
        );
    }

    if command == EXPORT_COMMAND.command {
        let format = if arg.is_empty() {
            DEFAULT_EXPORT_FORMAT.to_string()
        } else {
            arg.to_ascii_lowercase()
        };
        return ChatInput::Command(
            Command::new(EXPORT_COMMAND.action, text).with_arg("format", Value::String(format)),
        );
    }

    ChatInput::Command(
        Command::new("unknown", text)
            .with_arg("command", Value::String(command))
            .with_arg("arg", Value::String(arg.to_string())),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{classify, extract_keywords, parse_chat_input, ChatInput, Command, Intent};
    use crate::chat::MediaType;

    fn command(text: &str) -> Command {
        match parse_chat_input(text) {
            ChatInput::Command(command) => command,
            other => panic!("expected a command for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn classify_detects_each_media_type() {
        assert_eq!(
            classify("Please generate image of a cat"),
            Intent::Media(MediaType::Image)
        );
        assert_eq!(
            classify("can you MAKE AUDIO for my intro"),
            Intent::Media(MediaType::Audio)
        );
        assert_eq!(
            classify("make a video of waves"),
            Intent::Media(MediaType::Video)
        );
        assert_eq!(
            classify("write code that sorts"),
            Intent::Media(MediaType::Code)
        );
        assert_eq!(
            classify("create chart of sales"),
            Intent::Media(MediaType::Chart)
        );
    }

    #[test]
    fn classify_breaks_ties_by_table_order() {
        assert_eq!(
            classify("generate audio and generate image"),
            Intent::Media(MediaType::Image)
        );
        assert_eq!(
            classify("generate chart then write code"),
            Intent::Media(MediaType::Code)
        );
    }

    #[test]
    fn classify_falls_back_to_conversational() {
        assert_eq!(classify("tell me about images"), Intent::Conversational);
        assert_eq!(classify(""), Intent::Conversational);
        assert_eq!(classify("write python code"), Intent::Conversational);
    }

    #[test]
    fn extract_keywords_drops_stop_words_and_short_tokens() {
        assert_eq!(
            extract_keywords("Please create image of a red fox and blue sky"),
            vec!["red", "fox", "blue", "sky"]
        );
    }

    #[test]
    fn extract_keywords_strips_punctuation_and_caps_at_five() {
        let keywords =
            extract_keywords("Sunset, mountains! rivers; forests? deserts: oceans... glaciers");
        assert_eq!(
            keywords,
            vec!["sunset", "mountains", "rivers", "forests", "deserts"]
        );
        assert!(extract_keywords("a an to of").is_empty());
        assert!(extract_keywords("   ").is_empty());
    }

    #[test]
    fn parse_empty_input_is_noop() {
        assert_eq!(parse_chat_input(""), ChatInput::Noop);
        assert_eq!(parse_chat_input("   \n\t"), ChatInput::Noop);
    }

    #[test]
    fn parse_plain_text_is_trimmed_message() {
        assert_eq!(
            parse_chat_input("  hello there \n"),
            ChatInput::Message("hello there".to_string())
        );
        assert_eq!(
            parse_chat_input("/ not a command"),
            ChatInput::Message("/ not a command".to_string())
        );
    }

    #[test]
    fn parse_no_arg_commands() {
        assert_eq!(command("/help").action, "help");
        assert_eq!(command("/regenerate").action, "regenerate");
        assert_eq!(command("/mic").action, "listen");
        assert_eq!(command("/THEME").action, "toggle_theme");
        assert_eq!(command("/reset_prefs").action, "reset_preferences");
    }

    #[test]
    fn parse_raw_arg_commands() {
        let name = command("/name \"Nova Prime\"");
        assert_eq!(name.action, "set_avatar_name");
        assert_eq!(name.args["name"], json!("Nova Prime"));

        let media = command("/media chart");
        assert_eq!(media.action, "suggest_media");
        assert_eq!(media.arg_str("media_type"), Some("chart"));
    }

    #[test]
    fn parse_history_count_defaults_to_twenty() {
        assert_eq!(command("/history").args["count"], json!(20));
        assert_eq!(command("/history 5").args["count"], json!(5));
        assert_eq!(command("/history lots").args["count"], json!(20));
    }

    #[test]
    fn parse_set_splits_key_and_value() {
        let set = command("/set voice \"deep male\"");
        assert_eq!(set.action, "set_preference");
        assert_eq!(set.args["key"], json!("voice"));
        assert_eq!(set.args["value"], json!("deep male"));
    }

    #[test]
    fn parse_export_defaults_to_text() {
        assert_eq!(command("/export").args["format"], json!("text"));
        assert_eq!(command("/export JSON").args["format"], json!("json"));
    }

    #[test]
    fn parse_unknown_command() {
        let unknown = command("/teleport far away");
        assert_eq!(unknown.action, "unknown");
        assert_eq!(unknown.args["command"], json!("teleport"));
        assert_eq!(unknown.args["arg"], json!("far away"));
    }
}
