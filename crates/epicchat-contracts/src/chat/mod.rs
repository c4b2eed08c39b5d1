mod command_registry;
mod intent_parser;
mod media;
mod replies;
mod sentiment;

pub use command_registry::CHAT_HELP_COMMANDS;
pub use intent_parser::{
    classify, extract_keywords, parse_chat_input, ChatInput, Command, Intent,
};
pub use media::{MediaType, GENERIC_ACKNOWLEDGEMENT, GENERIC_COMPLETION};
pub use replies::{compose, compose_reply, excerpt, ResponseAction};
pub use sentiment::{analyze_sentiment, Sentiment};
