use super::intent_parser::{classify, Intent};
use super::media::MediaType;

const EXCERPT_MAX_CHARS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseAction {
    /// Conversational reply, delivered after the "thinking" delay.
    Reply { text: String },
    /// Acknowledge now, deliver the artifact after the "generating" delay.
    Media {
        media_type: MediaType,
        acknowledgement: String,
        prompt: String,
    },
}

#[derive(Clone, Copy)]
enum Template {
    Fixed(&'static str),
    WithName(fn(&str) -> String),
}

struct ReplyRule {
    needles: &'static [&'static str],
    template: Template,
}

// Order matters: greeting is checked first, the topic hints last.
const REPLY_RULES: &[ReplyRule] = &[
    ReplyRule {
        needles: &["hello", "hi", "hey"],
        template: Template::Fixed(
            "Hello! How can I help you today? I can generate images, audio, video, code, or charts. Just let me know what you'd like to create.",
        ),
    },
    ReplyRule {
        needles: &["what can you do", "your capabilities", "help me"],
        template: Template::WithName(capability_reply),
    },
    ReplyRule {
        needles: &["who are you", "your name"],
        template: Template::WithName(identity_reply),
    },
    ReplyRule {
        needles: &["thank", "thanks"],
        template: Template::Fixed(
            "You're welcome! Is there anything else you'd like me to help you with?",
        ),
    },
    ReplyRule {
        needles: &["image", "picture", "photo"],
        template: Template::Fixed(
            "I'd be happy to generate an image for you. Please describe what you'd like to see in detail, or click the \"+\" button and select \"Generate Image\".",
        ),
    },
    ReplyRule {
        needles: &["audio", "sound", "music"],
        template: Template::Fixed(
            "I can create audio for you. Please describe what kind of audio you'd like, or click the \"+\" button and select \"Generate Audio\".",
        ),
    },
    ReplyRule {
        needles: &["video"],
        template: Template::Fixed(
            "I can generate video content for you. Please describe what you'd like to see in the video, or click the \"+\" button and select \"Generate Video\".",
        ),
    },
    ReplyRule {
        needles: &["code", "program", "script"],
        template: Template::Fixed(
            "I'd be happy to write some code for you. Please describe what functionality you need or what problem you're trying to solve, or click the \"+\" button and select \"Generate Code\".",
        ),
    },
    ReplyRule {
        needles: &["chart", "graph", "visualization"],
        template: Template::Fixed(
            "I can create data visualizations for you. Please describe what data you'd like to visualize and what type of chart would be most appropriate, or click the \"+\" button and select \"Generate Chart\".",
        ),
    },
];

fn capability_reply(name: &str) -> String {
    format!(
        "I'm {name}, your AI assistant. I can generate various types of media including images, audio clips, videos, code samples, and data visualizations. I can also answer questions and learn from our interactions to provide a more personalized experience. What would you like to create today?"
    )
}

fn identity_reply(name: &str) -> String {
    format!(
        "I'm {name}, an AI avatar assistant designed to help you generate media and answer questions. I'm constantly learning from our interactions to better assist you."
    )
}

/// First `EXCERPT_MAX_CHARS` characters of `text`, with "..." when cut.
pub fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

pub fn compose_reply(message: &str, avatar_name: &str) -> String {
    let lower = message.to_lowercase();
    let matched = REPLY_RULES
        .iter()
        .find(|rule| rule.needles.iter().any(|needle| lower.contains(needle)));
    match matched.map(|rule| rule.template) {
        Some(Template::Fixed(text)) => text.to_string(),
        Some(Template::WithName(render)) => render(avatar_name),
        None => format!(
            "I understand you're interested in \"{}\". Would you like me to generate some media related to this topic? I can create images, audio, video, code, or charts. Just let me know what you prefer.",
            excerpt(message)
        ),
    }
}

pub fn compose(message: &str, avatar_name: &str) -> ResponseAction {
    match classify(message) {
        Intent::Media(media_type) => ResponseAction::Media {
            media_type,
            acknowledgement: media_type.acknowledgement().to_string(),
            prompt: message.to_string(),
        },
        Intent::Conversational => ResponseAction::Reply {
            text: compose_reply(message, avatar_name),
        },
    }
}
