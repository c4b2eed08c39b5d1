use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Local, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::history::{Message, Sender};

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("url pattern compiles"));
static CODE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("code pattern compiles"));
static BOLD_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("bold pattern compiles"));
static ITALIC_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_]+)_").expect("italic pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Html,
    Markdown,
    Json,
}

impl ExportFormat {
    /// Unknown names fall back to plain text.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "html" | "htm" => ExportFormat::Html,
            "markdown" | "md" => ExportFormat::Markdown,
            "json" => ExportFormat::Json,
            _ => ExportFormat::Text,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Html => "html",
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain",
            ExportFormat::Html => "text/html",
            ExportFormat::Markdown => "text/markdown",
            ExportFormat::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Text => "text",
            ExportFormat::Html => "html",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Json => "json",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub format: ExportFormat,
    pub file_name: String,
    pub content: String,
}

impl ExportDocument {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Shape of the JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub timestamp: String,
    pub avatar: String,
    pub messages: Vec<Message>,
}

pub fn export_document(
    format: ExportFormat,
    avatar_name: &str,
    messages: &[Message],
    exported_at: DateTime<Local>,
) -> ExportDocument {
    let content = match format {
        ExportFormat::Text => export_text(avatar_name, messages, exported_at),
        ExportFormat::Html => export_html(avatar_name, messages, exported_at),
        ExportFormat::Markdown => export_markdown(avatar_name, messages, exported_at),
        ExportFormat::Json => export_json(avatar_name, messages, exported_at),
    };
    let stamp = exported_at
        .with_timezone(&Utc)
        .format("%Y-%m-%dT%H-%M-%S");
    ExportDocument {
        format,
        file_name: format!("epicchat-export-{stamp}.{}", format.extension()),
        content,
    }
}

fn display_time(exported_at: DateTime<Local>) -> String {
    exported_at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

fn sender_label<'a>(message: &Message, avatar_name: &'a str) -> &'a str {
    match message.sender {
        Sender::User => "You",
        Sender::Assistant => avatar_name,
    }
}

fn export_text(avatar_name: &str, messages: &[Message], exported_at: DateTime<Local>) -> String {
    let mut text = format!(
        "EpicChat Conversation with {avatar_name}\nExported on {}\n\n",
        display_time(exported_at)
    );
    for message in messages {
        text.push_str(&format!(
            "[{}] {}: {}\n\n",
            message.timestamp,
            sender_label(message, avatar_name),
            message.content
        ));
    }
    text
}

fn export_markdown(
    avatar_name: &str,
    messages: &[Message],
    exported_at: DateTime<Local>,
) -> String {
    let mut markdown = format!(
        "# EpicChat Conversation with {avatar_name}\n\n*Exported on {}*\n\n",
        display_time(exported_at)
    );
    for message in messages {
        markdown.push_str(&format!(
            "### {} ({})\n\n{}\n\n---\n\n",
            sender_label(message, avatar_name),
            message.timestamp,
            message.content
        ));
    }
    markdown
}

fn export_json(avatar_name: &str, messages: &[Message], exported_at: DateTime<Local>) -> String {
    let envelope = ExportEnvelope {
        timestamp: exported_at
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        avatar: avatar_name.to_string(),
        messages: messages.to_vec(),
    };
    serde_json::to_string_pretty(&envelope).unwrap_or_default()
}

fn export_html(avatar_name: &str, messages: &[Message], exported_at: DateTime<Local>) -> String {
    let mut cards = String::new();
    for message in messages {
        let css_class = match message.sender {
            Sender::User => "user",
            Sender::Assistant => "bot",
        };
        cards.push_str(&format!(
            "\n    <div class=\"message {css_class}\">\n        <div class=\"sender\">{sender}</div>\n        <div class=\"content\">{content}</div>\n        <div class=\"timestamp\">{timestamp}</div>\n    </div>",
            sender = escape_html(sender_label(message, avatar_name)),
            content = format_message_content(&message.content),
            timestamp = escape_html(&message.timestamp),
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    <title>EpicChat Conversation</title>\n    <style>\n        body {{ font-family: Arial, sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; color: #333; }}\n        h1 {{ color: #6C63FF; text-align: center; border-bottom: 2px solid #6C63FF; padding-bottom: 10px; }}\n        .export-info {{ text-align: center; color: #666; margin-bottom: 30px; }}\n        .message {{ margin-bottom: 20px; padding: 15px; border-radius: 10px; }}\n        .user {{ background-color: #F0F7FF; margin-left: 50px; }}\n        .bot {{ background-color: #F5F5F7; margin-right: 50px; }}\n        .timestamp {{ font-size: 0.8rem; color: #888; text-align: right; margin-top: 5px; }}\n        .sender {{ font-weight: bold; margin-bottom: 5px; }}\n        .user .sender {{ color: #2980b9; }}\n        .bot .sender {{ color: #6C63FF; }}\n    </style>\n</head>\n<body>\n    <h1>EpicChat Conversation</h1>\n    <div class=\"export-info\">\n        Conversation with {name}<br>\n        Exported on {exported}\n    </div>{cards}\n</body>\n</html>",
        name = escape_html(avatar_name),
        exported = display_time(exported_at),
    )
}

/// Render chat markup as HTML: escape the text, link URLs, then apply
/// `code`, **bold** and _italic_ spans outside of links.
pub fn format_message_content(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for found in URL_PATTERN.find_iter(content) {
        out.push_str(&format_inline(&content[cursor..found.start()]));
        let url = escape_html(found.as_str());
        out.push_str(&format!(
            "<a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">{url}</a>"
        ));
        cursor = found.end();
    }
    out.push_str(&format_inline(&content[cursor..]));
    out
}

/// Code spans are emitted verbatim; bold and italic apply only between them.
fn format_inline(text: &str) -> String {
    let escaped = escape_html(text);
    let mut out = String::with_capacity(escaped.len());
    let mut cursor = 0;
    for span in CODE_SPAN.captures_iter(&escaped) {
        let (Some(whole), Some(code)) = (span.get(0), span.get(1)) else {
            continue;
        };
        out.push_str(&format_emphasis(&escaped[cursor..whole.start()]));
        out.push_str("<code>");
        out.push_str(code.as_str());
        out.push_str("</code>");
        cursor = whole.end();
    }
    out.push_str(&format_emphasis(&escaped[cursor..]));
    out
}

fn format_emphasis(text: &str) -> String {
    let bold = BOLD_SPAN.replace_all(text, "<strong>${1}</strong>");
    ITALIC_SPAN
        .replace_all(&bold, "<em>${1}</em>")
        .into_owned()
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
