use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::bounded::BoundedLog;
use super::DEFAULT_HISTORY_CAPACITY;
use crate::export::{export_document, ExportDocument, ExportFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "bot", alias = "assistant")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub sender: Sender,
    pub timestamp: String,
}

impl Message {
    pub fn new(content: impl Into<String>, sender: Sender, timestamp: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sender,
            timestamp: timestamp.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, Sender::User, now_local_time())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content, Sender::Assistant, now_local_time())
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Wall-clock time the way the chat shows it, e.g. `3:04:05 PM`.
pub fn now_local_time() -> String {
    Local::now().format("%-I:%M:%S %p").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationLog {
    messages: BoundedLog<Message>,
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ConversationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: BoundedLog::new(capacity),
        }
    }

    pub fn from_messages(messages: Vec<Message>, capacity: usize) -> Self {
        Self {
            messages: BoundedLog::from_entries(messages, capacity),
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn recent(&self, n: usize) -> &[Message] {
        self.messages.recent(n)
    }

    pub fn messages(&self) -> &[Message] {
        self.messages.entries()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn export_all(
        &self,
        format: ExportFormat,
        avatar_name: &str,
        exported_at: DateTime<Local>,
    ) -> ExportDocument {
        export_document(format, avatar_name, self.messages(), exported_at)
    }
}
