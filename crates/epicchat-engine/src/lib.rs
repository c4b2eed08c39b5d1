pub mod config;
pub mod media;
pub mod scheduler;
pub mod speech;
pub mod store;

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Local};
use epicchat_contracts::chat::{compose, MediaType, ResponseAction, GENERIC_ACKNOWLEDGEMENT};
use epicchat_contracts::events::{EventPayload, EventWriter};
use epicchat_contracts::export::{ExportDocument, ExportFormat};
use epicchat_contracts::history::{ConversationLog, LearningLog, LearningRecord, Message};
use epicchat_contracts::profile::{AvatarProfile, Preferences, Theme};
use serde_json::{json, Value};

pub use config::{ReplyPolicy, SessionConfig};
pub use media::{MediaArtifact, MediaSynthesizer, PlaceholderMedia};
pub use scheduler::{Pending, ReplyScheduler};
pub use speech::{
    NoSpeech, SpeechError, SpeechInput, TranscriptFile, SPEECH_UNSUPPORTED_MESSAGE,
};
pub use store::{FileStore, KeyValueStore, MemoryStore, PersistedState, PersistenceStore};

pub const PREFERENCES_UPDATED_MESSAGE: &str = "Your preferences have been updated.";
pub const EMPTY_EXPORT_MESSAGE: &str = "There is no chat history to export.";

/// The most recent media request; `regenerate` replays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub id: u64,
    pub media_type: MediaType,
    pub prompt: String,
    pub generated_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Reply(Message),
    /// `media_type` is `None` when the request named an unrecognized type.
    Artifact {
        media_type: Option<MediaType>,
        content: String,
        message: Message,
    },
}

impl Delivery {
    pub fn message(&self) -> &Message {
        match self {
            Delivery::Reply(message) => message,
            Delivery::Artifact { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub document: Option<ExportDocument>,
    pub message: Message,
}

/// One avatar conversation: persisted state, delayed replies and the current
/// media request. Time is always passed in by the caller.
pub struct ChatSession {
    session_id: String,
    config: SessionConfig,
    state: PersistedState,
    store: PersistenceStore,
    scheduler: ReplyScheduler,
    synthesizer: Box<dyn MediaSynthesizer>,
    events: Option<EventWriter>,
    current_media: Option<MediaRequest>,
    next_media_id: u64,
    speech_available: bool,
}

impl ChatSession {
    pub fn open(store: PersistenceStore, config: SessionConfig) -> Self {
        let store = store.with_capacities(config.history_capacity, config.learning_capacity);
        let state = store.load();
        tracing::debug!(
            messages = state.chat_history.len(),
            learning = state.learning_log.len(),
            "loaded chat session"
        );
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            scheduler: ReplyScheduler::new(config.reply_policy),
            config,
            state,
            store,
            synthesizer: Box::new(PlaceholderMedia),
            events: None,
            current_media: None,
            next_media_id: 1,
            speech_available: true,
        }
    }

    /// Append session events to a JSONL file and record `session_started`.
    pub fn with_event_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.events = Some(EventWriter::new(path, self.session_id.clone()));
        self.emit(
            "session_started",
            json!({
                "avatar": self.state.avatar.name,
                "messages": self.state.chat_history.len(),
                "reply_policy": format!("{:?}", self.config.reply_policy).to_lowercase(),
                "synthesizer": self.synthesizer.name(),
            }),
        );
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: impl MediaSynthesizer + 'static) -> Self {
        self.synthesizer = Box::new(synthesizer);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn preferences(&self) -> &Preferences {
        &self.state.preferences
    }

    pub fn avatar(&self) -> &AvatarProfile {
        &self.state.avatar
    }

    pub fn history(&self) -> &ConversationLog {
        &self.state.chat_history
    }

    pub fn learning_log(&self) -> &LearningLog {
        &self.state.learning_log
    }

    pub fn current_media(&self) -> Option<&MediaRequest> {
        self.current_media.as_ref()
    }

    pub fn event_log_path(&self) -> Option<PathBuf> {
        self.events.as_ref().map(|events| events.path().to_path_buf())
    }

    pub fn has_pending(&self) -> bool {
        !self.scheduler.is_empty()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.scheduler.next_due()
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech_available && self.state.preferences.speech_recognition
    }

    /// Handle one line of user text. Returns the messages appended right away;
    /// the reply itself arrives through `poll`.
    pub fn send(&mut self, text: &str, now: Instant) -> Vec<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let user = Message::user(text);
        self.append(user.clone());
        let mut appended = vec![user];

        match compose(text, &self.state.avatar.name) {
            ResponseAction::Media {
                media_type,
                acknowledgement,
                prompt,
            } => {
                let ack = self.begin_media(Some(media_type), acknowledgement, prompt, now);
                appended.push(ack);
            }
            ResponseAction::Reply { text: reply } => {
                self.state
                    .learning_log
                    .push(LearningRecord::from_input(text));
                self.schedule(now, self.config.reply_delay, Pending::Reply { text: reply });
            }
        }

        self.persist();
        appended
    }

    /// Request media by type name. Unrecognized names are acknowledged
    /// generically and later deliver an empty artifact.
    pub fn request_media(&mut self, type_name: &str, prompt: &str, now: Instant) -> Message {
        let media_type = MediaType::parse(type_name);
        let acknowledgement = media_type
            .map(MediaType::acknowledgement)
            .unwrap_or(GENERIC_ACKNOWLEDGEMENT)
            .to_string();
        let message = self.begin_media(media_type, acknowledgement, prompt.to_string(), now);
        self.persist();
        message
    }

    /// Deliver everything due at `now`.
    pub fn poll(&mut self, now: Instant) -> Vec<Delivery> {
        let due = self.scheduler.take_due(now);
        if due.is_empty() {
            return Vec::new();
        }

        let mut deliveries = Vec::with_capacity(due.len());
        for pending in due {
            let delivery = match pending {
                Pending::Reply { text } => {
                    let message = Message::assistant(text);
                    self.append(message.clone());
                    Delivery::Reply(message)
                }
                Pending::Artifact {
                    request_id,
                    media_type,
                    prompt,
                    regenerated,
                } => self.deliver_artifact(request_id, media_type, &prompt, regenerated),
            };
            deliveries.push(delivery);
        }
        self.persist();
        deliveries
    }

    /// Re-run the current media request. `None` when nothing was requested yet.
    pub fn regenerate(&mut self, now: Instant) -> Option<Message> {
        let request = self.current_media.clone()?;
        let notice = Message::assistant(request.media_type.regeneration_notice());
        self.append(notice.clone());
        self.schedule(
            now,
            self.config.regenerate_delay,
            Pending::Artifact {
                request_id: request.id,
                media_type: Some(request.media_type),
                prompt: request.prompt,
                regenerated: true,
            },
        );
        self.persist();
        Some(notice)
    }

    /// Invite the user to describe a media request; unknown types get nothing.
    pub fn suggest_media(&mut self, type_name: &str) -> Option<Message> {
        let media_type = MediaType::parse(type_name)?;
        let message = Message::assistant(media_type.suggestion());
        self.append(message.clone());
        self.persist();
        Some(message)
    }

    pub fn save_preferences(&mut self, preferences: Preferences) -> Message {
        self.state.preferences = preferences;
        self.preferences_changed();
        self.confirm(PREFERENCES_UPDATED_MESSAGE)
    }

    /// Update a single preference from user text; nothing changes on error.
    pub fn set_preference(&mut self, key: &str, value: &str) -> anyhow::Result<Message> {
        let mut preferences = self.state.preferences.clone();
        preferences.set(key, value)?;
        Ok(self.save_preferences(preferences))
    }

    pub fn reset_preferences(&mut self) {
        self.state.preferences = Preferences::default();
        self.preferences_changed();
        self.persist();
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.state.preferences.theme.toggled();
        self.state.preferences.theme = theme;
        self.preferences_changed();
        self.persist();
        theme
    }

    /// Blank names and images keep the current value.
    pub fn save_avatar(&mut self, name: Option<&str>, image: Option<&str>) -> Message {
        if let Some(name) = name.map(str::trim).filter(|name| !name.is_empty()) {
            self.state.avatar.name = name.to_string();
        }
        if let Some(image) = image.map(str::trim).filter(|image| !image.is_empty()) {
            self.state.avatar.image = image.to_string();
        }
        self.emit(
            "avatar_saved",
            json!({
                "name": self.state.avatar.name,
                "image": self.state.avatar.image,
            }),
        );
        let text = format!(
            "I've updated my appearance. You can call me {} now.",
            self.state.avatar.name
        );
        self.confirm(&text)
    }

    /// Render the whole history. The confirmation is appended after the
    /// document is built, so it is not part of the export.
    pub fn export(&mut self, format: ExportFormat, now: DateTime<Local>) -> ExportOutcome {
        if self.state.chat_history.is_empty() {
            return ExportOutcome {
                document: None,
                message: self.confirm(EMPTY_EXPORT_MESSAGE),
            };
        }

        let document = self
            .state
            .chat_history
            .export_all(format, &self.state.avatar.name, now);
        self.emit(
            "history_exported",
            json!({
                "format": format.to_string(),
                "file_name": document.file_name,
                "messages": self.state.chat_history.len(),
            }),
        );
        let text = format!(
            "Your chat history has been exported as {}.",
            format.to_string().to_uppercase()
        );
        ExportOutcome {
            document: Some(document),
            message: self.confirm(&text),
        }
    }

    /// Take one transcript from `speech` and handle it like typed text. An
    /// unsupported or failing source disables speech for the rest of the
    /// session.
    pub fn listen(&mut self, speech: &mut dyn SpeechInput, now: Instant) -> Vec<Message> {
        if !self.speech_enabled() || !speech.is_supported() {
            self.speech_available = false;
            return vec![self.confirm(SPEECH_UNSUPPORTED_MESSAGE)];
        }

        match speech.listen() {
            Ok(transcript) => self.send(&transcript, now),
            Err(SpeechError::Unsupported) => {
                self.speech_available = false;
                vec![self.confirm(SPEECH_UNSUPPORTED_MESSAGE)]
            }
            Err(err) => {
                tracing::warn!(error = %err, "speech input failed");
                self.speech_available = false;
                vec![self.confirm(&format!("Speech recognition stopped: {err}."))]
            }
        }
    }

    /// Save all categories now. Returns false if any write failed.
    pub fn persist(&self) -> bool {
        self.store.save(&self.state)
    }

    fn begin_media(
        &mut self,
        media_type: Option<MediaType>,
        acknowledgement: String,
        prompt: String,
        now: Instant,
    ) -> Message {
        let request_id = self.next_media_id;
        self.next_media_id += 1;
        if let Some(media_type) = media_type {
            self.current_media = Some(MediaRequest {
                id: request_id,
                media_type,
                prompt: prompt.clone(),
                generated_content: None,
            });
        }

        let ack = Message::assistant(acknowledgement);
        self.append(ack.clone());
        self.schedule(
            now,
            self.config.media_delay,
            Pending::Artifact {
                request_id,
                media_type,
                prompt,
                regenerated: false,
            },
        );
        ack
    }

    fn deliver_artifact(
        &mut self,
        request_id: u64,
        media_type: Option<MediaType>,
        prompt: &str,
        regenerated: bool,
    ) -> Delivery {
        let artifact = media::synthesize_artifact(self.synthesizer.as_ref(), media_type, prompt);
        if let Some(current) = self
            .current_media
            .as_mut()
            .filter(|current| current.id == request_id)
        {
            current.generated_content = Some(artifact.content.clone());
        }

        self.emit(
            "artifact_delivered",
            json!({
                "request_id": request_id,
                "media_type": media_type.map(MediaType::as_str),
                "regenerated": regenerated,
                "content": artifact.content,
            }),
        );

        let completion = match (media_type, regenerated) {
            (Some(media_type), true) => media_type.regeneration_completion(),
            _ => artifact.completion,
        };
        let message = Message::assistant(completion);
        self.append(message.clone());
        Delivery::Artifact {
            media_type,
            content: artifact.content,
            message,
        }
    }

    fn schedule(&mut self, now: Instant, delay: std::time::Duration, pending: Pending) {
        let cancelled = self.scheduler.schedule(now, delay, pending);
        if cancelled > 0 {
            tracing::debug!(cancelled, "superseded pending replies");
            self.emit("replies_superseded", json!({ "cancelled": cancelled }));
        }
    }

    fn append(&mut self, message: Message) {
        self.emit(
            "message_appended",
            json!({
                "sender": message.sender,
                "content": message.content,
                "timestamp": message.timestamp,
            }),
        );
        self.state.chat_history.append(message);
    }

    /// Append an assistant message and save.
    fn confirm(&mut self, text: &str) -> Message {
        let message = Message::assistant(text);
        self.append(message.clone());
        self.persist();
        message
    }

    fn preferences_changed(&mut self) {
        let entries = self
            .state
            .preferences
            .entries()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        self.emit("preferences_saved", Value::Object(entries));
    }

    fn emit(&self, event_type: &str, payload: Value) {
        let Some(events) = &self.events else {
            return;
        };
        if let Err(err) = events.emit(event_type, map_object(payload)) {
            tracing::warn!(event_type, error = %err, "failed to write session event");
        }
    }
}

fn map_object(value: Value) -> EventPayload {
    match value {
        Value::Object(map) => map,
        _ => EventPayload::new(),
    }
}
