use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

/// Append-only JSONL log of one chat session.
///
/// Every line carries `type`, `session_id`, `seq` (0-based, per writer) and
/// `ts`; the caller payload is merged last and can override them. The file is
/// opened on the first emit and kept open.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<EventWriterInner>,
}

#[derive(Debug)]
struct EventWriterInner {
    path: PathBuf,
    session_id: String,
    next_seq: AtomicU64,
    file: Mutex<Option<File>>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(EventWriterInner {
                path: path.into(),
                session_id: session_id.into(),
                next_seq: AtomicU64::new(0),
                file: Mutex::new(None),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn emit(&self, event_type: &str, payload: EventPayload) -> anyhow::Result<Value> {
        let mut guard = self
            .inner
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("event writer lock poisoned"))?;

        let mut event = Map::new();
        event.insert("type".to_string(), Value::String(event_type.to_string()));
        event.insert(
            "session_id".to_string(),
            Value::String(self.inner.session_id.clone()),
        );
        event.insert(
            "seq".to_string(),
            Value::from(self.inner.next_seq.fetch_add(1, Ordering::Relaxed)),
        );
        event.insert(
            "ts".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)),
        );
        event.extend(payload);

        let mut line = serde_json::to_string(&event)?;
        line.push('\n');

        if guard.is_none() {
            *guard = Some(self.open_log()?);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(line.as_bytes())
                .with_context(|| format!("failed to append to {}", self.inner.path.display()))?;
        }

        Ok(Value::Object(event))
    }

    fn open_log(&self) -> anyhow::Result<File> {
        if let Some(parent) = self.inner.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)
            .with_context(|| format!("failed to open {}", self.inner.path.display()))
    }
}

/// Read back an event log, skipping blank lines.
pub fn read_events(path: &Path) -> anyhow::Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(anyhow::Error::from))
        .collect()
}
