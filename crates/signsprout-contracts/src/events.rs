use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::outcome::{FallbackCause, Outcome};

/// Keys owned by the log line itself. Details cannot shadow them.
const RESERVED_KEYS: &[&str] = &[
    "type",
    "session_id",
    "ts",
    "source",
    "model",
    "fallback_cause",
    "fallback_reason",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionPlan,
    SignVerification,
    StorySegment,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SessionPlan => "session_plan",
            EventKind::SignVerification => "sign_verification",
            EventKind::StorySegment => "story_segment",
        }
    }
}

/// One content-service call: which operation ran, whether the caller got a
/// live or fallback value, and operation-specific details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub source: &'static str,
    pub model: String,
    pub fallback_cause: Option<&'static str>,
    pub fallback_reason: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ContentEvent {
    pub fn from_outcome<T>(kind: EventKind, model: &str, outcome: &Outcome<T>) -> Self {
        let cause = outcome.cause();
        Self {
            kind,
            source: outcome.source_label(),
            model: model.to_string(),
            fallback_cause: cause.map(FallbackCause::label),
            fallback_reason: match cause {
                Some(FallbackCause::Failed(reason)) => Some(reason.clone()),
                _ => None,
            },
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        if !RESERVED_KEYS.contains(&key) {
            self.details.insert(key.to_string(), value.into());
        }
        self
    }
}

#[derive(Serialize)]
struct LogLine<'a> {
    session_id: &'a str,
    ts: String,
    #[serde(flatten)]
    event: &'a ContentEvent,
}

/// Append-only JSONL log of content requests, one compact object per line.
/// Clones write to the same file under one lock.
#[derive(Debug, Clone)]
pub struct EventWriter {
    path: PathBuf,
    session_id: Arc<str>,
    lock: Arc<Mutex<()>>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            session_id: Arc::from(session_id.into()),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Writer tagged with a fresh random session id.
    pub fn for_new_session(path: impl Into<PathBuf>) -> Self {
        Self::new(path, format!("session-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn record(&self, event: &ContentEvent) -> anyhow::Result<()> {
        let line = LogLine {
            session_id: &self.session_id,
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            event,
        };
        let mut text = serde_json::to_string(&line)?;
        text.push('\n');
        self.append(&text)
    }

    fn append(&self, text: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("event log lock poisoned"))?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(text.as_bytes())?;
        Ok(())
    }
}
