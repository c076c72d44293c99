//! Purpose: Define a stable, structured schema for non-fatal stderr notices.
//! Exports: `Notice`, `notice_json`, `notice_text`.
//! Role: Carries message-log lines from the CLI to stderr without touching stdout.
//! Invariants: Notices are non-fatal and never alter stdout payloads.
//! Invariants: JSON schema is additive-only.
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: String,
    pub time: Option<String>,
    pub cmd: String,
    pub message: String,
}

impl Notice {
    pub fn message(cmd: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: "message".to_string(),
            time: None,
            cmd: cmd.into(),
            message: message.into(),
        }
    }

    pub fn at(mut self, time: Option<String>) -> Self {
        self.time = time;
        self
    }
}

pub fn notice_json(notice: &Notice) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(notice.kind));
    if let Some(time) = &notice.time {
        inner.insert("time".to_string(), json!(time));
    }
    inner.insert("cmd".to_string(), json!(notice.cmd));
    inner.insert("message".to_string(), json!(notice.message));

    let mut outer = Map::new();
    outer.insert("notice".to_string(), Value::Object(inner));
    Value::Object(outer)
}

pub fn notice_text(notice: &Notice) -> String {
    format!("notice: {}", notice.message)
}
