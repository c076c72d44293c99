//! Scripted transport for unit tests: replays queued replies and records every request.
use super::transport::{Method, Reply, Request, Transport};
use crate::core::error::{Error, ErrorKind, kind_from_status};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Recorded {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Result<Reply, (ErrorKind, String, Option<u16>)>>>>,
    calls: Arc<Mutex<Vec<Recorded>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, status: u16, body: Value) -> &Self {
        self.push(Ok(Reply {
            status,
            body: Some(body),
        }))
    }

    pub fn reply_empty(&self, status: u16) -> &Self {
        self.push(Ok(Reply { status, body: None }))
    }

    pub fn fail_status(&self, status: u16) -> &Self {
        self.push(Err((
            kind_from_status(status),
            format!("remote error status {status}"),
            Some(status),
        )))
    }

    pub fn fail_io(&self, message: &str) -> &Self {
        self.push(Err((ErrorKind::Io, message.to_string(), None)))
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls").len()
    }

    fn push(&self, entry: Result<Reply, (ErrorKind, String, Option<u16>)>) -> &Self {
        self.replies.lock().expect("replies").push_back(entry);
        self
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &Request<'_>) -> Result<Reply, Error> {
        self.calls.lock().expect("calls").push(Recorded {
            method: request.method,
            url: request.url.to_string(),
            body: request.body.cloned(),
        });
        let next = self.replies.lock().expect("replies").pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err((kind, message, status))) => {
                let err = Error::new(kind).with_message(message);
                Err(match status {
                    Some(status) => err.with_status(status),
                    None => err,
                })
            }
            None => Err(Error::new(ErrorKind::Io).with_message("no scripted reply")),
        }
    }
}
