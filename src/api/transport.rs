//! Purpose: HTTP transport seam for the Pop REST endpoint.
//! Exports: `Transport`, `HttpTransport`, `Request`, `Reply`, `Method`.
//! Role: Turns one request into a decoded JSON reply or a typed error.
//! Invariants: Non-2xx statuses become errors whose kind follows `kind_from_status`.
//! Invariants: Bodies are JSON; requests with a body carry `Content-Type: application/json`.
#![allow(clippy::result_large_err)]

use crate::core::error::{Error, ErrorKind, kind_from_status};
use serde_json::Value;
use url::Url;

type ApiResult<T> = Result<T, Error>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Request<'a> {
    pub method: Method,
    pub url: &'a Url,
    pub body: Option<&'a Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub status: u16,
    /// `None` when the response body was empty.
    pub body: Option<Value>,
}

pub trait Transport: Send + Sync {
    fn send(&self, request: &Request<'_>) -> ApiResult<Reply>;
}

#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request<'_>) -> ApiResult<Reply> {
        let call = self
            .agent
            .request(request.method.as_str(), request.url.as_str())
            .set("Accept", "application/json");
        let response = match request.body {
            None => call.call(),
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to encode request json")
                        .with_source(err)
                })?;
                call.set("Content-Type", "application/json")
                    .send_string(&payload)
            }
        };

        match response {
            Ok(resp) => read_reply(resp),
            Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

fn read_reply(response: ureq::Response) -> ApiResult<Reply> {
    let status = response.status();
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    Ok(Reply {
        status,
        body: decode_body(&body)?,
    })
}

pub(crate) fn decode_body(body: &str) -> ApiResult<Option<Value>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body).map(Some).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    let mut err = Error::new(kind_from_status(status)).with_status(status);
    err = match remote_error_message(&body) {
        Some(message) => err.with_message(message),
        None => err.with_message(format!("remote error status {status}")),
    };
    err
}

/// ORDS error bodies carry `message`; some stores nest it under `error`.
fn remote_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error").and_then(|inner| inner.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
}
