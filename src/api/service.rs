//! Purpose: Data access layer for the remote Pop collection.
//! Exports: `PopService`, `Ack`, `ApiResult`, `DEFAULT_BASE_URL`.
//! Role: Issues list/get/search/create/update/delete requests and traces each outcome.
//! Invariants: Every transport failure is logged once as `{operation} failed: {error}`.
//! Invariants: Failures become caller-safe defaults; only strict lookup surfaces NotFound.
//! Invariants: Blank search terms short-circuit without touching the transport.
#![allow(clippy::result_large_err)]

use super::transport::{HttpTransport, Method, Reply, Request, Transport};
use crate::core::error::{Error, ErrorKind};
use crate::core::messages::MessageLog;
use crate::core::pop::{Pop, PopCollection};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

pub type ApiResult<T> = Result<T, Error>;

pub const DEFAULT_BASE_URL: &str =
    "https://apex.oracle.com/pls/apex/noahdoc/PopColOffline/PopsofflineAPI";

const LOG_PREFIX: &str = "PopService";

/// Opaque acknowledgement of an update or delete.
#[derive(Clone, Debug, PartialEq)]
pub struct Ack {
    pub status: u16,
    pub body: Option<Value>,
}

#[derive(Clone)]
pub struct PopService {
    inner: Arc<PopServiceInner>,
}

struct PopServiceInner {
    base_url: Url,
    transport: Arc<dyn Transport>,
    messages: MessageLog,
}

impl PopService {
    pub fn new(base_url: impl AsRef<str>, messages: MessageLog) -> ApiResult<Self> {
        Self::with_transport(base_url, HttpTransport::new(), messages)
    }

    pub fn with_transport(
        base_url: impl AsRef<str>,
        transport: impl Transport + 'static,
        messages: MessageLog,
    ) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.as_ref())?;
        Ok(Self {
            inner: Arc::new(PopServiceInner {
                base_url,
                transport: Arc::new(transport),
                messages,
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn messages(&self) -> &MessageLog {
        &self.inner.messages
    }

    /// GET base. Degrades to an empty list on failure.
    pub fn get_pops(&self) -> Vec<Pop> {
        self.fetch_pops().unwrap_or_default()
    }

    /// Like `get_pops`, but keeps a failed fetch distinguishable from an empty one.
    pub(crate) fn fetch_pops(&self) -> Option<Vec<Pop>> {
        match self.fetch_collection(&self.inner.base_url) {
            Ok(pops) => {
                self.log("fetched pops");
                Some(pops)
            }
            Err(err) => {
                self.record_failure("getPops", &err);
                None
            }
        }
    }

    /// GET base/{id}. A 404 is returned as `Err(NotFound)`; any other failure is `Ok(None)`.
    pub fn get_pop(&self, id: u64) -> ApiResult<Option<Pop>> {
        let result = item_url(&self.inner.base_url, id)
            .and_then(|url| self.send(Method::Get, &url, None))
            .and_then(decode_reply::<Pop>)
            .and_then(require_key);
        match result {
            Ok(pop) => {
                self.log(format!("fetched pop id={id}"));
                Ok(Some(pop))
            }
            Err(err) => {
                self.record_failure(&format!("getPop id={id}"), &err);
                if err.is_not_found() {
                    Err(err)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// GET base/?id={id}. Takes the first element of the 0-or-1 collection.
    pub fn get_pop_no_404(&self, id: u64) -> Option<Pop> {
        let result = query_url(&self.inner.base_url, "id", &id.to_string())
            .and_then(|url| self.fetch_collection(&url));
        match result {
            Ok(pops) => {
                let found = pops.into_iter().next();
                let outcome = if found.is_some() {
                    "fetched"
                } else {
                    "did not find"
                };
                self.log(format!("{outcome} pop id={id}"));
                found
            }
            Err(err) => {
                self.record_failure(&format!("getPop id={id}"), &err);
                None
            }
        }
    }

    /// GET base/?name={term}. Blank terms return empty without a request.
    pub fn search_pops(&self, term: &str) -> Vec<Pop> {
        if term.trim().is_empty() {
            return Vec::new();
        }
        let result = query_url(&self.inner.base_url, "name", term)
            .and_then(|url| self.fetch_collection(&url));
        match result {
            Ok(pops) => {
                if pops.is_empty() {
                    self.log(format!("no pops matching \"{term}\""));
                } else {
                    self.log(format!("found pops matching \"{term}\""));
                }
                pops
            }
            Err(err) => {
                self.record_failure("searchPops", &err);
                Vec::new()
            }
        }
    }

    /// POST base. Any client-side key is stripped; the reply must carry the assigned key.
    pub fn add_pop(&self, pop: &Pop) -> Option<Pop> {
        let draft = Pop {
            id: None,
            ..pop.clone()
        };
        let result = encode_body(&draft)
            .and_then(|body| self.send(Method::Post, &self.inner.base_url, Some(&body)))
            .and_then(decode_reply::<Pop>)
            .and_then(require_key);
        match result {
            Ok(created) => {
                if let Some(id) = created.id {
                    self.log(format!("added pop w/ id={id}"));
                }
                Some(created)
            }
            Err(err) => {
                self.record_failure("addPop", &err);
                None
            }
        }
    }

    /// PUT base with the full record. Records without a key are rejected locally.
    pub fn update_pop(&self, pop: &Pop) -> Option<Ack> {
        let Some(id) = pop.id else {
            let err = Error::new(ErrorKind::Usage).with_message("record has no popid");
            self.record_failure("updatePop", &err);
            return None;
        };
        let result = encode_body(pop)
            .and_then(|body| self.send(Method::Put, &self.inner.base_url, Some(&body)));
        match result {
            Ok(reply) => {
                self.log(format!("updated pop id={id}"));
                Some(ack(reply))
            }
            Err(err) => {
                self.record_failure("updatePop", &err);
                None
            }
        }
    }

    /// DELETE base/{id}.
    pub fn delete_pop(&self, id: u64) -> Option<Ack> {
        let result =
            item_url(&self.inner.base_url, id).and_then(|url| self.send(Method::Delete, &url, None));
        match result {
            Ok(reply) => {
                self.log(format!("deleted pop id={id}"));
                Some(ack(reply))
            }
            Err(err) => {
                self.record_failure("deletePop", &err);
                None
            }
        }
    }

    fn fetch_collection(&self, url: &Url) -> ApiResult<Vec<Pop>> {
        let reply = self.send(Method::Get, url, None)?;
        decode_reply::<PopCollection>(reply).map(PopCollection::into_pops)
    }

    fn send(&self, method: Method, url: &Url, body: Option<&Value>) -> ApiResult<Reply> {
        self.inner.transport.send(&Request { method, url, body })
    }

    fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::debug!(target: "popcol::service", "{message}");
        self.inner.messages.add(format!("{LOG_PREFIX}: {message}"));
    }

    fn record_failure(&self, operation: &str, err: &Error) {
        let text = err.chain_text();
        tracing::warn!(target: "popcol::service", operation, error = %text, "operation failed");
        self.log(format!("{operation} failed: {text}"));
    }
}

fn normalize_base_url(raw: &str) -> ApiResult<Url> {
    let mut url = Url::parse(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid base url")
            .with_hint("Use an absolute http(s) URL for the Pop collection.")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage).with_message("base url must use http or https"));
    }
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("base url cannot be a base"))?
        .pop_if_empty();
    Ok(url)
}

fn item_url(base_url: &Url, id: u64) -> ApiResult<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| Error::new(ErrorKind::Internal).with_message("base url cannot be a base"))?
        .pop_if_empty()
        .push(&id.to_string());
    Ok(url)
}

/// `base/?{key}={value}`, keeping the trailing slash the endpoint expects.
fn query_url(base_url: &Url, key: &str, value: &str) -> ApiResult<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| Error::new(ErrorKind::Internal).with_message("base url cannot be a base"))?
        .pop_if_empty()
        .push("");
    url.query_pairs_mut().append_pair(key, value);
    Ok(url)
}

fn encode_body(pop: &Pop) -> ApiResult<Value> {
    serde_json::to_value(pop).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode record")
            .with_source(err)
    })
}

fn decode_reply<T>(reply: Reply) -> ApiResult<T>
where
    T: DeserializeOwned,
{
    let body = reply.body.ok_or_else(|| {
        Error::new(ErrorKind::Internal)
            .with_message("empty response body")
            .with_status(reply.status)
    })?;
    serde_json::from_value(body).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("unexpected response shape")
            .with_source(err)
    })
}

fn require_key(pop: Pop) -> ApiResult<Pop> {
    match pop.id {
        Some(_) => Ok(pop),
        None => Err(Error::new(ErrorKind::Internal).with_message("record in reply has no popid")),
    }
}

fn ack(reply: Reply) -> Ack {
    Ack {
        status: reply.status,
        body: reply.body,
    }
}
