//! In-memory fetcher for unit tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::NetworkError;
use crate::http_client::HttpFetcher;
use crate::probe::ProbeResponse;

type Responder = Box<dyn Fn(&str) -> Option<Result<ProbeResponse, NetworkError>> + Send + Sync>;

/// Answers from a fixed script and records every URL it was asked for.
pub struct ScriptedFetcher {
    default: Option<ProbeResponse>,
    exact: HashMap<String, Result<ProbeResponse, NetworkError>>,
    responder: Option<Responder>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    /// Every URL without a scripted answer gets `default`.
    pub fn new(default: ProbeResponse) -> Self {
        Self { default: Some(default), exact: HashMap::new(), responder: None, requested: Mutex::new(Vec::new()) }
    }

    /// Every URL without a scripted answer fails with a non-reset error.
    pub fn offline() -> Self {
        Self { default: None, exact: HashMap::new(), responder: None, requested: Mutex::new(Vec::new()) }
    }

    pub fn respond_to(mut self, url: &str, resp: ProbeResponse) -> Self {
        self.exact.insert(url.to_string(), Ok(resp));
        self
    }

    pub fn reset_on(mut self, url: &str) -> Self {
        self.exact.insert(url.to_string(), Err(NetworkError::reset(url, "connection reset by peer")));
        self
    }

    pub fn fail_on(mut self, url: &str) -> Self {
        self.exact.insert(url.to_string(), Err(NetworkError::other(url, "timed out")));
        self
    }

    /// Consulted after exact matches; returning `None` falls through to the default.
    pub fn with_responder<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Option<Result<ProbeResponse, NetworkError>> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(f));
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requested.lock().len()
    }
}

#[async_trait]
impl HttpFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<ProbeResponse, NetworkError> {
        self.requested.lock().push(url.to_string());
        if let Some(answer) = self.exact.get(url) {
            return answer.clone();
        }
        if let Some(answer) = self.responder.as_ref().and_then(|f| f(url)) {
            return answer;
        }
        self.default.clone().ok_or_else(|| NetworkError::other(url, "no scripted response"))
    }
}
