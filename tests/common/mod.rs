//! Scripted fetcher for end-to-end scenarios.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use wafscope::http_client::HttpFetcher;
use wafscope::{NetworkError, ProbeResponse};

/// Answers from a fixed script and records every URL it was asked for.
pub struct ScriptedFetcher {
    default: ProbeResponse,
    exact: HashMap<String, ProbeResponse>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new(default: ProbeResponse) -> Self {
        Self { default, exact: HashMap::new(), requested: Mutex::new(Vec::new()) }
    }

    pub fn respond_to(mut self, url: &str, resp: ProbeResponse) -> Self {
        self.exact.insert(url.to_string(), resp);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requested.lock().len()
    }
}

#[async_trait]
impl HttpFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<ProbeResponse, NetworkError> {
        self.requested.lock().push(url.to_string());
        Ok(self.exact.get(url).cloned().unwrap_or_else(|| self.default.clone()))
    }
}
