//! Search for tampers that get payloads past the identified firewall.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::ScanConfig;
use crate::detection::FailureSignatureBank;
use crate::error::{Result, WafError};
use crate::http_client::HttpFetcher;
use crate::plugins::TamperPlugin;

/// Upper bound on collected working tampers per run.
pub const MAX_SUCCESSFUL_PAYLOADS: usize = 5;

/// A tamper that produced a clean 200 response.
#[derive(Clone, Serialize)]
pub struct WorkingTamper {
    pub type_name: String,
    /// The tamper's own example, re-tampered for display
    pub example: String,
    pub tamper_id: String,
    #[serde(skip)]
    pub plugin: Arc<dyn TamperPlugin>,
}

impl WorkingTamper {
    fn key(&self) -> (&str, &str, &str) {
        (&self.type_name, &self.example, &self.tamper_id)
    }
}

impl PartialEq for WorkingTamper {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for WorkingTamper {}

impl fmt::Debug for WorkingTamper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkingTamper")
            .field("type_name", &self.type_name)
            .field("example", &self.example)
            .field("tamper_id", &self.tamper_id)
            .finish()
    }
}

/// Tries every tamper against every payload until the quota is reached.
pub struct BypassSearchEngine<'a> {
    fetcher: &'a dyn HttpFetcher,
    config: &'a ScanConfig,
    tampers: &'a [Arc<dyn TamperPlugin>],
}

impl<'a> BypassSearchEngine<'a> {
    pub fn new(fetcher: &'a dyn HttpFetcher, config: &'a ScanConfig, tampers: &'a [Arc<dyn TamperPlugin>]) -> Self {
        Self { fetcher, config, tampers }
    }

    pub async fn search(&self, url: &str, payloads: &[String], cancel: &CancellationToken) -> Result<Vec<WorkingTamper>> {
        let mut working: Vec<WorkingTamper> = Vec::new();
        let verbose = self.config.verbose;

        tracing::info!("running tampering bypass checks");
        'tampers: for tamper in self.tampers {
            if verbose {
                tracing::debug!("currently tampering with script '{}'", tamper.id());
            }
            for vector in payloads {
                if cancel.is_cancelled() {
                    return Err(WafError::Cancelled);
                }
                let tampered = match tamper.tamper(vector) {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::warn!("{}, skipping", e);
                        continue;
                    }
                };
                if verbose {
                    tracing::debug!(target: "wafscope::payload", "{}", tampered.trim());
                }

                let payloaded_url = format!("{}{}", url, tampered);
                let response = match self.fetcher.fetch(&payloaded_url).await {
                    Ok(r) => Some(r),
                    Err(e) => {
                        crate::probe::prober::log_network_error(&e, Some(&tampered));
                        None
                    }
                };
                let status = response.as_ref().map(|r| r.status).unwrap_or(0);

                if FailureSignatureBank::is_failure(response.as_ref().map(|r| r.body.as_str())) {
                    if verbose {
                        tracing::warn!("failure found in response content");
                    }
                } else {
                    if verbose {
                        if status != 0 {
                            tracing::debug!("response code: {}", status);
                        } else {
                            tracing::debug!("unknown response detected");
                        }
                    }
                    if status != 404 && status == 200 {
                        self.record(&mut working, tamper);
                    }
                }

                if working.len() == MAX_SUCCESSFUL_PAYLOADS {
                    break 'tampers;
                }
            }
        }
        Ok(working)
    }

    fn record(&self, working: &mut Vec<WorkingTamper>, tamper: &Arc<dyn TamperPlugin>) {
        let example = match tamper.tamper(tamper.example_payload()) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("unable to render example payload: {}", e);
                return;
            }
        };
        let entry = WorkingTamper {
            type_name: tamper.type_name().to_string(),
            example,
            tamper_id: tamper.id().to_string(),
            plugin: Arc::clone(tamper),
        };
        if !working.contains(&entry) {
            tracing::debug!(tamper = %entry.tamper_id, "working tamper found");
            working.push(entry);
        }
    }
}
