//! Per-target orchestration: probe, identify, then verify or search for bypasses.

use std::path::PathBuf;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::bypass::{BypassSearchEngine, WorkingTamper};
use crate::config::ScanConfig;
use crate::detection::{DetectionEngine, ProtectionVerifier, Verdict};
use crate::error::Result;
use crate::fingerprint::{FingerprintSink, IssueReporter};
use crate::http_client::HttpFetcher;
use crate::plugins::PluginRegistry;
use crate::probe::Prober;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "tampers", rename_all = "snake_case")]
pub enum BypassStatus {
    /// No firewall was identified, so no search was attempted
    NotRun,
    Skipped,
    Completed(Vec<WorkingTamper>),
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub url: String,
    pub products: Vec<String>,
    pub product_count: usize,
    pub unknown_detected: bool,
    pub fingerprint: Option<PathBuf>,
    /// Only set when no product was counted
    pub verdict: Option<Verdict>,
    pub bypass: BypassStatus,
}

/// Everything a scan needs, borrowed for the duration of the run.
pub struct WafScanner<'a> {
    config: &'a ScanConfig,
    registry: &'a PluginRegistry,
    fetcher: &'a dyn HttpFetcher,
    fingerprints: &'a dyn FingerprintSink,
    reporter: &'a dyn IssueReporter,
    cancel: CancellationToken,
}

impl<'a> WafScanner<'a> {
    pub fn new(
        config: &'a ScanConfig,
        registry: &'a PluginRegistry,
        fetcher: &'a dyn HttpFetcher,
        fingerprints: &'a dyn FingerprintSink,
        reporter: &'a dyn IssueReporter,
    ) -> Self {
        Self { config, registry, fetcher, fingerprints, reporter, cancel: CancellationToken::new() }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn scan(&self, url: &str, payloads: &[String]) -> Result<ScanReport> {
        let prober = Prober::new(self.fetcher, self.config);

        tracing::info!("gathering HTTP responses");
        let responses = prober.gather(url, payloads, &self.cancel).await?;
        tracing::info!("gathering normal response to compare against");
        let normal = prober.fetch_one(url).await;

        tracing::info!("running firewall detection checks");
        let detection = DetectionEngine::new(self.registry.signatures(), self.fingerprints, self.reporter)
            .run(url, &responses, normal.as_ref(), &self.cancel)?;

        let mut report = ScanReport {
            url: url.to_string(),
            products: detection.products.clone(),
            product_count: detection.product_count,
            unknown_detected: detection.unknown_detected,
            fingerprint: detection.fingerprint.clone(),
            verdict: None,
            bypass: BypassStatus::NotRun,
        };

        match detection.product_count {
            0 => {
                tracing::warn!("no protection identified on target, verifying");
                let verdict = ProtectionVerifier::new(&prober).verify(url).await;
                match &verdict {
                    Verdict::Clean => tracing::info!(target: "wafscope::success", "no protection identified on target"),
                    Verdict::Suspected(_) => tracing::info!(target: "wafscope::success", "target seems to be behind some kind of protection"),
                    Verdict::Unverified => {}
                }
                report.verdict = Some(verdict);
            }
            1 => {
                tracing::info!(
                    target: "wafscope::success",
                    "detected website protection identified as '{}', searching for bypasses",
                    detection.products[0]
                );
                report.bypass = self.bypass(url, payloads).await?;
            }
            _ => {
                tracing::info!(target: "wafscope::success", "{}", multiple_protections_heading(detection.unknown_detected));
                for (i, product) in detection.products.iter().enumerate() {
                    tracing::info!(target: "wafscope::success", "#{} '{}'", i + 1, product);
                }
                report.bypass = self.bypass(url, payloads).await?;
            }
        }
        Ok(report)
    }

    async fn bypass(&self, url: &str, payloads: &[String]) -> Result<BypassStatus> {
        if self.config.skip_bypass_check {
            tracing::warn!("skipping bypass checks");
            return Ok(BypassStatus::Skipped);
        }
        tracing::info!("loading payload tampering scripts");
        let found = BypassSearchEngine::new(self.fetcher, self.config, self.registry.tampers())
            .search(url, payloads, &self.cancel)
            .await?;
        Ok(BypassStatus::Completed(found))
    }
}

fn multiple_protections_heading(unknown_detected: bool) -> String {
    let note = if unknown_detected { " (unknown firewall will not be displayed)" } else { "" };
    format!("multiple protections identified on target{}:", note)
}
