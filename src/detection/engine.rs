use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{Result, WafError};
use crate::fingerprint::{FingerprintSink, IssueReporter};
use crate::plugins::{SignaturePlugin, UNKNOWN_FIREWALL_NAME};
use crate::probe::{ProbeResponse, ProbeSlot};

/// What the signature pass found for one target.
#[derive(Debug, Clone, Default)]
pub struct DetectionOutcome {
    /// Distinct reportable products, in first-detection order
    pub products: Vec<String>,
    /// Drives the reporting branch, see [`count_products`]
    pub product_count: usize,
    /// The unknown-firewall signature fired at least once
    pub unknown_detected: bool,
    pub fingerprint: Option<PathBuf>,
}

/// Branch selector for reporting. Counts one for "a known product is present",
/// then one more per product once several were detected, so two products give 3.
pub fn count_products(products: &[String]) -> usize {
    let mut amount = 0;
    if !products.is_empty() {
        if !products.iter().any(|p| p == UNKNOWN_FIREWALL_NAME) {
            amount += 1;
        }
        if products.len() > 1 {
            amount += products.len();
        }
    }
    amount
}

/// Runs every signature plugin against every probe response.
pub struct DetectionEngine<'a> {
    signatures: &'a [Arc<dyn SignaturePlugin>],
    fingerprints: &'a dyn FingerprintSink,
    reporter: &'a dyn IssueReporter,
}

impl<'a> DetectionEngine<'a> {
    pub fn new(signatures: &'a [Arc<dyn SignaturePlugin>], fingerprints: &'a dyn FingerprintSink, reporter: &'a dyn IssueReporter) -> Self {
        Self { signatures, fingerprints, reporter }
    }

    /// Absent slots fall back to `normal`; when that is absent too the slot is skipped.
    pub fn run(&self, url: &str, responses: &[ProbeSlot], normal: Option<&ProbeResponse>, cancel: &CancellationToken) -> Result<DetectionOutcome> {
        let mut outcome = DetectionOutcome::default();

        for slot in responses {
            if cancel.is_cancelled() {
                return Err(WafError::Cancelled);
            }
            let Some(response) = slot.as_ref().or(normal) else {
                tracing::warn!("no response was provided, skipping");
                continue;
            };

            for signature in self.signatures {
                if !signature.detect(&response.body, response.status, &response.headers) {
                    continue;
                }
                let product = signature.product();
                if product == UNKNOWN_FIREWALL_NAME {
                    if !outcome.unknown_detected {
                        outcome.unknown_detected = true;
                        outcome.fingerprint = self.capture_unknown(url, response);
                    }
                } else if !outcome.products.iter().any(|p| p == product) {
                    tracing::debug!(product, status = response.status, "signature matched");
                    outcome.products.push(product.to_string());
                }
            }
        }

        outcome.product_count = count_products(&outcome.products);
        Ok(outcome)
    }

    fn capture_unknown(&self, url: &str, response: &ProbeResponse) -> Option<PathBuf> {
        tracing::warn!("unknown firewall detected saving fingerprint to log file");
        match self.fingerprints.capture(url, response) {
            Ok(path) => {
                self.reporter.report_unknown_firewall(&path);
                Some(path)
            }
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        }
    }
}
