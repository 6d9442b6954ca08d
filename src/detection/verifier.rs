//! Fallback check used when no signature recognized the target.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::probe::payloads::verification_payload;
use crate::probe::{ProbeResponse, Prober};

pub const MATCH_STEP: u32 = 1;
pub const VERIFIED_THRESHOLD: u32 = 5;

pub const HEADER_MISMATCH: &str = "header values differ when a payload is provided";
pub const STATUS_MISMATCH: &str = "response status code differs when a payload is provided";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reasons", rename_all = "snake_case")]
pub enum Verdict {
    /// No protection identified
    Clean,
    /// Some protection suspected, with the reasons
    Suspected(Vec<String>),
    /// One of the verification requests failed
    Unverified,
}

/// Compare a normal response against a payloaded one.
///
/// Header keys are compared by presence only. Returns the mismatch reasons
/// when there are any and the match score stays within `verified`.
pub fn check_if_matched(normal: &ProbeResponse, payloaded: &ProbeResponse, step: u32, verified: u32) -> Option<BTreeSet<&'static str>> {
    let mut matched = 0u32;
    let mut reasons = BTreeSet::new();

    for key in normal.headers.keys() {
        if payloaded.headers.contains_key(key) {
            matched += step;
        } else {
            reasons.insert(HEADER_MISMATCH);
        }
    }
    if normal.status == payloaded.status {
        matched += step;
    } else {
        reasons.insert(STATUS_MISMATCH);
    }

    if !reasons.is_empty() && matched <= verified {
        Some(reasons)
    } else {
        None
    }
}

pub struct ProtectionVerifier<'a> {
    prober: &'a Prober<'a>,
}

impl<'a> ProtectionVerifier<'a> {
    pub fn new(prober: &'a Prober<'a>) -> Self {
        Self { prober }
    }

    /// Fetch a fresh baseline and one fixed payload, then compare them.
    pub async fn verify(&self, target: &str) -> Verdict {
        let normal = self.prober.fetch_one(target).await;
        let payloaded_url = format!("{}{}", target, verification_payload());
        let payloaded = self.prober.fetch_one(&payloaded_url).await;

        let (Some(normal), Some(payloaded)) = (normal, payloaded) else {
            tracing::warn!("unable to verify protection, a verification request failed");
            return Verdict::Unverified;
        };

        match check_if_matched(&normal, &payloaded, MATCH_STEP, VERIFIED_THRESHOLD) {
            Some(reasons) => Verdict::Suspected(reasons.into_iter().map(str::to_string).collect()),
            None => Verdict::Clean,
        }
    }
}
