use rand::seq::SliceRandom;
use tokio_util::sync::CancellationToken;

use crate::config::ScanConfig;
use crate::error::{NetworkError, Result, WafError};
use crate::http_client::HttpFetcher;
use crate::probe::payloads::{origin_of, RANDOM_HOMEPAGES};
use crate::probe::response::ProbeResponse;

/// A probe slot: `None` when the request failed.
pub type ProbeSlot = Option<ProbeResponse>;

/// Issues the primary/control request pairs for a target.
pub struct Prober<'a> {
    fetcher: &'a dyn HttpFetcher,
    config: &'a ScanConfig,
}

impl<'a> Prober<'a> {
    pub fn new(fetcher: &'a dyn HttpFetcher, config: &'a ScanConfig) -> Self {
        Self { fetcher, config }
    }

    /// Probe every payload. Returns exactly `2 * payloads.len()` slots: the
    /// payloaded request at even offsets, the control request right after it.
    pub async fn gather(&self, target: &str, payloads: &[String], cancel: &CancellationToken) -> Result<Vec<ProbeSlot>> {
        let origin = origin_of(target)?;
        let mut slots = Vec::with_capacity(payloads.len() * 2);

        for vector in payloads {
            if cancel.is_cancelled() {
                return Err(WafError::Cancelled);
            }
            let primary_url = format!("{}{}", target, vector);
            let homepage = RANDOM_HOMEPAGES.choose(&mut rand::thread_rng()).copied().unwrap_or("index.html");
            let secondary_url = format!("{}/{}", origin, homepage);

            if self.config.verbose {
                tracing::debug!(target: "wafscope::payload", "{}", vector.trim());
                tracing::debug!("trying: '{}'", primary_url);
            }
            slots.push(self.fetch_slot(&primary_url, vector).await);

            if self.config.verbose {
                tracing::debug!("trying: '{}'", secondary_url);
            }
            slots.push(self.fetch_slot(&secondary_url, vector).await);
        }
        Ok(slots)
    }

    async fn fetch_slot(&self, url: &str, vector: &str) -> ProbeSlot {
        match self.fetcher.fetch(url).await {
            Ok(resp) => Some(resp),
            Err(e) => {
                log_network_error(&e, Some(vector));
                None
            }
        }
    }

    /// Single unpaired request, used for the normal baseline.
    pub async fn fetch_one(&self, url: &str) -> ProbeSlot {
        match self.fetcher.fetch(url).await {
            Ok(resp) => Some(resp),
            Err(e) => {
                log_network_error(&e, None);
                None
            }
        }
    }
}

pub(crate) fn log_network_error(err: &NetworkError, vector: Option<&str>) {
    if err.is_reset() {
        tracing::warn!(url = %err.url, "possible network level firewall detected (hardware), received an aborted connection");
    } else {
        match vector {
            Some(v) => tracing::error!(url = %err.url, "failed to obtain target meta-data with payload {}, error: '{}'", v.trim(), err.message),
            None => tracing::error!(url = %err.url, "failed to obtain target meta-data, error: '{}'", err.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedFetcher;

    fn payloads(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("?id={}'", i)).collect()
    }

    #[tokio::test]
    async fn test_two_slots_per_payload() {
        let fetcher = ScriptedFetcher::new(ProbeResponse::new(200, "Welcome"));
        let cfg = ScanConfig::default();
        let prober = Prober::new(&fetcher, &cfg);
        for n in [0, 1, 4] {
            let slots = prober.gather("http://example.com/", &payloads(n), &CancellationToken::new()).await.unwrap();
            assert_eq!(slots.len(), 2 * n);
        }
    }

    #[tokio::test]
    async fn test_pairing_and_failures_keep_position() {
        let fetcher = ScriptedFetcher::new(ProbeResponse::new(200, "home"))
            .respond_to("http://example.com/?q=<a>", ProbeResponse::new(403, "blocked"))
            .reset_on("http://example.com/?q=<b>");
        let cfg = ScanConfig::default();
        let prober = Prober::new(&fetcher, &cfg);
        let vectors = vec!["<a>".to_string(), "<b>".to_string()];
        let slots = prober.gather("http://example.com/?q=", &vectors, &CancellationToken::new()).await.unwrap();

        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].as_ref().map(|r| r.status), Some(403));
        assert_eq!(slots[1].as_ref().map(|r| r.body.as_str()), Some("home"));
        assert!(slots[2].is_none());
        assert!(slots[3].is_some());

        let requested = fetcher.requested();
        assert_eq!(requested[0], "http://example.com/?q=<a>");
        assert!(requested[1].starts_with("http://example.com/index."));
        assert_eq!(requested[2], "http://example.com/?q=<b>");
    }

    #[tokio::test]
    async fn test_cancel_stops_probing() {
        let fetcher = ScriptedFetcher::new(ProbeResponse::new(200, "ok"));
        let cfg = ScanConfig::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let res = Prober::new(&fetcher, &cfg).gather("http://example.com/", &payloads(3), &cancel).await;
        assert!(matches!(res, Err(WafError::Cancelled)));
        assert!(fetcher.requested().is_empty());
    }
}
