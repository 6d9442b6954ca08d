mod common;

use std::sync::Arc;

use wafscope::detection::Verdict;
use wafscope::fingerprint::{FileFingerprintStore, LogIssueReporter};
use wafscope::plugins::signatures::{HeaderPattern, PatternSignature, SignatureDefinition, UNKNOWN_FIREWALL_NAME};
use wafscope::plugins::{tampers, PluginEntry, PluginRegistry, SignaturePlugin};
use common::ScriptedFetcher;
use wafscope::{BypassStatus, ProbeResponse, ScanConfig, WafScanner};

const TARGET: &str = "http://shop.example/item.php?id=";

fn acme_signature() -> PluginEntry<dyn SignaturePlugin> {
    PluginEntry::new("acme", || {
        let def = SignatureDefinition {
            product: "Acme-WAF".into(),
            headers: vec![HeaderPattern { name: "x-acme".into(), pattern: "block".into() }],
            ..Default::default()
        };
        let sig: Arc<dyn SignaturePlugin> = Arc::new(PatternSignature::from_definition("acme", &def)?);
        Ok(sig)
    })
}

fn unknown_signature() -> PluginEntry<dyn SignaturePlugin> {
    PluginEntry::new("unknown", || {
        let def = SignatureDefinition {
            product: UNKNOWN_FIREWALL_NAME.into(),
            body: vec!["mystery shield".into()],
            ..Default::default()
        };
        let sig: Arc<dyn SignaturePlugin> = Arc::new(PatternSignature::from_definition("unknown", &def)?);
        Ok(sig)
    })
}

fn registry(signatures: Vec<PluginEntry<dyn SignaturePlugin>>) -> PluginRegistry {
    PluginRegistry::from_entries(signatures, tampers::builtin_entries(), false).unwrap()
}

fn payloads(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn plain_site_is_verified_clean() {
    let fetcher = ScriptedFetcher::new(ProbeResponse::new(200, "Welcome"));
    let config = ScanConfig::default();
    let registry = PluginRegistry::builtin().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = FileFingerprintStore::new(dir.path());

    let scanner = WafScanner::new(&config, &registry, &fetcher, &store, &LogIssueReporter);
    let report = scanner.scan(TARGET, &payloads(&["'", "<script>"])).await.unwrap();

    assert_eq!(report.product_count, 0);
    assert_eq!(report.verdict, Some(Verdict::Clean));
    assert_eq!(report.bypass, BypassStatus::NotRun);
    // 2 pairs + normal baseline + verifier baseline and payload
    assert_eq!(fetcher.request_count(), 4 + 1 + 2);
}

#[tokio::test]
async fn repeated_product_triggers_bypass_search() {
    let blocked = ProbeResponse::new(403, "Request blocked").with_header("X-Acme", "block");
    let fetcher = ScriptedFetcher::new(ProbeResponse::new(200, "Welcome"))
        .respond_to(&format!("{}'", TARGET), blocked.clone())
        .respond_to(&format!("{}<script>", TARGET), blocked);
    let config = ScanConfig::default();
    let registry = registry(vec![acme_signature()]);
    let dir = tempfile::tempdir().unwrap();
    let store = FileFingerprintStore::new(dir.path());

    let report = WafScanner::new(&config, &registry, &fetcher, &store, &LogIssueReporter)
        .scan(TARGET, &payloads(&["'", "<script>"]))
        .await
        .unwrap();

    assert_eq!(report.products, vec!["Acme-WAF"]);
    assert_eq!(report.product_count, 1);
    assert!(report.verdict.is_none());
    match report.bypass {
        BypassStatus::Completed(found) => {
            assert_eq!(found.len(), 5);
            // registry order decides which tampers fill the quota
            assert_eq!(found[0].tamper_id, "apostrophemask");
        }
        other => panic!("bypass search did not run: {:?}", other),
    }
}

#[tokio::test]
async fn skip_bypass_check_suppresses_search() {
    let fetcher = ScriptedFetcher::new(ProbeResponse::new(200, "Welcome").with_header("X-Acme", "block"));
    let config = ScanConfig { skip_bypass_check: true, ..ScanConfig::default() };
    let registry = registry(vec![acme_signature()]);
    let dir = tempfile::tempdir().unwrap();
    let store = FileFingerprintStore::new(dir.path());

    let report = WafScanner::new(&config, &registry, &fetcher, &store, &LogIssueReporter)
        .scan(TARGET, &payloads(&["'"]))
        .await
        .unwrap();

    assert_eq!(report.bypass, BypassStatus::Skipped);
    assert_eq!(fetcher.request_count(), 3);
}

#[tokio::test]
async fn unknown_firewall_is_fingerprinted_once() {
    let fetcher = ScriptedFetcher::new(ProbeResponse::new(406, "Mystery Shield says no"));
    let config = ScanConfig { skip_bypass_check: true, ..ScanConfig::default() };
    let registry = registry(vec![acme_signature(), unknown_signature()]);
    let dir = tempfile::tempdir().unwrap();
    let store = FileFingerprintStore::new(dir.path());

    let report = WafScanner::new(&config, &registry, &fetcher, &store, &LogIssueReporter)
        .scan(TARGET, &payloads(&["'", "<script>", "../etc/passwd"]))
        .await
        .unwrap();

    assert!(report.unknown_detected);
    assert!(report.products.is_empty());
    assert_eq!(report.product_count, 0);
    assert!(report.verdict.is_some());

    let host_dir = dir.path().join("shop.example");
    assert_eq!(std::fs::read_dir(&host_dir).unwrap().count(), 1);
    assert!(report.fingerprint.unwrap().starts_with(&host_dir));
}

#[tokio::test]
async fn two_products_count_as_multiple() {
    let fetcher = ScriptedFetcher::new(ProbeResponse::new(200, "Welcome"))
        .respond_to(&format!("{}'", TARGET), ProbeResponse::new(403, "x").with_header("x-acme", "block"))
        .respond_to(&format!("{}<script>", TARGET), ProbeResponse::new(403, "x").with_header("server", "cloudflare"));
    let config = ScanConfig { skip_bypass_check: true, ..ScanConfig::default() };
    let mut signatures = wafscope::plugins::signatures::builtin_entries();
    signatures.push(acme_signature());
    let registry = registry(signatures);
    let dir = tempfile::tempdir().unwrap();
    let store = FileFingerprintStore::new(dir.path());

    let report = WafScanner::new(&config, &registry, &fetcher, &store, &LogIssueReporter)
        .scan(TARGET, &payloads(&["'", "<script>"]))
        .await
        .unwrap();

    assert_eq!(report.products, vec!["Acme-WAF", "Cloudflare"]);
    assert_eq!(report.product_count, 3);
    assert_eq!(report.bypass, BypassStatus::Skipped);
}

#[tokio::test]
async fn two_products_still_search_for_bypasses() {
    let fetcher = ScriptedFetcher::new(ProbeResponse::new(200, "Welcome"))
        .respond_to(&format!("{}'", TARGET), ProbeResponse::new(403, "x").with_header("x-acme", "block"))
        .respond_to(&format!("{}<script>", TARGET), ProbeResponse::new(403, "x").with_header("server", "cloudflare"));
    let config = ScanConfig::default();
    let mut signatures = wafscope::plugins::signatures::builtin_entries();
    signatures.push(acme_signature());
    let registry = registry(signatures);
    let dir = tempfile::tempdir().unwrap();
    let store = FileFingerprintStore::new(dir.path());

    let report = WafScanner::new(&config, &registry, &fetcher, &store, &LogIssueReporter)
        .scan(TARGET, &payloads(&["'", "<script>"]))
        .await
        .unwrap();

    assert_eq!(report.product_count, 3);
    assert!(report.verdict.is_none());
    match report.bypass {
        BypassStatus::Completed(found) => assert_eq!(found.len(), 5),
        other => panic!("bypass search did not run: {:?}", other),
    }
}
