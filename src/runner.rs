use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Commands};
use wafscope::fingerprint::{FileFingerprintStore, LogIssueReporter};
use wafscope::http_client::ReqwestFetcher;
use wafscope::output::{produce_results, render_encoded, render_tamper_list, render_verdict, write_encoded, write_report};
use wafscope::plugins::SignatureSource;
use wafscope::probe::payloads;
use wafscope::{BypassStatus, PluginRegistry, ScanConfig, ScanReport, WafScanner};

fn print_ascii_logo() {
    println!(r#"
     __      ____ _ / _|___  ___ ___  _ __   ___
     \ \ /\ / / _` | |_/ __|/ __/ _ \| '_ \ / _ \
      \ V  V / (_| |  _\__ \ (_| (_) | |_) |  __/
       \_/\_/ \__,_|_| |___/\___\___/| .__/ \___|
                                     |_|   v{}
    "#, env!("CARGO_PKG_VERSION"));
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // Keep reqwest/hyper at INFO so --verbose only floods with our own steps.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.verbose { "debug" } else { "info" };
    let filter_str = format!("wafscope={},reqwest=info,hyper=info", crate_level);
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Tampers => {
            let registry = PluginRegistry::builtin()?;
            println!("{}", render_tamper_list(registry.tampers()));
        }
        Commands::Encode { payload, tamper } => {
            let registry = PluginRegistry::builtin()?;
            tracing::info!("encoding '{}' using '{}'", payload, tamper);
            let encoded = registry.encode(&payload, &tamper)?;
            println!("[+] encoded successfully:");
            println!("{}", render_encoded(&[encoded]));
        }
        Commands::EncodeList { file, tamper, save } => {
            let registry = PluginRegistry::builtin()?;
            tracing::info!("encoding payloads from given file '{}' using given tamper '{}'", file, tamper);
            let encoded = registry.encode_file(Path::new(&file), &tamper)?;
            match save {
                Some(out) => {
                    write_encoded(Path::new(&out), &encoded)?;
                    println!("[+] saved encoded payloads to file '{}' successfully", out);
                }
                None => {
                    println!("[+] payloads encoded successfully:");
                    println!("{}", render_encoded(&encoded));
                }
            }
        }
        Commands::Scan { url, list, payloads, payload_file, agent, random_agent, proxy, tor, force_ssl, skip_bypass, timeout, signatures, fingerprint_dir, report } => {
            if !cli.hide_banner {
                print_ascii_logo();
            }
            let mut config = ScanConfig::from_flags(agent, random_agent, proxy, tor, cli.verbose, skip_bypass);
            config.timeout_secs = timeout;

            // Everything read from disk is resolved before the first request goes out.
            let payload_list = match (payloads, payload_file) {
                (Some(raw), _) => {
                    tracing::info!("using provided payloads");
                    payloads::parse_payload_list(&raw)
                }
                (None, Some(path)) => {
                    tracing::info!("using provided payload file '{}'", path);
                    payloads::load_payload_file(Path::new(&path))?
                }
                (None, None) => {
                    tracing::info!("using default payloads");
                    payloads::default_payloads()
                }
            };
            let targets = match (url, list) {
                (Some(url), _) => vec![payloads::auto_assign(&url, force_ssl)],
                (None, Some(path)) => {
                    tracing::info!("reading from '{}'", path);
                    payloads::load_target_file(Path::new(&path))?
                        .iter()
                        .map(|t| payloads::auto_assign(t, force_ssl))
                        .collect()
                }
                (None, None) => anyhow::bail!("no target given"),
            };
            let source = match signatures {
                Some(dir) => SignatureSource::BuiltinAndDirectory(PathBuf::from(dir)),
                None => SignatureSource::Builtin,
            };
            tracing::info!("loading firewall detection scripts");
            let registry = PluginRegistry::load(&source, config.verbose)?;
            let store = match fingerprint_dir {
                Some(dir) => FileFingerprintStore::new(dir),
                None => FileFingerprintStore::default(),
            };

            let reports = run_scan(&config, &registry, &store, &targets, &payload_list).await?;
            if let Some(path) = report {
                write_report(Path::new(&path), &reports)?;
                println!("[+] report saved to '{}'", path);
            }
        }
    }
    Ok(())
}

async fn run_scan(config: &ScanConfig, registry: &PluginRegistry, store: &FileFingerprintStore, targets: &[String], payload_list: &[String]) -> anyhow::Result<Vec<ScanReport>> {
    let fetcher = ReqwestFetcher::new(config)?;
    let reporter = LogIssueReporter;

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher.cancel();
        }
    });

    let scanner = WafScanner::new(config, registry, &fetcher, store, &reporter).with_cancellation(cancel);
    let mut reports = Vec::with_capacity(targets.len());

    for (i, target) in targets.iter().enumerate() {
        if targets.len() > 1 {
            tracing::info!("currently running on site #{} ('{}')", i + 1, target);
        } else {
            tracing::info!("running single web application '{}'", target);
        }
        let report = scanner.scan(target, payload_list).await?;
        print_report(&report);
        reports.push(report);

        if targets.len() > 1 && i + 1 < targets.len() {
            println!();
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
    Ok(reports)
}

fn print_report(report: &ScanReport) {
    if let Some(verdict) = &report.verdict {
        println!("{}", render_verdict(verdict));
    }
    if let BypassStatus::Completed(found) = &report.bypass {
        println!("{}", produce_results(found));
    }
}
