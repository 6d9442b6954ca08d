//! Plain-text rendering of results for the terminal.

use crate::bypass::WorkingTamper;
use crate::detection::Verdict;
use crate::plugins::TamperPlugin;
use std::sync::Arc;

const SPACER: &str = "------------------------------";

/// Numbered list of working tampers.
pub fn produce_results(found: &[WorkingTamper]) -> String {
    if found.is_empty() {
        return "[x] no working tampers found, you can try custom payloads or encodings".to_string();
    }
    let mut lines = vec![format!("[+] apparent working tampers for target ({}):", found.len()), SPACER.to_string()];
    for (i, tamper) in found.iter().enumerate() {
        lines.push(format!("(#{}) description: tamper payload by {}", i + 1, tamper.type_name));
        lines.push(format!("example: '{}'", tamper.example));
        lines.push(format!("load path: {}", tamper.tamper_id));
        lines.push(SPACER.to_string());
    }
    lines.join("\n")
}

/// Reasons list for a suspected protection, or the clean/unverified message.
pub fn render_verdict(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Clean => "[+] no protection identified on target".to_string(),
        Verdict::Unverified => "[!] unable to verify protection, the target did not answer".to_string(),
        Verdict::Suspected(reasons) => {
            let mut lines = vec!["[*] target seems to be behind some kind of protection for the following reasons:".to_string(), String::new()];
            for (i, reason) in reasons.iter().enumerate() {
                lines.push(format!("[{}] {}", i + 1, reason));
            }
            lines.join("\n")
        }
    }
}

/// Encoded payloads framed by spacers, numbered when there are several.
pub fn render_encoded(items: &[String]) -> String {
    let mut lines = vec![SPACER.to_string()];
    if items.len() == 1 {
        lines.push(items[0].clone());
    } else {
        for (i, item) in items.iter().enumerate() {
            lines.push(format!("#{} {}", i + 1, item));
        }
    }
    lines.push(SPACER.to_string());
    lines.join("\n")
}

/// One line per tamper with its description and the tampered example payload.
pub fn render_tamper_list(tampers: &[Arc<dyn TamperPlugin>]) -> String {
    tampers
        .iter()
        .map(|t| {
            let example = t.tamper(t.example_payload()).unwrap_or_else(|_| t.example_payload().to_string());
            format!("{:<16} {} (example: '{}')", t.id(), t.type_name(), example)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
