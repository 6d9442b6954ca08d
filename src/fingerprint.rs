//! Hand-off of unrecognized firewall samples.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{Result, WafError, ISSUES_LINK};
use crate::probe::ProbeResponse;

/// Persists a response that matched the unknown-firewall signature.
pub trait FingerprintSink: Send + Sync {
    fn capture(&self, url: &str, response: &ProbeResponse) -> Result<PathBuf>;
}

/// Tells whoever maintains the signatures that a new sample exists.
pub trait IssueReporter: Send + Sync {
    fn report_unknown_firewall(&self, path: &Path);
}

/// Writes fingerprints to `<root>/<host>/<sha256>`.
pub struct FileFingerprintStore {
    root: PathBuf,
}

impl FileFingerprintStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$HOME/.wafscope/fingerprints`, or the working directory when HOME is unset.
    pub fn default_root() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".wafscope")
            .join("fingerprints")
    }
}

impl Default for FileFingerprintStore {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

pub fn render_fingerprint(url: &str, response: &ProbeResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<!--");
    let _ = writeln!(out, "URL: {}", url);
    let _ = writeln!(out, "Status: {}", response.status);
    for (name, value) in &response.headers {
        let _ = writeln!(out, "{}: {}", name, value);
    }
    let _ = writeln!(out, "-->");
    out.push_str(&response.body);
    out
}

impl FingerprintSink for FileFingerprintStore {
    fn capture(&self, url: &str, response: &ProbeResponse) -> Result<PathBuf> {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown-host".to_string());
        let content = render_fingerprint(url, response);
        let digest = Sha256::digest(content.as_bytes());
        let name: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

        let dir = self.root.join(host);
        std::fs::create_dir_all(&dir).map_err(WafError::Fingerprint)?;
        let path = dir.join(name);
        if !path.exists() {
            std::fs::write(&path, content).map_err(WafError::Fingerprint)?;
        }
        Ok(path)
    }
}

/// Default reporter: logs where the sample is and where to submit it.
pub struct LogIssueReporter;

impl IssueReporter for LogIssueReporter {
    fn report_unknown_firewall(&self, path: &Path) {
        tracing::warn!(
            path = %path.display(),
            "fingerprint saved; please open an issue with its contents at {}",
            ISSUES_LINK
        );
    }
}
