//! Error types shared by the detection and bypass engines.

use std::path::PathBuf;

use thiserror::Error;

/// Link shown to the user when something escapes the engine.
pub const ISSUES_LINK: &str = "https://github.com/wafscope/wafscope/issues";

/// How a request failed. Only used to pick a log severity; both kinds
/// degrade the probe slot to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// The peer aborted the connection (ECONNRESET and friends)
    Reset,
    Other,
}

#[derive(Error, Debug, Clone)]
#[error("request to {url} failed: {message}")]
pub struct NetworkError {
    pub kind: NetworkErrorKind,
    pub url: String,
    pub message: String,
}

impl NetworkError {
    pub fn reset(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: NetworkErrorKind::Reset, url: url.into(), message: message.into() }
    }

    pub fn other(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: NetworkErrorKind::Other, url: url.into(), message: message.into() }
    }

    pub fn is_reset(&self) -> bool {
        self.kind == NetworkErrorKind::Reset
    }
}

/// A single plugin that could not be loaded. Loading continues with the rest.
#[derive(Error, Debug)]
pub enum PluginLoadError {
    #[error("plugin '{id}' has no {attribute}")]
    MissingAttribute { id: String, attribute: &'static str },

    #[error("failed to read plugin '{id}': {source}")]
    Read { id: String, source: std::io::Error },

    #[error("failed to parse plugin '{id}': {reason}")]
    Parse { id: String, reason: String },
}

/// Errors raised by a tamper on a specific payload.
#[derive(Error, Debug)]
#[error("tamper '{tamper}' failed on payload: {reason}")]
pub struct TamperError {
    pub tamper: String,
    pub reason: String,
}

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum WafError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unable to read input file '{path}': {source}")]
    InputFile { path: PathBuf, source: std::io::Error },

    #[error("invalid target URL '{0}'")]
    InvalidUrl(String),

    #[error("unknown tamper '{0}'")]
    UnknownTamper(String),

    #[error(transparent)]
    Tamper(#[from] TamperError),

    #[error("failed to store fingerprint: {0}")]
    Fingerprint(#[source] std::io::Error),

    #[error("scan cancelled by user")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, WafError>;
