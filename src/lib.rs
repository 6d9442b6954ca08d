pub mod bypass;
pub mod config;
pub mod detection;
pub mod error;
pub mod fingerprint;
pub mod http_client;
pub mod output;
pub mod plugins;
pub mod probe;
pub mod scanner;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::config::ScanConfig;
pub use crate::error::{NetworkError, NetworkErrorKind, WafError};
pub use crate::plugins::{PluginRegistry, SignaturePlugin, TamperPlugin};
pub use crate::probe::ProbeResponse;
pub use crate::scanner::{BypassStatus, ScanReport, WafScanner};
