// Firewall identification: signature pass, block-page classification and the
// heuristic fallback when nothing matched.

pub mod engine;
pub mod failure;
pub mod verifier;

pub use engine::{count_products, DetectionEngine, DetectionOutcome};
pub use failure::FailureSignatureBank;
pub use verifier::{check_if_matched, ProtectionVerifier, Verdict};
