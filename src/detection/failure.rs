use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Block-page markers. `.` stands in for any separator.
const FAILURE_PATTERNS: &[&str] = &[
    "404",
    "captcha",
    "illegal",
    "blocked",
    "ip.logged",
    "ip.address.logged",
    "not.acceptable",
    "access.denied",
    "forbidden",
    "400",
];

static FAILURE_SIGNATURES: Lazy<Vec<Regex>> = Lazy::new(|| {
    FAILURE_PATTERNS
        .iter()
        .filter_map(|p| RegexBuilder::new(p).case_insensitive(true).build().ok())
        .collect()
});

/// Response bodies that mark a tampered request as blocked or invalid.
pub struct FailureSignatureBank;

impl FailureSignatureBank {
    pub fn patterns() -> &'static [Regex] {
        &FAILURE_SIGNATURES
    }

    /// True for absent or empty bodies and for bodies matching any failure signature.
    pub fn is_failure(body: Option<&str>) -> bool {
        match body {
            None => true,
            Some("") => true,
            Some(html) => FAILURE_SIGNATURES.iter().any(|re| re.is_match(html)),
        }
    }
}
