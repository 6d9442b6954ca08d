//! Payload vectors and target URL helpers.

use std::path::Path;

use crate::error::{Result, WafError};

/// Default vectors used to provoke a firewall response.
pub const DEFAULT_PAYLOADS: &[&str] = &[
    "<frameset><frame src=\"javascript:alert('XSS');\"></frameset>",
    " AND 1=1 ORDERBY(1,2,3,4,5) --;",
    "><script>alert(\"testing\");</script>",
    " AND 1=1 UNION ALL SELECT 1,NULL,'<script>alert(\"XSS\")</script>',table_name FROM information_schema.tables WHERE 2>1--/**/; EXEC xp_cmdshell('cat ../../../etc/passwd')#",
    "<img src=\"javascript:alert('XSS');\">",
    "'))) AND 1=1,SELECT * FROM information_schema.tables ((('",
    "' )) AND 1=1 (( ' -- rgzd",
    ";SELECT * FROM information_schema.tables WHERE 2>1 AND 1=1 OR 2=2 -- qdEf '",
    "' OR '1'=1 '",
    "<scri<script>pt>alert('123');</scri</script>pt>",
    "../../../../../etc/passwd",
    "%0A%0Dcat%20/etc/passwd",
];

/// Index into `DEFAULT_PAYLOADS` of the single vector used by the protection verifier.
pub const VERIFICATION_PAYLOAD_INDEX: usize = 3;

pub fn verification_payload() -> &'static str {
    DEFAULT_PAYLOADS[VERIFICATION_PAYLOAD_INDEX]
}

/// Benign paths requested as the control half of each probe pair.
pub const RANDOM_HOMEPAGES: &[&str] = &["index.php", "index.exe", "index.html", "index.py", "index.pl"];

pub fn default_payloads() -> Vec<String> {
    DEFAULT_PAYLOADS.iter().map(|p| p.to_string()).collect()
}

/// Split a comma-separated payload list. Entries starting with a space are trimmed.
pub fn parse_payload_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|p| !p.is_empty())
        .map(|p| if p.starts_with(' ') { p.trim().to_string() } else { p.to_string() })
        .collect()
}

/// Read one payload per line, keeping everything but the line terminator.
/// Blank lines stay as empty payloads.
pub fn load_payload_file(path: &Path) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(path)
        .map_err(|source| WafError::InputFile { path: path.to_path_buf(), source })?;
    Ok(data.lines().map(|l| l.trim_end_matches('\r').to_string()).collect())
}

/// Read newline-delimited target URLs, skipping blanks.
pub fn load_target_file(path: &Path) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(path)
        .map_err(|source| WafError::InputFile { path: path.to_path_buf(), source })?;
    Ok(data.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect())
}

/// Give a bare host a scheme so it can be requested.
pub fn auto_assign(target: &str, force_ssl: bool) -> String {
    let target = target.trim();
    if target.starts_with("http://") || target.starts_with("https://") {
        return target.to_string();
    }
    let scheme = if force_ssl { "https" } else { "http" };
    format!("{}://{}", scheme, target)
}

/// `scheme://host[:port]` of the target, used to build the control request.
pub fn origin_of(target: &str) -> Result<String> {
    let parsed = url::Url::parse(target).map_err(|_| WafError::InvalidUrl(target.to_string()))?;
    let host = parsed.host_str().ok_or_else(|| WafError::InvalidUrl(target.to_string()))?;
    Ok(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}
