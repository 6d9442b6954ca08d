use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::scanner::ScanReport;

/// Write every scan report as one pretty-printed JSON array.
pub fn write_report(path: &Path, reports: &[ScanReport]) -> anyhow::Result<()> {
    let data = serde_json::to_string_pretty(reports)?;
    std::fs::write(path, data)?;
    Ok(())
}

/// Append encoded payloads, one per line.
pub fn write_encoded(path: &Path, items: &[String]) -> anyhow::Result<()> {
    let mut f = OpenOptions::new().append(true).create(true).open(path)?;
    for it in items {
        f.write_all(it.as_bytes())?;
        f.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Verdict;
    use crate::scanner::BypassStatus;

    #[test]
    fn test_report_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = ScanReport {
            url: "http://example.com/".into(),
            products: vec![],
            product_count: 0,
            unknown_detected: false,
            fingerprint: None,
            verdict: Some(Verdict::Suspected(vec!["response status code differs when a payload is provided".into()])),
            bypass: BypassStatus::NotRun,
        };
        write_report(&path, &[report]).unwrap();
        let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v[0]["verdict"]["verdict"], "suspected");
        assert_eq!(v[0]["bypass"]["state"], "not_run");
    }

    #[test]
    fn test_encoded_lines_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encoded.txt");
        write_encoded(&path, &["a".into()]).unwrap();
        write_encoded(&path, &["b".into(), "c".into()]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
    }
}
