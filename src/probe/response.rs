use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header names are stored lowercased, values as received.
pub type Headers = BTreeMap<String, String>;

/// One HTTP response as seen by the detection engine.
///
/// A failed request is represented by the absence of a `ProbeResponse`
/// (`Option::None`), never by an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResponse {
    /// 0 when the status is unknown
    pub status: u16,
    pub body: String,
    pub headers: Headers,
}

impl ProbeResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into(), headers: Headers::new() }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|v| v.as_str())
    }
}

/// Build the header map from a reqwest response. Repeated headers are joined
/// with ", " so set-cookie values stay searchable.
pub fn headers_from_reqwest(map: &reqwest::header::HeaderMap) -> Headers {
    let mut out = Headers::new();
    for (name, value) in map.iter() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE, SERVER};

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let resp = ProbeResponse::new(200, "ok").with_header("Server", "cloudflare");
        assert_eq!(resp.header("SERVER"), Some("cloudflare"));
        assert!(resp.headers.contains_key("server"));
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let mut map = HeaderMap::new();
        map.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        map.append(SET_COOKIE, HeaderValue::from_static("incap_ses_1=2"));
        map.insert(SERVER, HeaderValue::from_static("nginx"));
        let headers = headers_from_reqwest(&map);
        assert_eq!(headers.get("set-cookie").map(String::as_str), Some("a=1, incap_ses_1=2"));
        assert_eq!(headers.get("server").map(String::as_str), Some("nginx"));
    }
}
