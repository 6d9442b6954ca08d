//! Firewall fingerprints expressed as pattern tables.

use std::path::Path;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::{Plugin, PluginEntry, SignaturePlugin};
use crate::error::{PluginLoadError, Result, WafError};
use crate::probe::Headers;

/// Product reported by the catch-all signature. Never listed as a detection;
/// its first hit triggers a fingerprint capture instead.
pub const UNKNOWN_FIREWALL_NAME: &str = "Unknown Firewall";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderPattern {
    pub name: String,
    pub pattern: String,
}

/// Serializable description of a signature. All patterns are case-insensitive regexes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureDefinition {
    pub product: String,
    pub headers: Vec<HeaderPattern>,
    pub server: Vec<String>,
    pub cookies: Vec<String>,
    pub body: Vec<String>,
    /// When non-empty, body patterns only count on one of these statuses
    pub status: Vec<u16>,
}

#[derive(Debug)]
pub struct PatternSignature {
    product: String,
    headers: Vec<(String, Regex)>,
    server: Vec<Regex>,
    cookies: Vec<Regex>,
    body: Vec<Regex>,
    status: Vec<u16>,
}

fn compile(id: &str, pattern: &str) -> std::result::Result<Regex, PluginLoadError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| PluginLoadError::Parse { id: id.to_string(), reason: e.to_string() })
}

fn compile_all(id: &str, patterns: &[String]) -> std::result::Result<Vec<Regex>, PluginLoadError> {
    patterns.iter().map(|p| compile(id, p)).collect()
}

impl PatternSignature {
    pub fn from_definition(id: &str, def: &SignatureDefinition) -> std::result::Result<Self, PluginLoadError> {
        if def.product.trim().is_empty() {
            return Err(PluginLoadError::MissingAttribute { id: id.to_string(), attribute: "product" });
        }
        if def.headers.is_empty() && def.server.is_empty() && def.cookies.is_empty() && def.body.is_empty() {
            return Err(PluginLoadError::MissingAttribute { id: id.to_string(), attribute: "detection pattern" });
        }
        let headers = def
            .headers
            .iter()
            .map(|h| Ok((h.name.to_ascii_lowercase(), compile(id, &h.pattern)?)))
            .collect::<std::result::Result<Vec<_>, PluginLoadError>>()?;
        Ok(Self {
            product: def.product.clone(),
            headers,
            server: compile_all(id, &def.server)?,
            cookies: compile_all(id, &def.cookies)?,
            body: compile_all(id, &def.body)?,
            status: def.status.clone(),
        })
    }
}

impl Plugin for PatternSignature {
    fn identity(&self) -> (&'static str, &str) {
        ("product", &self.product)
    }
}

impl SignaturePlugin for PatternSignature {
    fn product(&self) -> &str {
        &self.product
    }

    fn detect(&self, body: &str, status: u16, headers: &Headers) -> bool {
        for (name, re) in &self.headers {
            if headers.get(name).map(|v| re.is_match(v)).unwrap_or(false) {
                return true;
            }
        }
        if let Some(server) = headers.get("server") {
            if self.server.iter().any(|re| re.is_match(server)) {
                return true;
            }
        }
        if let Some(cookie) = headers.get("set-cookie") {
            if self.cookies.iter().any(|re| re.is_match(cookie)) {
                return true;
            }
        }
        let status_ok = self.status.is_empty() || self.status.contains(&status);
        status_ok && self.body.iter().any(|re| re.is_match(body))
    }
}

fn def(product: &str) -> SignatureDefinition {
    SignatureDefinition { product: product.to_string(), ..Default::default() }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn header(name: &str, pattern: &str) -> HeaderPattern {
    HeaderPattern { name: name.to_string(), pattern: pattern.to_string() }
}

/// Built-in fingerprint table, keyed by identifier.
pub fn builtin_definitions() -> Vec<(&'static str, SignatureDefinition)> {
    vec![
        ("akamai", SignatureDefinition {
            server: strings(&["akamaighost"]),
            headers: vec![header("x-akamai-transformed", ".+")],
            body: strings(&[r"access.denied.+reference.#[0-9a-f]+\.[0-9a-f]+"]),
            status: vec![403],
            ..def("Akamai Kona Site Defender")
        }),
        ("aws", SignatureDefinition {
            server: strings(&["awselb"]),
            headers: vec![header("x-amzn-waf-action", ".+")],
            cookies: strings(&["aws-waf-token"]),
            body: strings(&[r"<requestid>[0-9a-z]{16,25}</requestid>", r"request.blocked.+cloudfront"]),
            status: vec![403],
            ..def("AWS WAF")
        }),
        ("barracuda", SignatureDefinition {
            cookies: strings(&["barra_counter_session", "bni__barracuda_lb_cookie", "bni_persistence"]),
            body: strings(&[r"barracuda.networks", r"you.have.been.blocked.+barracuda"]),
            status: vec![403, 503],
            ..def("Barracuda WAF")
        }),
        ("bigip", SignatureDefinition {
            headers: vec![header("x-wa-info", ".+"), header("x-cnection", "close")],
            cookies: strings(&[r"^ts[0-9a-f]{6,}=", r"\bts01[0-9a-f]{6}=", "bigipserver", "f5_st"]),
            body: strings(&[r"the.requested.url.was.rejected..please.consult.with.your.administrator"]),
            ..def("F5 BIG-IP ASM")
        }),
        ("cloudflare", SignatureDefinition {
            server: strings(&["cloudflare"]),
            headers: vec![header("cf-ray", ".+"), header("cf-cache-status", ".+")],
            cookies: strings(&["__cfduid", "cf_clearance", "__cf_bm"]),
            body: strings(&[r"attention.required!.+cloudflare", r"cloudflare.ray.id"]),
            status: vec![403, 503],
            ..def("Cloudflare")
        }),
        ("fortiweb", SignatureDefinition {
            cookies: strings(&["fortiwafsid="]),
            body: strings(&[r"powered.by.fortinet", r"fortigate.ipa?.blocked", r"\.fgd_icon"]),
            ..def("Fortinet FortiWeb")
        }),
        ("incapsula", SignatureDefinition {
            headers: vec![header("x-iinfo", ".+"), header("x-cdn", "incapsula")],
            cookies: strings(&["incap_ses", "visid_incap"]),
            body: strings(&[r"incapsula.incident.id", r"powered.by.incapsula"]),
            ..def("Imperva Incapsula")
        }),
        ("modsecurity", SignatureDefinition {
            server: strings(&["mod_security", "noyb"]),
            body: strings(&[r"this.error.was.generated.by.mod.security", r"rules.of.the.mod.security.module", r"mod.security.rules.triggered"]),
            status: vec![403, 406, 501],
            ..def("ModSecurity")
        }),
        ("sucuri", SignatureDefinition {
            server: strings(&["sucuri/cloudproxy"]),
            headers: vec![header("x-sucuri-id", ".+"), header("x-sucuri-cache", ".+")],
            body: strings(&[r"access.denied.-.sucuri.website.firewall", r"sucuri\.net/privacy-policy"]),
            ..def("Sucuri CloudProxy")
        }),
        ("unknown", SignatureDefinition {
            body: strings(&[
                r"web.application.firewall",
                r"security.policy",
                r"request.rejected",
                r"suspicious.activity",
                r"your.request.has.been.blocked",
            ]),
            status: vec![403, 406, 419, 429, 501, 999],
            ..def(UNKNOWN_FIREWALL_NAME)
        }),
        ("wallarm", SignatureDefinition {
            server: strings(&["nginx-wallarm"]),
            ..def("Wallarm")
        }),
        ("wordfence", SignatureDefinition {
            body: strings(&[r"generated.by.wordfence", r"your.access.to.this.site.has.been.limited", r"a.potentially.unsafe.operation.has.been.detected"]),
            status: vec![403, 503],
            ..def("Wordfence")
        }),
    ]
}

pub fn builtin_entries() -> Vec<PluginEntry<dyn SignaturePlugin>> {
    builtin_definitions()
        .into_iter()
        .map(|(id, definition)| {
            PluginEntry::new(id, move || {
                let sig: Arc<dyn SignaturePlugin> = Arc::new(PatternSignature::from_definition(id, &definition)?);
                Ok(sig)
            })
        })
        .collect()
}

/// One entry per `*.json` file in `dir`, identified by its file name.
/// Files are read lazily when the registry resolves the entry.
pub fn entries_from_dir(dir: &Path) -> Result<Vec<PluginEntry<dyn SignaturePlugin>>> {
    let read = std::fs::read_dir(dir).map_err(|source| WafError::InputFile { path: dir.to_path_buf(), source })?;
    let mut entries = Vec::new();
    for item in read {
        let item = item.map_err(|source| WafError::InputFile { path: dir.to_path_buf(), source })?;
        let path = item.path();
        let id = item.file_name().to_string_lossy().into_owned();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            tracing::debug!("ignoring non-signature file '{}'", id);
            continue;
        }
        let loader_id = id.clone();
        entries.push(PluginEntry::new(id, move || {
            let raw = std::fs::read_to_string(&path).map_err(|source| PluginLoadError::Read { id: loader_id.clone(), source })?;
            let definition: SignatureDefinition = serde_json::from_str(&raw)
                .map_err(|e| PluginLoadError::Parse { id: loader_id.clone(), reason: e.to_string() })?;
            let sig: Arc<dyn SignaturePlugin> = Arc::new(PatternSignature::from_definition(&loader_id, &definition)?);
            Ok(sig)
        }));
    }
    Ok(entries)
}
