//! Built-in payload tampers.

use std::sync::Arc;

use base64::Engine as _;
use rand::Rng;

use super::{Plugin, PluginEntry, TamperPlugin};
use crate::error::TamperError;

type Transform = fn(&str) -> Result<String, String>;

/// A tamper backed by a plain transform function.
pub struct BuiltinTamper {
    id: &'static str,
    type_name: &'static str,
    example: &'static str,
    transform: Transform,
}

impl BuiltinTamper {
    pub const fn new(id: &'static str, type_name: &'static str, example: &'static str, transform: Transform) -> Self {
        Self { id, type_name, example, transform }
    }
}

impl Plugin for BuiltinTamper {
    fn identity(&self) -> (&'static str, &str) {
        ("type", self.type_name)
    }
}

impl TamperPlugin for BuiltinTamper {
    fn id(&self) -> &str {
        self.id
    }

    fn type_name(&self) -> &str {
        self.type_name
    }

    fn example_payload(&self) -> &str {
        self.example
    }

    fn tamper(&self, payload: &str) -> Result<String, TamperError> {
        (self.transform)(payload).map_err(|reason| TamperError { tamper: self.id.to_string(), reason })
    }
}

fn apostrophe_mask(p: &str) -> Result<String, String> {
    Ok(p.replace('\'', "%EF%BC%87"))
}

fn base64_encode(p: &str) -> Result<String, String> {
    Ok(base64::engine::general_purpose::STANDARD.encode(p))
}

fn double_url_encode(p: &str) -> Result<String, String> {
    Ok(urlencoding::encode(&urlencoding::encode(p)).into_owned())
}

fn enclose_brackets(p: &str) -> Result<String, String> {
    Ok(p.chars()
        .map(|c| if c.is_ascii_digit() { format!("[{}]", c) } else { c.to_string() })
        .collect())
}

fn html_encode(p: &str) -> Result<String, String> {
    Ok(html_escape::encode_safe(p).into_owned())
}

fn lowercase(p: &str) -> Result<String, String> {
    Ok(p.to_lowercase())
}

fn modsec_versioned(p: &str) -> Result<String, String> {
    Ok(format!("/*!30874{}*/", p))
}

fn random_case(p: &str) -> Result<String, String> {
    let mut rng = rand::thread_rng();
    Ok(p.chars()
        .map(|c| if rng.gen_bool(0.5) { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
        .collect())
}

fn space_to_comment(p: &str) -> Result<String, String> {
    Ok(p.replace(' ', "/**/"))
}

fn space_to_plus(p: &str) -> Result<String, String> {
    Ok(p.replace(' ', "+"))
}

fn unicode_encode(p: &str) -> Result<String, String> {
    p.chars()
        .map(|c| {
            if !c.is_ascii() {
                Err(format!("cannot represent non-ASCII character {:?}", c))
            } else if c.is_ascii_alphanumeric() {
                Ok(c.to_string())
            } else {
                Ok(format!("%u{:04X}", c as u32))
            }
        })
        .collect()
}

fn uppercase(p: &str) -> Result<String, String> {
    Ok(p.to_uppercase())
}

fn url_encode(p: &str) -> Result<String, String> {
    Ok(urlencoding::encode(p).into_owned())
}

fn url_encode_all(p: &str) -> Result<String, String> {
    Ok(p.bytes().map(|b| format!("%{:02X}", b)).collect())
}

const SQL_EXAMPLE: &str = "' AND 1=1 UNION SELECT username,password FROM users --";
const XSS_EXAMPLE: &str = "<script>alert('xss');</script>";

/// Registration table for the tamper family.
pub fn builtin_tampers() -> Vec<BuiltinTamper> {
    vec![
        BuiltinTamper::new("apostrophemask", "masking apostrophes with their UTF-8 fullwidth counterpart", SQL_EXAMPLE, apostrophe_mask),
        BuiltinTamper::new("base64encode", "encoding the payload into base64", XSS_EXAMPLE, base64_encode),
        BuiltinTamper::new("doubleurlencode", "double URL encoding the payload", XSS_EXAMPLE, double_url_encode),
        BuiltinTamper::new("enclosebrackets", "enclosing numbers in square brackets", SQL_EXAMPLE, enclose_brackets),
        BuiltinTamper::new("htmlencode", "escaping HTML special characters", XSS_EXAMPLE, html_encode),
        BuiltinTamper::new("lowercase", "changing the payload into lowercase", SQL_EXAMPLE, lowercase),
        BuiltinTamper::new("modsecversioned", "wrapping the payload in a MySQL versioned comment", SQL_EXAMPLE, modsec_versioned),
        BuiltinTamper::new("randomcase", "changing the payload into random case", SQL_EXAMPLE, random_case),
        BuiltinTamper::new("space2comment", "changing spaces into inline comments", SQL_EXAMPLE, space_to_comment),
        BuiltinTamper::new("space2plus", "changing spaces into plus signs", SQL_EXAMPLE, space_to_plus),
        BuiltinTamper::new("unicodeencode", "encoding the payload as %u unicode escapes", XSS_EXAMPLE, unicode_encode),
        BuiltinTamper::new("uppercase", "changing the payload into uppercase", SQL_EXAMPLE, uppercase),
        BuiltinTamper::new("urlencode", "URL encoding the payload", XSS_EXAMPLE, url_encode),
        BuiltinTamper::new("urlencodeall", "URL encoding every character of the payload", XSS_EXAMPLE, url_encode_all),
    ]
}

pub fn builtin_entries() -> Vec<PluginEntry<dyn TamperPlugin>> {
    builtin_tampers()
        .into_iter()
        .map(|tamper| {
            PluginEntry::new(tamper.id, move || {
                let plugin: Arc<dyn TamperPlugin> = Arc::new(tamper);
                Ok(plugin)
            })
        })
        .collect()
}
