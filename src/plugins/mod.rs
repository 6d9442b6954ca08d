//! Signature and tamper plugins.
//!
//! Both families are resolved eagerly through registration tables: each entry
//! pairs an identifier with a constructor. Entries are loaded in identifier
//! order, and that order is the priority used when reporting results.

pub mod signatures;
pub mod tampers;

use std::path::Path;
use std::sync::Arc;

use crate::error::{PluginLoadError, Result, TamperError, WafError};
use crate::probe::Headers;

pub use signatures::{PatternSignature, SignatureDefinition, UNKNOWN_FIREWALL_NAME};
pub use tampers::BuiltinTamper;

/// Identifiers containing any of these are never loaded.
pub const RESERVED_MARKERS: &[&str] = &["__init__", ".pyc", "__"];

/// Metadata every plugin must carry to be loadable.
pub trait Plugin: Send + Sync {
    /// Name of the identifying attribute and its value, e.g. `("product", "Cloudflare")`.
    fn identity(&self) -> (&'static str, &str);
}

/// Recognizes a specific firewall from a response.
pub trait SignaturePlugin: Plugin {
    fn product(&self) -> &str;
    fn detect(&self, body: &str, status: u16, headers: &Headers) -> bool;
}

/// Transforms an attack payload.
pub trait TamperPlugin: Plugin {
    /// Registry identifier, e.g. `space2comment`
    fn id(&self) -> &str;
    /// Human readable description of the transform
    fn type_name(&self) -> &str;
    fn example_payload(&self) -> &str;
    fn tamper(&self, payload: &str) -> std::result::Result<String, TamperError>;
}

/// One row of a registration table.
pub struct PluginEntry<T: ?Sized> {
    pub id: String,
    load: Box<dyn FnOnce() -> std::result::Result<Arc<T>, PluginLoadError> + Send>,
}

impl<T: ?Sized> PluginEntry<T> {
    pub fn new<F>(id: impl Into<String>, load: F) -> Self
    where
        F: FnOnce() -> std::result::Result<Arc<T>, PluginLoadError> + Send + 'static,
    {
        Self { id: id.into(), load: Box::new(load) }
    }
}

pub fn is_reserved(id: &str) -> bool {
    RESERVED_MARKERS.iter().any(|m| id.contains(m))
}

/// Load one family. Broken plugins are skipped with a warning; an empty
/// family is a configuration error.
pub fn load_family<T>(family: &str, mut entries: Vec<PluginEntry<T>>, verbose: bool) -> Result<Vec<Arc<T>>>
where
    T: ?Sized + Plugin,
{
    entries.retain(|e| !is_reserved(&e.id));
    entries.sort_by(|a, b| a.id.cmp(&b.id));

    let mut loaded = Vec::with_capacity(entries.len());
    for entry in entries {
        if verbose {
            tracing::debug!("loading {} script '{}'", family, entry.id);
        }
        let id = entry.id;
        let plugin = match (entry.load)() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(family, "skipping {} plugin: {}", family, e);
                continue;
            }
        };
        let (attribute, value) = plugin.identity();
        if value.trim().is_empty() {
            let e = PluginLoadError::MissingAttribute { id, attribute };
            tracing::warn!(family, "skipping {} plugin: {}", family, e);
            continue;
        }
        loaded.push(plugin);
    }

    if loaded.is_empty() {
        return Err(WafError::Configuration(format!("no usable {} plugins could be loaded", family)));
    }
    Ok(loaded)
}

/// Where signature plugins come from.
#[derive(Debug, Clone, Default)]
pub enum SignatureSource {
    #[default]
    Builtin,
    /// Built-ins plus every `*.json` definition in the directory
    BuiltinAndDirectory(std::path::PathBuf),
}

/// Owns every loaded plugin for the lifetime of a run.
pub struct PluginRegistry {
    signatures: Vec<Arc<dyn SignaturePlugin>>,
    tampers: Vec<Arc<dyn TamperPlugin>>,
}

impl PluginRegistry {
    pub fn load(source: &SignatureSource, verbose: bool) -> Result<Self> {
        let mut signature_entries = signatures::builtin_entries();
        if let SignatureSource::BuiltinAndDirectory(dir) = source {
            signature_entries.extend(signatures::entries_from_dir(dir)?);
        }
        Self::from_entries(signature_entries, tampers::builtin_entries(), verbose)
    }

    pub fn builtin() -> Result<Self> {
        Self::load(&SignatureSource::Builtin, false)
    }

    pub fn from_entries(
        signature_entries: Vec<PluginEntry<dyn SignaturePlugin>>,
        tamper_entries: Vec<PluginEntry<dyn TamperPlugin>>,
        verbose: bool,
    ) -> Result<Self> {
        let signatures = load_family("firewall", signature_entries, verbose)?;
        let tampers = load_family("tamper", tamper_entries, verbose)?;
        tracing::debug!(signatures = signatures.len(), tampers = tampers.len(), "plugins loaded");
        Ok(Self { signatures, tampers })
    }

    pub fn signatures(&self) -> &[Arc<dyn SignaturePlugin>] {
        &self.signatures
    }

    pub fn tampers(&self) -> &[Arc<dyn TamperPlugin>] {
        &self.tampers
    }

    pub fn tamper_by_id(&self, id: &str) -> Option<&Arc<dyn TamperPlugin>> {
        self.tampers.iter().find(|t| t.id() == id)
    }

    /// Apply one registered tamper to a payload.
    pub fn encode(&self, payload: &str, tamper_id: &str) -> Result<String> {
        let tamper = self.tamper_by_id(tamper_id).ok_or_else(|| WafError::UnknownTamper(tamper_id.to_string()))?;
        Ok(tamper.tamper(payload)?)
    }

    /// Apply one tamper to every payload in a file.
    pub fn encode_file(&self, path: &Path, tamper_id: &str) -> Result<Vec<String>> {
        let payloads = crate::probe::payloads::load_payload_file(path)?;
        payloads.iter().map(|p| self.encode(p.trim(), tamper_id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Named(&'static str);

    impl Plugin for Named {
        fn identity(&self) -> (&'static str, &str) {
            ("product", self.0)
        }
    }

    fn entry(id: &str, name: &'static str) -> PluginEntry<Named> {
        PluginEntry::new(id, move || Ok(Arc::new(Named(name))))
    }

    #[test]
    fn test_loads_in_lexicographic_order() {
        let entries = vec![entry("zeta", "Z"), entry("alpha", "A"), entry("mid", "M")];
        let loaded = load_family("firewall", entries, false).unwrap();
        let names: Vec<&str> = loaded.iter().map(|p| p.0).collect();
        assert_eq!(names, vec!["A", "M", "Z"]);
    }

    #[test]
    fn test_reserved_identifiers_are_skipped() {
        let entries = vec![entry("__init__", "Init"), entry("cloudflare.pyc", "Compiled"), entry("__pycache__", "Cache"), entry("real", "Real")];
        let loaded = load_family("firewall", entries, false).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "Real");
    }

    #[test]
    fn test_broken_plugins_are_skipped() {
        let entries = vec![
            entry("a", ""),
            PluginEntry::new("b", || Err(PluginLoadError::Parse { id: "b".into(), reason: "bad".into() })),
            entry("c", "Good"),
        ];
        let loaded = load_family("firewall", entries, false).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_empty_family_is_configuration_error() {
        let entries = vec![entry("a", " "), entry("__init__", "Init")];
        let err = load_family("tamper", entries, false).unwrap_err();
        assert!(matches!(err, WafError::Configuration(_)));
    }

    #[test]
    fn test_builtin_registry() {
        let registry = PluginRegistry::builtin().unwrap();
        assert!(registry.signatures().iter().any(|s| s.product() == UNKNOWN_FIREWALL_NAME));
        assert!(registry.tamper_by_id("space2comment").is_some());
        let ids: Vec<&str> = registry.tampers().iter().map(|t| t.id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_encode_unknown_tamper() {
        let registry = PluginRegistry::builtin().unwrap();
        assert_eq!(registry.encode("a b", "space2plus").unwrap(), "a+b");
        assert!(matches!(registry.encode("a", "nope"), Err(WafError::UnknownTamper(_))));
    }
}
