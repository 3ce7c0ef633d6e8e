//! Cache key generation
//!
//! Keys are built from a primary text plus named components. Text is
//! canonicalized (trimmed, whitespace collapsed, lower-cased) and components are kept sorted by
//! name, so two logically identical queries always hash to the same key.

use std::collections::BTreeMap;
use std::fmt::Debug;

use sha2::{Digest, Sha256};

/// Trait for generating cache keys from input data
pub trait CacheKeyGenerator: Send + Sync + Debug {
    /// Generates a cache key from the given components
    fn generate(&self, params: &CacheKeyParams) -> String;

    /// Generates a key with a namespace prefix
    fn generate_with_namespace(&self, namespace: &str, params: &CacheKeyParams) -> String {
        format!("{}:{}", namespace, self.generate(params))
    }
}

/// Parameters for cache key generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheKeyParams {
    /// Canonicalized primary text (query or address)
    pub primary: String,
    /// Secondary components, sorted by name
    pub components: BTreeMap<String, String>,
}

impl CacheKeyParams {
    /// Creates key parameters from free text, canonicalizing it
    pub fn new(primary: impl AsRef<str>) -> Self {
        Self {
            primary: canonicalize_text(primary.as_ref()),
            components: BTreeMap::new(),
        }
    }

    /// Adds a component to the key parameters
    pub fn with_component(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.components.insert(key.into(), value.into());
        self
    }

    /// Adds a component only when a value is present
    pub fn with_optional_component(
        self,
        key: impl Into<String>,
        value: Option<impl Into<String>>,
    ) -> Self {
        match value {
            Some(value) => self.with_component(key, value),
            None => self,
        }
    }

    /// Serialized form that gets hashed
    pub fn serialize(&self) -> String {
        let mut parts = vec![self.primary.clone()];

        for (k, v) in &self.components {
            parts.push(format!("{}={}", k, v));
        }

        parts.join("|")
    }
}

/// Collapses whitespace runs and case-folds free text
pub fn canonicalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// SHA-256 key generator producing hex digests
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyGenerator;

impl DefaultKeyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl CacheKeyGenerator for DefaultKeyGenerator {
    fn generate(&self, params: &CacheKeyParams) -> String {
        let digest = Sha256::digest(params.serialize().as_bytes());
        hex::encode(digest)
    }
}
