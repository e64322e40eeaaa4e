//! Qualified header keys: `(namespace, local name)` pairs.
//!
//! XML carries header keys as namespace-qualified attributes, JSON as plain
//! object keys. The string form used in JSON is decoded by trying, in order:
//!
//! 1. `{namespaceURI}localName`
//! 2. `prefix:localName` with a registered prefix
//! 3. `namespaceURIlocalName` with a registered namespace URI
//! 4. anything else: unqualified, the whole string as local name
//!
//! Decoding never fails. Encoding always produces form 1, so
//! `decode(encode(k)) == k` for every key.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::namespace::{DOCUMENT_NS, NamespaceRegistry};

/// A header key, optionally bound to a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedKey {
    namespace: Option<String>,
    local_name: String,
}

impl QualifiedKey {
    /// A key in `namespace`. An empty namespace yields an unqualified key.
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            namespace: (!namespace.is_empty()).then_some(namespace),
            local_name: local_name.into(),
        }
    }

    /// A key without namespace.
    pub fn unqualified(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// A key in the document namespace.
    pub fn document(local_name: impl Into<String>) -> Self {
        Self::new(DOCUMENT_NS, local_name)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn is_qualified(&self) -> bool {
        self.namespace.is_some()
    }

    /// Decode the string form of a key. Never fails.
    pub fn decode(raw: &str) -> Self {
        let registry = NamespaceRegistry::global();

        if let Some(rest) = raw.strip_prefix('{') {
            if let Some((namespace, local)) = rest.split_once('}') {
                if !local.is_empty() {
                    return Self::new(namespace, local);
                }
            }
        }

        if let Some((prefix, local)) = raw.split_once(':') {
            if !local.is_empty() {
                if let Some(uri) = registry.uri_for_prefix(prefix) {
                    return Self::new(uri, local);
                }
            }
        }

        if let Some((uri, local)) = registry.split_known_uri(raw) {
            if !local.is_empty() {
                return Self::new(uri, local);
            }
        }

        Self::unqualified(raw)
    }

    /// Encode to the `{namespace}local` string form.
    ///
    /// An unqualified key whose name would not decode back to itself (it looks
    /// qualified, or starts with `{}`) is written as `{}name`.
    pub fn encode(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{{{namespace}}}{}", self.local_name),
            None if Self::decode(&self.local_name) != *self => {
                format!("{{}}{}", self.local_name)
            }
            None => self.local_name.clone(),
        }
    }

    /// The `prefix:local` producer convention, when the namespace is registered.
    pub fn to_prefixed(&self) -> Option<String> {
        let namespace = self.namespace.as_deref()?;
        let prefix = NamespaceRegistry::global().prefix_for_uri(namespace)?;
        Some(format!("{prefix}:{}", self.local_name))
    }
}

impl fmt::Display for QualifiedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for QualifiedKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::decode(s))
    }
}

impl From<&str> for QualifiedKey {
    fn from(raw: &str) -> Self {
        Self::decode(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::DUBLIN_CORE_NS;

    #[test]
    fn decodes_bracketed_form() {
        let key = QualifiedKey::decode("{http://example.org/ns#}author");
        assert_eq!(key.namespace(), Some("http://example.org/ns#"));
        assert_eq!(key.local_name(), "author");
    }

    #[test]
    fn decodes_registered_prefix() {
        let key = QualifiedKey::decode("dc:title");
        assert_eq!(key, QualifiedKey::new(DUBLIN_CORE_NS, "title"));
    }

    #[test]
    fn decodes_concatenated_uri() {
        let key = QualifiedKey::decode("http://purl.org/dc/elements/1.1/creator");
        assert_eq!(key, QualifiedKey::new(DUBLIN_CORE_NS, "creator"));
    }

    #[test]
    fn unknown_forms_fall_back_to_unqualified() {
        for raw in ["foo:bar", "plain", "http://example.org/x", "dc:", "{ns}", ""] {
            let key = QualifiedKey::decode(raw);
            assert!(!key.is_qualified(), "{raw} should be unqualified");
            assert_eq!(key.local_name(), raw);
        }
    }

    #[test]
    fn empty_braces_mean_unqualified() {
        let key = QualifiedKey::decode("{}dc:title");
        assert_eq!(key, QualifiedKey::unqualified("dc:title"));
        assert_eq!(key.encode(), "{}dc:title");
    }

    #[test]
    fn nested_empty_braces_survive_encoding() {
        let key = QualifiedKey::decode("{}{}foo");
        assert_eq!(key, QualifiedKey::unqualified("{}foo"));
        assert_eq!(key.encode(), "{}{}foo");
        assert_eq!(QualifiedKey::decode(&key.encode()), key);
        assert_eq!(QualifiedKey::unqualified("{}").encode(), "{}");
    }

    #[test]
    fn encode_uses_bracketed_form() {
        let key = QualifiedKey::new(DUBLIN_CORE_NS, "title");
        assert_eq!(key.encode(), "{http://purl.org/dc/elements/1.1/}title");
        assert_eq!(key.to_prefixed().as_deref(), Some("dc:title"));
        assert_eq!(QualifiedKey::unqualified("plain").encode(), "plain");
    }

    #[test]
    fn empty_namespace_is_unqualified() {
        assert_eq!(QualifiedKey::new("", "x"), QualifiedKey::unqualified("x"));
        assert_eq!(QualifiedKey::new("", "x").to_prefixed(), None);
    }
}
