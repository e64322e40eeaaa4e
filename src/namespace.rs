//! Registry of well-known namespace prefixes.
//!
//! The table is built once on first use and never mutated afterwards, so
//! lookups are lock-free from any thread.

use std::sync::LazyLock;

/// The document namespace: structural elements and attributes of a page.
pub const DOCUMENT_NS: &str = "http://www.weblyzard.com/wl/2013#";
/// Dublin Core elements, used for `dc:format` and common header fields.
pub const DUBLIN_CORE_NS: &str = "http://purl.org/dc/elements/1.1/";
/// The reserved `xml` namespace (`xml:lang`).
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix used for the document namespace on the wire.
pub const DOCUMENT_PREFIX: &str = "wl";

const WELL_KNOWN: &[(&str, &str)] = &[
    (DOCUMENT_PREFIX, DOCUMENT_NS),
    ("dc", DUBLIN_CORE_NS),
    ("xml", XML_NS),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("sioc", "http://rdfs.org/sioc/ns#"),
    ("schema", "http://schema.org/"),
    ("ma", "http://www.w3.org/ns/ma-ont#"),
];

static REGISTRY: LazyLock<NamespaceRegistry> =
    LazyLock::new(|| NamespaceRegistry::new(WELL_KNOWN));

/// A known namespace binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: &'static str,
    pub uri: &'static str,
}

/// Read-only prefix ↔ URI table.
#[derive(Debug)]
pub struct NamespaceRegistry {
    entries: Vec<Namespace>,
    /// Indices into `entries`, longest URI first, for prefix-of-key matching.
    by_uri_len: Vec<usize>,
}

impl NamespaceRegistry {
    fn new(table: &[(&'static str, &'static str)]) -> Self {
        let entries: Vec<Namespace> = table
            .iter()
            .map(|&(prefix, uri)| Namespace { prefix, uri })
            .collect();
        let mut by_uri_len: Vec<usize> = (0..entries.len()).collect();
        by_uri_len.sort_by(|a, b| entries[*b].uri.len().cmp(&entries[*a].uri.len()));
        Self {
            entries,
            by_uri_len,
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static NamespaceRegistry {
        &REGISTRY
    }

    /// Resolve a prefix (`dc`) to its namespace URI.
    pub fn uri_for_prefix(&self, prefix: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|ns| ns.prefix == prefix)
            .map(|ns| ns.uri)
    }

    /// Find the registered prefix of a namespace URI.
    pub fn prefix_for_uri(&self, uri: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|ns| ns.uri == uri)
            .map(|ns| ns.prefix)
    }

    /// Split `key` into a known namespace URI and the remainder, when `key`
    /// starts with a registered URI. The longest matching URI wins.
    pub fn split_known_uri<'k>(&self, key: &'k str) -> Option<(&'static str, &'k str)> {
        self.by_uri_len.iter().find_map(|&i| {
            let uri = self.entries[i].uri;
            key.strip_prefix(uri).map(|rest| (uri, rest))
        })
    }

    /// All registered bindings in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.entries.iter()
    }
}
