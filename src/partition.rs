//! Partitions: named lists of spans over a document's content.
//!
//! A document keeps one list per [`PartitionKind`]. Title and body regions are
//! plain char spans, sentences and tokens carry their own annotations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::span::{Span, TextSpan};

/// The kind of a partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartitionKind {
    Title,
    Body,
    Sentence,
    Token,
    /// Any other partition a producer adds (layout blocks, paragraphs, ...).
    Other(String),
}

impl PartitionKind {
    /// Wire name, e.g. `SENTENCE`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Title => "TITLE",
            Self::Body => "BODY",
            Self::Sentence => "SENTENCE",
            Self::Token => "TOKEN",
            Self::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "TITLE" => Self::Title,
            "BODY" => Self::Body,
            "SENTENCE" => Self::Sentence,
            "TOKEN" => Self::Token,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PartitionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PartitionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// All partitions of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partitions(BTreeMap<PartitionKind, Vec<Span>>);

impl Partitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spans of one partition, in insertion order.
    pub fn get(&self, kind: &PartitionKind) -> &[Span] {
        self.0.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn get_mut(&mut self, kind: &PartitionKind) -> Option<&mut Vec<Span>> {
        self.0.get_mut(kind)
    }

    pub(crate) fn push(&mut self, kind: PartitionKind, span: Span) {
        self.0.entry(kind).or_default().push(span);
    }

    /// Spans of `kind` that lie entirely inside `outer`.
    pub fn within<'a>(
        &'a self,
        kind: &PartitionKind,
        outer: &'a dyn TextSpan,
    ) -> impl Iterator<Item = &'a Span> + use<'a> {
        self.get(kind)
            .iter()
            .filter(move |span| outer.contains_span(*span))
    }

    /// Whether any span of `kind` contains `inner`.
    pub fn covers(&self, kind: &PartitionKind, inner: &dyn TextSpan) -> bool {
        self.get(kind).iter().any(|span| span.contains_span(inner))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &PartitionKind> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PartitionKind, &[Span])> {
        self.0.iter().map(|(kind, spans)| (kind, spans.as_slice()))
    }

    /// True when no partition kind is present at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The furthest end offset over all spans.
    pub fn max_end(&self) -> usize {
        self.0
            .values()
            .flatten()
            .map(|span| span.end())
            .max()
            .unwrap_or(0)
    }
}
