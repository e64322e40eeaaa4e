//! Typed character ranges inside document content.
//!
//! Offsets count Unicode scalar values (chars), not bytes. Spans never own
//! text; [`TextSpan::text`] slices it out of the content they index.

use serde::{Deserialize, Serialize};

use crate::digest::Digest;

/// Anything that covers a half-open `[start, end)` character range.
///
/// Partition handling only relies on this trait, so new span kinds plug in
/// by implementing `start` and `end`.
pub trait TextSpan {
    fn start(&self) -> usize;
    fn end(&self) -> usize;

    fn len(&self) -> usize {
        self.end().saturating_sub(self.start())
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` lies entirely inside this span.
    fn contains_span(&self, other: &dyn TextSpan) -> bool {
        self.start() <= other.start() && other.end() <= self.end()
    }

    /// Whether the two ranges share at least one character.
    fn overlaps(&self, other: &dyn TextSpan) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }

    /// Slice the covered text out of `content`, if the span fits.
    fn text<'a>(&self, content: &'a str) -> Option<&'a str> {
        char_slice(content, self.start(), self.end())
    }
}

/// Slice `content` by char offsets. `None` when the range is inverted or
/// runs past the end.
pub fn char_slice(content: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let byte_at = |char_idx: usize| {
        content
            .char_indices()
            .map(|(b, _)| b)
            .chain(std::iter::once(content.len()))
            .nth(char_idx)
    };
    let from = byte_at(start)?;
    let to = byte_at(end)?;
    Some(&content[from..to])
}

/// A plain character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharSpan {
    pub start: usize,
    pub end: usize,
}

impl CharSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A sentence: its range, its content digest and sentence-level scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceSpan {
    pub start: usize,
    pub end: usize,
    pub id: Digest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sem_orient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub significance: Option<f64>,
}

/// A dependency arc from a token to its head.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Index of the head token within the sentence; `-1` marks the root.
    pub parent: i32,
    pub label: String,
}

impl Dependency {
    pub const ROOT: i32 = -1;

    pub fn new(parent: i32, label: impl Into<String>) -> Self {
        Self {
            parent,
            label: label.into(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent == Self::ROOT
    }
}

/// A token with optional part-of-speech tag and dependency arc.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<Dependency>,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            pos: None,
            dependency: None,
        }
    }

    pub fn with_pos(mut self, pos: impl Into<String>) -> Self {
        self.pos = Some(pos.into());
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependency = Some(dependency);
        self
    }

    /// The same token moved by `delta` characters (negative moves left).
    pub(crate) fn shifted(&self, delta: isize) -> Self {
        Self {
            start: self.start.saturating_add_signed(delta),
            end: self.end.saturating_add_signed(delta),
            ..self.clone()
        }
    }
}

/// Any span stored in a partition.
///
/// JSON form carries an explicit `@type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum Span {
    #[serde(rename = "CharSpan")]
    Char(CharSpan),
    #[serde(rename = "SentenceSpan")]
    Sentence(SentenceSpan),
    #[serde(rename = "TokenSpan")]
    Token(TokenSpan),
}

impl Span {
    pub fn as_sentence(&self) -> Option<&SentenceSpan> {
        match self {
            Self::Sentence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&TokenSpan> {
        match self {
            Self::Token(t) => Some(t),
            _ => None,
        }
    }
}

macro_rules! impl_text_span {
    ($($ty:ty),*) => {
        $(impl TextSpan for $ty {
            fn start(&self) -> usize {
                self.start
            }
            fn end(&self) -> usize {
                self.end
            }
        })*
    };
}

impl_text_span!(CharSpan, SentenceSpan, TokenSpan);

impl TextSpan for Span {
    fn start(&self) -> usize {
        match self {
            Self::Char(s) => s.start,
            Self::Sentence(s) => s.start,
            Self::Token(s) => s.start,
        }
    }

    fn end(&self) -> usize {
        match self {
            Self::Char(s) => s.end,
            Self::Sentence(s) => s.end,
            Self::Token(s) => s.end,
        }
    }
}

impl From<CharSpan> for Span {
    fn from(span: CharSpan) -> Self {
        Self::Char(span)
    }
}

impl From<SentenceSpan> for Span {
    fn from(span: SentenceSpan) -> Self {
        Self::Sentence(span)
    }
}

impl From<TokenSpan> for Span {
    fn from(span: TokenSpan) -> Self {
        Self::Token(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_slice_counts_chars_not_bytes() {
        let text = "The café costs €50";
        assert_eq!(char_slice(text, 4, 8), Some("café"));
        assert_eq!(char_slice(text, 15, 18), Some("€50"));
        assert_eq!(char_slice(text, 18, 18), Some(""));
        assert_eq!(char_slice(text, 15, 19), None);
        assert_eq!(char_slice(text, 5, 4), None);
    }

    #[test]
    fn overlap_and_containment() {
        let outer = CharSpan::new(0, 10);
        let inner = TokenSpan::new(2, 5);
        let touching = CharSpan::new(10, 12);
        assert!(outer.contains_span(&inner));
        assert!(outer.overlaps(&inner));
        assert!(!outer.overlaps(&touching));
        assert!(!inner.contains_span(&outer));
    }

    #[test]
    fn span_enum_delegates() {
        let span: Span = TokenSpan::new(3, 7).with_pos("NN").into();
        assert_eq!(span.start(), 3);
        assert_eq!(span.len(), 4);
        assert_eq!(span.as_token().and_then(|t| t.pos.as_deref()), Some("NN"));
        assert!(span.as_sentence().is_none());
    }

    #[test]
    fn span_json_is_tagged() {
        let span: Span = CharSpan::new(0, 4).into();
        let json = serde_json::to_value(&span).unwrap();
        assert_eq!(json["@type"], "CharSpan");
        assert_eq!(json["end"], 4);
        let back: Span = serde_json::from_value(json).unwrap();
        assert_eq!(back, span);
    }

    #[test]
    fn shifted_token_keeps_annotations() {
        let token = TokenSpan::new(2, 4)
            .with_pos("DT")
            .with_dependency(Dependency::new(1, "det"));
        let moved = token.shifted(10);
        assert_eq!((moved.start, moved.end), (12, 14));
        assert_eq!(moved.pos, token.pos);
        assert_eq!(moved.shifted(-10), token);
    }
}
