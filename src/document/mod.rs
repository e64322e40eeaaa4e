//! The document model exchanged between pipeline services.
//!
//! A document goes through two phases:
//!
//! - **draft**: title and body annotations are collected in separate lists so
//!   regions annotated independently are not counted twice;
//! - **finalized**: [`Document::finalize`] replaces `annotations` with both
//!   lists and clears the raw title/body text. The transition happens
//!   once; a second call is an error.
//!
//! Sentence and token positions live in [`Partitions`] over `content`.

pub mod sentence;

use std::collections::BTreeMap;

use crate::entity::{Annotation, CompactAnnotation};
use crate::error::{DocumentError, DocumentResult};
use crate::partition::{PartitionKind, Partitions};
use crate::qkey::QualifiedKey;
use crate::span::{CharSpan, SentenceSpan, Span, TextSpan, char_slice};

pub use sentence::Sentence;

/// Separator placed between sentences appended with [`Document::push_sentence`].
pub const SENTENCE_SEPARATOR: char = '\n';

/// Header metadata keyed by qualified key.
pub type Header = BTreeMap<QualifiedKey, String>;

/// A text document and everything annotated on it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub id: String,
    /// Content type, e.g. `text/html`.
    pub format: Option<String>,
    /// Language tag, e.g. `en`.
    pub lang: Option<String>,
    /// Locality-sensitive content fingerprint, opaque to this crate.
    pub nilsimsa: Option<String>,
    pub header: Header,
    /// Raw title text before sentence splitting.
    pub title: Option<String>,
    /// Raw body text before sentence splitting.
    pub body: Option<String>,
    /// Canonical annotation list.
    pub annotations: Vec<Annotation>,
    content: Option<String>,
    partitions: Partitions,
    title_annotations: Vec<Annotation>,
    body_annotations: Vec<Annotation>,
    finalized: bool,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_header(mut self, key: QualifiedKey, value: impl Into<String>) -> Self {
        self.header.insert(key, value.into());
        self
    }

    pub fn header_value(&self, key: &QualifiedKey) -> Option<&str> {
        self.header.get(key).map(String::as_str)
    }

    // -----------------------------------------------------------------------
    // Content and partitions
    // -----------------------------------------------------------------------

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn partitions(&self) -> &Partitions {
        &self.partitions
    }

    /// Length of the content in chars.
    pub fn content_len(&self) -> usize {
        self.content.as_deref().map_or(0, |c| c.chars().count())
    }

    /// Replace content and partitions together, checking every span against
    /// the new content.
    pub fn set_content(
        &mut self,
        content: Option<String>,
        partitions: Partitions,
    ) -> DocumentResult<()> {
        let len = content.as_deref().map_or(0, |c| c.chars().count());
        for (_, spans) in partitions.iter() {
            for span in spans {
                self.check_bounds(span, len)?;
            }
        }
        self.content = content;
        self.partitions = partitions;
        Ok(())
    }

    /// Add a span to a partition.
    pub fn add_span(&mut self, kind: PartitionKind, span: impl Into<Span>) -> DocumentResult<()> {
        let span = span.into();
        self.check_bounds(&span, self.content_len())?;
        self.partitions.push(kind, span);
        Ok(())
    }

    fn check_bounds(&self, span: &dyn TextSpan, len: usize) -> DocumentResult<()> {
        if span.start() > span.end() || span.end() > len {
            return Err(DocumentError::SpanOutOfBounds {
                id: self.id.clone(),
                start: span.start(),
                end: span.end(),
                len,
            });
        }
        Ok(())
    }

    /// Text covered by `span`.
    pub fn text_of(&self, span: &dyn TextSpan) -> Option<&str> {
        span.text(self.content.as_deref()?)
    }

    // -----------------------------------------------------------------------
    // Sentences
    // -----------------------------------------------------------------------

    /// Append a sentence to the content and record its sentence, token and
    /// title/body region spans. Returns the sentence index.
    pub fn push_sentence(&mut self, sentence: Sentence) -> DocumentResult<usize> {
        let len = sentence.char_len();
        if let Some(bad) = sentence
            .tokens
            .iter()
            .find(|t| t.start > t.end || t.end > len)
        {
            return Err(DocumentError::TokenOutOfBounds {
                id: self.id.clone(),
                start: bad.start,
                end: bad.end,
                len,
            });
        }

        let has_sentences = !self.partitions.get(&PartitionKind::Sentence).is_empty();
        let content = self.content.get_or_insert_with(String::new);
        let mut start = content.chars().count();
        if has_sentences {
            content.push(SENTENCE_SEPARATOR);
            start += 1;
        }
        content.push_str(&sentence.text);
        let end = start + len;

        let previous_end = self
            .partitions
            .get(&PartitionKind::Sentence)
            .last()
            .map(|s| s.end());
        let region = if sentence.is_title {
            PartitionKind::Title
        } else {
            PartitionKind::Body
        };
        self.extend_region(region, previous_end, start, end);

        self.partitions.push(
            PartitionKind::Sentence,
            SentenceSpan {
                start,
                end,
                id: sentence.id,
                sem_orient: sentence.sem_orient,
                significance: sentence.significance,
            }
            .into(),
        );
        for token in &sentence.tokens {
            self.partitions
                .push(PartitionKind::Token, token.shifted(start as isize).into());
        }

        Ok(self.partitions.get(&PartitionKind::Sentence).len() - 1)
    }

    /// Grow the last region span over the new sentence when the previous
    /// sentence belonged to the same region, otherwise open a new one.
    fn extend_region(
        &mut self,
        region: PartitionKind,
        previous_end: Option<usize>,
        start: usize,
        end: usize,
    ) {
        if let (Some(spans), Some(prev)) = (self.partitions.get_mut(&region), previous_end) {
            if let Some(Span::Char(last)) = spans.last_mut() {
                if last.end == prev {
                    last.end = end;
                    return;
                }
            }
        }
        self.partitions.push(region, CharSpan::new(start, end).into());
    }

    /// Sentence records rebuilt from content and partitions, in order.
    pub fn sentences(&self) -> Vec<Sentence> {
        let content = self.content.as_deref().unwrap_or_default();
        self.partitions
            .get(&PartitionKind::Sentence)
            .iter()
            .filter_map(Span::as_sentence)
            .map(|span| {
                let tokens = self
                    .partitions
                    .within(&PartitionKind::Token, span)
                    .filter_map(Span::as_token)
                    .map(|t| t.shifted(-(span.start as isize)))
                    .collect();
                Sentence {
                    id: span.id,
                    text: char_slice(content, span.start, span.end)
                        .unwrap_or_default()
                        .to_string(),
                    tokens,
                    is_title: self.partitions.covers(&PartitionKind::Title, span),
                    sem_orient: span.sem_orient,
                    significance: span.significance,
                }
            })
            .collect()
    }

    /// Whether content and partitions are exactly what appending
    /// [`Document::sentences`] again would produce.
    pub fn is_sentence_layout(&self) -> bool {
        let mut rebuilt = Document::new(self.id.clone());
        self.sentences()
            .into_iter()
            .all(|sentence| rebuilt.push_sentence(sentence).is_ok())
            && rebuilt.content == self.content
            && rebuilt.partitions == self.partitions
    }

    // -----------------------------------------------------------------------
    // Annotations and lifecycle
    // -----------------------------------------------------------------------

    pub fn title_annotations(&self) -> &[Annotation] {
        &self.title_annotations
    }

    pub fn body_annotations(&self) -> &[Annotation] {
        &self.body_annotations
    }

    /// Record an annotation found in the title region.
    pub fn add_title_annotation(&mut self, annotation: Annotation) -> DocumentResult<()> {
        self.ensure_draft()?;
        self.title_annotations.push(annotation);
        Ok(())
    }

    /// Record an annotation found in the body region.
    pub fn add_body_annotation(&mut self, annotation: Annotation) -> DocumentResult<()> {
        self.ensure_draft()?;
        self.body_annotations.push(annotation);
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn ensure_draft(&self) -> DocumentResult<()> {
        if self.finalized {
            return Err(DocumentError::AlreadyFinalized {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Merge title and body annotations into `annotations` and clear the raw
    /// title and body text.
    ///
    /// The canonical list becomes the title annotations followed by the body
    /// annotations; anything set there before is replaced. Fails with
    /// [`DocumentError::AlreadyFinalized`] on a second call.
    pub fn finalize(&mut self) -> DocumentResult<()> {
        self.ensure_draft()?;
        let title = std::mem::take(&mut self.title_annotations);
        let body = std::mem::take(&mut self.body_annotations);
        let replaced = self.annotations.len();
        let mut merged = title;
        merged.extend(body);
        self.annotations = merged;
        self.title = None;
        self.body = None;
        self.finalized = true;
        tracing::debug!(
            document = %self.id,
            replaced,
            total = self.annotations.len(),
            "document finalized"
        );
        Ok(())
    }

    /// The canonical annotation list aggregated per entity.
    pub fn compact_annotations(&self) -> Vec<CompactAnnotation> {
        CompactAnnotation::fold(&self.annotations)
    }

    // Codec hooks: restore state exactly as it was transmitted.

    pub(crate) fn restore_region_annotations(
        &mut self,
        title: Vec<Annotation>,
        body: Vec<Annotation>,
    ) {
        self.title_annotations = title;
        self.body_annotations = body;
    }

    pub(crate) fn restore_finalized(&mut self, finalized: bool) {
        self.finalized = finalized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;
    use crate::entity::EntityDescriptor;
    use crate::span::{Dependency, TokenSpan};

    fn ann(key: &str, start: usize) -> Annotation {
        Annotation::new(EntityDescriptor::new(key), key, start, start + key.len())
    }

    #[test]
    fn finalize_merges_title_then_body() {
        let mut doc = Document::new("d1");
        doc.title = Some("Title".into());
        doc.body = Some("Body text".into());
        doc.add_title_annotation(ann("a1", 0)).unwrap();
        doc.add_body_annotation(ann("a2", 0)).unwrap();
        doc.add_body_annotation(ann("a3", 5)).unwrap();

        doc.finalize().unwrap();

        let keys: Vec<_> = doc.annotations.iter().map(Annotation::key).collect();
        assert_eq!(keys, vec!["a1", "a2", "a3"]);
        assert!(doc.title_annotations().is_empty());
        assert!(doc.body_annotations().is_empty());
        assert!(doc.title.is_none());
        assert!(doc.body.is_none());
        assert!(doc.is_finalized());
    }

    #[test]
    fn finalize_replaces_canonical_list() {
        let mut doc = Document::new("d9");
        doc.annotations.push(ann("old", 0));
        doc.add_title_annotation(ann("a1", 0)).unwrap();
        doc.add_body_annotation(ann("a2", 4)).unwrap();
        doc.finalize().unwrap();
        let keys: Vec<_> = doc.annotations.iter().map(Annotation::key).collect();
        assert_eq!(keys, vec!["a1", "a2"]);
    }

    #[test]
    fn finalize_twice_is_rejected() {
        let mut doc = Document::new("d2");
        doc.add_body_annotation(ann("a", 0)).unwrap();
        doc.finalize().unwrap();
        assert!(matches!(
            doc.finalize(),
            Err(DocumentError::AlreadyFinalized { .. })
        ));
        assert_eq!(doc.annotations.len(), 1);
        assert!(doc.add_title_annotation(ann("b", 0)).is_err());
    }

    #[test]
    fn push_sentence_builds_partitions() {
        let mut doc = Document::new("d3");
        let title = Sentence::new("Big news").title().with_tokens([
            TokenSpan::new(0, 3).with_pos("JJ"),
            TokenSpan::new(4, 8).with_pos("NN"),
        ]);
        let body = Sentence::new("Vienna grows.")
            .with_token(
                TokenSpan::new(0, 6)
                    .with_pos("NNP")
                    .with_dependency(Dependency::new(1, "nsubj")),
            )
            .with_significance(0.5);

        assert_eq!(doc.push_sentence(title.clone()).unwrap(), 0);
        assert_eq!(doc.push_sentence(body.clone()).unwrap(), 1);

        assert_eq!(doc.content(), Some("Big news\nVienna grows."));
        let parts = doc.partitions();
        assert_eq!(parts.get(&PartitionKind::Title), &[Span::from(CharSpan::new(0, 8))]);
        assert_eq!(parts.get(&PartitionKind::Body), &[Span::from(CharSpan::new(9, 22))]);
        assert_eq!(parts.get(&PartitionKind::Token)[2].start(), 9);

        let sentences = doc.sentences();
        assert_eq!(sentences, vec![title, body]);
    }

    #[test]
    fn consecutive_title_sentences_share_one_region() {
        let mut doc = Document::new("d4");
        doc.push_sentence(Sentence::new("One").title()).unwrap();
        doc.push_sentence(Sentence::new("Two").title()).unwrap();
        doc.push_sentence(Sentence::new("Three")).unwrap();
        doc.push_sentence(Sentence::new("Four").title()).unwrap();
        let titles = doc.partitions().get(&PartitionKind::Title);
        assert_eq!(titles, &[
                Span::from(CharSpan::new(0, 7)),
                Span::from(CharSpan::new(14, 18))
            ]);
        let flags: Vec<_> = doc.sentences().iter().map(|s| s.is_title).collect();
        assert_eq!(flags, vec![true, true, false, true]);
    }

    #[test]
    fn empty_first_sentence_keeps_separator() {
        let mut doc = Document::new("d8");
        doc.push_sentence(Sentence::new("")).unwrap();
        doc.push_sentence(Sentence::new("Title").title()).unwrap();
        doc.push_sentence(Sentence::new("")).unwrap();

        assert_eq!(doc.content(), Some("\nTitle\n"));
        let flags: Vec<_> = doc.sentences().iter().map(|s| s.is_title).collect();
        assert_eq!(flags, vec![false, true, false]);
        assert_eq!(
            doc.partitions().get(&PartitionKind::Title),
            &[Span::from(CharSpan::new(1, 6))]
        );
    }

    #[test]
    fn token_outside_sentence_is_rejected() {
        let mut doc = Document::new("d5");
        let bad = Sentence::new("abc").with_token(TokenSpan::new(1, 9));
        assert!(matches!(
            doc.push_sentence(bad),
            Err(DocumentError::TokenOutOfBounds { .. })
        ));
        assert!(doc.content().is_none());
    }

    #[test]
    fn spans_are_bounds_checked() {
        let mut doc = Document::new("d6");
        let mut parts = Partitions::new();
        parts.push(PartitionKind::Token, TokenSpan::new(0, 4).into());
        assert!(doc.set_content(Some("abc".into()), parts.clone()).is_err());
        doc.set_content(Some("abcd".into()), parts).unwrap();
        assert!(doc.add_span(PartitionKind::Title, CharSpan::new(2, 5)).is_err());
        doc.add_span(PartitionKind::Title, CharSpan::new(0, 2)).unwrap();
        assert_eq!(doc.text_of(&CharSpan::new(0, 2)), Some("ab"));
    }

    #[test]
    fn sentence_layout_detects_foreign_content() {
        assert!(Document::new("e").is_sentence_layout());

        let mut doc = Document::new("d10");
        doc.push_sentence(Sentence::new("Hello world.")).unwrap();
        doc.push_sentence(Sentence::new("Bye.").title()).unwrap();
        assert!(doc.is_sentence_layout());

        doc.add_span(PartitionKind::Other("PARA".into()), CharSpan::new(0, 12))
            .unwrap();
        assert!(!doc.is_sentence_layout());

        let mut spaced = Document::new("d11");
        let mut parts = Partitions::new();
        parts.push(
            PartitionKind::Sentence,
            SentenceSpan {
                start: 0,
                end: 5,
                id: Digest::from_text("Hello"),
                sem_orient: None,
                significance: None,
            }
            .into(),
        );
        spaced.set_content(Some("Hello  world".into()), parts).unwrap();
        assert!(!spaced.is_sentence_layout());
    }

    #[test]
    fn sentence_ids_are_kept() {
        let mut doc = Document::new("d7");
        let id = Digest::from_parts(1, 2);
        doc.push_sentence(Sentence::new("text").with_id(id)).unwrap();
        assert_eq!(doc.sentences()[0].id, id);
    }
}
