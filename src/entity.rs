//! Entity descriptors and their two aggregation levels.
//!
//! - [`Annotation`]: one recognized occurrence of an entity.
//! - [`CompactAnnotation`]: one entity with the set of its occurrences
//!   ([`AnnotationSurface`]s), deduplicated by position.
//! - [`ScoredAnnotation`]: an aggregated entity carrying a relevance score.
//!
//! [`EntityAnnotation`] unifies the three behind an explicit kind tag.

use std::collections::BTreeMap;
use std::fmt;

use crate::digest::Digest;

/// What is known about a recognized entity, independent of where it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityDescriptor {
    /// Stable identifier supplied by the recognizer, e.g. a knowledge-base URI.
    pub key: String,
    pub preferred_name: Option<String>,
    pub entity_type: Option<String>,
    /// Open enrichment fields. Each name maps to one or more values.
    pub metadata: BTreeMap<String, Vec<String>>,
}

impl EntityDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_preferred_name(mut self, name: impl Into<String>) -> Self {
        self.preferred_name = Some(name.into());
        self
    }

    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Append one value to a metadata field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// First value of a metadata field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.metadata
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// One occurrence of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub descriptor: EntityDescriptor,
    pub surface_form: String,
    pub start: usize,
    pub end: usize,
    /// Index of the sentence the occurrence was found in.
    pub sentence: Option<usize>,
    pub pos_tag: Option<String>,
    pub confidence: Option<f64>,
    /// Digest of the owning sentence.
    pub md5sum: Option<Digest>,
}

impl Annotation {
    pub fn new(
        descriptor: EntityDescriptor,
        surface_form: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            descriptor,
            surface_form: surface_form.into(),
            start,
            end,
            sentence: None,
            pos_tag: None,
            confidence: None,
            md5sum: None,
        }
    }

    pub fn with_sentence(mut self, index: usize) -> Self {
        self.sentence = Some(index);
        self
    }

    pub fn with_pos_tag(mut self, pos_tag: impl Into<String>) -> Self {
        self.pos_tag = Some(pos_tag.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_md5sum(mut self, md5sum: Digest) -> Self {
        self.md5sum = Some(md5sum);
        self
    }

    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    /// True iff both occurrences sit in the same sentence (by digest) and
    /// their `[start, end)` ranges share at least one character.
    ///
    /// Which of two overlapping candidates wins is up to the caller.
    pub fn overlaps(&self, other: &Annotation) -> bool {
        match (self.md5sum, other.md5sum) {
            (Some(a), Some(b)) if a == b => self.start < other.end && other.start < self.end,
            _ => false,
        }
    }

    /// This occurrence as a surface of its entity.
    pub fn surface(&self) -> AnnotationSurface {
        AnnotationSurface {
            start: self.start,
            end: self.end,
            sentence: self.sentence,
            md5sum: self.md5sum,
            surface_form: self.surface_form.clone(),
        }
    }
}

/// One position of an aggregated entity.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSurface {
    pub start: usize,
    pub end: usize,
    pub sentence: Option<usize>,
    pub md5sum: Option<Digest>,
    pub surface_form: String,
}

impl AnnotationSurface {
    /// Surfaces are identified by position alone.
    fn position(&self) -> SurfaceKey {
        SurfaceKey {
            sentence: self.sentence,
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct SurfaceKey {
    sentence: Option<usize>,
    start: usize,
    end: usize,
}

/// One entity with all of its occurrences.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactAnnotation {
    pub descriptor: EntityDescriptor,
    surfaces: BTreeMap<SurfaceKey, AnnotationSurface>,
}

impl CompactAnnotation {
    pub fn new(descriptor: EntityDescriptor) -> Self {
        Self {
            descriptor,
            surfaces: BTreeMap::new(),
        }
    }

    /// Aggregate a single occurrence. Zero-length occurrences contribute no
    /// surface.
    pub fn from_annotation(annotation: &Annotation) -> Self {
        let mut compact = Self::new(annotation.descriptor.clone());
        if annotation.end > annotation.start {
            compact.add_surface(annotation.surface());
        }
        compact
    }

    /// Group occurrences by entity key, in order of first appearance. The
    /// descriptor of the first occurrence of each key is kept.
    pub fn fold<'a>(annotations: impl IntoIterator<Item = &'a Annotation>) -> Vec<Self> {
        let mut order: Vec<Self> = Vec::new();
        let mut index: BTreeMap<&'a str, usize> = BTreeMap::new();
        for annotation in annotations {
            match index.get(annotation.key()) {
                Some(&i) => {
                    if annotation.end > annotation.start {
                        order[i].add_surface(annotation.surface());
                    }
                }
                None => {
                    index.insert(annotation.key(), order.len());
                    order.push(Self::from_annotation(annotation));
                }
            }
        }
        order
    }

    /// Insert a surface. Returns `false` when a surface at the same
    /// `(start, end, sentence)` was already present; the set is unchanged.
    pub fn add_surface(&mut self, surface: AnnotationSurface) -> bool {
        let key = surface.position();
        if self.surfaces.contains_key(&key) {
            return false;
        }
        self.surfaces.insert(key, surface);
        true
    }

    /// Surfaces ordered by sentence, then position.
    pub fn surfaces(&self) -> impl Iterator<Item = &AnnotationSurface> {
        self.surfaces.values()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn key(&self) -> &str {
        &self.descriptor.key
    }
}

/// An aggregated entity with a relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAnnotation {
    pub compact: CompactAnnotation,
    pub score: f64,
}

impl ScoredAnnotation {
    pub fn new(compact: CompactAnnotation, score: f64) -> Self {
        Self { compact, score }
    }
}

/// Aggregation level of an [`EntityAnnotation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Occurrence,
    Aggregated,
    ScoredAggregated,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Occurrence => "occurrence",
            Self::Aggregated => "aggregated",
            Self::ScoredAggregated => "scored_aggregated",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "occurrence" => Some(Self::Occurrence),
            "aggregated" => Some(Self::Aggregated),
            "scored_aggregated" => Some(Self::ScoredAggregated),
            _ => None,
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity annotation at any aggregation level.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityAnnotation {
    Occurrence(Annotation),
    Aggregated(CompactAnnotation),
    ScoredAggregated(ScoredAnnotation),
}

impl EntityAnnotation {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Self::Occurrence(_) => AnnotationKind::Occurrence,
            Self::Aggregated(_) => AnnotationKind::Aggregated,
            Self::ScoredAggregated(_) => AnnotationKind::ScoredAggregated,
        }
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        match self {
            Self::Occurrence(a) => &a.descriptor,
            Self::Aggregated(c) => &c.descriptor,
            Self::ScoredAggregated(s) => &s.compact.descriptor,
        }
    }

    /// Number of occurrences represented.
    pub fn occurrences(&self) -> usize {
        match self {
            Self::Occurrence(_) => 1,
            Self::Aggregated(c) => c.surface_count(),
            Self::ScoredAggregated(s) => s.compact.surface_count(),
        }
    }
}

impl From<Annotation> for EntityAnnotation {
    fn from(a: Annotation) -> Self {
        Self::Occurrence(a)
    }
}

impl From<CompactAnnotation> for EntityAnnotation {
    fn from(c: CompactAnnotation) -> Self {
        Self::Aggregated(c)
    }
}

impl From<ScoredAnnotation> for EntityAnnotation {
    fn from(s: ScoredAnnotation) -> Self {
        Self::ScoredAggregated(s)
    }
}
