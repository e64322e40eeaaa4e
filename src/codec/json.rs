//! The JSON wire form.
//!
//! Field names are snake_case and independent of the in-memory names. Header
//! keys use the qualified-key string form (`{namespace}local`). Annotation
//! metadata is flattened into the annotation object next to the fixed fields:
//! one value is written as a string, several as an array.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::config::{CodecConfig, JsonLayout};
use crate::digest::Digest;
use crate::document::{Document, Sentence};
use crate::entity::{
    Annotation, AnnotationSurface, CompactAnnotation, EntityAnnotation, EntityDescriptor,
    ScoredAnnotation,
};
use crate::error::{CodecError, CodecResult, DocumentError};
use crate::partition::Partitions;
use crate::qkey::QualifiedKey;
use crate::span::TokenSpan;

/// Annotation field names that metadata can never use. `kind` is the
/// aggregation tag of [`EntityAnnotation`].
const RESERVED_FIELDS: &[&str] = &[
    "key",
    "preferred_name",
    "entity_type",
    "surface_form",
    "start",
    "end",
    "sentence",
    "pos_tag",
    "confidence",
    "md5sum",
    "kind",
    "surfaces",
    "score",
];

fn is_false(value: &bool) -> bool {
    !value
}

fn json_error(document: Option<&str>, err: impl std::fmt::Display) -> CodecError {
    CodecError::Json {
        document: document.map(str::to_string),
        message: err.to_string(),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentWire {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nilsimsa: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    header: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Partitions::is_empty")]
    partitions: Partitions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sentences: Option<Vec<SentenceWire>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    annotations: Vec<AnnotationWire>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    title_annotations: Vec<AnnotationWire>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    body_annotations: Vec<AnnotationWire>,
    #[serde(default, skip_serializing_if = "is_false")]
    finalized: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct SentenceWire {
    /// Computed from `text` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Digest>,
    text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tokens: Vec<TokenSpan>,
    #[serde(default, skip_serializing_if = "is_false")]
    is_title: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sem_orient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    significance: Option<f64>,
}

impl From<Sentence> for SentenceWire {
    fn from(s: Sentence) -> Self {
        Self {
            id: Some(s.id),
            text: s.text,
            tokens: s.tokens,
            is_title: s.is_title,
            sem_orient: s.sem_orient,
            significance: s.significance,
        }
    }
}

impl From<SentenceWire> for Sentence {
    fn from(w: SentenceWire) -> Self {
        let id = w.id.unwrap_or_else(|| Digest::from_text(&w.text));
        Sentence {
            id,
            text: w.text,
            tokens: w.tokens,
            is_title: w.is_title,
            sem_orient: w.sem_orient,
            significance: w.significance,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AnnotationWire {
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preferred_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entity_type: Option<String>,
    #[serde(default)]
    surface_form: String,
    start: usize,
    end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sentence: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pos_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    md5sum: Option<Digest>,
    #[serde(flatten)]
    metadata: BTreeMap<String, Value>,
}

impl AnnotationWire {
    fn new(annotation: &Annotation, document: Option<&str>) -> Self {
        let d = &annotation.descriptor;
        Self {
            key: d.key.clone(),
            preferred_name: d.preferred_name.clone(),
            entity_type: d.entity_type.clone(),
            surface_form: annotation.surface_form.clone(),
            start: annotation.start,
            end: annotation.end,
            sentence: annotation.sentence,
            pos_tag: annotation.pos_tag.clone(),
            confidence: annotation.confidence,
            md5sum: annotation.md5sum,
            metadata: metadata_to_wire(&d.metadata, &d.key, document),
        }
    }

    fn into_annotation(self) -> Annotation {
        let descriptor = EntityDescriptor {
            key: self.key,
            preferred_name: self.preferred_name,
            entity_type: self.entity_type,
            metadata: metadata_from_wire(self.metadata),
        };
        Annotation {
            descriptor,
            surface_form: self.surface_form,
            start: self.start,
            end: self.end,
            sentence: self.sentence,
            pos_tag: self.pos_tag,
            confidence: self.confidence,
            md5sum: self.md5sum,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SurfaceWire {
    start: usize,
    end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sentence: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    md5sum: Option<Digest>,
    #[serde(default)]
    surface_form: String,
}

/// An aggregated entity; `score` is present only for scored aggregates.
#[derive(Debug, Serialize, Deserialize)]
struct AggregateWire {
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preferred_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entity_type: Option<String>,
    #[serde(default)]
    surfaces: Vec<SurfaceWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(flatten)]
    metadata: BTreeMap<String, Value>,
}

impl AggregateWire {
    fn new(compact: &CompactAnnotation, score: Option<f64>) -> Self {
        let d = &compact.descriptor;
        Self {
            key: d.key.clone(),
            preferred_name: d.preferred_name.clone(),
            entity_type: d.entity_type.clone(),
            surfaces: compact
                .surfaces()
                .map(|s| SurfaceWire {
                    start: s.start,
                    end: s.end,
                    sentence: s.sentence,
                    md5sum: s.md5sum,
                    surface_form: s.surface_form.clone(),
                })
                .collect(),
            score,
            metadata: metadata_to_wire(&d.metadata, &d.key, None),
        }
    }

    fn into_compact(self) -> CompactAnnotation {
        let mut compact = CompactAnnotation::new(EntityDescriptor {
            key: self.key,
            preferred_name: self.preferred_name,
            entity_type: self.entity_type,
            metadata: metadata_from_wire(self.metadata),
        });
        for s in self.surfaces {
            compact.add_surface(AnnotationSurface {
                start: s.start,
                end: s.end,
                sentence: s.sentence,
                md5sum: s.md5sum,
                surface_form: s.surface_form,
            });
        }
        compact
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EntityAnnotationWire {
    Occurrence(AnnotationWire),
    Aggregated(AggregateWire),
    ScoredAggregated(AggregateWire),
}

fn metadata_to_wire(
    metadata: &BTreeMap<String, Vec<String>>,
    key: &str,
    document: Option<&str>,
) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    for (name, values) in metadata {
        if RESERVED_FIELDS.contains(&name.as_str()) {
            tracing::warn!(
                document = document.unwrap_or("<none>"),
                entity = key,
                field = %name,
                "metadata field collides with a fixed annotation field, not written"
            );
            continue;
        }
        let value = match values.as_slice() {
            [single] => Value::String(single.clone()),
            many => Value::Array(many.iter().cloned().map(Value::String).collect()),
        };
        out.insert(name.clone(), value);
    }
    out
}

fn metadata_from_wire(wire: BTreeMap<String, Value>) -> BTreeMap<String, Vec<String>> {
    wire.into_iter()
        .filter(|(name, _)| !RESERVED_FIELDS.contains(&name.as_str()))
        .map(|(name, value)| {
            let values = match value {
                Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
                other => scalar_text(other).into_iter().collect(),
            };
            (name, values)
        })
        .collect()
}

/// Text of a metadata value; `null` carries none.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Serialize with the default [`CodecConfig`].
pub fn to_json(document: &Document) -> CodecResult<String> {
    to_json_with(document, &CodecConfig::default())
}

pub fn to_json_with(document: &Document, config: &CodecConfig) -> CodecResult<String> {
    let wire = document_wire(document, config)?;
    let json = if config.json_pretty {
        serde_json::to_string_pretty(&wire)
    } else {
        serde_json::to_string(&wire)
    }
    .map_err(|e| json_error(Some(&document.id), e))?;
    tracing::debug!(
        document = %document.id,
        layout = ?config.json_layout,
        bytes = json.len(),
        "encoded JSON document"
    );
    Ok(json)
}

pub fn to_json_value(document: &Document, config: &CodecConfig) -> CodecResult<Value> {
    serde_json::to_value(document_wire(document, config)?)
        .map_err(|e| json_error(Some(&document.id), e))
}

pub fn from_json(json: &str) -> CodecResult<Document> {
    let value: Value = serde_json::from_str(json).map_err(|e| json_error(None, e))?;
    from_json_value(value)
}

/// Decode a document. Either `content` with `partitions` or a `sentences`
/// array is accepted; when both are present `content` wins.
pub fn from_json_value(value: Value) -> CodecResult<Document> {
    let id = value.get("id").and_then(Value::as_str).map(str::to_string);
    let wire: DocumentWire =
        serde_json::from_value(value).map_err(|e| json_error(id.as_deref(), e))?;
    let document = document_from_wire(wire)?;
    tracing::debug!(
        document = %document.id,
        annotations = document.annotations.len(),
        "decoded JSON document"
    );
    Ok(document)
}

fn document_wire(document: &Document, config: &CodecConfig) -> CodecResult<DocumentWire> {
    let id = Some(document.id.as_str());
    let annotations = |list: &[Annotation]| -> Vec<AnnotationWire> {
        list.iter().map(|a| AnnotationWire::new(a, id)).collect()
    };

    let (content, partitions, sentences) = match config.json_layout {
        JsonLayout::Partitions => (
            document.content().map(str::to_string),
            document.partitions().clone(),
            None,
        ),
        JsonLayout::Sentences => {
            super::ensure_sentence_layout(document)?;
            let sentences: Vec<SentenceWire> =
                document.sentences().into_iter().map(SentenceWire::from).collect();
            (None, Partitions::new(), (!sentences.is_empty()).then_some(sentences))
        }
    };

    Ok(DocumentWire {
        id: document.id.clone(),
        format: document.format.clone(),
        lang: document.lang.clone(),
        nilsimsa: document.nilsimsa.clone(),
        header: document
            .header
            .iter()
            .map(|(key, value)| (key.encode(), value.clone()))
            .collect(),
        title: document.title.clone(),
        body: document.body.clone(),
        content,
        partitions,
        sentences,
        annotations: annotations(&document.annotations),
        title_annotations: annotations(document.title_annotations()),
        body_annotations: annotations(document.body_annotations()),
        finalized: document.is_finalized(),
    })
}

fn document_from_wire(wire: DocumentWire) -> CodecResult<Document> {
    let mut document = Document::new(wire.id);
    document.format = wire.format;
    document.lang = wire.lang;
    document.nilsimsa = wire.nilsimsa;
    document.header = wire
        .header
        .into_iter()
        .map(|(key, value)| (QualifiedKey::decode(&key), value))
        .collect();
    document.title = wire.title;
    document.body = wire.body;

    let id = document.id.clone();
    let located = |e: DocumentError| CodecError::from(e).with_document(&id);
    if wire.content.is_some() || !wire.partitions.is_empty() {
        document
            .set_content(wire.content, wire.partitions)
            .map_err(located)?;
    } else if let Some(sentences) = wire.sentences {
        for sentence in sentences {
            document.push_sentence(sentence.into()).map_err(located)?;
        }
    }

    document.annotations = wire
        .annotations
        .into_iter()
        .map(AnnotationWire::into_annotation)
        .collect();
    document.restore_region_annotations(
        wire.title_annotations
            .into_iter()
            .map(AnnotationWire::into_annotation)
            .collect(),
        wire.body_annotations
            .into_iter()
            .map(AnnotationWire::into_annotation)
            .collect(),
    );
    document.restore_finalized(wire.finalized);
    Ok(document)
}

// ---------------------------------------------------------------------------
// Standalone entity annotations
// ---------------------------------------------------------------------------

pub fn entity_annotation_to_value(annotation: &EntityAnnotation) -> CodecResult<Value> {
    let wire = match annotation {
        EntityAnnotation::Occurrence(a) => EntityAnnotationWire::Occurrence(AnnotationWire::new(a, None)),
        EntityAnnotation::Aggregated(c) => EntityAnnotationWire::Aggregated(AggregateWire::new(c, None)),
        EntityAnnotation::ScoredAggregated(s) => {
            EntityAnnotationWire::ScoredAggregated(AggregateWire::new(&s.compact, Some(s.score)))
        }
    };
    serde_json::to_value(wire).map_err(|e| json_error(None, e))
}

/// Decode an annotation tagged with `kind`. A scored aggregate without a
/// `score` is rejected.
pub fn entity_annotation_from_value(value: Value) -> CodecResult<EntityAnnotation> {
    let wire: EntityAnnotationWire = serde_json::from_value(value).map_err(|e| json_error(None, e))?;
    Ok(match wire {
        EntityAnnotationWire::Occurrence(a) => EntityAnnotation::Occurrence(a.into_annotation()),
        EntityAnnotationWire::Aggregated(c) => EntityAnnotation::Aggregated(c.into_compact()),
        EntityAnnotationWire::ScoredAggregated(mut c) => {
            let score = c.score.take().ok_or_else(|| CodecError::Missing {
                document: None,
                what: format!("score of aggregated entity {}", c.key),
            })?;
            EntityAnnotation::ScoredAggregated(ScoredAnnotation::new(c.into_compact(), score))
        }
    })
}

pub fn entity_annotation_to_json(annotation: &EntityAnnotation) -> CodecResult<String> {
    entity_annotation_to_value(annotation).map(|v| v.to_string())
}

pub fn entity_annotation_from_json(json: &str) -> CodecResult<EntityAnnotation> {
    let value: Value = serde_json::from_str(json).map_err(|e| json_error(None, e))?;
    entity_annotation_from_value(value)
}
