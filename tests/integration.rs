//! End-to-end integration tests for the docwire interchange format.
//!
//! These tests follow a document through the pipeline: a producer builds and
//! encodes it, a consumer decodes, annotates, finalizes and re-encodes, and
//! every hop must preserve the document exactly.

use docwire::codec::{self, CodecConfig, JsonLayout, envelope};
use docwire::digest::Digest;
use docwire::document::{Document, Sentence};
use docwire::entity::{Annotation, CompactAnnotation, EntityDescriptor};
use docwire::error::{CodecError, DocumentError};
use docwire::namespace::DUBLIN_CORE_NS;
use docwire::qkey::QualifiedKey;
use docwire::span::{Dependency, TokenSpan};

fn producer_document() -> Document {
    let mut doc = Document::new("1042")
        .with_format("text/html")
        .with_lang("en")
        .with_header(QualifiedKey::new(DUBLIN_CORE_NS, "title"), "City report")
        .with_header(QualifiedKey::decode("{http://example.org/crawl#}jobId"), "c-7");
    doc.title = Some("Vienna tops ranking".into());
    doc.body = Some("Vienna was named \"most liveable\" again. Zurich came second.".into());

    doc.push_sentence(
        Sentence::new("Vienna tops ranking")
            .title()
            .with_tokens([
                TokenSpan::new(0, 6).with_pos("NNP"),
                TokenSpan::new(7, 11).with_pos("VBZ"),
                TokenSpan::new(12, 19).with_pos("NN"),
            ]),
    )
    .unwrap();
    doc.push_sentence(
        Sentence::new("Vienna was named \"most liveable\" again.")
            .with_tokens([
                TokenSpan::new(0, 6)
                    .with_pos("NNP")
                    .with_dependency(Dependency::new(2, "nsubjpass")),
                TokenSpan::new(7, 10)
                    .with_pos("VBD")
                    .with_dependency(Dependency::new(2, "auxpass")),
                TokenSpan::new(11, 16)
                    .with_pos("VBN")
                    .with_dependency(Dependency::new(Dependency::ROOT, "ROOT")),
            ])
            .with_sem_orient(0.6),
    )
    .unwrap();
    doc.push_sentence(Sentence::new("Zurich came second.")).unwrap();
    doc
}

fn vienna(doc: &Document, sentence: usize, start: usize) -> Annotation {
    Annotation::new(
        EntityDescriptor::new("http://www.geonames.org/2761369")
            .with_preferred_name("Vienna")
            .with_entity_type("GeoEntity")
            .with_field("country", "AT"),
        "Vienna",
        start,
        start + 6,
    )
    .with_sentence(sentence)
    .with_md5sum(doc.sentences()[sentence].id)
}

#[test]
fn pipeline_hop_preserves_document() {
    let config = CodecConfig::default();
    let doc = producer_document();

    // Producer side.
    let payload = envelope::wrap(&doc, &config).unwrap();

    // Consumer side.
    let mut received = envelope::unwrap(&payload).unwrap();
    assert_eq!(received, doc);
    assert_eq!(received.sentences().len(), 3);
    assert!(received.sentences()[0].is_title);

    let title_hit = vienna(&received, 0, 0);
    let body_hit = vienna(&received, 1, 20);
    received.add_title_annotation(title_hit).unwrap();
    received.add_body_annotation(body_hit).unwrap();

    // Draft state travels as-is.
    let draft = envelope::unwrap(&envelope::wrap(&received, &config).unwrap()).unwrap();
    assert_eq!(draft, received);
    assert_eq!(draft.title_annotations().len(), 1);
    assert!(!draft.is_finalized());

    received.finalize().unwrap();
    let final_payload = envelope::wrap(&received, &config).unwrap();
    let finalized = envelope::unwrap(&final_payload).unwrap();
    assert!(finalized.is_finalized());
    assert!(finalized.title.is_none());
    assert_eq!(finalized.annotations.len(), 2);
    assert_eq!(finalized, received);

    // A finalized document stays finalized downstream.
    let mut downstream = finalized;
    assert!(matches!(
        downstream.finalize(),
        Err(DocumentError::AlreadyFinalized { .. })
    ));
}

#[test]
fn xml_and_json_agree() {
    let mut doc = producer_document();
    let ann = vienna(&doc, 1, 0);
    doc.annotations.push(ann);

    let from_xml = codec::from_xml(&codec::to_xml(&doc).unwrap()).unwrap();
    let from_json = codec::from_json(&codec::to_json(&doc).unwrap()).unwrap();
    assert_eq!(from_xml, doc);
    assert_eq!(from_json, doc);

    let sentences = CodecConfig {
        json_layout: JsonLayout::Sentences,
        ..Default::default()
    };
    let via_sentences = codec::from_json(&codec::to_json_with(&doc, &sentences).unwrap()).unwrap();
    assert_eq!(via_sentences, doc);

    // JSON output of the XML-decoded document is identical.
    assert_eq!(codec::to_json(&from_xml).unwrap(), codec::to_json(&doc).unwrap());
}

#[test]
fn quote_rewrite_is_configurable() {
    let doc = producer_document();
    let escaped = codec::to_xml(&doc).unwrap();
    assert!(escaped.contains("&quot;most liveable&quot;"));

    let raw = codec::to_xml_with(
        &doc,
        &CodecConfig {
            escape_quotes: false,
            ..Default::default()
        },
    )
    .unwrap();
    assert!(raw.contains("\"most liveable\""));
    assert_eq!(codec::from_xml(&raw).unwrap(), doc);
}

#[test]
fn title_flag_only_on_title_sentences() {
    let xml = codec::to_xml(&producer_document()).unwrap();
    assert_eq!(xml.matches("wl:is_title=").count(), 1);
    assert!(!xml.contains("=\"false\""));
}

#[test]
fn compact_view_groups_occurrences() {
    let mut doc = producer_document();
    let first = vienna(&doc, 1, 0);
    let again = vienna(&doc, 1, 0);
    let title = vienna(&doc, 0, 0);
    doc.annotations.extend([first, again, title]);

    let compact: Vec<CompactAnnotation> = doc.compact_annotations();
    assert_eq!(compact.len(), 1);
    assert_eq!(compact[0].surface_count(), 2);
}

#[test]
fn producer_header_keys_are_accepted() {
    let json = r#"{
        "id": "p-1",
        "header": {
            "dc:creator": "Ann",
            "wl:jobId": "j-9",
            "http://purl.org/dc/elements/1.1/subject": "cities",
            "plain": "x"
        }
    }"#;
    let doc = codec::from_json(json).unwrap();
    assert_eq!(
        doc.header_value(&QualifiedKey::new(DUBLIN_CORE_NS, "creator")),
        Some("Ann")
    );
    assert_eq!(doc.header_value(&QualifiedKey::document("jobId")), Some("j-9"));
    assert_eq!(
        doc.header_value(&QualifiedKey::new(DUBLIN_CORE_NS, "subject")),
        Some("cities")
    );
    assert_eq!(doc.header_value(&QualifiedKey::unqualified("plain")), Some("x"));

    // Re-encoding canonicalizes to the braced form.
    let value = codec::json::to_json_value(&doc, &CodecConfig::default()).unwrap();
    assert_eq!(value["header"]["{http://purl.org/dc/elements/1.1/}creator"], "Ann");

    // And the XML form carries them as namespaced attributes.
    let xml = codec::to_xml(&doc).unwrap();
    assert!(xml.contains("dc:creator=\"Ann\""));
    assert_eq!(codec::from_xml(&xml).unwrap(), doc);
}

#[test]
fn sentence_ids_are_text_digests() {
    let doc = producer_document();
    for sentence in doc.sentences() {
        assert_eq!(sentence.id, Digest::from_text(&sentence.text));
    }
}

#[test]
fn errors_name_the_document() {
    let mut doc = Document::new("bad-lang");
    doc.lang = Some("not a tag".into());
    let xml = codec::to_xml(&doc).unwrap();
    let err = codec::from_xml(&xml).unwrap_err();
    assert_eq!(err.document(), Some("bad-lang"));
    assert!(matches!(err, CodecError::InvalidValue { .. }));
}

#[test]
fn documents_cross_threads() {
    let doc = producer_document();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let mut copy = doc.clone();
            copy.id = format!("thread-{i}");
            std::thread::spawn(move || codec::from_xml(&codec::to_xml(&copy).unwrap()).unwrap())
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let back = handle.join().unwrap();
        assert_eq!(back.id, format!("thread-{i}"));
        assert_eq!(back.sentences(), doc.sentences());
    }
}

#[test]
fn batch_roundtrip() {
    let docs: Vec<Document> = (0..32)
        .map(|i| {
            let mut d = producer_document();
            d.id = i.to_string();
            d
        })
        .collect();
    let pages: Vec<String> = codec::encode_xml_batch(&docs, &CodecConfig::default())
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    let back: Vec<Document> = codec::decode_xml_batch(&pages)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(back, docs);
}

#[test]
fn codec_config_file_drives_output() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("codec.toml");
    std::fs::write(&path, "indent = 2\nxml_declaration = false\njson_pretty = true\n").unwrap();

    let config = CodecConfig::load(&path).unwrap();
    let doc = producer_document();
    let xml = codec::to_xml_with(&doc, &config).unwrap();
    assert!(xml.starts_with("<wl:page"));
    assert!(xml.contains("\n  <wl:title>"));
    let json = codec::to_json_with(&doc, &config).unwrap();
    assert!(json.contains("\n  \"id\": \"1042\""));
}
