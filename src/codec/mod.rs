//! Wire codecs for [`Document`]: the canonical XML page, the JSON form, and
//! the JSON-string envelope used for transport.

pub mod config;
pub mod envelope;
pub mod field;
pub mod json;
pub mod xml;

use rayon::prelude::*;

use crate::document::Document;
use crate::error::{CodecError, CodecResult};
use crate::partition::PartitionKind;

pub use config::{CodecConfig, JsonLayout};
pub use json::{from_json, to_json, to_json_with};
pub use xml::{from_xml, to_xml, to_xml_with};

/// Sentence-only wire forms cannot carry content or spans that
/// [`Document::push_sentence`] would not rebuild.
pub(crate) fn ensure_sentence_layout(document: &Document) -> CodecResult<()> {
    if document.is_sentence_layout() {
        return Ok(());
    }
    let kinds: Vec<&str> = document
        .partitions()
        .kinds()
        .map(PartitionKind::as_str)
        .collect();
    Err(CodecError::InvalidValue {
        document: Some(document.id.clone()),
        field: "content".to_string(),
        value: format!("not built from sentences (partitions: {})", kinds.join(", ")),
    })
}

/// Encode many documents in parallel. One result per input, in input order.
pub fn encode_xml_batch(documents: &[Document], config: &CodecConfig) -> Vec<CodecResult<String>> {
    let results: Vec<_> = documents
        .par_iter()
        .map(|document| xml::to_xml_with(document, config))
        .collect();
    let failed = results.iter().filter(|r| r.is_err()).count();
    tracing::debug!(documents = documents.len(), failed, "encoded XML batch");
    results
}

/// Decode many pages in parallel. A malformed page fails alone.
pub fn decode_xml_batch<S>(pages: &[S]) -> Vec<CodecResult<Document>>
where
    S: AsRef<str> + Sync,
{
    let results: Vec<_> = pages
        .par_iter()
        .map(|page| xml::from_xml(page.as_ref()))
        .collect();
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        tracing::warn!(pages = pages.len(), failed, "some pages in batch failed to decode");
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Sentence;

    #[test]
    fn batch_keeps_order_and_isolates_failures() {
        let docs: Vec<Document> = (0..16)
            .map(|i| {
                let mut d = Document::new(format!("doc-{i}"));
                d.push_sentence(Sentence::new(format!("Sentence number {i}.")))
                    .unwrap();
                d
            })
            .collect();
        let encoded = encode_xml_batch(&docs, &CodecConfig::default());
        let mut pages: Vec<String> = encoded.into_iter().map(Result::unwrap).collect();
        pages[3] = "<broken".to_string();

        let decoded = decode_xml_batch(&pages);
        assert_eq!(decoded.len(), docs.len());
        for (i, result) in decoded.iter().enumerate() {
            if i == 3 {
                assert!(result.is_err());
            } else {
                assert_eq!(result.as_ref().unwrap(), &docs[i]);
            }
        }
    }
}
