//! Transport envelope: the XML page carried as a single JSON string value.

use crate::codec::config::CodecConfig;
use crate::codec::xml;
use crate::document::Document;
use crate::error::{CodecError, CodecResult};

/// Encode to XML and quote the result as a JSON string.
pub fn wrap(document: &Document, config: &CodecConfig) -> CodecResult<String> {
    let page = xml::to_xml_with(document, config)?;
    serde_json::to_string(&page).map_err(|e| CodecError::Json {
        document: Some(document.id.clone()),
        message: e.to_string(),
    })
}

/// Reverse of [`wrap`].
pub fn unwrap(payload: &str) -> CodecResult<Document> {
    let page: String = serde_json::from_str(payload).map_err(|e| CodecError::Json {
        document: None,
        message: format!("envelope is not a JSON string: {e}"),
    })?;
    xml::from_xml(&page)
}
