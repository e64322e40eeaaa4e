// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # docwire
//!
//! The document interchange format shared by a pipeline of text-analysis
//! services. A producer builds a [`Document`], encodes it as an XML page and
//! wraps the page as a JSON string; a consumer unwraps, decodes, adds
//! annotations and re-encodes.
//!
//! ## Architecture
//!
//! - **Digests** (`digest`): 128-bit content digests used as sentence and
//!   entity ids
//! - **Qualified keys** (`qkey`, `namespace`): `(namespace, local)` header keys
//!   and their single-string form
//! - **Spans** (`span`, `partition`): character ranges grouped by kind
//! - **Entities** (`entity`): occurrences, aggregated entities and scores
//! - **Documents** (`document`): the model and its draft/finalized phases
//! - **Codecs** (`codec`): XML page, JSON form, transport envelope
//!
//! ## Library usage
//!
//! ```no_run
//! use docwire::codec::{self, CodecConfig};
//! use docwire::document::{Document, Sentence};
//! use docwire::entity::{Annotation, EntityDescriptor};
//!
//! let mut doc = Document::new("42").with_lang("en");
//! doc.push_sentence(Sentence::new("Vienna grows.")).unwrap();
//! doc.add_body_annotation(Annotation::new(EntityDescriptor::new("geo:vienna"), "Vienna", 0, 6))
//!     .unwrap();
//! doc.finalize().unwrap();
//!
//! let payload = codec::envelope::wrap(&doc, &CodecConfig::default()).unwrap();
//! let back = codec::envelope::unwrap(&payload).unwrap();
//! assert_eq!(back, doc);
//! ```

pub mod codec;
pub mod digest;
pub mod document;
pub mod entity;
pub mod error;
pub mod namespace;
pub mod partition;
pub mod qkey;
pub mod span;

pub use digest::Digest;
pub use document::{Document, Sentence};
pub use entity::{Annotation, CompactAnnotation, EntityAnnotation, EntityDescriptor};
pub use error::{DocwireError, DocwireResult};
pub use qkey::QualifiedKey;
