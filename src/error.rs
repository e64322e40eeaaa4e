//! Rich diagnostic error types for docwire.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so pipeline operators know
//! exactly which document failed and why.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for docwire.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum DocwireError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Digest(#[from] DigestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Digest errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DigestError {
    #[error("invalid digest \"{input}\": {reason}")]
    #[diagnostic(
        code(docwire::digest::invalid_format),
        help(
            "A digest is written as exactly 32 hexadecimal characters \
             (upper or lower case), high half first."
        )
    )]
    InvalidFormat { input: String, reason: String },

    #[error("invalid digest length: expected 16 bytes, got {actual}")]
    #[diagnostic(
        code(docwire::digest::invalid_length),
        help("Digests are 128 bits wide. Pass exactly 16 raw bytes.")
    )]
    InvalidLength { actual: usize },
}

// ---------------------------------------------------------------------------
// Document errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error("document \"{id}\" is already finalized")]
    #[diagnostic(
        code(docwire::document::already_finalized),
        help(
            "Finalize merges the title and body annotation lists exactly once. \
             Add annotations to `annotations` directly on a finalized document."
        )
    )]
    AlreadyFinalized { id: String },

    #[error("span {start}..{end} is out of bounds for document \"{id}\" ({len} chars)")]
    #[diagnostic(
        code(docwire::document::span_out_of_bounds),
        help(
            "Span offsets are character offsets into the document content and \
             must satisfy 0 <= start <= end <= content length."
        )
    )]
    SpanOutOfBounds {
        id: String,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("token {start}..{end} lies outside its sentence ({len} chars) in document \"{id}\"")]
    #[diagnostic(
        code(docwire::document::token_out_of_bounds),
        help("Token offsets are relative to the start of their sentence.")
    )]
    TokenOutOfBounds {
        id: String,
        start: usize,
        end: usize,
        len: usize,
    },
}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CodecError {
    #[error("XML error in document {}: {message}", .document.as_deref().unwrap_or("<unknown>"))]
    #[diagnostic(
        code(docwire::codec::xml),
        help(
            "The XML payload is not well-formed or could not be written. \
             Retry the call or inspect the payload; do not drop the document."
        )
    )]
    Xml {
        document: Option<String>,
        message: String,
    },

    #[error("JSON error in document {}: {message}", .document.as_deref().unwrap_or("<unknown>"))]
    #[diagnostic(
        code(docwire::codec::json),
        help("The JSON payload is not valid or does not have the document shape.")
    )]
    Json {
        document: Option<String>,
        message: String,
    },

    #[error("missing {what} in document {}", .document.as_deref().unwrap_or("<unknown>"))]
    #[diagnostic(
        code(docwire::codec::missing),
        help("Every page needs an id, and every annotation needs a key, start and end.")
    )]
    Missing {
        document: Option<String>,
        what: String,
    },

    #[error("invalid value for {field} in document {}: \"{value}\"", .document.as_deref().unwrap_or("<unknown>"))]
    #[diagnostic(
        code(docwire::codec::invalid_value),
        help("Check the attribute or field type (integer, float, boolean, digest, token list).")
    )]
    InvalidValue {
        document: Option<String>,
        field: String,
        value: String,
    },

    #[error("\"{name}\" is not a valid XML name in document {}", .document.as_deref().unwrap_or("<unknown>"))]
    #[diagnostic(
        code(docwire::codec::invalid_name),
        help(
            "Header keys travel as XML attributes and their local names must be \
             XML NCNames (no spaces or colons, not starting with a digit)."
        )
    )]
    InvalidName {
        document: Option<String>,
        name: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),
}

impl CodecError {
    /// Attach a document id to an error raised before the id was known.
    pub fn with_document(self, id: &str) -> Self {
        let fill = |document: Option<String>| document.or_else(|| Some(id.to_string()));
        match self {
            Self::Xml { document, message } => Self::Xml {
                document: fill(document),
                message,
            },
            Self::Json { document, message } => Self::Json {
                document: fill(document),
                message,
            },
            Self::Missing { document, what } => Self::Missing {
                document: fill(document),
                what,
            },
            Self::InvalidValue {
                document,
                field,
                value,
            } => Self::InvalidValue {
                document: fill(document),
                field,
                value,
            },
            Self::InvalidName { document, name } => Self::InvalidName {
                document: fill(document),
                name,
            },
            other => other,
        }
    }

    /// The offending document id, when known.
    pub fn document(&self) -> Option<&str> {
        match self {
            Self::Xml { document, .. }
            | Self::Json { document, .. }
            | Self::Missing { document, .. }
            | Self::InvalidValue { document, .. }
            | Self::InvalidName { document, .. } => document.as_deref(),
            Self::Document(DocumentError::AlreadyFinalized { id })
            | Self::Document(DocumentError::SpanOutOfBounds { id, .. })
            | Self::Document(DocumentError::TokenOutOfBounds { id, .. }) => Some(id),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read codec config: {path}")]
    #[diagnostic(
        code(docwire::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse codec config: {path}: {message}")]
    #[diagnostic(
        code(docwire::config::parse),
        help("Check the TOML syntax and the field types in the codec config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write codec config: {path}")]
    #[diagnostic(
        code(docwire::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for digest results.
pub type DigestResult<T> = std::result::Result<T, DigestError>;

/// Convenience alias for document model results.
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

/// Convenience alias for codec results.
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Convenience alias for config results.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Convenience alias for top-level results.
pub type DocwireResult<T> = std::result::Result<T, DocwireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_error_reports_document() {
        let err = CodecError::Xml {
            document: None,
            message: "unexpected EOF".into(),
        };
        assert_eq!(err.document(), None);
        assert!(err.to_string().contains("<unknown>"));

        let err = err.with_document("doc-7");
        assert_eq!(err.document(), Some("doc-7"));
        assert!(err.to_string().contains("doc-7"));
    }

    #[test]
    fn with_document_keeps_existing_id() {
        let err = CodecError::Missing {
            document: Some("first".into()),
            what: "annotation key".into(),
        }
        .with_document("second");
        assert_eq!(err.document(), Some("first"));
    }

    #[test]
    fn subsystem_errors_convert_to_top_level() {
        let err: DocwireError = DigestError::InvalidLength { actual: 3 }.into();
        assert!(matches!(err, DocwireError::Digest(_)));
        let err: DocwireError = DocumentError::AlreadyFinalized { id: "x".into() }.into();
        assert!(err.to_string().contains("already finalized"));
    }
}
