//! Sentence records: the sentence-level view of a document.
//!
//! A document stores sentences as spans over its content. [`Sentence`] is the
//! owned form used to add a sentence and to read one back, with token offsets
//! relative to the sentence start.

use crate::digest::Digest;
use crate::span::TokenSpan;

/// One sentence with its tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    /// Digest of `text`, unless the producer supplied another id.
    pub id: Digest,
    pub text: String,
    /// Tokens with offsets relative to the start of `text`.
    pub tokens: Vec<TokenSpan>,
    pub is_title: bool,
    pub sem_orient: Option<f64>,
    pub significance: Option<f64>,
}

impl Sentence {
    /// A body sentence whose id is the digest of its text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: Digest::from_text(&text),
            text,
            tokens: Vec::new(),
            is_title: false,
            sem_orient: None,
            significance: None,
        }
    }

    pub fn title(mut self) -> Self {
        self.is_title = true;
        self
    }

    pub fn with_id(mut self, id: Digest) -> Self {
        self.id = id;
        self
    }

    pub fn with_token(mut self, token: TokenSpan) -> Self {
        self.tokens.push(token);
        self
    }

    pub fn with_tokens(mut self, tokens: impl IntoIterator<Item = TokenSpan>) -> Self {
        self.tokens.extend(tokens);
        self
    }

    pub fn with_sem_orient(mut self, value: f64) -> Self {
        self.sem_orient = Some(value);
        self
    }

    pub fn with_significance(mut self, value: f64) -> Self {
        self.significance = Some(value);
        self
    }

    /// Length of the text in chars.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Split on whitespace into tokens without tags. Handy for producers that
    /// have no tokenizer of their own.
    pub fn whitespace_tokens(&self) -> Vec<TokenSpan> {
        let mut tokens = Vec::new();
        let mut start = None;
        let mut idx = 0;
        for (i, c) in self.text.chars().enumerate() {
            match (c.is_whitespace(), start) {
                (true, Some(s)) => {
                    tokens.push(TokenSpan::new(s, i));
                    start = None;
                }
                (false, None) => start = Some(i),
                _ => {}
            }
            idx = i + 1;
        }
        if let Some(s) = start {
            tokens.push(TokenSpan::new(s, idx));
        }
        tokens
    }
}
