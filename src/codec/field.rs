//! Attribute-level encode/decode pairs.
//!
//! Every typed XML attribute goes through a [`FieldCodec`]: `encode` turns a
//! value into attribute text (or `None` to omit the attribute), `decode`
//! parses it back. Token lists and the `&quot;` rewrite live here as well.

use std::borrow::Cow;

use crate::digest::Digest;
use crate::error::{CodecError, CodecResult};
use crate::span::Dependency;

/// Encode/decode pair for one attribute.
pub struct FieldCodec<T> {
    pub name: &'static str,
    encode: fn(&T) -> Option<String>,
    decode: fn(&str) -> Option<T>,
}

impl<T> FieldCodec<T> {
    /// Attribute text, or `None` when the attribute is omitted.
    pub fn write(&self, value: &T) -> Option<String> {
        (self.encode)(value)
    }

    pub fn read(&self, raw: &str, document: Option<&str>) -> CodecResult<T> {
        (self.decode)(raw).ok_or_else(|| CodecError::InvalidValue {
            document: document.map(str::to_string),
            field: self.name.to_string(),
            value: raw.to_string(),
        })
    }

    /// Decode an optional attribute.
    pub fn read_opt(&self, raw: Option<&str>, document: Option<&str>) -> CodecResult<Option<T>> {
        raw.map(|r| self.read(r, document)).transpose()
    }
}

/// Boolean flag, written only when true; absence reads as false.
pub fn flag(name: &'static str) -> FieldCodec<bool> {
    FieldCodec {
        name,
        encode: |v| v.then(|| "true".to_string()),
        decode: |raw| match raw.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
    }
}

pub fn digest(name: &'static str) -> FieldCodec<Digest> {
    FieldCodec {
        name,
        encode: |d| Some(d.to_string()),
        decode: |raw| Digest::from_hex(raw.trim()).ok(),
    }
}

pub fn index(name: &'static str) -> FieldCodec<usize> {
    FieldCodec {
        name,
        encode: |v| Some(v.to_string()),
        decode: |raw| raw.trim().parse().ok(),
    }
}

pub fn score(name: &'static str) -> FieldCodec<f64> {
    FieldCodec {
        name,
        encode: |v| Some(v.to_string()),
        decode: |raw| raw.trim().parse().ok(),
    }
}

/// Language tags: ASCII alphanumeric subtags joined by `-` or `_`, as in
/// `en`, `de-AT` or `en_US`.
pub fn language(name: &'static str) -> FieldCodec<String> {
    FieldCodec {
        name,
        encode: |v| Some(v.clone()),
        decode: |raw| {
            let tag = raw.trim();
            let valid = !tag.is_empty()
                && tag
                    .split(['-', '_'])
                    .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()));
            valid.then(|| tag.to_string())
        },
    }
}

/// Sentence-relative token offsets, `start,end` pairs separated by spaces.
pub fn offsets(name: &'static str) -> FieldCodec<Vec<(usize, usize)>> {
    FieldCodec {
        name,
        encode: |pairs| {
            (!pairs.is_empty()).then(|| {
                pairs
                    .iter()
                    .map(|(s, e)| format!("{s},{e}"))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
        },
        decode: |raw| {
            raw.split_whitespace()
                .map(|pair| {
                    let (s, e) = pair.split_once(',')?;
                    Some((s.parse().ok()?, e.parse().ok()?))
                })
                .collect()
        },
    }
}

/// Dependency arcs, `parent:label` separated by spaces.
pub fn dependencies(name: &'static str) -> FieldCodec<Vec<Dependency>> {
    FieldCodec {
        name,
        encode: |deps| {
            (!deps.is_empty()).then(|| {
                deps.iter()
                    .map(|d| format!("{}:{}", d.parent, d.label))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
        },
        decode: |raw| {
            raw.split_whitespace()
                .map(|arc| {
                    let (parent, label) = arc.split_once(':')?;
                    Some(Dependency::new(parent.parse().ok()?, label))
                })
                .collect()
        },
    }
}

/// Part-of-speech tags separated by spaces.
pub fn tags(name: &'static str) -> FieldCodec<Vec<String>> {
    FieldCodec {
        name,
        encode: |tags| (!tags.is_empty()).then(|| tags.join(" ")),
        decode: |raw| Some(raw.split_whitespace().map(str::to_string).collect()),
    }
}

const QUOTE_ENTITY: &str = "&quot;";

/// Rewrite literal `"` as `&quot;` for consumers that are not XML-aware.
pub fn escape_quotes(text: &str) -> Cow<'_, str> {
    if text.contains('"') {
        Cow::Owned(text.replace('"', QUOTE_ENTITY))
    } else {
        Cow::Borrowed(text)
    }
}

/// Reverse of [`escape_quotes`].
pub fn unescape_quotes(text: &str) -> Cow<'_, str> {
    if text.contains(QUOTE_ENTITY) {
        Cow::Owned(text.replace(QUOTE_ENTITY, "\""))
    } else {
        Cow::Borrowed(text)
    }
}

/// Whether `name` can be used as an XML attribute local name (an NCName).
pub fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn false_flag_is_omitted() {
        let is_title = flag("is_title");
        assert_eq!(is_title.write(&false), None);
        assert_eq!(is_title.write(&true).as_deref(), Some("true"));
        assert!(!is_title.read_opt(None, None).unwrap().unwrap_or(false));
        assert!(is_title.read("1", None).unwrap());
        assert!(matches!(
            is_title.read("yes", Some("d")),
            Err(CodecError::InvalidValue { .. })
        ));
    }

    #[test]
    fn offsets_roundtrip_and_reject_garbage() {
        let codec = offsets("token");
        let pairs = vec![(0, 5), (6, 11)];
        let raw = codec.write(&pairs).unwrap();
        assert_eq!(raw, "0,5 6,11");
        assert_eq!(codec.read(&raw, None).unwrap(), pairs);
        assert_eq!(codec.write(&Vec::new()), None);
        assert!(codec.read("0-5", None).is_err());
    }

    #[test]
    fn dependencies_keep_root_marker() {
        let codec = dependencies("dependency");
        let deps = vec![Dependency::new(1, "nsubj"), Dependency::new(-1, "ROOT")];
        let raw = codec.write(&deps).unwrap();
        assert_eq!(raw, "1:nsubj -1:ROOT");
        assert_eq!(codec.read(&raw, None).unwrap(), deps);
        assert!(codec.read("x:nsubj", None).is_err());
    }

    #[test]
    fn language_tags_are_validated() {
        let lang = language("lang");
        assert_eq!(lang.read("de-AT", None).unwrap(), "de-AT");
        assert!(lang.read("", None).is_err());
        assert_eq!(lang.read("en_US", None).unwrap(), "en_US");
        assert!(lang.read("en-", None).is_err());
        assert!(lang.read("not a tag", None).is_err());
    }

    #[test]
    fn quote_rewrite_roundtrips() {
        let text = r#"He said "hi"."#;
        let escaped = escape_quotes(text);
        assert_eq!(escaped, "He said &quot;hi&quot;.");
        assert_eq!(unescape_quotes(&escaped), text);
        assert!(matches!(escape_quotes("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn ncname_rules() {
        assert!(is_ncname("title"));
        assert!(is_ncname("_x-1.2"));
        assert!(!is_ncname("1abc"));
        assert!(!is_ncname("dc:title"));
        assert!(!is_ncname("has space"));
        assert!(!is_ncname(""));
    }
}
