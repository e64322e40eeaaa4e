//! The canonical XML wire form of a [`Document`].
//!
//! ```text
//! <wl:page xmlns:wl="..." xmlns:dc="..." wl:id="42" dc:format="text/html"
//!          xml:lang="en" wl:nilsimsa="..." dc:creator="...">
//!   <wl:title><![CDATA[raw title]]></wl:title>
//!   <wl:body><![CDATA[raw body]]></wl:body>
//!   <wl:sentence wl:id="<md5>" wl:token="0,6 7,12" wl:pos="NNP VBZ"
//!                wl:dependency="1:nsubj -1:ROOT" wl:is_title="true">
//!     <![CDATA[Vienna grows]]>
//!   </wl:sentence>
//!   <wl:annotation wl:key="..." wl:surfaceForm="Vienna" wl:start="0" wl:end="6" .../>
//!   <wl:title_annotation .../>
//!   <wl:body_annotation .../>
//! </wl:page>
//! ```
//!
//! Header entries are root attributes in their own namespaces. Boolean
//! attributes are omitted when false. Literal `"` in sentence text and tags is
//! written as `&quot;` and turned back on read.

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::{Namespace, QName, ResolveResult};
use quick_xml::reader::NsReader;

use crate::codec::config::CodecConfig;
use crate::codec::field::{self, escape_quotes, is_ncname, unescape_quotes};
use crate::digest::Digest;
use crate::document::{Document, Sentence};
use crate::entity::{Annotation, EntityDescriptor};
use crate::error::{CodecError, CodecResult};
use crate::namespace::{DOCUMENT_NS, DOCUMENT_PREFIX, DUBLIN_CORE_NS, NamespaceRegistry, XML_NS};
use crate::qkey::QualifiedKey;
use crate::span::{Dependency, TokenSpan};

const PAGE: &str = "page";
const TITLE: &str = "title";
const BODY: &str = "body";
const SENTENCE: &str = "sentence";
const ANNOTATION: &str = "annotation";
const TITLE_ANNOTATION: &str = "title_annotation";
const BODY_ANNOTATION: &str = "body_annotation";
const METADATA: &str = "metadata";

fn wl(local: &str) -> String {
    format!("{DOCUMENT_PREFIX}:{local}")
}

/// Root attributes that carry document fields rather than header entries.
fn structural_keys() -> [QualifiedKey; 5] {
    [
        QualifiedKey::document("id"),
        QualifiedKey::new(DUBLIN_CORE_NS, "format"),
        QualifiedKey::new(XML_NS, "lang"),
        QualifiedKey::document("nilsimsa"),
        QualifiedKey::document("finalized"),
    ]
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Serialize with the default [`CodecConfig`].
pub fn to_xml(document: &Document) -> CodecResult<String> {
    to_xml_with(document, &CodecConfig::default())
}

/// Fails with [`CodecError::InvalidValue`] when the content or partitions
/// are not exactly what the sentences rebuild on read.
pub fn to_xml_with(document: &Document, config: &CodecConfig) -> CodecResult<String> {
    super::ensure_sentence_layout(document)?;
    let mut out = XmlOut::new(&document.id, config);

    if config.xml_declaration {
        out.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    }

    let page = out.page_start(document)?;
    out.emit(Event::Start(page))?;

    if let Some(title) = &document.title {
        out.cdata_element(BytesStart::new(wl(TITLE)), title)?;
    }
    if let Some(body) = &document.body {
        out.cdata_element(BytesStart::new(wl(BODY)), body)?;
    }

    let sentences = document.sentences();
    for sentence in &sentences {
        out.sentence(sentence)?;
    }
    for annotation in &document.annotations {
        out.annotation(ANNOTATION, annotation)?;
    }
    for annotation in document.title_annotations() {
        out.annotation(TITLE_ANNOTATION, annotation)?;
    }
    for annotation in document.body_annotations() {
        out.annotation(BODY_ANNOTATION, annotation)?;
    }

    out.emit(Event::End(BytesEnd::new(wl(PAGE))))?;
    let xml = out.finish()?;
    tracing::debug!(
        document = %document.id,
        sentences = sentences.len(),
        annotations = document.annotations.len(),
        bytes = xml.len(),
        "encoded XML page"
    );
    Ok(xml)
}

/// Namespace prefixes declared on the page element.
struct Prefixes {
    bindings: Vec<(String, String)>,
}

impl Prefixes {
    fn collect(document: &Document) -> Self {
        let registry = NamespaceRegistry::global();
        let mut bindings = vec![
            (DOCUMENT_PREFIX.to_string(), DOCUMENT_NS.to_string()),
            ("dc".to_string(), DUBLIN_CORE_NS.to_string()),
        ];
        let mut generated = 0;
        for namespace in document.header.keys().filter_map(QualifiedKey::namespace) {
            if namespace == XML_NS || bindings.iter().any(|(_, uri)| uri == namespace) {
                continue;
            }
            let prefix = match registry.prefix_for_uri(namespace) {
                Some(prefix) => prefix.to_string(),
                None => {
                    generated += 1;
                    format!("ns{}", generated - 1)
                }
            };
            bindings.push((prefix, namespace.to_string()));
        }
        Self { bindings }
    }

    fn prefix_of(&self, namespace: &str) -> Option<&str> {
        if namespace == XML_NS {
            return Some("xml");
        }
        self.bindings
            .iter()
            .find(|(_, uri)| uri == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }
}

struct XmlOut<'d> {
    writer: Writer<Vec<u8>>,
    document: &'d str,
    escape_quotes: bool,
}

impl<'d> XmlOut<'d> {
    fn new(document: &'d str, config: &CodecConfig) -> Self {
        let writer = if config.indent > 0 {
            Writer::new_with_indent(Vec::new(), b' ', config.indent)
        } else {
            Writer::new(Vec::new())
        };
        Self {
            writer,
            document,
            escape_quotes: config.escape_quotes,
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> CodecError {
        CodecError::Xml {
            document: Some(self.document.to_string()),
            message: message.to_string(),
        }
    }

    fn invalid(&self, field: &str, value: impl Into<String>) -> CodecError {
        CodecError::InvalidValue {
            document: Some(self.document.to_string()),
            field: field.to_string(),
            value: value.into(),
        }
    }

    fn emit(&mut self, event: Event<'_>) -> CodecResult<()> {
        self.writer.write_event(event).map_err(|e| CodecError::Xml {
            document: Some(self.document.to_string()),
            message: e.to_string(),
        })
    }

    fn quoted<'t>(&self, text: &'t str) -> std::borrow::Cow<'t, str> {
        if self.escape_quotes {
            escape_quotes(text)
        } else {
            std::borrow::Cow::Borrowed(text)
        }
    }

    fn finish(self) -> CodecResult<String> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| CodecError::Xml {
            document: Some(self.document.to_string()),
            message: e.to_string(),
        })
    }

    fn page_start(&self, document: &Document) -> CodecResult<BytesStart<'static>> {
        let prefixes = Prefixes::collect(document);
        let mut page = BytesStart::new(wl(PAGE));
        for (prefix, uri) in &prefixes.bindings {
            page.push_attribute((format!("xmlns:{prefix}").as_str(), uri.as_str()));
        }

        page.push_attribute((wl("id").as_str(), document.id.as_str()));
        if let Some(format) = &document.format {
            page.push_attribute(("dc:format", format.as_str()));
        }
        if let Some(lang) = document.lang.as_ref().and_then(|l| field::language("lang").write(l)) {
            page.push_attribute(("xml:lang", lang.as_str()));
        }
        if let Some(nilsimsa) = &document.nilsimsa {
            page.push_attribute((wl("nilsimsa").as_str(), nilsimsa.as_str()));
        }
        if let Some(flag) = field::flag("finalized").write(&document.is_finalized()) {
            page.push_attribute((wl("finalized").as_str(), flag.as_str()));
        }

        let reserved = structural_keys();
        for (key, value) in &document.header {
            if reserved.contains(key) {
                tracing::warn!(
                    document = %document.id,
                    key = %key,
                    "header key collides with a page attribute, not written"
                );
                continue;
            }
            let local = key.local_name();
            let bad_name = || CodecError::InvalidName {
                document: Some(document.id.clone()),
                name: key.encode(),
            };
            if !is_ncname(local) {
                return Err(bad_name());
            }
            let name = match key.namespace() {
                Some(namespace) => {
                    let prefix = prefixes.prefix_of(namespace).ok_or_else(bad_name)?;
                    format!("{prefix}:{local}")
                }
                None if local == "xmlns" => return Err(bad_name()),
                None => local.to_string(),
            };
            page.push_attribute((name.as_str(), value.as_str()));
        }
        Ok(page)
    }

    /// `<name ...>` followed by `text` as CDATA and the closing tag.
    fn cdata_element(&mut self, start: BytesStart<'_>, text: &str) -> CodecResult<()> {
        let end = BytesEnd::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        self.emit(Event::Start(start))?;
        for chunk in cdata_chunks(text) {
            self.emit(Event::CData(BytesCData::new(chunk)))?;
        }
        self.emit(Event::End(end))
    }

    fn sentence(&mut self, sentence: &Sentence) -> CodecResult<()> {
        let mut start = BytesStart::new(wl(SENTENCE));
        start.push_attribute((wl("id").as_str(), sentence.id.to_string().as_str()));

        let offsets: Vec<(usize, usize)> = sentence.tokens.iter().map(|t| (t.start, t.end)).collect();
        if let Some(raw) = field::offsets("token").write(&offsets) {
            start.push_attribute((wl("token").as_str(), raw.as_str()));
        }

        if let Some(tags) = self.pos_tags(&sentence.tokens)? {
            if let Some(raw) = field::tags("pos").write(&tags) {
                start.push_attribute((wl("pos").as_str(), raw.as_str()));
            }
        }
        if let Some(deps) = self.dependencies(&sentence.tokens)? {
            if let Some(raw) = field::dependencies("dependency").write(&deps) {
                start.push_attribute((wl("dependency").as_str(), raw.as_str()));
            }
        }

        if let Some(raw) = field::flag("is_title").write(&sentence.is_title) {
            start.push_attribute((wl("is_title").as_str(), raw.as_str()));
        }
        if let Some(raw) = sentence.sem_orient.and_then(|v| field::score("sem_orient").write(&v)) {
            start.push_attribute((wl("sem_orient").as_str(), raw.as_str()));
        }
        if let Some(raw) = sentence.significance.and_then(|v| field::score("significance").write(&v)) {
            start.push_attribute((wl("significance").as_str(), raw.as_str()));
        }

        let text = self.quoted(&sentence.text).into_owned();
        self.cdata_element(start, &text)
    }

    /// Tags for every token, or `None` when no token is tagged.
    fn pos_tags(&self, tokens: &[TokenSpan]) -> CodecResult<Option<Vec<String>>> {
        if tokens.iter().all(|t| t.pos.is_none()) {
            return Ok(None);
        }
        tokens
            .iter()
            .map(|t| match t.pos.as_deref() {
                Some(tag) if !tag.is_empty() && !tag.contains(char::is_whitespace) => {
                    Ok(self.quoted(tag).into_owned())
                }
                Some(tag) => Err(self.invalid("pos", tag)),
                None => Err(self.invalid("pos", "<missing tag on some tokens>")),
            })
            .collect::<CodecResult<Vec<_>>>()
            .map(Some)
    }

    /// Arcs for every token, or `None` when no token has one.
    fn dependencies(&self, tokens: &[TokenSpan]) -> CodecResult<Option<Vec<Dependency>>> {
        if tokens.iter().all(|t| t.dependency.is_none()) {
            return Ok(None);
        }
        tokens
            .iter()
            .map(|t| match &t.dependency {
                Some(dep) if !dep.label.contains(char::is_whitespace) => Ok(dep.clone()),
                Some(dep) => Err(self.invalid("dependency", dep.label.clone())),
                None => Err(self.invalid("dependency", "<missing arc on some tokens>")),
            })
            .collect::<CodecResult<Vec<_>>>()
            .map(Some)
    }

    fn annotation(&mut self, element: &str, annotation: &Annotation) -> CodecResult<()> {
        let descriptor = &annotation.descriptor;
        let mut start = BytesStart::new(wl(element));
        start.push_attribute((wl("key").as_str(), descriptor.key.as_str()));
        if let Some(name) = &descriptor.preferred_name {
            start.push_attribute((wl("preferredName").as_str(), name.as_str()));
        }
        if let Some(entity_type) = &descriptor.entity_type {
            start.push_attribute((wl("annotationType").as_str(), entity_type.as_str()));
        }
        start.push_attribute((wl("surfaceForm").as_str(), annotation.surface_form.as_str()));
        start.push_attribute((wl("start").as_str(), annotation.start.to_string().as_str()));
        start.push_attribute((wl("end").as_str(), annotation.end.to_string().as_str()));
        if let Some(sentence) = annotation.sentence {
            start.push_attribute((wl("sentence").as_str(), sentence.to_string().as_str()));
        }
        if let Some(pos_tag) = &annotation.pos_tag {
            start.push_attribute((wl("posTag").as_str(), &*self.quoted(pos_tag)));
        }
        if let Some(raw) = annotation.confidence.and_then(|v| field::score("confidence").write(&v)) {
            start.push_attribute((wl("confidence").as_str(), raw.as_str()));
        }
        if let Some(md5sum) = annotation.md5sum {
            start.push_attribute((wl("md5sum").as_str(), md5sum.to_string().as_str()));
        }

        if descriptor.metadata.values().all(Vec::is_empty) {
            return self.emit(Event::Empty(start));
        }
        self.emit(Event::Start(start))?;
        for (name, values) in &descriptor.metadata {
            for value in values {
                let mut field_start = BytesStart::new(wl(METADATA));
                field_start.push_attribute((wl("name").as_str(), name.as_str()));
                self.cdata_element(field_start, value)?;
            }
        }
        self.emit(Event::End(BytesEnd::new(wl(element))))
    }
}

/// Split text so no chunk contains the CDATA terminator `]]>`.
fn cdata_chunks(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while let Some(i) = rest.find("]]>") {
        chunks.push(&rest[..i + 2]);
        rest = &rest[i + 2..];
    }
    chunks.push(rest);
    chunks
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Parse a page. Unknown root attributes land in the header; unknown child
/// elements are skipped.
pub fn from_xml(xml: &str) -> CodecResult<Document> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);
    PageReader { reader, id: None }.read()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Canonical,
    Title,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Page,
    Title,
    Body,
    Sentence,
    Annotation(Region),
    Metadata,
}

/// Attributes of one element, consumed as they are interpreted.
struct Attrs(Vec<(QualifiedKey, String)>);

impl Attrs {
    /// Remove an attribute by exact key.
    fn take_key(&mut self, key: &QualifiedKey) -> Option<String> {
        let i = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(i).1)
    }

    /// Remove an attribute in the document namespace, or unqualified.
    fn take(&mut self, local: &str) -> Option<String> {
        let i = self.0.iter().position(|(k, _)| {
            k.local_name() == local && k.namespace().is_none_or(|ns| ns == DOCUMENT_NS)
        })?;
        Some(self.0.remove(i).1)
    }
}

struct PageReader<'i> {
    reader: NsReader<&'i [u8]>,
    id: Option<String>,
}

impl<'i> PageReader<'i> {
    fn error(&self, message: impl std::fmt::Display) -> CodecError {
        CodecError::Xml {
            document: self.id.clone(),
            message: message.to_string(),
        }
    }

    fn missing(&self, what: &str) -> CodecError {
        CodecError::Missing {
            document: self.id.clone(),
            what: what.to_string(),
        }
    }

    fn next(&mut self) -> CodecResult<Event<'i>> {
        self.reader.read_event().map_err(|e| self.error(e))
    }

    fn skip(&mut self, name: QName<'_>) -> CodecResult<()> {
        self.reader
            .read_to_end(name)
            .map(|_| ())
            .map_err(|e| self.error(e))
    }

    fn element(&self, name: QName<'_>) -> Option<Element> {
        let (namespace, local) = self.reader.resolve_element(name);
        let in_document_ns = match namespace {
            ResolveResult::Bound(Namespace(uri)) => uri == DOCUMENT_NS.as_bytes(),
            ResolveResult::Unbound => true,
            ResolveResult::Unknown(_) => false,
        };
        if !in_document_ns {
            return None;
        }
        let local = std::str::from_utf8(local.as_ref()).ok()?;
        Some(match local {
            PAGE => Element::Page,
            TITLE => Element::Title,
            BODY => Element::Body,
            SENTENCE => Element::Sentence,
            ANNOTATION => Element::Annotation(Region::Canonical),
            TITLE_ANNOTATION => Element::Annotation(Region::Title),
            BODY_ANNOTATION => Element::Annotation(Region::Body),
            METADATA => Element::Metadata,
            _ => return None,
        })
    }

    fn attributes(&self, start: &BytesStart<'_>) -> CodecResult<Attrs> {
        let mut out = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.error(e))?;
            let raw = attr.key.as_ref();
            if raw == b"xmlns" || raw.starts_with(b"xmlns:") {
                continue;
            }
            let value = attr.unescape_value().map_err(|e| self.error(e))?.into_owned();
            out.push((self.attribute_key(attr.key)?, value));
        }
        Ok(Attrs(out))
    }

    fn attribute_key(&self, name: QName<'_>) -> CodecResult<QualifiedKey> {
        if name.as_ref() == b"xml:lang" {
            return Ok(QualifiedKey::new(XML_NS, "lang"));
        }
        let (namespace, local) = self.reader.resolve_attribute(name);
        let local = std::str::from_utf8(local.as_ref()).map_err(|e| self.error(e))?;
        match namespace {
            ResolveResult::Bound(Namespace(uri)) => {
                let uri = std::str::from_utf8(uri).map_err(|e| self.error(e))?;
                Ok(QualifiedKey::new(uri, local))
            }
            ResolveResult::Unbound => Ok(QualifiedKey::unqualified(local)),
            ResolveResult::Unknown(prefix) if prefix == b"xml" => Ok(QualifiedKey::new(XML_NS, local)),
            ResolveResult::Unknown(prefix) => Err(self.error(format!(
                "undeclared namespace prefix \"{}\"",
                String::from_utf8_lossy(&prefix)
            ))),
        }
    }

    /// Character data up to the end of the current element. Nested markup is
    /// skipped.
    fn text(&mut self) -> CodecResult<String> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Event::Text(t) => text.push_str(&t.unescape().map_err(|e| self.error(e))?),
                Event::CData(c) => {
                    text.push_str(std::str::from_utf8(&c).map_err(|e| self.error(e))?)
                }
                Event::Start(e) => self.skip(e.name())?,
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(self.error("unexpected end of input inside element")),
                _ => {}
            }
        }
    }

    fn read(mut self) -> CodecResult<Document> {
        let (root, empty) = loop {
            match self.next()? {
                Event::Start(e) => break (e, false),
                Event::Empty(e) => break (e, true),
                Event::Eof => return Err(self.error("no page element found")),
                _ => {}
            }
        };
        if self.element(root.name()) != Some(Element::Page) {
            return Err(self.error(format!(
                "root element is <{}>, expected <{}>",
                String::from_utf8_lossy(root.name().as_ref()),
                wl(PAGE)
            )));
        }

        let mut attrs = self.attributes(&root)?;
        let id = attrs
            .take_key(&QualifiedKey::document("id"))
            .ok_or_else(|| self.missing("page id"))?;
        self.id = Some(id.clone());
        let doc_id = Some(id.as_str());

        let mut document = Document::new(id.clone());
        document.format = attrs.take_key(&QualifiedKey::new(DUBLIN_CORE_NS, "format"));
        document.lang = field::language("lang")
            .read_opt(attrs.take_key(&QualifiedKey::new(XML_NS, "lang")).as_deref(), doc_id)?;
        document.nilsimsa = attrs.take_key(&QualifiedKey::document("nilsimsa"));
        let finalized = field::flag("finalized")
            .read_opt(attrs.take_key(&QualifiedKey::document("finalized")).as_deref(), doc_id)?
            .unwrap_or(false);
        document.header = attrs.0.into_iter().collect();

        let mut sentences = Vec::new();
        let mut annotations = Vec::new();
        let mut title_annotations = Vec::new();
        let mut body_annotations = Vec::new();

        if !empty {
            loop {
                let (start, empty) = match self.next()? {
                    Event::Start(e) => (e, false),
                    Event::Empty(e) => (e, true),
                    Event::End(_) => break,
                    Event::Eof => return Err(self.error("unexpected end of input inside page")),
                    _ => continue,
                };
                match self.element(start.name()) {
                    Some(Element::Title) => document.title = Some(self.maybe_text(empty)?),
                    Some(Element::Body) => document.body = Some(self.maybe_text(empty)?),
                    Some(Element::Sentence) => sentences.push(self.sentence(&start, empty)?),
                    Some(Element::Annotation(region)) => {
                        let annotation = self.annotation(&start, empty)?;
                        match region {
                            Region::Canonical => annotations.push(annotation),
                            Region::Title => title_annotations.push(annotation),
                            Region::Body => body_annotations.push(annotation),
                        }
                    }
                    _ if empty => {}
                    _ => self.skip(start.name())?,
                }
            }
        }

        let sentence_count = sentences.len();
        for sentence in sentences {
            document
                .push_sentence(sentence)
                .map_err(|e| CodecError::from(e).with_document(&id))?;
        }
        document.annotations = annotations;
        document.restore_region_annotations(title_annotations, body_annotations);
        document.restore_finalized(finalized);

        tracing::debug!(
            document = %id,
            sentences = sentence_count,
            annotations = document.annotations.len(),
            "decoded XML page"
        );
        Ok(document)
    }

    fn maybe_text(&mut self, empty: bool) -> CodecResult<String> {
        if empty { Ok(String::new()) } else { self.text() }
    }

    fn sentence(&mut self, start: &BytesStart<'_>, empty: bool) -> CodecResult<Sentence> {
        let mut attrs = self.attributes(start)?;
        let doc_id = self.id.clone();
        let doc = doc_id.as_deref();

        let text = self.maybe_text(empty)?;
        let text = unescape_quotes(&text).into_owned();

        let id = field::digest("id")
            .read_opt(attrs.take("id").as_deref(), doc)?
            .unwrap_or_else(|| Digest::from_text(&text));
        let offsets = field::offsets("token")
            .read_opt(attrs.take("token").as_deref(), doc)?
            .unwrap_or_default();

        let raw_pos = attrs.take("pos");
        let pos = field::tags("pos").read_opt(raw_pos.as_deref(), doc)?;
        if let Some(tags) = &pos {
            if tags.len() != offsets.len() {
                return Err(self.count_mismatch("pos", raw_pos.unwrap_or_default()));
            }
        }
        let raw_deps = attrs.take("dependency");
        let deps = field::dependencies("dependency").read_opt(raw_deps.as_deref(), doc)?;
        if let Some(arcs) = &deps {
            if arcs.len() != offsets.len() {
                return Err(self.count_mismatch("dependency", raw_deps.unwrap_or_default()));
            }
        }

        let tokens = offsets
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| TokenSpan {
                start,
                end,
                pos: pos.as_ref().map(|tags| unescape_quotes(&tags[i]).into_owned()),
                dependency: deps.as_ref().map(|arcs| arcs[i].clone()),
            })
            .collect();

        let is_title = field::flag("is_title")
            .read_opt(attrs.take("is_title").as_deref(), doc)?
            .unwrap_or(false);
        let sem_orient = field::score("sem_orient").read_opt(attrs.take("sem_orient").as_deref(), doc)?;
        let significance =
            field::score("significance").read_opt(attrs.take("significance").as_deref(), doc)?;

        for (key, _) in &attrs.0 {
            tracing::warn!(
                document = doc.unwrap_or_default(),
                key = %key,
                "unknown sentence attribute ignored"
            );
        }

        Ok(Sentence {
            id,
            text,
            tokens,
            is_title,
            sem_orient,
            significance,
        })
    }

    fn count_mismatch(&self, field: &str, raw: String) -> CodecError {
        CodecError::InvalidValue {
            document: self.id.clone(),
            field: format!("{field} (one entry per token expected)"),
            value: raw,
        }
    }

    fn annotation(&mut self, start: &BytesStart<'_>, empty: bool) -> CodecResult<Annotation> {
        let mut attrs = self.attributes(start)?;
        let doc_id = self.id.clone();
        let doc = doc_id.as_deref();

        let key = attrs.take("key").ok_or_else(|| self.missing("annotation key"))?;
        let begin = field::index("start")
            .read_opt(attrs.take("start").as_deref(), doc)?
            .ok_or_else(|| self.missing("annotation start"))?;
        let end = field::index("end")
            .read_opt(attrs.take("end").as_deref(), doc)?
            .ok_or_else(|| self.missing("annotation end"))?;

        let mut descriptor = EntityDescriptor::new(key);
        descriptor.preferred_name = attrs.take("preferredName");
        descriptor.entity_type = attrs.take("annotationType");

        let mut annotation = Annotation::new(
            EntityDescriptor::default(),
            attrs.take("surfaceForm").unwrap_or_default(),
            begin,
            end,
        );
        annotation.sentence = field::index("sentence").read_opt(attrs.take("sentence").as_deref(), doc)?;
        annotation.pos_tag = attrs
            .take("posTag")
            .map(|tag| unescape_quotes(&tag).into_owned());
        annotation.confidence =
            field::score("confidence").read_opt(attrs.take("confidence").as_deref(), doc)?;
        annotation.md5sum = field::digest("md5sum").read_opt(attrs.take("md5sum").as_deref(), doc)?;

        // Foreign attributes are kept as enrichment fields.
        for (key, value) in attrs.0 {
            descriptor
                .metadata
                .entry(key.local_name().to_string())
                .or_default()
                .push(value);
        }

        if !empty {
            loop {
                let (child, child_empty) = match self.next()? {
                    Event::Start(e) => (e, false),
                    Event::Empty(e) => (e, true),
                    Event::End(_) => break,
                    Event::Eof => {
                        return Err(self.error("unexpected end of input inside annotation"));
                    }
                    _ => continue,
                };
                if self.element(child.name()) != Some(Element::Metadata) {
                    if !child_empty {
                        self.skip(child.name())?;
                    }
                    continue;
                }
                let name = self
                    .attributes(&child)?
                    .take("name")
                    .ok_or_else(|| self.missing("metadata name"))?;
                let value = self.maybe_text(child_empty)?;
                descriptor.metadata.entry(name).or_default().push(value);
            }
        }

        annotation.descriptor = descriptor;
        Ok(annotation)
    }
}
