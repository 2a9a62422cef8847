//! Markup events → raw document elements.
//!
//! The reader keeps every id and relation name as written; interpretation
//! (dense ids, relation kinds, extents) happens in the builder.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::{Error, Result};

/// A `<rel>` declaration. `kind` is the raw `type` attribute; a missing
/// type marks a schema entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRelation {
    pub name: String,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment {
    pub id: String,
    pub parent: Option<String>,
    pub relname: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGroup {
    pub id: String,
    pub kind: String,
    pub parent: Option<String>,
    pub relname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSecedge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relname: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSignal {
    pub source: String,
    pub kind: String,
    pub subtype: String,
    pub tokens: String,
    pub status: Option<String>,
}

/// Every element of interest, in document order per element type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    pub relations: Vec<RawRelation>,
    pub segments: Vec<RawSegment>,
    pub groups: Vec<RawGroup>,
    pub secedges: Vec<RawSecedge>,
    pub signals: Vec<RawSignal>,
}

/// Parses rs3/rs4 markup. Any markup error is reported as
/// [`Error::Malformed`].
pub fn read(xml: &str) -> Result<RawDocument> {
    let mut reader = Reader::from_str(xml);
    let mut doc = RawDocument::default();
    // Open segment and the text collected for it so far.
    let mut open: Option<RawSegment> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(&reader, e))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"segment" => {
                open = Some(segment(&e)?);
            }
            Event::Start(e) | Event::Empty(e) => {
                if e.name().as_ref() == b"segment" {
                    // Only reachable for <segment/>.
                    doc.segments.push(segment(&e)?);
                } else {
                    element(&e, &mut doc)?;
                }
            }
            Event::Text(t) => {
                if let Some(seg) = open.as_mut() {
                    let text = t.unescape().map_err(|e| malformed(&reader, e))?;
                    seg.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(seg) = open.as_mut() {
                    seg.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) if e.name().as_ref() == b"segment" => {
                if let Some(mut seg) = open.take() {
                    seg.text = normalize_text(&seg.text);
                    doc.segments.push(seg);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if open.is_some() {
        return Err(Error::Malformed("unterminated <segment>".to_string()));
    }
    tracing::debug!(
        segments = doc.segments.len(),
        groups = doc.groups.len(),
        secedges = doc.secedges.len(),
        signals = doc.signals.len(),
        "read constituent markup"
    );
    Ok(doc)
}

fn malformed(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> Error {
    Error::Malformed(format!("at byte {}: {err}", reader.buffer_position()))
}

/// Collapses layout whitespace so the text fits one dependency column.
fn normalize_text(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ").trim().to_string()
}

fn segment(e: &BytesStart<'_>) -> Result<RawSegment> {
    let attrs = Attrs::of(e)?;
    Ok(RawSegment {
        id: attrs.required("id", "segment")?,
        parent: attrs.optional("parent"),
        relname: attrs.optional("relname"),
        text: String::new(),
    })
}

fn element(e: &BytesStart<'_>, doc: &mut RawDocument) -> Result<()> {
    match e.name().as_ref() {
        b"rel" => {
            let attrs = Attrs::of(e)?;
            doc.relations.push(RawRelation {
                name: attrs.required("name", "rel")?,
                kind: attrs.optional("type"),
            });
        }
        b"group" => {
            let attrs = Attrs::of(e)?;
            doc.groups.push(RawGroup {
                id: attrs.required("id", "group")?,
                kind: attrs.required("type", "group")?,
                parent: attrs.optional("parent"),
                relname: attrs.optional("relname"),
            });
        }
        b"secedge" => {
            let attrs = Attrs::of(e)?;
            let source = attrs.required("source", "secedge")?;
            let target = attrs.required("target", "secedge")?;
            doc.secedges.push(RawSecedge {
                id: attrs
                    .optional("id")
                    .unwrap_or_else(|| format!("{source}-{target}")),
                source,
                target,
                relname: attrs.optional("relname").unwrap_or_default(),
            });
        }
        b"signal" => {
            let attrs = Attrs::of(e)?;
            doc.signals.push(RawSignal {
                source: attrs.required("source", "signal")?,
                kind: attrs.optional("type").unwrap_or_default(),
                subtype: attrs.optional("subtype").unwrap_or_default(),
                tokens: attrs.optional("tokens").unwrap_or_default(),
                status: attrs.optional("status"),
            });
        }
        _ => {}
    }
    Ok(())
}

/// Unescaped attributes of one element.
struct Attrs(Vec<(String, String)>);

impl Attrs {
    fn of(e: &BytesStart<'_>) -> Result<Self> {
        let mut out = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::Malformed(err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| Error::Malformed(err.to_string()))?;
            out.push((key, value.into_owned()));
        }
        Ok(Self(out))
    }

    /// Present and non-empty.
    fn optional(&self, key: &str) -> Option<String> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str, element: &str) -> Result<String> {
        self.optional(key).ok_or_else(|| {
            Error::Malformed(format!("<{element}> lacks a {key:?} attribute"))
        })
    }
}
