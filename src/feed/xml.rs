//! Minimal namespace-resolved XML element tree.
//!
//! Feeds are small, so the whole document is materialized and the variant
//! parsers walk it by (namespace, local name). Only element structure and
//! text survive; comments, processing instructions and the DOCTYPE are
//! dropped.

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::convert::ConversionError;

/// Nesting limit; deeper documents are rejected as malformed.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Resolved namespace URI, `None` when the element is not in a namespace.
    pub namespace: Option<String>,
    /// Prefix as written in the document (`dc` for `<dc:date>`).
    pub prefix: Option<String>,
    pub local_name: String,
    /// Attributes keyed by their qualified name as written (`rdf:about`).
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated text and CDATA directly inside this element.
    pub text: String,
}

impl Element {
    /// True if this element has `local_name` and sits in `namespace`
    /// (`None` meaning no namespace at all).
    pub fn is(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == namespace
    }

    /// First direct child matching `namespace` and `local_name`.
    pub fn child(&self, namespace: Option<&str>, local_name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(namespace, local_name))
    }

    /// Text of the first matching direct child.
    pub fn child_text(&self, namespace: Option<&str>, local_name: &str) -> Option<&str> {
        self.child(namespace, local_name).map(|c| c.text.as_str())
    }

    pub fn attribute(&self, qualified_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == qualified_name)
            .map(|(_, value)| value.as_str())
    }

    /// All elements below this one in document order (pre-order), excluding itself.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    /// Parses `bytes` into an element tree.
    ///
    /// The character encoding comes from a byte order mark or the XML
    /// declaration (`encoding="ISO-8859-1"`, `Shift_JIS`, ...), defaulting to
    /// UTF-8. Text, CDATA, names and attribute values are decoded to UTF-8.
    ///
    /// # Errors
    ///
    /// [`ConversionError::Xml`] for any well-formedness problem: syntax
    /// errors, mismatched or unclosed tags, a missing or repeated root
    /// element, bytes invalid in the declared encoding, or nesting deeper
    /// than the supported limit.
    ///
    /// # Security
    ///
    /// quick-xml (0.37) does not process `<!ENTITY>` declarations, so only the
    /// five predefined entities and character references are expanded.
    pub fn parse(bytes: &[u8]) -> Result<Self, ConversionError> {
        let mut reader = NsReader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let (resolved, event) = reader
                .read_resolved_event_into(&mut buf)
                .map_err(|e| ConversionError::Xml(e.to_string()))?;
            let namespace = namespace_uri(resolved);

            match event {
                Event::Start(e) => {
                    if stack.len() >= MAX_DEPTH {
                        return Err(ConversionError::Xml(format!(
                            "nesting depth exceeds maximum of {} levels",
                            MAX_DEPTH
                        )));
                    }
                    stack.push(start_element(namespace, &e, reader.decoder())?);
                }
                Event::Empty(e) => {
                    let element = start_element(namespace, &e, reader.decoder())?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ConversionError::Xml("unexpected closing tag".into()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|e| ConversionError::Xml(e.to_string()))?;
                    append_text(&mut stack, &text)?;
                }
                Event::CData(c) => {
                    let text = decode(reader.decoder(), &c)?;
                    append_text(&mut stack, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(ConversionError::Xml(format!(
                "unexpected end of document: <{}> is not closed",
                stack.last().map(|e| e.local_name.as_str()).unwrap_or_default()
            )));
        }

        root.map(|root| Document { root })
            .ok_or_else(|| ConversionError::Xml("document has no root element".into()))
    }
}

fn namespace_uri(resolved: ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        // Undeclared prefixes are kept as unqualified; the prefix is still recorded
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}

fn decode(decoder: Decoder, bytes: &[u8]) -> Result<String, ConversionError> {
    decoder
        .decode(bytes)
        .map(|text| text.into_owned())
        .map_err(|e| ConversionError::Xml(e.to_string()))
}

fn start_element(
    namespace: Option<String>,
    e: &BytesStart<'_>,
    decoder: Decoder,
) -> Result<Element, ConversionError> {
    let name = e.name();
    let prefix = match name.prefix() {
        Some(p) => Some(decode(decoder, p.as_ref())?),
        None => None,
    };
    let local_name = decode(decoder, name.local_name().as_ref())?;

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(err) => {
                tracing::debug!(element = %local_name, error = %err, "Skipping malformed XML attribute");
                continue;
            }
        };
        let key = decode(decoder, attr.key.as_ref())?;
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(|err| ConversionError::Xml(err.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        namespace,
        prefix,
        local_name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ConversionError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(ConversionError::Xml(
                "document has more than one root element".into(),
            ))
        }
    }
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) -> Result<(), ConversionError> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(ConversionError::Xml("text outside the root element".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_namespaces_resolved() {
        let doc = Document::parse(
            br#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/" xmlns:dc="http://purl.org/dc/elements/1.1/">
                <item rdf:about="urn:1"><dc:date>2020-01-01</dc:date></item>
            </rdf:RDF>"#,
        )
        .unwrap();

        assert_eq!(doc.root.local_name, "RDF");
        assert_eq!(doc.root.prefix.as_deref(), Some("rdf"));
        assert_eq!(
            doc.root.namespace.as_deref(),
            Some("http://www.w3.org/1999/02/22-rdf-syntax-ns#")
        );

        let item = &doc.root.children[0];
        assert!(item.is(Some("http://purl.org/rss/1.0/"), "item"));
        assert_eq!(item.attribute("rdf:about"), Some("urn:1"));
        assert_eq!(
            item.child_text(Some("http://purl.org/dc/elements/1.1/"), "date"),
            Some("2020-01-01")
        );
    }

    #[test]
    fn test_unqualified_elements_have_no_namespace() {
        let doc = Document::parse(b"<rss><channel><title>T</title></channel></rss>").unwrap();
        let channel = doc.root.child(None, "channel").unwrap();
        assert_eq!(channel.child_text(None, "title"), Some("T"));
    }

    #[test]
    fn test_text_entities_and_cdata() {
        let doc = Document::parse(
            b"<a><b>Fish &amp; Chips &#x263A;</b><c><![CDATA[<p>raw</p>]]></c></a>",
        )
        .unwrap();
        assert_eq!(doc.root.child_text(None, "b"), Some("Fish & Chips \u{263A}"));
        assert_eq!(doc.root.child_text(None, "c"), Some("<p>raw</p>"));
    }

    #[test]
    fn test_declared_legacy_encoding_decoded() {
        // 0xE9 is "é" in ISO-8859-1 and invalid as a lone UTF-8 byte
        let doc = Document::parse(
            b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<rss><channel><title>Caf\xe9</title><![CDATA[na\xefve]]></channel></rss>",
        )
        .unwrap();
        let channel = doc.root.child(None, "channel").unwrap();
        assert_eq!(channel.child_text(None, "title"), Some("Café"));
        assert_eq!(channel.text, "naïve");
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = Document::parse(b"<r><a><b/><c/></a><d><e/></d></r>").unwrap();
        let names: Vec<&str> = doc
            .root
            .descendants()
            .map(|e| e.local_name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_malformed_documents_rejected() {
        let inputs: [&[u8]; 5] = [
            b"<rss><channel>",
            b"<a></b>",
            b"",
            b"<a/><b/>",
            b"<a>&undefined;</a>",
        ];
        for input in inputs {
            let result = Document::parse(input);
            assert!(
                matches!(result, Err(ConversionError::Xml(_))),
                "expected XML error for {:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_depth_limit() {
        let mut input = String::new();
        for _ in 0..(MAX_DEPTH + 1) {
            input.push_str("<x>");
        }
        for _ in 0..(MAX_DEPTH + 1) {
            input.push_str("</x>");
        }
        assert!(Document::parse(input.as_bytes()).is_err());
    }

    #[test]
    fn test_declaration_and_comments_ignored() {
        let doc = Document::parse(
            b"<?xml version=\"1.0\"?>\n<!-- hello --><root>text<!-- inner --></root>",
        )
        .unwrap();
        assert_eq!(doc.root.local_name, "root");
        assert_eq!(doc.root.text, "text");
    }
}
