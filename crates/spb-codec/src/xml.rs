//! XML serialization of the output tree.
//!
//! Written with two-space indentation and a UTF-8 declaration. On read,
//! whitespace-only text that sits next to element or comment children is
//! indentation and is dropped; leaf text is kept verbatim.

use std::io::{BufRead, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Location, Result, SpbError};
use crate::tree::{Document, Element, Node};

/// Deepest element nesting read or written. Leaves room for property
/// elements below the deepest decodable set.
pub const MAX_XML_DEPTH: usize = 512;

/// Write `document` as indented XML.
pub fn write_document<W: Write>(document: &Document, writer: W) -> Result<()> {
    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    for node in &document.children {
        write_node(&mut xml, node, 0)?;
    }
    xml.get_mut().write_all(b"\n")?;
    Ok(())
}

pub fn to_xml_string(document: &Document) -> Result<String> {
    let mut buffer = Vec::new();
    write_document(document, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| SpbError::Io(std::io::Error::other(e)))
}

fn write_node<W: Write>(xml: &mut Writer<W>, node: &Node, depth: usize) -> Result<()> {
    match node {
        Node::Element(element) => write_element(xml, element, depth),
        Node::Text(text) => {
            xml.write_event(Event::Text(BytesText::new(text)))?;
            Ok(())
        }
        Node::Comment(text) => {
            xml.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
            Ok(())
        }
    }
}

fn write_element<W: Write>(xml: &mut Writer<W>, element: &Element, depth: usize) -> Result<()> {
    if depth >= MAX_XML_DEPTH {
        return Err(SpbError::NestingTooDeep {
            limit: MAX_XML_DEPTH,
            at: Location::Path(element.name.clone()),
        });
    }
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        xml.write_event(Event::Empty(start))?;
        return Ok(());
    }
    xml.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(xml, child, depth + 1)?;
    }
    xml.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

/// Parse XML text produced by [`write_document`] (or written by hand).
pub fn parse_document(text: &str) -> Result<Document> {
    read_document(text.as_bytes())
}

/// Pull-parse a document from any buffered reader.
pub fn read_document<R: BufRead>(input: R) -> Result<Document> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut top: Vec<Node> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                if stack.len() >= MAX_XML_DEPTH {
                    return Err(SpbError::NestingTooDeep {
                        limit: MAX_XML_DEPTH,
                        at: Location::Offset(reader.buffer_position()),
                    });
                }
                stack.push(start_element(e)?);
            }
            Event::Empty(ref e) => {
                let element = start_element(e)?;
                attach(&mut stack, &mut top, Node::Element(element));
            }
            Event::End(_) => {
                if let Some(mut element) = stack.pop() {
                    drop_indentation(&mut element.children);
                    attach(&mut stack, &mut top, Node::Element(element));
                }
            }
            Event::Text(ref e) => {
                let text = e.unescape()?.into_owned();
                push_text(&mut stack, &mut top, text);
            }
            Event::CData(ref e) => {
                let text = String::from_utf8_lossy(e).into_owned();
                push_text(&mut stack, &mut top, text);
            }
            Event::Comment(ref e) => {
                let text = String::from_utf8_lossy(e).into_owned();
                attach(&mut stack, &mut top, Node::Comment(text));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    top.retain(|node| !matches!(node, Node::Text(text) if text.trim().is_empty()));
    Ok(Document { children: top })
}

fn start_element(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.push_attribute(key, value);
    }
    Ok(element)
}

fn attach(stack: &mut [Element], top: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
    }
}

fn push_text(stack: &mut [Element], top: &mut Vec<Node>, text: String) {
    let siblings = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => top,
    };
    if let Some(Node::Text(previous)) = siblings.last_mut() {
        previous.push_str(&text);
    } else if !text.is_empty() {
        siblings.push(Node::Text(text));
    }
}

fn drop_indentation(children: &mut Vec<Node>) {
    let structured = children
        .iter()
        .any(|node| matches!(node, Node::Element(_) | Node::Comment(_)));
    if structured {
        children.retain(|node| !matches!(node, Node::Text(text) if text.trim().is_empty()));
    }
}
