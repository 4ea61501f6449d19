//! Tag-stream decoder: SPB bytes to an output tree plus side-channel.

use std::io::Read;

use spb_model::guid::{format_braced, from_wire_bytes, parse_guid};
use spb_model::{
    Definition, ModelNames, PrimitiveType, PropertyDef, SetDef, SymbolBank, SymbolRef,
};
use tracing::{debug, info, info_span};

use crate::cursor::ByteCursor;
use crate::error::{Location, Result, SpbError};
use crate::metadata::{HEADER_INTS, RoundTripMetadata, SPB_MAGIC, SetEntry, TagEntry};
use crate::options::DecoderOptions;
use crate::text::{TextCodec, Utf8Codec};
use crate::tree::{Document, Element, Node};
use crate::value::decode_value;

/// Output of a successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub document: Document,
    pub metadata: RoundTripMetadata,
}

/// Decodes SPB streams against a symbol catalogue.
///
/// The decoder only borrows the catalogue, so one [`SymbolBank`] can back
/// any number of decoders, including on other threads.
pub struct Decoder<'b> {
    bank: &'b SymbolBank,
    models: Option<&'b ModelNames>,
    codec: &'b dyn TextCodec,
    options: DecoderOptions,
}

/// Per-stream decode state.
struct Session<'a> {
    cursor: ByteCursor<'a>,
    tags: Vec<&'a Definition>,
    metadata: RoundTripMetadata,
    /// Sets currently open.
    depth: usize,
}

impl<'b> Decoder<'b> {
    pub fn new(bank: &'b SymbolBank) -> Self {
        Self {
            bank,
            models: None,
            codec: &Utf8Codec,
            options: DecoderOptions::default(),
        }
    }

    #[must_use]
    pub fn with_models(mut self, models: &'b ModelNames) -> Self {
        self.models = Some(models);
        self
    }

    #[must_use]
    pub fn with_text_codec(mut self, codec: &'b dyn TextCodec) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: DecoderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn decode_reader<R: Read>(&self, mut reader: R) -> Result<Decoded> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.decode(&bytes)
    }

    /// Decode a complete stream. Any failure aborts the whole decode.
    pub fn decode(&self, bytes: &[u8]) -> Result<Decoded> {
        let _span = info_span!("decode", bytes = bytes.len()).entered();
        let mut cursor = ByteCursor::new(bytes);

        let magic = cursor.read_u16()?;
        if magic != SPB_MAGIC {
            return Err(SpbError::InvalidSignature { found: magic });
        }
        let mut header = [0i32; HEADER_INTS];
        for slot in &mut header {
            *slot = cursor.read_i32()?;
        }

        let mut session = Session {
            cursor,
            tags: Vec::new(),
            metadata: RoundTripMetadata::new(header),
            depth: 0,
        };
        self.read_tag_table(&mut session)?;

        let mut root = Element::default();
        while !session.cursor.is_empty() {
            let at = session.cursor.position();
            let tag_ref = session.cursor.read_i32()?;
            if tag_ref == 0 {
                session.metadata.terminated = true;
                session.metadata.trailer = hex::encode(session.cursor.rest());
                break;
            }
            self.read_item(&mut session, tag_ref, at, None, &mut root, true)?;
        }

        let document = Document {
            children: root.children,
        };
        info!(
            bytes = bytes.len(),
            elements = document.element_count(),
            tags = session.tags.len(),
            sets = session.metadata.sets.len(),
            "decoded SPB stream"
        );
        Ok(Decoded {
            document,
            metadata: session.metadata,
        })
    }

    fn read_tag_table<'a>(&self, session: &mut Session<'a>) -> Result<()>
    where
        'b: 'a,
    {
        let count = RoundTripMetadata::announced_tag_count(&session.metadata.header);
        for _ in 0..count {
            let at = session.cursor.position();
            let guid = from_wire_bytes(session.cursor.read_array()?);
            let flag = session.cursor.read_i32()?;
            let definition =
                self.bank
                    .lookup_by_guid(&guid)
                    .ok_or_else(|| SpbError::UnboundSymbol {
                        guid: format_braced(&guid),
                        at: Location::Offset(at),
                    })?;
            session.tags.push(definition);
            session.metadata.tags.push(TagEntry { guid, flag });
        }
        debug!(tags = count, "read tag table");
        Ok(())
    }

    /// Read one item into `target`. Returns whether it was stored as an
    /// attribute of `target`.
    fn read_item(
        &self,
        session: &mut Session<'_>,
        tag_ref: i32,
        at: u64,
        context: Option<&SymbolRef>,
        target: &mut Element,
        top_level: bool,
    ) -> Result<bool> {
        let index = i64::from(tag_ref) - 1;
        let definition = usize::try_from(index)
            .ok()
            .and_then(|idx| session.tags.get(idx).copied())
            .ok_or_else(|| SpbError::InvalidTagIndex {
                index,
                tag_count: session.tags.len(),
                at: Location::Offset(at),
            })?;
        match definition {
            Definition::Set(set) => {
                self.read_set(session, set, context, target)?;
                Ok(false)
            }
            Definition::Property(property) => {
                self.read_property(session, property, context, target, top_level)
            }
        }
    }

    fn read_set(
        &self,
        session: &mut Session<'_>,
        set: &SetDef,
        context: Option<&SymbolRef>,
        target: &mut Element,
    ) -> Result<()> {
        if session.depth >= self.options.max_depth {
            return Err(SpbError::NestingTooDeep {
                limit: self.options.max_depth,
                at: Location::Offset(session.cursor.position()),
            });
        }
        let size = session.cursor.read_i32()?;
        let start = session.cursor.position();
        let end = start.saturating_add_signed(i64::from(size));

        let (name, child_context) = match &set.parent {
            Some(parent) if context.map(|c| c.id) != Some(parent.id) => {
                (format!("{}.{}", parent.name, set.name), Some(parent))
            }
            _ => (set.name.clone(), context),
        };
        debug!(set = %name, size, offset = start, "entering set");

        let stream_end = start + session.cursor.remaining() as u64;
        if end > stream_end {
            return Err(SpbError::SetBoundsViolation {
                set: name,
                expected_end: end,
                actual: stream_end,
            });
        }

        let entry = session.metadata.sets.len();
        session.metadata.sets.push(SetEntry {
            name: name.clone(),
            size,
            offset: start,
            terminated: false,
            attribute_slots: Vec::new(),
        });

        let mut element = Element::new(name);
        session.depth += 1;
        let mut item = 0;
        while session.cursor.position() < end {
            let at = session.cursor.position();
            let tag_ref = session.cursor.read_i32()?;
            if tag_ref == 0 {
                session.metadata.sets[entry].terminated = true;
                break;
            }
            if self.read_item(session, tag_ref, at, child_context, &mut element, false)? {
                session.metadata.sets[entry].attribute_slots.push(item);
            }
            item += 1;
        }
        session.depth -= 1;

        let actual = session.cursor.position();
        if actual != end {
            return Err(SpbError::SetBoundsViolation {
                set: element.name,
                expected_end: end,
                actual,
            });
        }
        target.push(Node::Element(element));
        Ok(())
    }

    fn read_property(
        &self,
        session: &mut Session<'_>,
        property: &PropertyDef,
        context: Option<&SymbolRef>,
        target: &mut Element,
        top_level: bool,
    ) -> Result<bool> {
        let text = decode_value(&mut session.cursor, property, self.codec)?;
        let name = match &property.context {
            Some(declared) if context.map(|c| c.id) != Some(declared.id) => {
                format!("{}.{}", declared.name, property.name)
            }
            _ => property.name.clone(),
        };

        if let Some(comment) = self.model_annotation(property, &text) {
            target.push(Node::Comment(comment));
        }
        // Repeats stay elements; XML allows one attribute per name.
        let as_attribute =
            property.is_attribute && !top_level && target.attribute(&name).is_none();
        if as_attribute {
            target.push_attribute(name, text);
        } else {
            target.push(Node::Element(Element::with_text(name, text)));
        }
        Ok(as_attribute)
    }

    fn model_annotation(&self, property: &PropertyDef, text: &str) -> Option<String> {
        let is_guid = property.type_def.primitive() == Some(PrimitiveType::Guid);
        if !self.options.annotate_models || !is_guid {
            return None;
        }
        let guid = parse_guid(text).ok()?;
        self.models?
            .lookup(&guid)
            .map(|label| format!("Model: {label}"))
    }
}
