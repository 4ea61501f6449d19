//! Tag-stream encoder: output tree plus side-channel back to SPB bytes.

use spb_model::guid::to_wire_bytes;
use spb_model::{Definition, PropertyDef, SymbolBank, SymbolRef};
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::error::{Location, Result, SpbError};
use crate::metadata::{RoundTripMetadata, SPB_MAGIC, SetEntry};
use crate::options::EncoderOptions;
use crate::text::{TextCodec, Utf8Codec};
use crate::tree::{Document, Element, Node};
use crate::value::encode_value;

/// Encodes trees against a symbol catalogue and a recorded side-channel.
pub struct Encoder<'b> {
    bank: &'b SymbolBank,
    codec: &'b dyn TextCodec,
    options: EncoderOptions,
}

/// Per-job encode state.
struct Session<'a> {
    /// Replayed tag table; `None` for GUIDs the catalogue does not know.
    tags: Vec<Option<&'a Definition>>,
    metadata: &'a RoundTripMetadata,
    next_set: usize,
    out: Vec<u8>,
}

impl<'a> Session<'a> {
    fn write_i32(&mut self, value: i32) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    /// Recorded entry of the next set in pre-order.
    fn next_set_entry(&mut self) -> Option<&'a SetEntry> {
        let metadata: &'a RoundTripMetadata = self.metadata;
        let entry = metadata.sets.get(self.next_set);
        self.next_set += 1;
        entry
    }
}

impl<'b> Encoder<'b> {
    pub fn new(bank: &'b SymbolBank) -> Self {
        Self {
            bank,
            codec: &Utf8Codec,
            options: EncoderOptions::default(),
        }
    }

    #[must_use]
    pub fn with_text_codec(mut self, codec: &'b dyn TextCodec) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: EncoderOptions) -> Self {
        self.options = options;
        self
    }

    /// Encode `document`, replaying header and tag table from `metadata`.
    pub fn encode(&self, document: &Document, metadata: &RoundTripMetadata) -> Result<Vec<u8>> {
        let _span = info_span!("encode", tags = metadata.tags.len()).entered();
        metadata.validate()?;

        let mut session = Session {
            tags: metadata
                .tags
                .iter()
                .map(|entry| self.bank.lookup_by_guid(&entry.guid))
                .collect(),
            metadata,
            next_set: 0,
            out: Vec::new(),
        };

        session.out.extend_from_slice(&SPB_MAGIC.to_le_bytes());
        for value in metadata.header {
            session.write_i32(value);
        }
        for entry in &metadata.tags {
            session.out.extend_from_slice(&to_wire_bytes(&entry.guid));
            session.write_i32(entry.flag);
        }
        debug!(tags = metadata.tags.len(), "replayed tag table");

        for (element, path) in child_elements(&document.children, "") {
            self.write_element(&mut session, element, None, &path, 0)?;
        }
        if self.options.replay_terminators && metadata.terminated {
            session.write_i32(0);
            session.out.extend_from_slice(&metadata.trailer_bytes()?);
        }

        info!(
            bytes = session.out.len(),
            elements = document.element_count(),
            "encoded SPB stream"
        );
        Ok(session.out)
    }

    fn write_element(
        &self,
        session: &mut Session<'_>,
        element: &Element,
        context: Option<&SymbolRef>,
        path: &str,
        depth: usize,
    ) -> Result<()> {
        let at = Location::Path(path.to_string());
        let (index, definition) = resolve(&session.tags, &element.name, context, &at)?;
        session.write_i32(tag_ref(index));

        match definition {
            Definition::Property(property) => {
                encode_value(&mut session.out, property, &element.text(), self.codec, &at)
            }
            Definition::Set(set) => {
                if depth >= self.options.max_depth {
                    return Err(SpbError::NestingTooDeep {
                        limit: self.options.max_depth,
                        at,
                    });
                }
                let child_context = match &set.parent {
                    Some(parent) if context.map(|c| c.id) != Some(parent.id) => Some(parent),
                    _ => context,
                };
                let entry = session.next_set_entry();
                let terminated = entry.is_some_and(|entry| entry.terminated);
                let slots = attribute_slots(entry, element.attributes.len());

                let size_at = session.out.len();
                session.write_i32(0);
                let body_start = session.out.len();

                // Attributes go back to their recorded item positions;
                // child elements fill the gaps in document order.
                let mut attributes = element.attributes.iter().zip(slots).peekable();
                let mut children = child_elements(&element.children, path).into_iter();
                let mut item = 0;
                loop {
                    if let Some(((key, value), _)) =
                        attributes.next_if(|(_, slot)| *slot <= item)
                    {
                        self.write_attribute(session, key, value, child_context, path)?;
                    } else if let Some((child, child_path)) = children.next() {
                        let depth = depth + 1;
                        self.write_element(session, child, child_context, &child_path, depth)?;
                    } else if let Some(((key, value), _)) = attributes.next() {
                        self.write_attribute(session, key, value, child_context, path)?;
                    } else {
                        break;
                    }
                    item += 1;
                }
                if self.options.replay_terminators && terminated {
                    session.write_i32(0);
                }

                let size = i32::try_from(session.out.len() - body_start).map_err(|_| {
                    SpbError::invalid_value("set length", element.name.as_str(), &at)
                })?;
                session.out[size_at..body_start].copy_from_slice(&size.to_le_bytes());
                debug!(set = %element.name, size, "wrote set");
                Ok(())
            }
        }
    }

    fn write_attribute(
        &self,
        session: &mut Session<'_>,
        key: &str,
        value: &str,
        context: Option<&SymbolRef>,
        path: &str,
    ) -> Result<()> {
        let at = Location::Path(format!("{path}/@{key}"));
        let (index, property) = resolve_property(&session.tags, key, context, &at)?;
        session.write_i32(tag_ref(index));
        encode_value(&mut session.out, property, value, self.codec, &at)
    }
}

/// Element children paired with their paths, `/Name[n]` where `n` is the
/// 1-based position among same-named siblings.
fn child_elements<'e>(nodes: &'e [Node], parent_path: &str) -> Vec<(&'e Element, String)> {
    let mut seen: Vec<(&str, usize)> = Vec::new();
    nodes
        .iter()
        .filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
        .map(|element| {
            let position = match seen.iter_mut().find(|(name, _)| *name == element.name) {
                Some((_, count)) => {
                    *count += 1;
                    *count
                }
                None => {
                    seen.push((element.name.as_str(), 1));
                    1
                }
            };
            (element, format!("{parent_path}/{}[{position}]", element.name))
        })
        .collect()
}

/// Recorded attribute positions, or attributes-first when the record does
/// not match the element (missing entry or edited attributes).
fn attribute_slots(entry: Option<&SetEntry>, attributes: usize) -> Vec<usize> {
    match entry {
        Some(entry) if entry.attribute_slots.len() == attributes => {
            entry.attribute_slots.clone()
        }
        _ => (0..attributes).collect(),
    }
}

fn tag_ref(index: usize) -> i32 {
    // Tag tables are bounded by an i32 header slot.
    i32::try_from(index + 1).unwrap_or(i32::MAX)
}

/// Resolve an element name against the replayed tag table.
///
/// Matching is case-insensitive. A `Context.Name` form selects among
/// same-named symbols by the name of their declaring context; an unqualified
/// name prefers symbols declared in the active context.
fn resolve<'a>(
    tags: &[Option<&'a Definition>],
    name: &str,
    context: Option<&SymbolRef>,
    at: &Location,
) -> Result<(usize, &'a Definition)> {
    let candidates = |base: &str| -> Vec<(usize, &'a Definition)> {
        tags.iter()
            .enumerate()
            .filter_map(|(idx, def)| def.map(|def| (idx, def)))
            .filter(|(_, def)| def.name().eq_ignore_ascii_case(base))
            .collect()
    };
    let active: Option<Uuid> = context.map(|c| c.id);

    let exact = candidates(name);
    if !exact.is_empty() {
        let preferred = exact
            .iter()
            .find(|(_, def)| def.context().map(|c| c.id) == active)
            .or_else(|| exact.iter().find(|(_, def)| def.context().is_none()));
        return Ok(*preferred.unwrap_or(&exact[0]));
    }

    if let Some((qualifier, base)) = name.rsplit_once('.') {
        let qualified = candidates(base);
        let preferred = qualified.iter().find(|(_, def)| {
            def.context()
                .is_some_and(|c| c.name.eq_ignore_ascii_case(qualifier))
        });
        if let Some(found) = preferred.or(qualified.first()) {
            return Ok(*found);
        }
    }

    Err(SpbError::unknown_element(name, at))
}

fn resolve_property<'a>(
    tags: &[Option<&'a Definition>],
    name: &str,
    context: Option<&SymbolRef>,
    at: &Location,
) -> Result<(usize, &'a PropertyDef)> {
    match resolve(tags, name, context, at)? {
        (index, Definition::Property(property)) => Ok((index, property)),
        (_, Definition::Set(_)) => Err(SpbError::unknown_element(name, at)),
    }
}
