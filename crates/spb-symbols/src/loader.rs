//! Loader for XML symbol definition documents.
//!
//! Each document declares one namespace:
//!
//! ```xml
//! <SymbolDef id="{GUID}" name="WorldBase">
//!   <Enums>
//!     <EnumDef name="Direction"><EnumVal name="North"/></EnumDef>
//!   </Enums>
//!   <Properties>
//!     <PropertyDef id="{GUID}" name="Heading" type="ENUM" enum="Direction"/>
//!   </Properties>
//!   <Sets>
//!     <SetDef id="{GUID}" name="Flight"/>
//!   </Sets>
//! </SymbolDef>
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use spb_model::guid::parse_guid;
use spb_model::{
    EnumDef, PropertyDef, SetDef, SymbolBank, SymbolBankBuilder, SymbolRef, TypeDef,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SymbolsError;

/// Counts of what one definition document contributed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    pub namespace: String,
    pub sets: usize,
    pub properties: usize,
    pub enums: usize,
}

#[derive(Debug, Default)]
struct RawDocument {
    namespace: Option<(Uuid, String)>,
    enums: Vec<EnumDef>,
    sets: Vec<RawSet>,
    properties: Vec<RawProperty>,
}

#[derive(Debug)]
struct RawSet {
    id: Uuid,
    name: String,
    parent: Option<String>,
}

#[derive(Debug)]
struct RawProperty {
    id: Uuid,
    name: String,
    type_name: String,
    enum_name: Option<String>,
    is_attribute: bool,
}

/// Load every `*.xml` document of each directory, in lexical order, into
/// one catalogue.
pub fn load_symbol_dirs<P: AsRef<Path>>(dirs: &[P]) -> Result<SymbolBank, SymbolsError> {
    let mut builder = SymbolBank::builder();
    let mut documents = 0usize;
    for dir in dirs {
        for path in definition_files(dir.as_ref())? {
            load_definition_file(&path, &mut builder)?;
            documents += 1;
        }
    }
    let bank = builder.build();
    info!(
        documents,
        sets = bank.set_count(),
        properties = bank.property_count(),
        "symbol bank loaded"
    );
    Ok(bank)
}

/// Load a single directory of definition documents.
pub fn load_symbol_dir(dir: &Path) -> Result<SymbolBank, SymbolsError> {
    load_symbol_dirs(&[dir])
}

/// Parse one definition document from disk into `builder`.
pub fn load_definition_file(
    path: &Path,
    builder: &mut SymbolBankBuilder,
) -> Result<DocumentSummary, SymbolsError> {
    let text = std::fs::read_to_string(path).map_err(|e| SymbolsError::io(path, e))?;
    load_definition_str(&text, path, builder)
}

/// Parse one definition document held in memory. `source` is only used to
/// label errors.
pub fn load_definition_str(
    text: &str,
    source: &Path,
    builder: &mut SymbolBankBuilder,
) -> Result<DocumentSummary, SymbolsError> {
    let raw = parse_document(text, source)?;
    let (ns_id, ns_name) = raw
        .namespace
        .ok_or_else(|| SymbolsError::invalid(source, "missing <SymbolDef> root"))?;
    let namespace = SymbolRef::new(ns_id, ns_name.clone());

    builder
        .set(SetDef::new(ns_id, ns_name.clone()))
        .map_err(|e| SymbolsError::model(source, e))?;

    for set in &raw.sets {
        let parent = match &set.parent {
            None => namespace.clone(),
            Some(parent) => raw
                .sets
                .iter()
                .find(|candidate| candidate.name.eq_ignore_ascii_case(parent))
                .map(|candidate| SymbolRef::new(candidate.id, candidate.name.clone()))
                .ok_or_else(|| {
                    SymbolsError::invalid(
                        source,
                        format!("set {} names unknown parent {parent}", set.name),
                    )
                })?,
        };
        builder
            .set(SetDef::new(set.id, set.name.clone()).with_parent(parent))
            .map_err(|e| SymbolsError::model(source, e))?;
    }

    for prop in &raw.properties {
        let mut def = PropertyDef::new(prop.id, prop.name.clone(), TypeDef::new(&prop.type_name))
            .with_context(namespace.clone());
        if prop.is_attribute {
            def = def.as_attribute();
        }
        if let Some(enum_name) = &prop.enum_name {
            let enum_def = raw
                .enums
                .iter()
                .find(|candidate| candidate.name.eq_ignore_ascii_case(enum_name))
                .ok_or_else(|| {
                    SymbolsError::invalid(
                        source,
                        format!("property {} names unknown enum {enum_name}", prop.name),
                    )
                })?;
            def = def.with_enum(enum_def.clone());
        }
        builder
            .property(def)
            .map_err(|e| SymbolsError::model(source, e))?;
    }

    let summary = DocumentSummary {
        namespace: ns_name,
        sets: raw.sets.len(),
        properties: raw.properties.len(),
        enums: raw.enums.len(),
    };
    debug!(
        path = %source.display(),
        namespace = %summary.namespace,
        sets = summary.sets,
        properties = summary.properties,
        enums = summary.enums,
        "definition document loaded"
    );
    Ok(summary)
}

fn definition_files(dir: &Path) -> Result<Vec<PathBuf>, SymbolsError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SymbolsError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SymbolsError::io(dir, e))?.path();
        let is_xml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        if is_xml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn parse_document(text: &str, source: &Path) -> Result<RawDocument, SymbolsError> {
    let mut reader = Reader::from_str(text);
    let mut raw = RawDocument::default();
    let mut open_enum: Option<(String, Vec<String>)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SymbolsError::xml(source, e))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                let attrs = attributes(e, source)?;
                match e.name().as_ref() {
                    b"SymbolDef" => {
                        let id = required_guid(&attrs, "SymbolDef", source)?;
                        let name = required(&attrs, "name", "SymbolDef", source)?;
                        raw.namespace = Some((id, name));
                    }
                    b"EnumDef" => {
                        let name = required(&attrs, "name", "EnumDef", source)?;
                        open_enum = Some((name, Vec::new()));
                        if empty {
                            finish_enum(&mut open_enum, &mut raw, source)?;
                        }
                    }
                    b"EnumVal" => {
                        let label = required(&attrs, "name", "EnumVal", source)?;
                        match open_enum.as_mut() {
                            Some((_, labels)) => labels.push(label),
                            None => {
                                return Err(SymbolsError::invalid(
                                    source,
                                    format!("EnumVal {label} outside of an EnumDef"),
                                ));
                            }
                        }
                    }
                    b"PropertyDef" => {
                        raw.properties.push(RawProperty {
                            id: required_guid(&attrs, "PropertyDef", source)?,
                            name: required(&attrs, "name", "PropertyDef", source)?,
                            type_name: required(&attrs, "type", "PropertyDef", source)?,
                            enum_name: attrs.get("enum").cloned(),
                            is_attribute: attrs.get("attribute").is_some_and(|v| is_truthy(v)),
                        });
                    }
                    b"SetDef" => {
                        raw.sets.push(RawSet {
                            id: required_guid(&attrs, "SetDef", source)?,
                            name: required(&attrs, "name", "SetDef", source)?,
                            parent: attrs.get("parent").cloned(),
                        });
                    }
                    _ => {}
                }
            }
            Event::End(ref e) if e.name().as_ref() == b"EnumDef" => {
                finish_enum(&mut open_enum, &mut raw, source)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(raw)
}

fn finish_enum(
    open_enum: &mut Option<(String, Vec<String>)>,
    raw: &mut RawDocument,
    source: &Path,
) -> Result<(), SymbolsError> {
    if let Some((name, labels)) = open_enum.take() {
        let def = EnumDef::new(name, labels).map_err(|e| SymbolsError::model(source, e))?;
        raw.enums.push(def);
    }
    Ok(())
}

fn attributes(
    element: &BytesStart<'_>,
    source: &Path,
) -> Result<HashMap<String, String>, SymbolsError> {
    let mut out = HashMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| SymbolsError::xml(source, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| SymbolsError::xml(source, e))?
            .trim()
            .to_string();
        out.insert(key, value);
    }
    Ok(out)
}

fn required(
    attrs: &HashMap<String, String>,
    key: &str,
    element: &str,
    source: &Path,
) -> Result<String, SymbolsError> {
    attrs
        .get(key)
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| SymbolsError::invalid(source, format!("<{element}> without {key}")))
}

fn required_guid(
    attrs: &HashMap<String, String>,
    element: &str,
    source: &Path,
) -> Result<Uuid, SymbolsError> {
    let text = required(attrs, "id", element, source)?;
    parse_guid(&text).map_err(|e| SymbolsError::model(source, e))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "attribute"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0"?>
<SymbolDef id="{00000000-0000-0000-0000-000000000001}" name="WorldBase">
  <Enums>
    <EnumDef name="Direction">
      <EnumVal name="North"/>
      <EnumVal name="South"/>
    </EnumDef>
    <EnumDef name="Nothing"/>
  </Enums>
  <Properties>
    <PropertyDef id="{00000000-0000-0000-0000-000000000010}" name="Heading" type="ENUM" enum="Direction"/>
    <PropertyDef id="{00000000-0000-0000-0000-000000000011}" name="InstanceId" type="GUID" attribute="true"/>
  </Properties>
  <Sets>
    <SetDef id="{00000000-0000-0000-0000-000000000020}" name="Flight"/>
    <SetDef id="{00000000-0000-0000-0000-000000000021}" name="Leg" parent="Flight"/>
  </Sets>
</SymbolDef>"#;

    #[test]
    fn parses_namespace_sets_and_properties() {
        let mut builder = SymbolBank::builder();
        let summary = load_definition_str(DOC, Path::new("world.xml"), &mut builder).unwrap();
        assert_eq!(
            summary,
            DocumentSummary {
                namespace: "WorldBase".to_string(),
                sets: 2,
                properties: 2,
                enums: 2,
            }
        );

        let bank = builder.build();
        assert_eq!(bank.len(), 5);
        let leg = bank.lookup_by_name("Leg").unwrap();
        assert_eq!(leg.context().map(|c| c.name.as_str()), Some("Flight"));
        let flight = bank.lookup_by_name("Flight").unwrap();
        assert_eq!(flight.context().map(|c| c.name.as_str()), Some("WorldBase"));
    }

    #[test]
    fn unknown_enum_reference_fails() {
        let doc = r#"<SymbolDef id="{00000000-0000-0000-0000-000000000001}" name="W">
  <PropertyDef id="{00000000-0000-0000-0000-000000000002}" name="P" type="ENUM" enum="Missing"/>
</SymbolDef>"#;
        let mut builder = SymbolBank::builder();
        let err = load_definition_str(doc, Path::new("w.xml"), &mut builder).unwrap_err();
        assert!(matches!(err, SymbolsError::InvalidDocument { .. }));
    }

    #[test]
    fn missing_root_fails() {
        let mut builder = SymbolBank::builder();
        let err = load_definition_str("<Other/>", Path::new("w.xml"), &mut builder).unwrap_err();
        assert!(err.to_string().contains("missing <SymbolDef> root"));
    }

    #[test]
    fn truthy_attribute_flags() {
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("1"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
    }
}
