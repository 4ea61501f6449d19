#![allow(dead_code)]

use std::path::Path;

use spb_codec::metadata::{HEADER_INTS, SPB_MAGIC, TAG_COUNT_SLOT};
use spb_model::guid::to_wire_bytes;
use spb_model::{ModelNames, PrimitiveType, PropertyDef, SymbolBank};
use uuid::Uuid;

pub const WORLD_BASE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SymbolDef id="{00000000-0000-0000-0000-000000000001}" name="WorldBase">
  <Enums>
    <EnumDef name="Direction">
      <EnumVal name="North"/>
      <EnumVal name="East"/>
      <EnumVal name="South"/>
      <EnumVal name="West"/>
    </EnumDef>
  </Enums>
  <Properties>
    <PropertyDef id="{00000000-0000-0000-0000-000000000010}" name="Score" type="LONG"/>
    <PropertyDef id="{00000000-0000-0000-0000-000000000011}" name="Title" type="TEXT"/>
    <PropertyDef id="{00000000-0000-0000-0000-000000000012}" name="Heading" type="ENUM" enum="Direction"/>
    <PropertyDef id="{00000000-0000-0000-0000-000000000013}" name="Orientation" type="PBH"/>
    <PropertyDef id="{00000000-0000-0000-0000-000000000014}" name="InstanceId" type="GUID" attribute="true"/>
    <PropertyDef id="{00000000-0000-0000-0000-000000000015}" name="Speed" type="FLOAT"/>
    <PropertyDef id="{00000000-0000-0000-0000-000000000016}" name="Location" type="LLA"/>
    <PropertyDef id="{00000000-0000-0000-0000-000000000017}" name="Stamp" type="FILETIME"/>
    <PropertyDef id="{00000000-0000-0000-0000-000000000018}" name="Mass" type="VECTOR"/>
  </Properties>
  <Sets>
    <SetDef id="{00000000-0000-0000-0000-000000000021}" name="Mission"/>
    <SetDef id="{00000000-0000-0000-0000-000000000022}" name="Leg" parent="Mission"/>
  </Sets>
</SymbolDef>
"#;

pub const SCENERY: &str = r#"<SymbolDef id="{00000000-0000-0000-0000-000000000002}" name="Scenery">
  <Properties>
    <PropertyDef id="{00000000-0000-0000-0000-000000000030}" name="Score" type="ULONG"/>
  </Properties>
</SymbolDef>
"#;

pub const SCORE: u128 = 0x10;
pub const TITLE: u128 = 0x11;
pub const HEADING: u128 = 0x12;
pub const ORIENTATION: u128 = 0x13;
pub const INSTANCE_ID: u128 = 0x14;
pub const SPEED: u128 = 0x15;
pub const LOCATION: u128 = 0x16;
pub const STAMP: u128 = 0x17;
pub const MASS: u128 = 0x18;
pub const MISSION: u128 = 0x21;
pub const LEG: u128 = 0x22;
pub const SCENERY_SCORE: u128 = 0x30;
pub const PIPER_CUB: u128 = 0x99;

/// Catalogue with the WorldBase and Scenery namespaces.
pub fn world_bank() -> SymbolBank {
    let mut builder = SymbolBank::builder();
    spb_symbols::load_definition_str(WORLD_BASE, Path::new("worldbase.xml"), &mut builder)
        .expect("load WorldBase");
    spb_symbols::load_definition_str(SCENERY, Path::new("scenery.xml"), &mut builder)
        .expect("load Scenery");
    builder.build()
}

/// Catalogue with one context-free LONG property named Score.
pub fn score_bank() -> SymbolBank {
    let mut builder = SymbolBank::builder();
    builder
        .property(PropertyDef::new(
            Uuid::from_u128(SCORE),
            "Score",
            PrimitiveType::Long.into(),
        ))
        .expect("register Score");
    builder.build()
}

pub fn models() -> ModelNames {
    [(Uuid::from_u128(PIPER_CUB), "Piper Cub".to_string())]
        .into_iter()
        .collect()
}

/// Little-endian body builder.
#[derive(Debug, Default, Clone)]
pub struct Body {
    bytes: Vec<u8>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn word(mut self, value: i32) -> Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn words(self, values: &[i32]) -> Self {
        values.iter().fold(self, |body, &value| body.word(value))
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.word(text.len() as i32).raw(text.as_bytes())
    }

    pub fn guid(self, id: u128) -> Self {
        self.raw(&to_wire_bytes(&Uuid::from_u128(id)))
    }

    /// A set element: tag reference, body length, body.
    pub fn set(self, tag_ref: i32, body: Body) -> Self {
        self.word(tag_ref)
            .word(body.bytes.len() as i32)
            .raw(&body.bytes)
    }
}

/// Full stream: signature, header words (slot 6 derived from `tags`),
/// tag table and body.
pub fn stream(header: [i32; HEADER_INTS], tags: &[(u128, i32)], body: Body) -> Vec<u8> {
    let mut header = header;
    header[TAG_COUNT_SLOT] = tags.len() as i32 + 1;
    let mut out = SPB_MAGIC.to_le_bytes().to_vec();
    for value in header {
        out.extend_from_slice(&value.to_le_bytes());
    }
    for &(id, flag) in tags {
        out.extend_from_slice(&to_wire_bytes(&Uuid::from_u128(id)));
        out.extend_from_slice(&flag.to_le_bytes());
    }
    out.extend_from_slice(&body.bytes);
    out
}

/// Offset of the first body byte for a stream with `tags` tag records.
pub fn body_offset(tags: usize) -> u64 {
    (2 + 4 * HEADER_INTS + 20 * tags) as u64
}

pub const HEADER: [i32; HEADER_INTS] = [3, 1, 4, 1, 5, 9, 0, 2, 6, 5, 3, 5];
