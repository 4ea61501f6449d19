//! Type codec table: per-primitive binary layout and canonical text form.
//!
//! Every decoder reads a fixed number of bytes (or a length prefix plus
//! payload for TEXT/MLTEXT) and renders locale-independent text. Every
//! encoder parses that text back and writes the same layout.

use spb_model::guid::{format_braced, from_wire_bytes, parse_guid, to_wire_bytes};
use spb_model::{EnumDef, PrimitiveType, PropertyDef};

use crate::cursor::ByteCursor;
use crate::error::{Location, Result, SpbError};
use crate::text::TextCodec;

/// One full turn of a packed angle fraction.
const ANGLE_SCALE: f64 = 4_294_967_296.0;

/// Fixed 3-decimal rendering with `.` as separator.
pub fn format_fixed3<T: Into<f64>>(value: T) -> String {
    format!("{:.3}", value.into())
}

/// Packed angle fraction to degrees.
pub fn angle_to_degrees(raw: u32) -> f64 {
    f64::from(raw) / ANGLE_SCALE * 360.0
}

/// Degrees to packed angle fraction, truncating (and saturating at the
/// `u32` range).
pub fn degrees_to_angle(degrees: f64) -> u32 {
    (degrees * ANGLE_SCALE / 360.0) as u32
}

/// Resolve a property's type name against the primitive catalogue.
pub fn resolve_type(property: &PropertyDef, at: &Location) -> Result<PrimitiveType> {
    property
        .type_def
        .primitive()
        .ok_or_else(|| SpbError::UnknownType {
            type_name: property.type_def.name.clone(),
            at: at.clone(),
        })
}

fn unsupported(ty: PrimitiveType, at: &Location) -> SpbError {
    SpbError::UnsupportedType {
        type_name: ty.as_str().to_string(),
        at: at.clone(),
    }
}

fn enum_table<'p>(property: &'p PropertyDef, at: &Location) -> Result<&'p EnumDef> {
    property
        .enum_def
        .as_ref()
        .ok_or_else(|| SpbError::MissingEnumDefinition {
            property: property.name.clone(),
            at: at.clone(),
        })
}

fn join<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Read one value of `property` at the cursor and render its text form.
pub fn decode_value(
    cursor: &mut ByteCursor<'_>,
    property: &PropertyDef,
    codec: &dyn TextCodec,
) -> Result<String> {
    let at = Location::Offset(cursor.position());
    let ty = resolve_type(property, &at)?;
    let text = match ty {
        PrimitiveType::Text | PrimitiveType::MlText => {
            let len = cursor.read_i32()?;
            if len <= 0 {
                String::new()
            } else {
                let payload_at = Location::Offset(cursor.position());
                let payload = cursor.read_bytes(len as usize)?;
                codec.decode(payload).map_err(|e| SpbError::TextCodec {
                    message: e.0,
                    at: payload_at,
                })?
            }
        }
        PrimitiveType::ULong => cursor.read_u32()?.to_string(),
        PrimitiveType::Long => cursor.read_i32()?.to_string(),
        PrimitiveType::Long2 => join(read_n(cursor, 2, ByteCursor::read_i32)?),
        PrimitiveType::Long4 => join(read_n(cursor, 4, ByteCursor::read_i32)?),
        PrimitiveType::Bool => {
            if cursor.read_i32()? == 1 { "true" } else { "false" }.to_string()
        }
        PrimitiveType::Float => format_fixed3(cursor.read_f32()?),
        PrimitiveType::Float2 | PrimitiveType::Float4 => {
            let count = if ty == PrimitiveType::Float2 { 2 } else { 4 };
            let values = read_n(cursor, count, ByteCursor::read_f32)?;
            join(values.into_iter().map(format_fixed3))
        }
        PrimitiveType::Double => format_fixed3(cursor.read_f64()?),
        PrimitiveType::Byte4 => join(cursor.read_array::<4>()?),
        PrimitiveType::Guid => format_braced(&from_wire_bytes(cursor.read_array()?)),
        PrimitiveType::Pbh | PrimitiveType::Pbh32 => {
            let angles = read_n(cursor, 3, ByteCursor::read_u32)?;
            cursor.read_bytes(4)?;
            join(angles.into_iter().map(|raw| format_fixed3(angle_to_degrees(raw))))
        }
        PrimitiveType::Enum => {
            let table = enum_table(property, &at)?;
            let index = cursor.read_i32()?;
            table
                .label(index)
                .ok_or_else(|| SpbError::InvalidEnumIndex {
                    index,
                    enum_name: table.name.clone(),
                    at: at.clone(),
                })?
                .to_string()
        }
        PrimitiveType::Lla => {
            let lat = cursor.read_i64()?;
            let lon = cursor.read_i64()?;
            let alt_fraction = cursor.read_u32()?;
            let alt = cursor.read_i32()?;
            format!("{lat},{lon},{alt_fraction},{alt}")
        }
        PrimitiveType::FileTime => return Err(unsupported(ty, &at)),
    };
    Ok(text)
}

fn read_n<'a, T>(
    cursor: &mut ByteCursor<'a>,
    count: usize,
    read: fn(&mut ByteCursor<'a>) -> Result<T>,
) -> Result<Vec<T>> {
    (0..count).map(|_| read(cursor)).collect()
}

/// Parse `text` as a value of `property` and append its binary layout.
pub fn encode_value(
    out: &mut Vec<u8>,
    property: &PropertyDef,
    text: &str,
    codec: &dyn TextCodec,
    at: &Location,
) -> Result<()> {
    let ty = resolve_type(property, at)?;
    let name = ty.as_str();
    match ty {
        PrimitiveType::Text | PrimitiveType::MlText => {
            let payload = codec.encode(text);
            let len = i32::try_from(payload.len()).map_err(|_| {
                SpbError::invalid_value(name, format!("{} bytes", payload.len()), at)
            })?;
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(&payload);
        }
        PrimitiveType::ULong => out.extend_from_slice(&parse::<u32>(text, name, at)?.to_le_bytes()),
        PrimitiveType::Long => out.extend_from_slice(&parse::<i32>(text, name, at)?.to_le_bytes()),
        PrimitiveType::Long2 | PrimitiveType::Long4 => {
            let count = if ty == PrimitiveType::Long2 { 2 } else { 4 };
            for field in fields(text, count, name, at)? {
                out.extend_from_slice(&parse::<i32>(field, name, at)?.to_le_bytes());
            }
        }
        PrimitiveType::Bool => {
            let flag: i32 = (text == "true").into();
            out.extend_from_slice(&flag.to_le_bytes());
        }
        PrimitiveType::Float | PrimitiveType::Float2 | PrimitiveType::Float4 => {
            let count = match ty {
                PrimitiveType::Float => 1,
                PrimitiveType::Float2 => 2,
                _ => 4,
            };
            for field in fields(text, count, name, at)? {
                out.extend_from_slice(&parse::<f32>(field, name, at)?.to_le_bytes());
            }
        }
        PrimitiveType::Double => {
            out.extend_from_slice(&parse::<f64>(text, name, at)?.to_le_bytes());
        }
        PrimitiveType::Byte4 => {
            for field in fields(text, 4, name, at)? {
                out.push(parse::<u8>(field, name, at)?);
            }
        }
        PrimitiveType::Guid => {
            let guid = parse_guid(text).map_err(|_| SpbError::invalid_value(name, text, at))?;
            out.extend_from_slice(&to_wire_bytes(&guid));
        }
        PrimitiveType::Pbh | PrimitiveType::Pbh32 => {
            for field in fields(text, 3, name, at)? {
                let degrees = parse::<f64>(field, name, at)?;
                out.extend_from_slice(&degrees_to_angle(degrees).to_le_bytes());
            }
            out.extend_from_slice(&[0u8; 4]);
        }
        PrimitiveType::Enum => {
            let table = enum_table(property, at)?;
            let index = table
                .index_of(text)
                .ok_or_else(|| SpbError::InvalidEnumValue {
                    value: text.to_string(),
                    enum_name: table.name.clone(),
                    at: at.clone(),
                })?;
            out.extend_from_slice(&index.to_le_bytes());
        }
        PrimitiveType::Lla => {
            let parts = fields(text, 4, name, at)?;
            out.extend_from_slice(&parse::<i64>(parts[0], name, at)?.to_le_bytes());
            out.extend_from_slice(&parse::<i64>(parts[1], name, at)?.to_le_bytes());
            out.extend_from_slice(&parse::<u32>(parts[2], name, at)?.to_le_bytes());
            out.extend_from_slice(&parse::<i32>(parts[3], name, at)?.to_le_bytes());
        }
        PrimitiveType::FileTime => return Err(unsupported(ty, at)),
    }
    Ok(())
}

fn fields<'t>(text: &'t str, count: usize, type_name: &str, at: &Location) -> Result<Vec<&'t str>> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != count {
        return Err(SpbError::invalid_value(type_name, text, at));
    }
    Ok(parts)
}

fn parse<T: std::str::FromStr>(text: &str, type_name: &str, at: &Location) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| SpbError::invalid_value(type_name, text, at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Utf8Codec;
    use spb_model::TypeDef;
    use uuid::Uuid;

    fn prop(ty: &str) -> PropertyDef {
        PropertyDef::new(Uuid::from_u128(9), "Value", TypeDef::new(ty))
    }

    fn decode(ty: &str, bytes: &[u8]) -> Result<String> {
        let mut cursor = ByteCursor::new(bytes);
        let text = decode_value(&mut cursor, &prop(ty), &Utf8Codec)?;
        assert!(cursor.is_empty(), "{ty} left {} byte(s)", cursor.remaining());
        Ok(text)
    }

    fn encode(ty: &str, text: &str) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        encode_value(&mut out, &prop(ty), text, &Utf8Codec, &Location::Path("/Value".into()))?;
        Ok(out)
    }

    #[test]
    fn integers() {
        assert_eq!(decode("LONG", &(-7i32).to_le_bytes()).unwrap(), "-7");
        assert_eq!(decode("ULONG", &u32::MAX.to_le_bytes()).unwrap(), "4294967295");
        let mut long2 = Vec::new();
        long2.extend_from_slice(&3i32.to_le_bytes());
        long2.extend_from_slice(&(-4i32).to_le_bytes());
        assert_eq!(decode("LONG2", &long2).unwrap(), "3,-4");
        assert_eq!(encode("LONG2", "3, -4").unwrap(), long2);
        assert!(matches!(
            encode("LONG2", "3"),
            Err(SpbError::InvalidValue { .. })
        ));
    }

    #[test]
    fn text_with_length_prefix() {
        let bytes = [5, 0, 0, 0, b'H', b'e', b'l', b'l', b'o'];
        assert_eq!(decode("TEXT", &bytes).unwrap(), "Hello");
        assert_eq!(encode("MLTEXT", "Hello").unwrap(), bytes);
        assert_eq!(decode("TEXT", &(-3i32).to_le_bytes()).unwrap(), "");
        assert_eq!(encode("TEXT", "").unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn text_codec_failure_reports_payload_offset() {
        let err = decode("TEXT", &[2, 0, 0, 0, 0xFF, 0xFE]).unwrap_err();
        assert!(matches!(err, SpbError::TextCodec { at: Location::Offset(4), .. }));
    }

    #[test]
    fn bool_only_one_is_true() {
        assert_eq!(decode("BOOL", &1i32.to_le_bytes()).unwrap(), "true");
        assert_eq!(decode("BOOL", &2i32.to_le_bytes()).unwrap(), "false");
        assert_eq!(encode("BOOL", "true").unwrap(), 1i32.to_le_bytes());
        assert_eq!(encode("BOOL", "yes").unwrap(), 0i32.to_le_bytes());
        assert_eq!(encode("BOOL", "True").unwrap(), 0i32.to_le_bytes());
        assert_eq!(encode("BOOL", " true").unwrap(), 0i32.to_le_bytes());
    }

    #[test]
    fn floats_use_three_decimals() {
        assert_eq!(decode("FLOAT", &1.5f32.to_le_bytes()).unwrap(), "1.500");
        assert_eq!(decode("DOUBLE", &(-2.25f64).to_le_bytes()).unwrap(), "-2.250");
        let mut float2 = Vec::new();
        float2.extend_from_slice(&0.25f32.to_le_bytes());
        float2.extend_from_slice(&100.0f32.to_le_bytes());
        assert_eq!(decode("FLOAT2", &float2).unwrap(), "0.250,100.000");
        assert_eq!(encode("FLOAT2", "0.250,100.000").unwrap(), float2);
    }

    #[test]
    fn byte4_and_guid() {
        assert_eq!(decode("BYTE4", &[1, 2, 254, 255]).unwrap(), "1,2,254,255");
        assert_eq!(encode("BYTE4", "1,2,254,255").unwrap(), [1, 2, 254, 255]);
        assert!(encode("BYTE4", "1,2,3,256").is_err());

        let text = "{00112233-4455-6677-8899-AABBCCDDEEFF}";
        let bytes = encode("GUID", text).unwrap();
        assert_eq!(bytes[..4], [0x33, 0x22, 0x11, 0x00]);
        assert_eq!(decode("GUID", &bytes).unwrap(), text);
    }

    #[test]
    fn pbh_scales_and_zeroes_padding() {
        let mut bytes = Vec::new();
        for raw in [0u32, 1 << 30, 1 << 31] {
            bytes.extend_from_slice(&raw.to_le_bytes());
        }
        bytes.extend_from_slice(&[9, 9, 9, 9]);
        assert_eq!(decode("PBH", &bytes).unwrap(), "0.000,90.000,180.000");

        let encoded = encode("PBH32", "0.000,90.000,180.000").unwrap();
        assert_eq!(encoded[..12], bytes[..12]);
        assert_eq!(encoded[12..], [0, 0, 0, 0]);
    }

    #[test]
    fn enum_by_index() {
        let table = EnumDef::new("Direction", ["North", "East"]).unwrap();
        let property = prop("ENUM").with_enum(table);
        let mut cursor = ByteCursor::new(&[1, 0, 0, 0]);
        assert_eq!(decode_value(&mut cursor, &property, &Utf8Codec).unwrap(), "East");

        let mut cursor = ByteCursor::new(&[2, 0, 0, 0]);
        assert!(matches!(
            decode_value(&mut cursor, &property, &Utf8Codec),
            Err(SpbError::InvalidEnumIndex { index: 2, .. })
        ));

        let at = Location::Path("/Heading".into());
        let mut out = Vec::new();
        encode_value(&mut out, &property, "North", &Utf8Codec, &at).unwrap();
        assert_eq!(out, [0, 0, 0, 0]);
        assert!(matches!(
            encode_value(&mut out, &property, "Up", &Utf8Codec, &at),
            Err(SpbError::InvalidEnumValue { .. })
        ));
        assert!(matches!(
            decode("ENUM", &[0, 0, 0, 0]),
            Err(SpbError::MissingEnumDefinition { .. })
        ));
    }

    #[test]
    fn lla_keeps_raw_fields() {
        let text = "-9223372036854775808,42,4294967295,-1";
        let bytes = encode("LLA", text).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(decode("LLA", &bytes).unwrap(), text);
    }

    #[test]
    fn unknown_and_unsupported_types() {
        assert!(matches!(
            decode("FILETIME", &[0; 8]),
            Err(SpbError::UnsupportedType { .. })
        ));
        let mut cursor = ByteCursor::new(&[0; 8]);
        cursor.read_i32().unwrap();
        let err = decode_value(&mut cursor, &prop("VECTOR"), &Utf8Codec).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"unknown type VECTOR at offset 4 (0x4)");
    }

    #[test]
    fn truncated_value_is_eof() {
        assert!(matches!(
            decode("LONG2", &[0, 0, 0, 0, 1]),
            Err(SpbError::UnexpectedEof { offset: 4, needed: 3 })
        ));
    }
}
