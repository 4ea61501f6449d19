//! GUID conversions between the on-disk byte layout and the braced text form.
//!
//! SPB streams store GUIDs in the mixed-endian layout (first three fields
//! little-endian, last eight bytes as-is). Text renders as upper-case
//! braced `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}`.

use uuid::Uuid;

use crate::error::{ModelError, Result};

/// Width of a GUID on the wire.
pub const GUID_LEN: usize = 16;

/// Build a GUID from its 16 on-disk bytes.
pub fn from_wire_bytes(bytes: [u8; GUID_LEN]) -> Uuid {
    Uuid::from_bytes_le(bytes)
}

/// The 16 on-disk bytes of a GUID.
pub fn to_wire_bytes(guid: &Uuid) -> [u8; GUID_LEN] {
    guid.to_bytes_le()
}

/// Render a GUID as upper-case braced text.
pub fn format_braced(guid: &Uuid) -> String {
    let mut buffer = Uuid::encode_buffer();
    guid.braced().encode_upper(&mut buffer).to_string()
}

/// Parse a GUID in braced, hyphenated, simple or URN form (case-insensitive).
pub fn parse_guid(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text.trim()).map_err(|_| ModelError::InvalidGuid(text.to_string()))
}
