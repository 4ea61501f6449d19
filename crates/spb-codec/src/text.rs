//! Byte ↔ string transform for TEXT/MLTEXT payloads, plus the hex helpers
//! the command line uses to inspect single length-prefixed fields.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TextCodecError(pub String);

/// Deterministic, invertible transform between payload bytes and text.
pub trait TextCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<String, TextCodecError>;
    fn encode(&self, text: &str) -> Vec<u8>;
}

/// Strict UTF-8: invalid sequences are rejected rather than replaced, so a
/// decoded string always re-encodes to the original bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl TextCodec for Utf8Codec {
    fn decode(&self, bytes: &[u8]) -> Result<String, TextCodecError> {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| TextCodecError(e.to_string()))
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        text.as_bytes().to_vec()
    }
}

/// Upper-case hex bytes separated by single spaces (`0D 0A FF`).
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(1)
        .map(hex::encode_upper)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Encode `text` as a length-prefixed field and render it with [`hex_dump`].
pub fn encode_hex_field(codec: &dyn TextCodec, text: &str) -> String {
    let payload = codec.encode(text);
    let mut field = Vec::with_capacity(payload.len() + 4);
    field.extend_from_slice(&(payload.len() as i32).to_le_bytes());
    field.extend_from_slice(&payload);
    hex_dump(&field)
}

/// Decode a length-prefixed field given as whitespace separated hex bytes.
///
/// A length of zero or less yields empty text.
pub fn decode_hex_field(codec: &dyn TextCodec, hex_text: &str) -> Result<String, TextCodecError> {
    let mut bytes = Vec::new();
    for token in hex_text.split_whitespace() {
        let decoded =
            hex::decode(token).map_err(|e| TextCodecError(format!("bad hex '{token}': {e}")))?;
        bytes.extend_from_slice(&decoded);
    }
    if bytes.len() < 4 {
        return Err(TextCodecError(format!(
            "field needs a 4-byte length prefix, got {} byte(s)",
            bytes.len()
        )));
    }
    let len = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if len <= 0 {
        return Ok(String::new());
    }
    let payload = &bytes[4..];
    let take = payload.len().min(len as usize);
    codec.decode(&payload[..take])
}
