//! Heuristic byte scanner: finds length-prefixed text fragments in an
//! arbitrary buffer without any schema.
//!
//! Best effort only. A candidate the text codec rejects is skipped and the
//! scan resumes one byte further on.

use std::fmt;

use crate::text::{TextCodec, hex_dump};

/// A candidate text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Offset of the first payload byte (just past the length prefix).
    pub offset: usize,
    pub text: String,
    /// Length prefix plus payload.
    pub raw: Vec<u8>,
}

impl Fragment {
    pub fn hex(&self) -> String {
        hex_dump(&self.raw)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Offset: {:X} - {} - {}", self.offset, self.text, self.hex())
    }
}

/// Lazy iterator over the fragments of a buffer.
pub struct Scanner<'a> {
    data: &'a [u8],
    codec: &'a dyn TextCodec,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(data: &'a [u8], codec: &'a dyn TextCodec) -> Self {
        Self {
            data,
            codec,
            pos: 0,
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        while self.pos + 4 <= self.data.len() {
            let start = self.pos;
            let prefix = &self.data[start..start + 4];
            let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
            let available = self.data.len() - start - 4;
            if len == 0 || len > available {
                self.pos += 1;
                continue;
            }
            let end = start + 4 + len;
            match self.codec.decode(&self.data[start + 4..end]) {
                Ok(text) => {
                    self.pos = end;
                    return Some(Fragment {
                        offset: start + 4,
                        text,
                        raw: self.data[start..end].to_vec(),
                    });
                }
                Err(_) => self.pos += 1,
            }
        }
        None
    }
}

/// Collect every fragment of `data`.
pub fn scan(data: &[u8], codec: &dyn TextCodec) -> Vec<Fragment> {
    Scanner::new(data, codec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Utf8Codec;

    #[test]
    fn finds_fragments_between_noise() {
        let mut data = vec![0xFF, 0xFF];
        data.extend_from_slice(&[2, 0, 0, 0, b'H', b'i']);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(&[3, 0, 0, 0, b'a', b'b', b'c']);

        let fragments = scan(&data, &Utf8Codec);
        let texts: Vec<_> = fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, ["Hi", "abc"]);
        assert_eq!(fragments[0].offset, 6);
        insta::assert_snapshot!(fragments[0].to_string(), @"Offset: 6 - Hi - 02 00 00 00 48 69");
    }

    #[test]
    fn rejected_payloads_do_not_stop_the_scan() {
        let mut data = vec![2, 0, 0, 0, 0xC3, 0x28];
        data.extend_from_slice(&[1, 0, 0, 0, b'Z']);
        let fragments = scan(&data, &Utf8Codec);
        assert_eq!(fragments.last().map(|f| f.text.as_str()), Some("Z"));
        assert!(fragments.iter().all(|f| f.offset != 4));
    }

    #[test]
    fn short_buffers_yield_nothing() {
        assert!(scan(&[], &Utf8Codec).is_empty());
        assert!(scan(&[9, 0, 0], &Utf8Codec).is_empty());
        assert!(scan(&[9, 0, 0, 0, b'x'], &Utf8Codec).is_empty());
    }
}
