//! SPB tag-stream codec.
//!
//! Converts SPB binary streams to an ordered XML tree and back, bit-exact.
//! Decoding yields the tree plus a [`RoundTripMetadata`] side-channel that
//! carries what the tree cannot (header words, tag table order and flags,
//! explicit terminators). Encoding replays that side-channel.
//!
//! # Example
//!
//! ```no_run
//! use spb_codec::{Decoder, Encoder};
//! use spb_model::SymbolBank;
//!
//! # fn run(bank: &SymbolBank, bytes: &[u8]) -> spb_codec::Result<()> {
//! let decoded = Decoder::new(bank).decode(bytes)?;
//! let xml = spb_codec::to_xml_string(&decoded.document)?;
//! let tree = spb_codec::parse_document(&xml)?;
//! let encoded = Encoder::new(bank).encode(&tree, &decoded.metadata)?;
//! assert_eq!(encoded, bytes);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod convert;
pub mod cursor;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod metadata;
pub mod options;
pub mod scan;
pub mod text;
pub mod tree;
pub mod value;
pub mod xml;

pub use convert::{
    ConversionSummary, RoundTripReport, compile_file, decompile_file, roundtrip_bytes,
    write_atomic,
};
pub use decoder::{Decoded, Decoder};
pub use encoder::Encoder;
pub use error::{Location, Result, SpbError};
pub use metadata::{RoundTripMetadata, SPB_MAGIC, SetEntry, TagEntry, metadata_path_for};
pub use options::{DecoderOptions, EncoderOptions};
pub use scan::{Fragment, Scanner, scan};
pub use text::{TextCodec, TextCodecError, Utf8Codec, decode_hex_field, encode_hex_field, hex_dump};
pub use tree::{Document, Element, Node};
pub use xml::{parse_document, read_document, to_xml_string, write_document};
