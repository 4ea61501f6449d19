//! Round-trip side-channel: everything a tree cannot carry but an encoder
//! needs to regenerate the original stream.
//!
//! Persisted as pretty JSON next to the tree document with a `.meta`
//! extension.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SpbError};

/// Stream signature, first two bytes (little-endian) of every file.
pub const SPB_MAGIC: u16 = 0xEBAC;
/// Number of 32-bit header integers following the signature.
pub const HEADER_INTS: usize = 12;
/// Header slot holding the tag table length (plus one).
pub const TAG_COUNT_SLOT: usize = 6;
pub const METADATA_VERSION: u32 = 1;

/// One tag table record, in stream order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub guid: Uuid,
    pub flag: i32,
}

/// One set body, in pre-order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetEntry {
    pub name: String,
    pub size: i32,
    /// Absolute offset of the first body byte.
    pub offset: u64,
    /// The body ended with an explicit 0 tag reference.
    #[serde(default)]
    pub terminated: bool,
    /// Item positions (0-based, terminator excluded) of the properties that
    /// became attributes, in attribute order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_slots: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTripMetadata {
    pub version: u32,
    pub file_type: u16,
    pub header: [i32; HEADER_INTS],
    pub tags: Vec<TagEntry>,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
    /// The top-level sibling list ended with an explicit 0 tag reference.
    #[serde(default)]
    pub terminated: bool,
    /// Hex of any bytes after the top-level terminator.
    #[serde(default)]
    pub trailer: String,
}

impl RoundTripMetadata {
    pub fn new(header: [i32; HEADER_INTS]) -> Self {
        Self {
            version: METADATA_VERSION,
            file_type: SPB_MAGIC,
            header,
            tags: Vec::new(),
            sets: Vec::new(),
            terminated: false,
            trailer: String::new(),
        }
    }

    /// Tag table length announced by a header (slot 6 counts one extra).
    pub fn announced_tag_count(header: &[i32; HEADER_INTS]) -> usize {
        usize::try_from(header[TAG_COUNT_SLOT].saturating_sub(1)).unwrap_or(0)
    }

    /// Check that the record can drive an encoder.
    pub fn validate(&self) -> Result<()> {
        if self.version != METADATA_VERSION {
            return Err(SpbError::missing_metadata(format!(
                "unsupported metadata version {}",
                self.version
            )));
        }
        if self.file_type != SPB_MAGIC {
            return Err(SpbError::missing_metadata(format!(
                "file type 0x{:04X} is not an SPB signature",
                self.file_type
            )));
        }
        let announced = Self::announced_tag_count(&self.header);
        if announced != self.tags.len() {
            return Err(SpbError::missing_metadata(format!(
                "header announces {announced} tag(s) but {} are recorded",
                self.tags.len()
            )));
        }
        self.trailer_bytes().map(|_| ())
    }

    pub fn trailer_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.trailer)
            .map_err(|e| SpbError::missing_metadata(format!("trailer is not hex: {e}")))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a persisted record.
    pub fn from_json(text: &str) -> Result<Self> {
        let meta: Self = serde_json::from_str(text)
            .map_err(|e| SpbError::missing_metadata(format!("unreadable metadata: {e}")))?;
        meta.validate()?;
        Ok(meta)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                SpbError::missing_metadata(format!("{} does not exist", path.display()))
            }
            _ => SpbError::missing_metadata(format!("{}: {e}", path.display())),
        })?;
        Self::from_json(&text)
    }
}

/// Side-channel path belonging to a tree document.
pub fn metadata_path_for(document: &Path) -> PathBuf {
    document.with_extension("meta")
}
