//! Error types for SPB conversion.

use std::fmt;

use thiserror::Error;

/// Where in a conversion job an error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Byte offset in the binary stream (decode side).
    Offset(u64),
    /// Element path in the tree, `/Name[position]` per level (encode side).
    Path(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Offset(offset) => write!(f, "offset {offset} (0x{offset:X})"),
            Location::Path(path) => write!(f, "element {path}"),
        }
    }
}

impl From<u64> for Location {
    fn from(value: u64) -> Self {
        Location::Offset(value)
    }
}

/// Errors that abort an SPB decode or encode job.
#[derive(Debug, Error)]
pub enum SpbError {
    /// The file does not start with the SPB magic.
    #[error("invalid SPB signature 0x{found:04X} (expected 0xEBAC)")]
    InvalidSignature { found: u16 },

    /// A tag table GUID is not in the symbol catalogue.
    #[error("symbol {guid} is not in the catalogue at {at}")]
    UnboundSymbol { guid: String, at: Location },

    /// A tag reference outside the tag table.
    #[error("tag index {index} outside [0, {tag_count}) at {at}")]
    InvalidTagIndex {
        index: i64,
        tag_count: usize,
        at: Location,
    },

    /// A set body did not end exactly at its declared length.
    #[error("set {set} body should end at offset {expected_end} but parsing stopped at {actual}")]
    SetBoundsViolation {
        set: String,
        expected_end: u64,
        actual: u64,
    },

    /// A property uses a type name outside the primitive catalogue.
    #[error("unknown type {type_name} at {at}")]
    UnknownType { type_name: String, at: Location },

    /// A known type with no defined encoding.
    #[error("type {type_name} is not supported at {at}")]
    UnsupportedType { type_name: String, at: Location },

    #[error("enum index {index} out of range for {enum_name} at {at}")]
    InvalidEnumIndex {
        index: i32,
        enum_name: String,
        at: Location,
    },

    #[error("value '{value}' is not a label of {enum_name} at {at}")]
    InvalidEnumValue {
        value: String,
        enum_name: String,
        at: Location,
    },

    #[error("enum property {property} has no enumeration table at {at}")]
    MissingEnumDefinition { property: String, at: Location },

    /// A tree element that names no symbol of the tag table.
    #[error("unknown element {name} at {at}")]
    UnknownElement { name: String, at: Location },

    /// Sets (or XML elements) nested past the configured limit.
    #[error("nesting deeper than {limit} levels at {at}")]
    NestingTooDeep { limit: usize, at: Location },

    #[error("round-trip metadata unavailable: {reason}")]
    MissingRoundTripMetadata { reason: String },

    /// Tree text that does not parse as the property's type.
    #[error("invalid {type_name} value '{value}' at {at}")]
    InvalidValue {
        type_name: String,
        value: String,
        at: Location,
    },

    #[error("unexpected end of stream at offset {offset}: {needed} more byte(s) required")]
    UnexpectedEof { offset: u64, needed: usize },

    #[error("text codec rejected payload at {at}: {message}")]
    TextCodec { message: String, at: Location },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for SPB operations.
pub type Result<T> = std::result::Result<T, SpbError>;

impl SpbError {
    pub fn missing_metadata(reason: impl Into<String>) -> Self {
        Self::MissingRoundTripMetadata {
            reason: reason.into(),
        }
    }

    pub fn invalid_value(
        type_name: impl Into<String>,
        value: impl Into<String>,
        at: &Location,
    ) -> Self {
        Self::InvalidValue {
            type_name: type_name.into(),
            value: value.into(),
            at: at.clone(),
        }
    }

    pub fn unknown_element(name: impl Into<String>, at: &Location) -> Self {
        Self::UnknownElement {
            name: name.into(),
            at: at.clone(),
        }
    }

    /// Location carried by the error, if any.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::UnboundSymbol { at, .. }
            | Self::InvalidTagIndex { at, .. }
            | Self::UnknownType { at, .. }
            | Self::UnsupportedType { at, .. }
            | Self::InvalidEnumIndex { at, .. }
            | Self::InvalidEnumValue { at, .. }
            | Self::MissingEnumDefinition { at, .. }
            | Self::UnknownElement { at, .. }
            | Self::InvalidValue { at, .. }
            | Self::NestingTooDeep { at, .. }
            | Self::TextCodec { at, .. } => Some(at),
            _ => None,
        }
    }
}
