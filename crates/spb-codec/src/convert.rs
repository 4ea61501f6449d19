//! File-level conversions between `.spb` streams and XML trees.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Result, SpbError};
use crate::metadata::{RoundTripMetadata, metadata_path_for};
use crate::xml::{parse_document, to_xml_string};

/// Counts reported after a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Size of the binary stream read or written.
    pub bytes: usize,
    pub elements: usize,
    pub tags: usize,
    pub sets: usize,
}

/// Outcome of a decode → XML → encode cycle over one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTripReport {
    pub original_len: usize,
    pub encoded_len: usize,
    /// First offset where the re-encoded stream differs, if any.
    pub first_difference: Option<usize>,
}

impl RoundTripReport {
    pub fn is_exact(&self) -> bool {
        self.first_difference.is_none()
    }
}

/// Decode `spb` into `xml` and write the side-channel next to it.
pub fn decompile_file(decoder: &Decoder<'_>, spb: &Path, xml: &Path) -> Result<ConversionSummary> {
    let bytes = fs::read(spb)?;
    let decoded = decoder.decode(&bytes)?;
    let text = to_xml_string(&decoded.document)?;

    write_atomic(xml, text.as_bytes())?;
    let meta_path = metadata_path_for(xml);
    write_atomic(&meta_path, decoded.metadata.to_json()?.as_bytes())?;
    info!(
        input = %spb.display(),
        output = %xml.display(),
        meta = %meta_path.display(),
        "decompiled"
    );

    Ok(ConversionSummary {
        bytes: bytes.len(),
        elements: decoded.document.element_count(),
        tags: decoded.metadata.tags.len(),
        sets: decoded.metadata.sets.len(),
    })
}

/// Encode `xml` with the side-channel at `meta` into `spb`.
///
/// `spb` is only replaced once the whole encode has succeeded.
pub fn compile_file(
    encoder: &Encoder<'_>,
    xml: &Path,
    meta: &Path,
    spb: &Path,
) -> Result<ConversionSummary> {
    let metadata = RoundTripMetadata::read_from(meta)?;
    let document = parse_document(&fs::read_to_string(xml)?)?;
    let bytes = encoder.encode(&document, &metadata)?;

    write_atomic(spb, &bytes)?;
    info!(input = %xml.display(), output = %spb.display(), "compiled");

    Ok(ConversionSummary {
        bytes: bytes.len(),
        elements: document.element_count(),
        tags: metadata.tags.len(),
        sets: metadata.sets.len(),
    })
}

/// Run a full decode → XML → side-channel → encode cycle in memory.
pub fn roundtrip_bytes(
    decoder: &Decoder<'_>,
    encoder: &Encoder<'_>,
    bytes: &[u8],
) -> Result<RoundTripReport> {
    let decoded = decoder.decode(bytes)?;
    let document = parse_document(&to_xml_string(&decoded.document)?)?;
    let metadata = RoundTripMetadata::from_json(&decoded.metadata.to_json()?)?;
    let encoded = encoder.encode(&document, &metadata)?;

    let first_difference = bytes
        .iter()
        .zip(&encoded)
        .position(|(a, b)| a != b)
        .or_else(|| (bytes.len() != encoded.len()).then_some(bytes.len().min(encoded.len())));
    Ok(RoundTripReport {
        original_len: bytes.len(),
        encoded_len: encoded.len(),
        first_difference,
    })
}

/// Write through a temporary file in the destination directory, then
/// rename over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(path).map_err(|e| SpbError::Io(e.error))?;
    Ok(())
}
