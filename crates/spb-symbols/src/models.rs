//! CSV loader for the GUID → model name table (`guid,name` header).

use std::path::Path;

use spb_model::ModelNames;
use spb_model::guid::parse_guid;
use tracing::debug;

use crate::error::SymbolsError;

pub fn load_model_names(path: &Path) -> Result<ModelNames, SymbolsError> {
    let bytes = std::fs::read(path).map_err(|e| SymbolsError::io(path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());
    let headers = reader
        .headers()
        .map_err(|e| SymbolsError::Csv {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_matches('\u{feff}').eq_ignore_ascii_case(name))
            .ok_or_else(|| SymbolsError::Csv {
                path: path.to_path_buf(),
                message: format!("missing {name} column"),
            })
    };
    let guid_col = column("guid")?;
    let name_col = column("name")?;

    let mut names = ModelNames::new();
    for row in reader.records() {
        let row = row.map_err(|e| SymbolsError::Csv {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let Some(name) = row.get(name_col).filter(|s| !s.is_empty()) else {
            continue;
        };
        let guid_text = row.get(guid_col).unwrap_or_default();
        let guid = parse_guid(guid_text).map_err(|e| SymbolsError::model(path, e))?;
        names.insert(guid, name);
    }

    debug!(path = %path.display(), entries = names.len(), "model names loaded");
    Ok(names)
}
