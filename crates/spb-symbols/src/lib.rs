//! Symbol catalogue sources for the SPB codec.
//!
//! Loads the XML definition documents that describe sets, properties and
//! enumerations into an immutable [`SymbolBank`](spb_model::SymbolBank),
//! and the optional model-name table used to annotate decoded GUIDs.

#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod models;

pub use crate::error::SymbolsError;
pub use crate::loader::{
    DocumentSummary, load_definition_file, load_definition_str, load_symbol_dir,
    load_symbol_dirs,
};
pub use crate::models::load_model_names;
