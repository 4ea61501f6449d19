//! Definition model for SPB property containers.
//!
//! SPB files reference externally defined symbols by GUID. A symbol is
//! either a [`SetDef`] (a container whose body nests other symbols) or a
//! [`PropertyDef`] (a leaf carrying one value of a [`PrimitiveType`]).
//! The [`SymbolBank`] resolves both by GUID and by name.

#![deny(unsafe_code)]

pub mod bank;
pub mod definition;
pub mod error;
pub mod guid;
pub mod models;

pub use bank::{SymbolBank, SymbolBankBuilder};
pub use definition::{
    Definition, EnumDef, PrimitiveType, PropertyDef, SetDef, SymbolRef, TypeDef,
};
pub use error::{ModelError, Result};
pub use models::ModelNames;
