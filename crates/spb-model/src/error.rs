use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("symbol name must not be empty (id {0})")]
    EmptyName(Uuid),
    #[error("duplicate symbol id {id} ({existing} and {duplicate})")]
    DuplicateSymbol {
        id: Uuid,
        existing: String,
        duplicate: String,
    },
    #[error("enum {enum_name} declares label '{label}' more than once")]
    DuplicateEnumLabel { enum_name: String, label: String },
    #[error("invalid GUID '{0}'")]
    InvalidGuid(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
