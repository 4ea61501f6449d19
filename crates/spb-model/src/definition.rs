//! Symbol definitions: sets (containers), properties (typed leaves), their
//! primitive types and enumeration tables.

use std::fmt;

use uuid::Uuid;

use crate::error::{ModelError, Result};

/// Reference to the symbol that establishes a naming context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolRef {
    pub id: Uuid,
    pub name: String,
}

impl SymbolRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A nestable container symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDef {
    pub id: Uuid,
    pub name: String,
    /// Symbol establishing the nesting/naming context of this set.
    pub parent: Option<SymbolRef>,
}

impl SetDef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: SymbolRef) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn symbol_ref(&self) -> SymbolRef {
        SymbolRef::new(self.id, self.name.clone())
    }
}

/// A typed leaf symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub id: Uuid,
    pub name: String,
    pub type_def: TypeDef,
    /// Label table, only meaningful for ENUM properties.
    pub enum_def: Option<EnumDef>,
    /// Serialize the value as an attribute of the enclosing element rather
    /// than as a child element.
    pub is_attribute: bool,
    /// Symbol that originally declared this property.
    pub context: Option<SymbolRef>,
}

impl PropertyDef {
    pub fn new(id: Uuid, name: impl Into<String>, type_def: TypeDef) -> Self {
        Self {
            id,
            name: name.into(),
            type_def,
            enum_def: None,
            is_attribute: false,
            context: None,
        }
    }

    #[must_use]
    pub fn with_enum(mut self, enum_def: EnumDef) -> Self {
        self.enum_def = Some(enum_def);
        self
    }

    #[must_use]
    pub fn as_attribute(mut self) -> Self {
        self.is_attribute = true;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: SymbolRef) -> Self {
        self.context = Some(context);
        self
    }
}

/// Closed variant over the two kinds of symbol a tag can reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Set(SetDef),
    Property(PropertyDef),
}

impl Definition {
    pub fn id(&self) -> Uuid {
        match self {
            Definition::Set(set) => set.id,
            Definition::Property(prop) => prop.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Definition::Set(set) => &set.name,
            Definition::Property(prop) => &prop.name,
        }
    }

    /// The symbol whose name qualifies this one when it is used outside of
    /// its own context.
    pub fn context(&self) -> Option<&SymbolRef> {
        match self {
            Definition::Set(set) => set.parent.as_ref(),
            Definition::Property(prop) => prop.context.as_ref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Definition::Set(_) => "set",
            Definition::Property(_) => "property",
        }
    }
}

impl From<SetDef> for Definition {
    fn from(value: SetDef) -> Self {
        Definition::Set(value)
    }
}

impl From<PropertyDef> for Definition {
    fn from(value: PropertyDef) -> Self {
        Definition::Property(value)
    }
}

/// Type tag of a property as named in the definition documents.
///
/// The name is kept verbatim so that documents may mention types this
/// crate does not know; resolution to a [`PrimitiveType`] happens when a
/// value is actually read or written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDef {
    pub name: String,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn primitive(&self) -> Option<PrimitiveType> {
        PrimitiveType::from_name(&self.name)
    }
}

impl From<PrimitiveType> for TypeDef {
    fn from(value: PrimitiveType) -> Self {
        Self::new(value.as_str())
    }
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The fixed catalogue of primitive encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Text,
    MlText,
    ULong,
    Long,
    Long2,
    Long4,
    Bool,
    Float,
    Float2,
    Float4,
    Double,
    Byte4,
    Guid,
    Pbh,
    Pbh32,
    Enum,
    Lla,
    FileTime,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 18] = [
        PrimitiveType::Text,
        PrimitiveType::MlText,
        PrimitiveType::ULong,
        PrimitiveType::Long,
        PrimitiveType::Long2,
        PrimitiveType::Long4,
        PrimitiveType::Bool,
        PrimitiveType::Float,
        PrimitiveType::Float2,
        PrimitiveType::Float4,
        PrimitiveType::Double,
        PrimitiveType::Byte4,
        PrimitiveType::Guid,
        PrimitiveType::Pbh,
        PrimitiveType::Pbh32,
        PrimitiveType::Enum,
        PrimitiveType::Lla,
        PrimitiveType::FileTime,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Text => "TEXT",
            PrimitiveType::MlText => "MLTEXT",
            PrimitiveType::ULong => "ULONG",
            PrimitiveType::Long => "LONG",
            PrimitiveType::Long2 => "LONG2",
            PrimitiveType::Long4 => "LONG4",
            PrimitiveType::Bool => "BOOL",
            PrimitiveType::Float => "FLOAT",
            PrimitiveType::Float2 => "FLOAT2",
            PrimitiveType::Float4 => "FLOAT4",
            PrimitiveType::Double => "DOUBLE",
            PrimitiveType::Byte4 => "BYTE4",
            PrimitiveType::Guid => "GUID",
            PrimitiveType::Pbh => "PBH",
            PrimitiveType::Pbh32 => "PBH32",
            PrimitiveType::Enum => "ENUM",
            PrimitiveType::Lla => "LLA",
            PrimitiveType::FileTime => "FILETIME",
        }
    }

    /// Resolve a type name exactly as written in definition documents.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|ty| ty.as_str() == name)
    }

    /// Encoded width in bytes; `None` for length-prefixed text.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            PrimitiveType::Text | PrimitiveType::MlText => None,
            PrimitiveType::ULong
            | PrimitiveType::Long
            | PrimitiveType::Bool
            | PrimitiveType::Float
            | PrimitiveType::Byte4
            | PrimitiveType::Enum => Some(4),
            PrimitiveType::Long2 | PrimitiveType::Float2 | PrimitiveType::Double => Some(8),
            PrimitiveType::FileTime => Some(8),
            PrimitiveType::Long4
            | PrimitiveType::Float4
            | PrimitiveType::Guid
            | PrimitiveType::Pbh
            | PrimitiveType::Pbh32 => Some(16),
            PrimitiveType::Lla => Some(24),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered enumeration labels; label `i` encodes as integer `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub name: String,
    labels: Vec<String>,
}

impl EnumDef {
    /// Build an enumeration, rejecting duplicate labels.
    pub fn new<I, S>(name: impl Into<String>, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        for (idx, label) in labels.iter().enumerate() {
            if labels[..idx].contains(label) {
                return Err(ModelError::DuplicateEnumLabel {
                    enum_name: name,
                    label: label.clone(),
                });
            }
        }
        Ok(Self { name, labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for an encoded index, `None` when out of range.
    pub fn label(&self, index: i32) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|idx| self.labels.get(idx))
            .map(String::as_str)
    }

    /// Encoded index of a label (exact match).
    pub fn index_of(&self, label: &str) -> Option<i32> {
        self.labels
            .iter()
            .position(|candidate| candidate == label)
            .and_then(|idx| i32::try_from(idx).ok())
    }
}
