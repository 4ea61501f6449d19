//! The symbol catalogue: GUID and name addressable definitions.

use std::collections::HashMap;

use uuid::Uuid;

use crate::definition::{Definition, PropertyDef, SetDef};
use crate::error::{ModelError, Result};

/// Immutable catalogue of set and property definitions.
///
/// Built once through [`SymbolBankBuilder`] and then shared by reference
/// with every decoder and encoder running in the process.
#[derive(Debug, Clone, Default)]
pub struct SymbolBank {
    definitions: Vec<Definition>,
    by_id: HashMap<Uuid, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

impl SymbolBank {
    pub fn builder() -> SymbolBankBuilder {
        SymbolBankBuilder::default()
    }

    pub fn lookup_by_guid(&self, id: &Uuid) -> Option<&Definition> {
        self.by_id.get(id).map(|&idx| &self.definitions[idx])
    }

    /// First definition registered under `name` (case-insensitive).
    pub fn lookup_by_name(&self, name: &str) -> Option<&Definition> {
        self.lookup_all_by_name(name).next()
    }

    /// Every definition registered under `name` (case-insensitive), in
    /// registration order.
    pub fn lookup_all_by_name<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Definition> {
        self.by_name
            .get(&name_key(name))
            .into_iter()
            .flatten()
            .map(|&idx| &self.definitions[idx])
    }

    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn set_count(&self) -> usize {
        self.definitions
            .iter()
            .filter(|def| matches!(def, Definition::Set(_)))
            .count()
    }

    pub fn property_count(&self) -> usize {
        self.len() - self.set_count()
    }
}

#[derive(Debug, Default)]
pub struct SymbolBankBuilder {
    bank: SymbolBank,
}

impl SymbolBankBuilder {
    pub fn add(&mut self, definition: impl Into<Definition>) -> Result<&mut Self> {
        let definition = definition.into();
        let id = definition.id();
        if definition.name().trim().is_empty() {
            return Err(ModelError::EmptyName(id));
        }
        if let Some(&existing) = self.bank.by_id.get(&id) {
            return Err(ModelError::DuplicateSymbol {
                id,
                existing: self.bank.definitions[existing].name().to_string(),
                duplicate: definition.name().to_string(),
            });
        }
        let idx = self.bank.definitions.len();
        self.bank.by_id.insert(id, idx);
        self.bank
            .by_name
            .entry(name_key(definition.name()))
            .or_default()
            .push(idx);
        self.bank.definitions.push(definition);
        Ok(self)
    }

    pub fn set(&mut self, set: SetDef) -> Result<&mut Self> {
        self.add(set)
    }

    pub fn property(&mut self, property: PropertyDef) -> Result<&mut Self> {
        self.add(property)
    }

    pub fn build(self) -> SymbolBank {
        self.bank
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}
