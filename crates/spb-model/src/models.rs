//! Optional GUID → friendly-name table used to annotate decoded output.

use std::collections::HashMap;

use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ModelNames {
    names: HashMap<Uuid, String>,
}

impl ModelNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: Uuid, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn lookup(&self, id: &Uuid) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(Uuid, String)> for ModelNames {
    fn from_iter<T: IntoIterator<Item = (Uuid, String)>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
