//! Injective class id to display name table.

use std::collections::{HashMap, HashSet};

use super::ClassId;
use crate::error::{AdapterError, Result};

/// Ordered mapping from class id to display name.
///
/// Neither ids nor names may repeat. Iteration follows insertion order, which
/// also fixes the key order of multiclass score mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassTable {
    entries: Vec<(ClassId, String)>,
    index: HashMap<ClassId, usize>,
}

impl ClassTable {
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ClassId, S)>,
        S: Into<String>,
    {
        let mut table = Self::default();
        let mut names = HashSet::new();
        for (id, name) in entries {
            let name = name.into();
            if table.index.contains_key(&id) {
                return Err(AdapterError::DuplicateClassId(id));
            }
            if !names.insert(name.clone()) {
                return Err(AdapterError::DuplicateClassName(name));
            }
            table.index.insert(id, table.entries.len());
            table.entries.push((id, name));
        }
        Ok(table)
    }

    /// Resolve names for `ids` from a model's label metadata.
    ///
    /// Ids without a label fall back to their decimal representation.
    pub fn from_labels(ids: &[ClassId], labels: Option<&HashMap<ClassId, String>>) -> Result<Self> {
        Self::new(ids.iter().map(|&id| {
            let name = labels.and_then(|labels| labels.get(&id)).cloned();
            let name = name.unwrap_or_else(|| {
                if labels.is_some() {
                    tracing::warn!(class_id = id, "no label for class id, using numeric name");
                }
                id.to_string()
            });
            (id, name)
        }))
    }

    pub fn name(&self, id: ClassId) -> Option<&str> {
        self.index
            .get(&id)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn contains(&self, id: ClassId) -> bool {
        self.index.contains_key(&id)
    }

    /// Class ids in table order.
    pub fn ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &str)> {
        self.entries.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
