//! Field registry
//!
//! Lookup table from metadata label to [FieldDefinition]. Built once from a fixed list and
//! read-only afterwards.

use super::hash::Djb2BuildHasher;
use super::{FieldDefinition, STANDARD_FIELDS};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use thiserror::Error;

/// Errors building a registry. Both point at a broken definition list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("field label '{0}' is defined more than once")]
    DuplicateLabel(String),

    #[error("no field definitions given")]
    Empty,
}

/// Registry of known metadata fields
///
/// # Examples
///
/// ```ignore
/// let registry = FieldRegistry::standard()?;
/// let seed = registry.lookup("Seed").unwrap();
/// assert_eq!(seed.switch.unwrap().long, "--seed");
/// ```
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: HashMap<&'static str, FieldDefinition, Djb2BuildHasher>,
}

impl FieldRegistry {
    /// Build a registry, failing on the first repeated label.
    pub fn new<I>(definitions: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = FieldDefinition>,
    {
        let mut fields = HashMap::with_hasher(Djb2BuildHasher::default());

        for definition in definitions {
            match fields.entry(definition.label) {
                Entry::Occupied(_) => {
                    return Err(RegistryError::DuplicateLabel(definition.label.to_string()))
                }
                Entry::Vacant(slot) => {
                    slot.insert(definition);
                }
            }
        }

        if fields.is_empty() {
            return Err(RegistryError::Empty);
        }

        Ok(Self { fields })
    }

    /// The registry of every field stable-diffusion.cpp is known to write.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::new(STANDARD_FIELDS.iter().copied())
    }

    pub fn lookup(&self, label: &str) -> Option<&FieldDefinition> {
        self.fields.get(label)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All definitions, sorted by label
    pub fn definitions(&self) -> Vec<&FieldDefinition> {
        let mut definitions: Vec<_> = self.fields.values().collect();
        definitions.sort_by_key(|definition| definition.label);
        definitions
    }
}
