//! Feature identifiers and their names.
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::num::TryFromIntError;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Small integer identifying a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(u32);

impl FeatureId {
    /// Creates a [`FeatureId`] from a column index.
    ///
    /// `idx` must fit in a `u32`; use `FeatureId::try_from` for unchecked input.
    pub fn from_index(idx: usize) -> Self {
        debug_assert!(u32::try_from(idx).is_ok(), "feature index {idx} exceeds u32");
        Self(idx as u32)
    }
    /// Returns the id as an index.
    pub fn to_index(&self) -> usize {
        self.0 as usize
    }
    /// Returns the raw id.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for FeatureId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl TryFrom<usize> for FeatureId {
    type Error = TryFromIntError;

    fn try_from(idx: usize) -> std::result::Result<Self, TryFromIntError> {
        u32::try_from(idx).map(Self)
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bijective mapping between feature ids and feature names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<FeatureId, String>", into = "BTreeMap<FeatureId, String>")]
pub struct FeatureCatalog {
    names: BTreeMap<FeatureId, String>,
    ids: HashMap<String, FeatureId>,
}

impl FeatureCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` under `name`, or under its decimal string when no name is given.
    ///
    /// Registering an id again with its current name is a no-op; renaming it
    /// replaces the old name.
    pub fn insert(&mut self, id: FeatureId, name: Option<&str>) -> Result<()> {
        let name = match name {
            Some(name) => name.to_string(),
            None => id.to_string(),
        };
        match self.ids.get(&name) {
            Some(&owner) if owner == id => return Ok(()),
            Some(&owner) => {
                return Err(Error::DuplicateFeatureName {
                    name,
                    first: owner.as_u32(),
                    second: id.as_u32(),
                })
            }
            None => {}
        }
        if let Some(old) = self.names.insert(id, name.clone()) {
            self.ids.remove(&old);
        }
        self.ids.insert(name, id);
        Ok(())
    }

    /// Registers `id` with its default name unless it is already known.
    pub(crate) fn ensure(&mut self, id: FeatureId) -> Result<()> {
        if self.names.contains_key(&id) {
            return Ok(());
        }
        self.insert(id, None)
    }

    /// Number of registered features.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no feature is registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: FeatureId) -> bool {
        self.names.contains_key(&id)
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.names.keys().copied()
    }

    /// Registered names in ascending id order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.values().map(String::as_str)
    }

    /// Name of a registered feature.
    pub fn name(&self, id: FeatureId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Id registered under `name`.
    pub fn id(&self, name: &str) -> Option<FeatureId> {
        self.ids.get(name).copied()
    }

    /// Resolves a feature given by name, falling back to its decimal id.
    pub fn lookup(&self, name_or_number: &str) -> Result<FeatureId> {
        if let Some(id) = self.id(name_or_number) {
            return Ok(id);
        }
        name_or_number
            .parse::<u32>()
            .ok()
            .map(FeatureId::from)
            .filter(|id| self.contains(*id))
            .ok_or_else(|| Error::UnknownFeature(name_or_number.to_string()))
    }

    /// The name to id mapping.
    pub fn name_to_index(&self) -> &HashMap<String, FeatureId> {
        &self.ids
    }

    /// Builds a catalog holding only the given ids, keeping their names.
    pub(crate) fn restrict(&self, keep: &[FeatureId]) -> FeatureCatalog {
        let mut out = FeatureCatalog::new();
        for &id in keep {
            if let Some(name) = self.names.get(&id) {
                out.names.insert(id, name.clone());
                out.ids.insert(name.clone(), id);
            }
        }
        out
    }
}

impl TryFrom<BTreeMap<FeatureId, String>> for FeatureCatalog {
    type Error = Error;

    fn try_from(names: BTreeMap<FeatureId, String>) -> Result<Self> {
        let mut catalog = FeatureCatalog::new();
        for (id, name) in names.iter() {
            catalog.insert(*id, Some(name))?;
        }
        Ok(catalog)
    }
}

impl From<FeatureCatalog> for BTreeMap<FeatureId, String> {
    fn from(catalog: FeatureCatalog) -> Self {
        catalog.names
    }
}
