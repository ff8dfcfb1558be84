//! Name-indexed multi-map of role identifiers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, RoleError};
use crate::types::{RoleDefinition, RoleDefinitionId};

/// How a call site picks one identifier for a name with several definitions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Take the first identifier in catalog order
    #[default]
    First,
    /// Treat several identifiers for one name as an error
    Reject,
}

/// Role name → ordered, non-empty list of identifiers
///
/// Identifiers under one name keep catalog encounter order. Built by the
/// resolver once every page has been drained and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoleLookup {
    entries: BTreeMap<String, Vec<RoleDefinitionId>>,
}

impl RoleLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, definition: RoleDefinition) {
        self.entries
            .entry(definition.name)
            .or_default()
            .push(definition.id);
    }

    /// All identifiers recorded under `name`
    pub fn get(&self, name: &str) -> Option<&[RoleDefinitionId]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Picks one identifier for `name` according to `policy`
    pub fn select(&self, name: &str, policy: DuplicatePolicy) -> Result<&RoleDefinitionId> {
        let ids = self
            .entries
            .get(name)
            .ok_or_else(|| RoleError::NameNotFound(name.to_string()))?;

        match (policy, ids.as_slice()) {
            (DuplicatePolicy::Reject, ids) if ids.len() > 1 => Err(RoleError::AmbiguousName {
                name: name.to_string(),
                count: ids.len(),
            }),
            (_, [first, ..]) => Ok(first),
            (_, []) => Err(RoleError::NameNotFound(name.to_string())),
        }
    }

    /// First identifier for `name`
    pub fn first(&self, name: &str) -> Result<&RoleDefinitionId> {
        self.select(name, DuplicatePolicy::First)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Names carrying more than one identifier
    pub fn duplicates(&self) -> impl Iterator<Item = (&str, &[RoleDefinitionId])> {
        self.entries
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    /// Number of distinct names
    pub fn name_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of identifiers across all names
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<RoleDefinition> for RoleLookup {
    fn from_iter<I: IntoIterator<Item = RoleDefinition>>(iter: I) -> Self {
        let mut lookup = RoleLookup::new();
        for definition in iter {
            lookup.insert(definition);
        }
        lookup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RoleLookup {
        vec![
            RoleDefinition::new("Reader", "R1"),
            RoleDefinition::new("Owner", "O1"),
            RoleDefinition::new("Reader", "R2"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_duplicates_keep_encounter_order() {
        let lookup = sample();

        let readers: Vec<_> = lookup.get("Reader").unwrap().iter().map(|id| id.as_str()).collect();
        assert_eq!(readers, vec!["R1", "R2"]);
        assert_eq!(lookup.len(), 3);
        assert_eq!(lookup.name_count(), 2);
    }

    #[test]
    fn test_select_first() {
        let lookup = sample();

        assert_eq!(lookup.first("Reader").unwrap().as_str(), "R1");
        assert_eq!(
            lookup.select("Owner", DuplicatePolicy::Reject).unwrap().as_str(),
            "O1"
        );
    }

    #[test]
    fn test_select_reject_duplicates() {
        let lookup = sample();

        match lookup.select("Reader", DuplicatePolicy::Reject) {
            Err(RoleError::AmbiguousName { name, count }) => {
                assert_eq!(name, "Reader");
                assert_eq!(count, 2);
            }
            other => panic!("Expected AmbiguousName, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_name() {
        let lookup = sample();

        assert!(matches!(
            lookup.first("Key Vault Reader"),
            Err(RoleError::NameNotFound(name)) if name == "Key Vault Reader"
        ));
        assert!(!lookup.contains("Key Vault Reader"));
    }

    #[test]
    fn test_duplicates_iterator() {
        let lookup = sample();

        let dups: Vec<_> = lookup.duplicates().map(|(name, ids)| (name, ids.len())).collect();
        assert_eq!(dups, vec![("Reader", 2)]);
    }

    #[test]
    fn test_serializes_as_map() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "Owner": ["O1"], "Reader": ["R1", "R2"] })
        );
    }
}
