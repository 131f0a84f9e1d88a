//! Validation groups and the catalog of their relationships.

use crate::core::error::{GroupError, GroupResult};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A named validation group.
///
/// Groups are cheap to clone and compare by name. The pseudo group
/// [`Group::DEFAULT`] is implied whenever no group is requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Group(Arc<str>);

impl Group {
    /// Name of the default group.
    pub const DEFAULT: &'static str = "Default";

    /// Create a group by name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The `Default` group.
    pub fn default_group() -> Self {
        Self::new(Self::DEFAULT)
    }

    /// Whether this is the `Default` group.
    pub fn is_default(&self) -> bool {
        &*self.0 == Self::DEFAULT
    }

    /// The group's name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::default_group()
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Group {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Group {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Registry of known groups, group inheritance and group sequences.
///
/// A plain group may extend other groups: requesting it also requests every
/// ancestor. A sequence is an ordered list of groups or nested sequences.
#[derive(Debug, Clone)]
pub struct GroupCatalog {
    /// Plain groups with their direct parent groups.
    groups: IndexMap<Group, Vec<Group>>,
    /// Group sequences with their ordered members.
    sequences: IndexMap<Group, Vec<Group>>,
}

impl GroupCatalog {
    /// Create a catalog that only knows `Default`.
    pub fn new() -> Self {
        let mut groups = IndexMap::new();
        groups.insert(Group::default_group(), Vec::new());
        Self {
            groups,
            sequences: IndexMap::new(),
        }
    }

    /// Define a plain group extending the given parents.
    ///
    /// Redefining a plain group replaces its parents.
    pub fn define_group<I>(&mut self, group: Group, extends: I) -> GroupResult<()>
    where
        I: IntoIterator<Item = Group>,
    {
        if self.sequences.contains_key(&group) {
            return Err(GroupError::ConflictingDefinition(
                group.to_string(),
                "group sequence",
            ));
        }
        self.groups.insert(group, extends.into_iter().collect());
        Ok(())
    }

    /// Define a group sequence.
    pub fn define_sequence<I>(&mut self, sequence: Group, members: I) -> GroupResult<()>
    where
        I: IntoIterator<Item = Group>,
    {
        if sequence.is_default() || self.groups.contains_key(&sequence) {
            return Err(GroupError::ConflictingDefinition(
                sequence.to_string(),
                "plain group",
            ));
        }
        let members: Vec<Group> = members.into_iter().collect();
        if members.is_empty() {
            return Err(GroupError::EmptySequence(sequence.to_string()));
        }
        self.sequences.insert(sequence, members);
        Ok(())
    }

    /// Register a plain group without parents unless the name is already known.
    pub fn ensure_known(&mut self, group: &Group) {
        if !self.is_known(group) {
            self.groups.insert(group.clone(), Vec::new());
        }
    }

    /// Whether the name is a known group or sequence.
    pub fn is_known(&self, group: &Group) -> bool {
        self.groups.contains_key(group) || self.sequences.contains_key(group)
    }

    /// Whether the name is a group sequence.
    pub fn is_sequence(&self, group: &Group) -> bool {
        self.sequences.contains_key(group)
    }

    /// Members of a sequence, if the name is one.
    pub fn sequence(&self, group: &Group) -> Option<&[Group]> {
        self.sequences.get(group).map(Vec::as_slice)
    }

    /// All defined sequences.
    pub fn sequences(&self) -> impl Iterator<Item = (&Group, &[Group])> {
        self.sequences.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Direct parents of a plain group.
    pub fn parents(&self, group: &Group) -> &[Group] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The group followed by all of its ancestors, breadth first, without repeats.
    pub fn with_ancestors(&self, group: &Group) -> Vec<Group> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut index = 0;
        seen.insert(group.clone());
        result.push(group.clone());
        while index < result.len() {
            let parents = self.parents(&result[index]).to_vec();
            for parent in parents {
                if seen.insert(parent.clone()) {
                    result.push(parent);
                }
            }
            index += 1;
        }
        result
    }

    /// Check that every sequence member is a known group.
    pub fn check_members(&self) -> GroupResult<()> {
        for members in self.sequences.values() {
            if let Some(unknown) = members.iter().find(|m| !self.is_known(m)) {
                return Err(GroupError::UnknownGroup(unknown.to_string()));
            }
        }
        Ok(())
    }
}

impl Default for GroupCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_always_known() {
        let catalog = GroupCatalog::new();
        assert!(catalog.is_known(&Group::default_group()));
        assert!(!catalog.is_known(&Group::new("Extra")));
    }

    #[test]
    fn test_ancestors_are_breadth_first_and_unique() {
        let mut catalog = GroupCatalog::new();
        catalog.define_group("Base".into(), []).unwrap();
        catalog.define_group("Left".into(), ["Base".into()]).unwrap();
        catalog.define_group("Right".into(), ["Base".into()]).unwrap();
        catalog
            .define_group("Child".into(), ["Left".into(), "Right".into()])
            .unwrap();

        let names: Vec<String> = catalog
            .with_ancestors(&"Child".into())
            .iter()
            .map(|g| g.to_string())
            .collect();
        assert_eq!(names, vec!["Child", "Left", "Right", "Base"]);
    }

    #[test]
    fn test_sequence_and_group_names_conflict() {
        let mut catalog = GroupCatalog::new();
        catalog.define_group("A".into(), []).unwrap();
        assert!(matches!(
            catalog.define_sequence("A".into(), ["Default".into()]),
            Err(GroupError::ConflictingDefinition(..))
        ));
        assert!(matches!(
            catalog.define_sequence("Default".into(), ["A".into()]),
            Err(GroupError::ConflictingDefinition(..))
        ));
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let mut catalog = GroupCatalog::new();
        assert_eq!(
            catalog.define_sequence("Seq".into(), []),
            Err(GroupError::EmptySequence("Seq".into()))
        );
    }

    #[test]
    fn test_unknown_sequence_member_detected() {
        let mut catalog = GroupCatalog::new();
        catalog
            .define_sequence("Seq".into(), ["Default".into(), "Missing".into()])
            .unwrap();
        assert_eq!(
            catalog.check_members(),
            Err(GroupError::UnknownGroup("Missing".into()))
        );
    }
}
