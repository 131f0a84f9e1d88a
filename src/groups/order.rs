//! Group order resolution.
//!
//! Expands a set of requested groups into the ordered list of units the
//! traversal processes. Plain groups (with their inherited groups) become
//! independent single units. Sequences become ordered lists of steps, where a
//! step is a group together with its inherited groups; a failing step stops
//! the rest of its own sequence and nothing else.

use crate::core::error::{GroupError, GroupResult};
use crate::groups::group::{Group, GroupCatalog};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// One independently evaluated unit of a validation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupUnit {
    /// A single group, evaluated on its own.
    Single(Group),
    /// An expanded group sequence.
    Sequence {
        /// Name of the requested sequence.
        name: Group,
        /// Ordered steps; each step is a group followed by its ancestors.
        steps: Arc<Vec<Vec<Group>>>,
    },
}

impl GroupUnit {
    /// Whether any step of this unit is the `Default` group.
    pub fn contains_default(&self) -> bool {
        match self {
            GroupUnit::Single(group) => group.is_default(),
            GroupUnit::Sequence { steps, .. } => steps
                .iter()
                .any(|step| step.first().map_or(false, Group::is_default)),
        }
    }
}

/// Ordered list of group units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOrder {
    units: Vec<GroupUnit>,
}

impl ValidationOrder {
    /// The order used when nothing but `Default` is requested.
    pub fn default_order() -> Self {
        Self {
            units: vec![GroupUnit::Single(Group::default_group())],
        }
    }

    /// An order holding one plain group and nothing else.
    pub fn single(group: Group) -> Self {
        Self {
            units: vec![GroupUnit::Single(group)],
        }
    }

    /// Units in processing order.
    pub fn units(&self) -> &[GroupUnit] {
        &self.units
    }

    /// Whether this order consists of `Default` alone.
    pub fn is_default_only(&self) -> bool {
        matches!(self.units.as_slice(), [GroupUnit::Single(g)] if g.is_default())
    }

    /// Check that every sequence in this order stays expandable once `Default`
    /// is replaced by a bean's redefined default group sequence.
    pub fn assert_default_expandable(&self, default_sequence: &[Group]) -> GroupResult<()> {
        for unit in &self.units {
            let GroupUnit::Sequence { name, steps } = unit else {
                continue;
            };
            let mut expanded: Vec<Group> = Vec::new();
            for step in steps.iter() {
                let Some(head) = step.first() else { continue };
                if head.is_default() {
                    add_groups(&mut expanded, default_sequence, name)?;
                } else {
                    add_groups(&mut expanded, std::slice::from_ref(head), name)?;
                }
            }
        }
        Ok(())
    }
}

/// Append groups to an expanded sequence.
///
/// A group may only reappear when its earlier occurrence is the current tail.
fn add_groups(resolved: &mut Vec<Group>, groups: &[Group], sequence: &Group) -> GroupResult<()> {
    for group in groups {
        if let Some(position) = resolved.iter().position(|g| g == group) {
            if position + 1 < resolved.len() {
                return Err(GroupError::NotExpandable {
                    sequence: sequence.to_string(),
                    group: group.to_string(),
                });
            }
            continue;
        }
        resolved.push(group.clone());
    }
    Ok(())
}

/// Computes validation orders against a group catalog.
///
/// Expanded sequences are cached; concurrent first resolutions of the same
/// sequence publish a single result.
pub struct ValidationOrderGenerator {
    catalog: Arc<GroupCatalog>,
    resolved: RwLock<HashMap<Group, Arc<Vec<Vec<Group>>>>>,
}

impl ValidationOrderGenerator {
    /// Create a generator over the given catalog.
    pub fn new(catalog: Arc<GroupCatalog>) -> Self {
        Self {
            catalog,
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// The underlying catalog.
    pub fn catalog(&self) -> &GroupCatalog {
        &self.catalog
    }

    /// Expand every declared sequence, surfacing cycles and unknown members eagerly.
    pub fn check_all_sequences(&self) -> GroupResult<()> {
        self.catalog.check_members()?;
        let names: Vec<Group> = self.catalog.sequences().map(|(name, _)| name.clone()).collect();
        for name in names {
            self.sequence_steps(&name)?;
        }
        Ok(())
    }

    /// Resolve the requested groups into a validation order.
    ///
    /// An empty request means `Default`. Single units come first, in request
    /// order with ancestors after their descendants, followed by sequences.
    pub fn validation_order(&self, requested: &[Group]) -> GroupResult<ValidationOrder> {
        if requested.is_empty() || (requested.len() == 1 && requested[0].is_default()) {
            return Ok(ValidationOrder::default_order());
        }

        let mut singles: Vec<Group> = Vec::new();
        let mut sequences: Vec<GroupUnit> = Vec::new();

        for group in requested {
            if !self.catalog.is_known(group) {
                return Err(GroupError::UnknownGroup(group.to_string()));
            }
            if self.catalog.is_sequence(group) {
                let already = sequences
                    .iter()
                    .any(|u| matches!(u, GroupUnit::Sequence { name, .. } if name == group));
                if !already {
                    sequences.push(GroupUnit::Sequence {
                        name: group.clone(),
                        steps: self.sequence_steps(group)?,
                    });
                }
            } else {
                for inherited in self.catalog.with_ancestors(group) {
                    if !singles.contains(&inherited) {
                        singles.push(inherited);
                    }
                }
            }
        }

        let mut units: Vec<GroupUnit> = singles.into_iter().map(GroupUnit::Single).collect();
        units.extend(sequences);
        Ok(ValidationOrder { units })
    }

    /// Order for a single group, as used when cascading with a converted group.
    pub fn order_for_group(&self, group: &Group) -> GroupResult<ValidationOrder> {
        self.validation_order(std::slice::from_ref(group))
    }

    /// Expanded steps of a sequence, from cache when possible.
    fn sequence_steps(&self, sequence: &Group) -> GroupResult<Arc<Vec<Vec<Group>>>> {
        if let Some(steps) = self.resolved.read().get(sequence) {
            return Ok(Arc::clone(steps));
        }

        let mut stack = Vec::new();
        let flat = self.expand_sequence(sequence, &mut stack)?;
        let steps: Vec<Vec<Group>> = flat
            .iter()
            .map(|group| self.catalog.with_ancestors(group))
            .collect();
        log::trace!("Expanded group sequence {} into {:?}", sequence, flat);

        let mut resolved = self.resolved.write();
        let entry = resolved
            .entry(sequence.clone())
            .or_insert_with(|| Arc::new(steps));
        Ok(Arc::clone(entry))
    }

    /// Flatten nested sequences; `stack` holds the sequences being expanded.
    fn expand_sequence(&self, sequence: &Group, stack: &mut Vec<Group>) -> GroupResult<Vec<Group>> {
        if stack.contains(sequence) {
            let mut chain: Vec<String> = stack.iter().map(|g| g.to_string()).collect();
            chain.push(sequence.to_string());
            return Err(GroupError::CyclicSequence {
                sequence: stack
                    .first()
                    .map_or_else(|| sequence.to_string(), |g| g.to_string()),
                chain,
            });
        }
        let members = self
            .catalog
            .sequence(sequence)
            .ok_or_else(|| GroupError::UnknownGroup(sequence.to_string()))?
            .to_vec();

        stack.push(sequence.clone());
        let mut resolved = Vec::new();
        for member in &members {
            if !self.catalog.is_known(member) {
                return Err(GroupError::UnknownGroup(member.to_string()));
            }
            if self.catalog.is_sequence(member) {
                let nested = self.expand_sequence(member, stack)?;
                add_groups(&mut resolved, &nested, sequence)?;
            } else {
                add_groups(&mut resolved, std::slice::from_ref(member), sequence)?;
            }
        }
        stack.pop();
        Ok(resolved)
    }
}
