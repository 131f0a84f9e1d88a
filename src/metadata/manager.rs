//! Metadata manager: flattens declarations into [`BeanMetaData`] and caches
//! the result per type.

use crate::core::error::{MetadataError, MetadataResult, ValidatorResult};
use crate::core::types::TypeHierarchy;
use crate::metadata::bean::{
    normalize_default_sequence, BeanMetaData, CascadingMetaData, DefaultSequence,
    ExecutableMetaData, MetaConstraint, ParameterMetaData, PropertyMetaData,
};
use crate::metadata::declaration::{BeanDeclaration, CascadeDeclaration, ExecutableDeclaration};
use crate::metadata::extractor::ValueExtractor;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Builds and caches flattened metadata.
///
/// Metadata is built lazily on first request. Concurrent first requests for
/// the same type may each build it, but only the first published instance is
/// kept and every caller receives that one.
pub struct BeanMetaDataManager {
    declarations: IndexMap<String, BeanDeclaration>,
    cache: RwLock<HashMap<String, Arc<BeanMetaData>>>,
}

impl BeanMetaDataManager {
    /// Create a manager over the given declarations.
    pub fn new<I>(declarations: I) -> Self
    where
        I: IntoIterator<Item = BeanDeclaration>,
    {
        Self {
            declarations: declarations
                .into_iter()
                .map(|d| (d.type_name.clone(), d))
                .collect(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of types with cached metadata.
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    /// Flattened metadata for a type.
    pub fn get(&self, type_name: &str) -> MetadataResult<Arc<BeanMetaData>> {
        if let Some(meta) = self.cache.read().get(type_name) {
            return Ok(Arc::clone(meta));
        }

        let built = Arc::new(self.build(type_name)?);
        log::debug!(
            "Built metadata for {} ({} properties, hierarchy {:?})",
            type_name,
            built.properties.len(),
            built.class_hierarchy
        );

        let mut cache = self.cache.write();
        let published = cache.entry(type_name.to_string()).or_insert(built);
        Ok(Arc::clone(published))
    }

    /// The type followed by its supertypes, breadth first, without repeats.
    fn hierarchy(&self, type_name: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut order = vec![type_name.to_string()];
        seen.insert(type_name.to_string());
        let mut index = 0;
        while index < order.len() {
            if let Some(decl) = self.declarations.get(&order[index]) {
                for supertype in &decl.supertypes {
                    if seen.insert(supertype.clone()) {
                        order.push(supertype.clone());
                    }
                }
            }
            index += 1;
        }
        order
    }

    fn build(&self, type_name: &str) -> MetadataResult<BeanMetaData> {
        let hierarchy = self.hierarchy(type_name);
        let mut meta = BeanMetaData::unconstrained(type_name);
        meta.class_hierarchy = hierarchy.clone();

        // Declaring types of each method, most derived first.
        let mut method_declarations: IndexMap<String, Vec<(&str, &ExecutableDeclaration)>> =
            IndexMap::new();

        for declaring_type in &hierarchy {
            let Some(decl) = self.declarations.get(declaring_type) else {
                continue;
            };

            meta.bean_constraints.extend(
                decl.constraints
                    .iter()
                    .map(|d| MetaConstraint::new(Arc::clone(d), declaring_type)),
            );

            for (name, property) in &decl.properties {
                let merged = meta
                    .properties
                    .entry(name.clone())
                    .or_insert_with(|| PropertyMetaData {
                        name: name.clone(),
                        declared_type: None,
                        constraints: Vec::new(),
                        cascading: CascadingMetaData::default(),
                    });
                if merged.declared_type.is_none() {
                    merged.declared_type = property.declared_type.clone();
                }
                merged.constraints.extend(
                    property
                        .constraints
                        .iter()
                        .map(|d| MetaConstraint::new(Arc::clone(d), declaring_type)),
                );
                merge_cascading(&mut merged.cascading, &property.cascading, declaring_type);
            }

            for (name, method) in &decl.methods {
                method_declarations
                    .entry(name.clone())
                    .or_default()
                    .push((declaring_type.as_str(), method));
            }
        }

        for (name, declarations) in method_declarations {
            let executable = flatten_method(type_name, &name, &declarations)?;
            meta.methods.insert(name, executable);
        }

        if let Some(decl) = self.declarations.get(type_name) {
            meta.constructors = decl
                .constructors
                .iter()
                .map(|c| flatten_executable(c, type_name))
                .collect();

            meta.default_sequence = match (&decl.default_group_sequence, &decl.sequence_provider) {
                (Some(_), Some(_)) => {
                    log::warn!("Rejecting {}: both a default sequence and a provider", type_name);
                    return Err(MetadataError::SequenceAndProvider {
                        type_name: type_name.to_string(),
                    });
                }
                (Some(groups), None) => DefaultSequence::Redefined(normalize_default_sequence(
                    type_name,
                    groups.clone(),
                )?),
                (None, Some(provider)) => DefaultSequence::Provider(Arc::clone(provider)),
                (None, None) => DefaultSequence::Default,
            };
        }

        meta.default_sequence_host = hierarchy
            .iter()
            .find(|t| {
                self.declarations
                    .get(t.as_str())
                    .map_or(false, BeanDeclaration::redefines_default_group_sequence)
            })
            .cloned();
        meta.has_cascadables = meta.properties.values().any(|p| p.cascading.cascade);
        Ok(meta)
    }
}

impl TypeHierarchy for BeanMetaDataManager {
    fn is_subtype(&self, sub: &str, sup: &str) -> ValidatorResult<bool> {
        if sub == sup {
            return Ok(true);
        }
        Ok(self.get(sub)?.class_hierarchy.iter().any(|t| t == sup))
    }
}

fn merge_cascading(target: &mut CascadingMetaData, source: &CascadeDeclaration, declaring_type: &str) {
    target.cascade |= source.cascade;
    if matches!(target.extractor, ValueExtractor::Auto) {
        target.extractor = source.extractor.clone();
    }
    target.element_constraints.extend(
        source
            .element_constraints
            .iter()
            .map(|d| MetaConstraint::new(Arc::clone(d), declaring_type)),
    );
    for (from, to) in &source.group_conversions {
        target
            .group_conversions
            .entry(from.clone())
            .or_insert_with(|| to.clone());
    }
}

fn flatten_executable(decl: &ExecutableDeclaration, declaring_type: &str) -> ExecutableMetaData {
    let mut return_cascading = CascadingMetaData::default();
    merge_cascading(&mut return_cascading, &decl.cascading, declaring_type);

    ExecutableMetaData {
        name: decl.name.clone(),
        kind: decl.kind,
        parameters: decl
            .parameters
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let mut cascading = CascadingMetaData::default();
                merge_cascading(&mut cascading, &p.cascading, declaring_type);
                ParameterMetaData {
                    index,
                    name: p.name.clone(),
                    type_name: p.type_name.clone(),
                    constraints: p
                        .constraints
                        .iter()
                        .map(|d| MetaConstraint::new(Arc::clone(d), declaring_type))
                        .collect(),
                    cascading,
                }
            })
            .collect(),
        cross_parameter_constraints: decl
            .cross_parameter_constraints
            .iter()
            .map(|d| MetaConstraint::new(Arc::clone(d), declaring_type))
            .collect(),
        return_constraints: decl
            .return_constraints
            .iter()
            .map(|d| MetaConstraint::new(Arc::clone(d), declaring_type))
            .collect(),
        return_cascading,
    }
}

/// Merge a method declared along a hierarchy, most derived declaration first.
///
/// Parameter rules come from the topmost declaration only; return value
/// constraints are the union of all declarations.
fn flatten_method(
    type_name: &str,
    name: &str,
    declarations: &[(&str, &ExecutableDeclaration)],
) -> MetadataResult<ExecutableMetaData> {
    let Some((&(top_type, top), overriding)) = declarations.split_last() else {
        return Err(MetadataError::UnknownExecutable {
            type_name: type_name.to_string(),
            executable: name.to_string(),
        });
    };

    if let Some((offender, _)) = overriding.iter().find(|(_, d)| d.declares_parameter_rules()) {
        log::warn!("Rejecting parameter constraints added by {}.{}", offender, name);
        return Err(MetadataError::IllegalParameterOverride {
            type_name: offender.to_string(),
            executable: name.to_string(),
        });
    }
    if declarations.iter().filter(|(_, d)| d.cascading.cascade).count() > 1 {
        return Err(MetadataError::ReturnValueCascadeRedeclared {
            type_name: type_name.to_string(),
            executable: name.to_string(),
        });
    }

    let mut executable = flatten_executable(top, top_type);
    for (declaring_type, decl) in overriding.iter().rev() {
        executable.return_constraints.extend(
            decl.return_constraints
                .iter()
                .map(|d| MetaConstraint::new(Arc::clone(d), declaring_type)),
        );
        merge_cascading(&mut executable.return_cascading, &decl.cascading, declaring_type);
    }
    Ok(executable)
}
