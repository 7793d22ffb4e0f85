//! Header hierarchy resolution: parent-linked descriptors -> ordered header tiers.
//!
//! Column placement inside a tier follows the supplied order of siblings; a child's
//! column is *not* derived from its parent's span. Irregular hierarchies (parents with
//! differing child counts) therefore need their descriptors pre-ordered by the caller.

use std::collections::{BTreeMap, HashMap};

use crate::error::{GridError, Result};
use crate::spec::SpecFieldDescriptor;

/// Header group resolved into tiers, tier 0 (roots) first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecHeaderTiers {
    /// Tier number -> descriptors in placement order.
    pub tiers: BTreeMap<usize, Vec<SpecFieldDescriptor>>,
    /// Descriptors skipped because their parent has no tier.
    pub warnings: Vec<String>,
}

impl SpecHeaderTiers {
    /// Total resolved descriptors.
    pub fn len(&self) -> usize {
        self.tiers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

/// Resolve one hierarchical header group.
///
/// Errors with [`GridError::Hierarchy`] when the first descriptor (by parent order) is not a
/// root; the whole group is then unusable. Children referencing an unresolved parent are
/// dropped and reported in [`SpecHeaderTiers::warnings`].
pub fn resolve_header_tiers(descriptors: &[SpecFieldDescriptor]) -> Result<SpecHeaderTiers> {
    let mut l_descs: Vec<SpecFieldDescriptor> = descriptors
        .iter()
        .map(SpecFieldDescriptor::normalized)
        .collect();
    if l_descs.is_empty() {
        return Ok(SpecHeaderTiers::default());
    }

    // `None < Some(_)`: roots first; stable for equal parents.
    l_descs.sort_by_key(|desc| desc.parent);
    if !l_descs[0].is_root() {
        return Err(GridError::Hierarchy(format!(
            "header group without root (first field {:?} has parent {:?})",
            l_descs[0].name, l_descs[0].parent
        )));
    }

    let mut dict_tier_by_index: HashMap<usize, usize> = HashMap::new();
    let mut l_warnings = Vec::new();
    for desc in &l_descs {
        match desc.parent {
            None => {
                dict_tier_by_index.insert(desc.index, 0);
            }
            Some(parent) => match dict_tier_by_index.get(&parent).copied() {
                Some(n_tier_parent) => {
                    dict_tier_by_index.insert(desc.index, n_tier_parent + 1);
                }
                None => {
                    l_warnings.push(format!(
                        "header field {:?} skipped: parent index {parent} has no tier",
                        desc.name
                    ));
                }
            },
        }
    }

    let mut tiers: BTreeMap<usize, Vec<SpecFieldDescriptor>> = BTreeMap::new();
    for desc in l_descs {
        if let Some(n_tier) = dict_tier_by_index.get(&desc.index).copied() {
            tiers.entry(n_tier).or_default().push(desc);
        }
    }

    Ok(SpecHeaderTiers {
        tiers,
        warnings: l_warnings,
    })
}
