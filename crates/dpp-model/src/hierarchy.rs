//! Product hierarchy checks.
//!
//! A hierarchy is a parent -> children id mapping (product -> subsystem ->
//! assembly -> component -> material). It must form a forest: acyclic, and
//! every non-root node listed under exactly one parent.

use crate::error::StructuralError;
use std::collections::{BTreeMap, BTreeSet};

/// Parent -> ordered children.
pub type Hierarchy = BTreeMap<String, Vec<String>>;

/// Validate the forest invariants and return the root nodes in id order.
///
/// Cycles are reported at the smallest node id on the cycle walk, so the
/// same hierarchy always yields the same error.
pub fn validate_hierarchy(hierarchy: &Hierarchy) -> Result<Vec<String>, StructuralError> {
    let mut parent_of: BTreeMap<&str, &str> = BTreeMap::new();
    let mut nodes: BTreeSet<&str> = BTreeSet::new();

    for (parent, children) in hierarchy {
        nodes.insert(parent.as_str());
        for child in children {
            if child == parent {
                return Err(StructuralError::HierarchyCycle {
                    node: parent.clone(),
                });
            }
            nodes.insert(child.as_str());
            match parent_of.get(child.as_str()) {
                Some(existing) if *existing != parent.as_str() => {
                    return Err(StructuralError::MultipleParents {
                        node: child.clone(),
                        parents: vec![existing.to_string(), parent.clone()],
                    });
                }
                _ => {
                    parent_of.insert(child.as_str(), parent.as_str());
                }
            }
        }
    }

    // Every node has at most one parent, so walking upwards either reaches a
    // root or revisits a node on the current walk.
    let mut reaches_root: BTreeSet<&str> = BTreeSet::new();
    for &start in &nodes {
        let mut walk: BTreeSet<&str> = BTreeSet::new();
        let mut current = start;
        loop {
            if reaches_root.contains(current) {
                break;
            }
            if !walk.insert(current) {
                return Err(StructuralError::HierarchyCycle {
                    node: current.to_string(),
                });
            }
            match parent_of.get(current) {
                Some(parent) => current = *parent,
                None => break,
            }
        }
        reaches_root.extend(walk);
    }

    Ok(nodes
        .into_iter()
        .filter(|node| !parent_of.contains_key(node))
        .map(str::to_string)
        .collect())
}
