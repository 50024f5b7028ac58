//! Hierarchy derivation
//!
//! Subteam and subsystem are not stored by hand; they follow from where a
//! part sits in the assembly tree. Walking `parent_id` links upward from the
//! parent gives a root-first chain of ancestors:
//!
//! ```text
//! ancestors[0]  top-level assembly
//! ancestors[1]  subteam
//! ancestors[2]  subsystem
//! ```
//!
//! The walk is iterative and bounded: a revisited id fails with
//! `CycleDetected`, and a chain longer than the configured depth fails with
//! `HierarchyTooDeep`. A dangling parent link ends the walk early and the
//! partial chain is used.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::core::error::{NumberingError, Result};
use crate::core::identity::PartId;
use crate::store::{Part, PartRecordStore};

/// Default bound on ancestor hops
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Derived organizational classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub subteam_id: Option<PartId>,
    pub subsystem_id: Option<PartId>,
}

impl Classification {
    /// Classification implied by a root-first ancestor chain
    pub fn from_ancestors(ancestors: &[Part]) -> Self {
        Self {
            subteam_id: ancestors.get(1).map(|p| p.id),
            subsystem_id: ancestors.get(2).map(|p| p.id),
        }
    }

    /// Keep explicit values, filling the rest from `derived`
    pub fn merge(
        explicit_subteam: Option<PartId>,
        explicit_subsystem: Option<PartId>,
        derived: Self,
    ) -> Self {
        Self {
            subteam_id: explicit_subteam.or(derived.subteam_id),
            subsystem_id: explicit_subsystem.or(derived.subsystem_id),
        }
    }
}

/// Walks ancestor chains through a [`PartRecordStore`]
pub struct HierarchyResolver<'s, S: ?Sized> {
    store: &'s S,
    max_depth: usize,
}

impl<'s, S: PartRecordStore + ?Sized> HierarchyResolver<'s, S> {
    pub fn new(store: &'s S, max_depth: usize) -> Self {
        Self { store, max_depth }
    }

    /// Ancestor chain of `start`, root-first, ending with `start` itself
    pub fn breadcrumb(&self, start: &Part) -> Result<Vec<Part>> {
        let mut ancestors = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = start.clone();

        loop {
            if !visited.insert(cursor.id) {
                return Err(NumberingError::CycleDetected { part_id: cursor.id });
            }
            if ancestors.len() == self.max_depth {
                return Err(NumberingError::HierarchyTooDeep {
                    start: start.id,
                    max_depth: self.max_depth,
                });
            }

            let next = cursor.parent_id;
            ancestors.push(cursor);

            let Some(parent_id) = next else { break };
            match self.store.get_part(parent_id)? {
                Some(parent) => cursor = parent,
                None => {
                    warn!(
                        part = %start.part_number,
                        missing = %parent_id,
                        "broken parent link, using partial ancestry"
                    );
                    break;
                }
            }
        }

        ancestors.reverse();
        Ok(ancestors)
    }

    /// Derive the classification for a new child of `parent`
    pub fn resolve(&self, parent: Option<&Part>) -> Result<Classification> {
        match parent {
            None => Ok(Classification::default()),
            Some(parent) => Ok(Classification::from_ancestors(&self.breadcrumb(parent)?)),
        }
    }

    /// Whether making `new_parent` the parent of `part_id` would close a loop
    pub fn would_create_cycle(&self, part_id: PartId, new_parent: &Part) -> Result<bool> {
        if new_parent.id == part_id {
            return Ok(true);
        }
        Ok(self
            .breadcrumb(new_parent)?
            .iter()
            .any(|ancestor| ancestor.id == part_id))
    }
}
