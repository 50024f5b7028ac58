//! Identifier allocation
//!
//! Assemblies are spaced [`ASSEMBLY_STRIDE`] apart. Children of an
//! assembly take consecutive numbers after it, never reaching the next
//! multiple of the stride. The caller must hold the project's write lock
//! across allocation and insert; two allocations under the same parent are
//! otherwise free to compute the same number.

use tracing::debug;

use crate::core::error::{NumberingError, Result};
use crate::core::identity::{PartNumber, PartType, ASSEMBLY_STRIDE};
use crate::store::{Part, PartRecordStore, Project};

/// Next assembly id given the current maximum
pub fn next_assembly_id(max_existing: Option<u32>) -> Result<u32> {
    match max_existing {
        None => Ok(0),
        Some(max) => (max / ASSEMBLY_STRIDE)
            .checked_add(1)
            .and_then(|block| block.checked_mul(ASSEMBLY_STRIDE))
            .ok_or(NumberingError::AssemblySlotsExhausted),
    }
}

/// Next part id under `parent` given the highest id already taken in its
/// block
pub fn next_part_id(parent: &Part, max_child: Option<u32>) -> Result<u32> {
    let overflow = |attempted| NumberingError::NumericIdOverflow {
        parent_number: parent.part_number.clone(),
        attempted,
    };

    let next = max_child
        .unwrap_or(parent.numeric_id)
        .checked_add(1)
        .ok_or_else(|| overflow(u32::MAX))?;
    if next % ASSEMBLY_STRIDE == 0 {
        return Err(overflow(next));
    }
    Ok(next)
}

/// Computes the next identifier from what the store already holds
pub struct IdentifierAllocator<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S: PartRecordStore + ?Sized> IdentifierAllocator<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Allocate the next `(numeric_id, part_number)` pair.
    ///
    /// Every assembly takes a fresh block, nested or not; parts number
    /// consecutively after the highest id taken in their parent's block.
    pub fn allocate(
        &self,
        project: &Project,
        part_type: PartType,
        parent: Option<&Part>,
    ) -> Result<(u32, PartNumber)> {
        let numeric_id = match (part_type, parent) {
            (PartType::Assembly, _) => {
                let max = self.store.max_assembly_id(project.id)?;
                next_assembly_id(max)?
            }
            (PartType::Part, Some(parent)) => {
                // Scoped to the block, not to the parent's current children:
                // moved records keep their numbers.
                let max = self.store.max_id_in_block(project.id, parent.numeric_id)?;
                next_part_id(parent, max)?
            }
            (PartType::Part, None) => {
                return Err(NumberingError::ParentNotFound { parent_id: None })
            }
        };

        let part_number = PartNumber::new(&project.prefix, part_type, numeric_id);
        debug!(
            project = %project.prefix,
            part_type = %part_type,
            numeric_id,
            part_number = %part_number,
            "allocated identifier"
        );
        Ok((numeric_id, part_number))
    }
}
