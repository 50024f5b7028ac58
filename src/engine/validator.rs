//! Structural checks run before any number is allocated
//!
//! # Invariants
//! - A `part` has a parent; an `assembly` may have one.
//! - A parent is always an assembly in the same project.
//! - Explicit subteam/subsystem overrides reference assemblies of the same
//!   project.

use crate::core::error::{NumberingError, Result};
use crate::core::identity::{PartId, PartType, ProjectId};
use crate::store::{Part, PartRecordStore, Project};

/// Parse a raw type string
pub fn parse_type(raw: &str) -> Result<PartType> {
    raw.parse::<PartType>().map_err(Into::into)
}

/// Check that `part_type` may live under `parent` inside `project`.
///
/// Pure with respect to the already-loaded records.
pub fn validate_parentage(
    part_type: PartType,
    project: &Project,
    parent: Option<&Part>,
) -> Result<()> {
    let parent = match (part_type, parent) {
        (PartType::Part, None) => return Err(NumberingError::ParentNotFound { parent_id: None }),
        (PartType::Assembly, None) => return Ok(()),
        (_, Some(parent)) => parent,
    };

    if parent.project_id != project.id {
        return Err(NumberingError::ParentProjectMismatch {
            parent_id: parent.id,
            parent_project: parent.project_id,
            project: project.id,
        });
    }
    if parent.part_type != PartType::Assembly {
        return Err(NumberingError::ParentTypeMismatch {
            parent_id: parent.id,
        });
    }
    Ok(())
}

/// Validates references against the store
pub struct ConstraintValidator<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S: PartRecordStore + ?Sized> ConstraintValidator<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Load the requested parent, failing if an id was given but nothing
    /// exists under it
    pub fn load_parent(&self, parent_id: Option<PartId>) -> Result<Option<Part>> {
        match parent_id {
            None => Ok(None),
            Some(id) => self
                .store
                .get_part(id)?
                .map(Some)
                .ok_or(NumberingError::ParentNotFound {
                    parent_id: Some(id),
                }),
        }
    }

    /// Check manually supplied subteam/subsystem references: each must be an
    /// assembly of `project_id`
    pub fn validate_overrides(
        &self,
        project_id: ProjectId,
        subteam_id: Option<PartId>,
        subsystem_id: Option<PartId>,
    ) -> Result<()> {
        if let Some(id) = subteam_id {
            if !self.is_assembly_in(project_id, id)? {
                return Err(NumberingError::InvalidSubteam(id));
            }
        }
        if let Some(id) = subsystem_id {
            if !self.is_assembly_in(project_id, id)? {
                return Err(NumberingError::InvalidSubsystem(id));
            }
        }
        Ok(())
    }

    fn is_assembly_in(&self, project_id: ProjectId, id: PartId) -> Result<bool> {
        Ok(self
            .store
            .get_part(id)?
            .is_some_and(|part| part.is_assembly() && part.project_id == project_id))
    }
}

/// Trim a display name, rejecting blank ones
pub fn normalize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NumberingError::InvalidName);
    }
    Ok(trimmed.to_string())
}
