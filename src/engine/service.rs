//! Part numbering service
//!
//! Orchestrates one create request through
//! `Validating → Allocating → Resolving → Committing`, all inside a single
//! `BEGIN IMMEDIATE` transaction. A unique-constraint conflict at commit
//! restarts the request once in a fresh transaction; anything else fails
//! immediately and rolls back.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::error::{NumberingError, Result};
use crate::core::identity::{validate_prefix, PartId, PartNumber, PartType, ProjectId};
use crate::engine::allocator::IdentifierAllocator;
use crate::engine::hierarchy::{Classification, HierarchyResolver, DEFAULT_MAX_DEPTH};
use crate::engine::tree::ProjectTree;
use crate::engine::validator::{normalize_name, validate_parentage, ConstraintValidator};
use crate::store::{
    NewPart, NewProject, Part, PartDetails, PartQueries, PartRecordStore, PartStore, PartUpdate,
    Project, ProjectStore, StoreError, DEFAULT_STATUS,
};

/// Attempts per create request: the first try plus one retry on conflict
pub const MAX_ATTEMPTS: usize = 2;

/// Tunables for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_hierarchy_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_hierarchy_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Stage of a create request, used in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Allocating,
    Resolving,
    Committing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Validating => "validating",
            Stage::Allocating => "allocating",
            Stage::Resolving => "resolving",
            Stage::Committing => "committing",
        };
        write!(f, "{s}")
    }
}

/// Result of allocation plus derivation, before anything is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub numeric_id: u32,
    pub part_number: PartNumber,
    pub subteam_id: Option<PartId>,
    pub subsystem_id: Option<PartId>,
}

/// A request to create a part or assembly
#[derive(Debug, Clone)]
pub struct CreatePart {
    pub project_id: ProjectId,
    pub part_type: PartType,
    pub parent_id: Option<PartId>,
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub quantity: Option<u32>,
    /// Explicit classification; each field left `None` is derived
    pub subteam_id: Option<PartId>,
    pub subsystem_id: Option<PartId>,
    pub details: PartDetails,
}

impl CreatePart {
    pub fn new(
        project_id: ProjectId,
        part_type: PartType,
        parent_id: Option<PartId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            project_id,
            part_type,
            parent_id,
            name: name.into(),
            description: None,
            status: None,
            quantity: None,
            subteam_id: None,
            subsystem_id: None,
            details: PartDetails::default(),
        }
    }
}

/// Subteam and subsystem candidates of a project
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyInfo {
    pub subteams: Vec<Part>,
    pub subsystems: Vec<Part>,
}

/// Validate, allocate and derive for one new record.
///
/// Must run on a store view that holds the project's write lock; the
/// returned numbers are only safe to insert through that same view.
pub fn allocate_and_derive<S>(
    store: &S,
    config: &EngineConfig,
    project_id: ProjectId,
    part_type: PartType,
    parent_id: Option<PartId>,
    explicit_subteam: Option<PartId>,
    explicit_subsystem: Option<PartId>,
) -> Result<Allocation>
where
    S: ProjectStore + PartRecordStore + ?Sized,
{
    debug!(stage = %Stage::Validating, %project_id, %part_type);
    let project = store
        .get_project(project_id)?
        .ok_or_else(|| NumberingError::ProjectNotFound(project_id.to_string()))?;
    let validator = ConstraintValidator::new(store);
    let parent = validator.load_parent(parent_id)?;
    validate_parentage(part_type, &project, parent.as_ref())?;
    validator.validate_overrides(project.id, explicit_subteam, explicit_subsystem)?;

    debug!(stage = %Stage::Allocating, %project_id);
    let (numeric_id, part_number) =
        IdentifierAllocator::new(store).allocate(&project, part_type, parent.as_ref())?;

    debug!(stage = %Stage::Resolving, %part_number);
    let derived = if explicit_subteam.is_some() && explicit_subsystem.is_some() {
        Classification::default()
    } else {
        HierarchyResolver::new(store, config.max_hierarchy_depth).resolve(parent.as_ref())?
    };
    let classification = Classification::merge(explicit_subteam, explicit_subsystem, derived);

    Ok(Allocation {
        numeric_id,
        part_number,
        subteam_id: classification.subteam_id,
        subsystem_id: classification.subsystem_id,
    })
}

fn create_in<S>(store: &S, config: &EngineConfig, request: &CreatePart, name: &str) -> Result<Part>
where
    S: ProjectStore + PartRecordStore + ?Sized,
{
    let allocation = allocate_and_derive(
        store,
        config,
        request.project_id,
        request.part_type,
        request.parent_id,
        request.subteam_id,
        request.subsystem_id,
    )?;

    debug!(stage = %Stage::Committing, part_number = %allocation.part_number);
    let record = NewPart {
        project_id: request.project_id,
        part_type: request.part_type,
        parent_id: request.parent_id,
        numeric_id: allocation.numeric_id,
        part_number: allocation.part_number.to_string(),
        name: name.to_string(),
        description: request.description.clone(),
        status: request
            .status
            .clone()
            .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        quantity: request.quantity.unwrap_or(1),
        subteam_id: allocation.subteam_id,
        subsystem_id: allocation.subsystem_id,
        details: request.details.clone(),
    };
    Ok(store.insert_part(&record)?)
}

/// Entry point for everything that changes numbering or hierarchy
pub struct PartNumberingService {
    store: PartStore,
    config: EngineConfig,
}

impl PartNumberingService {
    pub fn new(store: PartStore, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Read access to the underlying store
    pub fn store(&self) -> &PartStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Projects
    // -------------------------------------------------------------------------

    pub fn create_project(
        &mut self,
        name: &str,
        prefix: &str,
        description: Option<String>,
    ) -> Result<Project> {
        let name = normalize_name(name)?;
        let prefix = prefix.trim();
        validate_prefix(prefix)?;

        let record = NewProject {
            name,
            prefix: prefix.to_string(),
            description,
        };
        let project = match self.store.insert_project(&record) {
            Ok(project) => project,
            Err(StoreError::UniqueViolation(_)) => {
                return Err(NumberingError::DuplicatePrefix(prefix.to_string()))
            }
            Err(err) => return Err(err.into()),
        };
        info!(prefix = %project.prefix, id = %project.id, "created project");
        Ok(project)
    }

    pub fn get_project(&self, id: ProjectId) -> Result<Project> {
        self.store
            .get_project(id)?
            .ok_or_else(|| NumberingError::ProjectNotFound(id.to_string()))
    }

    pub fn project_by_prefix(&self, prefix: &str) -> Result<Project> {
        self.store
            .project_by_prefix(prefix)?
            .ok_or_else(|| NumberingError::ProjectNotFound(prefix.to_string()))
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.store.list_projects()?)
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Create a part or assembly, retrying once on a numbering conflict
    pub fn create_part(&mut self, request: &CreatePart) -> Result<Part> {
        let name = normalize_name(&request.name)?;
        let mut last_conflict = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            let tx = self.store.begin()?;
            match create_in(&*tx, &self.config, request, &name) {
                Ok(part) => {
                    tx.commit()?;
                    info!(
                        part_number = %part.part_number,
                        id = %part.id,
                        attempt,
                        "created {}",
                        part.part_type
                    );
                    return Ok(part);
                }
                Err(NumberingError::Conflict(detail)) => {
                    warn!(attempt, %detail, "numbering conflict, rolling back");
                    last_conflict = detail;
                }
                Err(err) => {
                    debug!(error = %err, "create failed, rolling back");
                    return Err(err);
                }
            }
        }

        Err(NumberingError::TransientConflict {
            attempts: MAX_ATTEMPTS,
            detail: last_conflict,
        })
    }

    /// Compute what [`Self::create_part`] would assign, without writing
    pub fn preview(&mut self, request: &CreatePart) -> Result<Allocation> {
        normalize_name(&request.name)?;
        let tx = self.store.begin()?;
        allocate_and_derive(
            &*tx,
            &self.config,
            request.project_id,
            request.part_type,
            request.parent_id,
            request.subteam_id,
            request.subsystem_id,
        )
    }

    /// Check whether a record of `part_type` could be created under `parent_id`
    pub fn validate_parentage(
        &self,
        part_type: PartType,
        parent_id: Option<PartId>,
        project_id: ProjectId,
    ) -> Result<()> {
        let conn = self.store.conn();
        let project = conn
            .get_project(project_id)?
            .ok_or_else(|| NumberingError::ProjectNotFound(project_id.to_string()))?;
        let parent = ConstraintValidator::new(conn).load_parent(parent_id)?;
        validate_parentage(part_type, &project, parent.as_ref())
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Find a part by part number or by `#id`
    pub fn resolve_ref(&self, reference: &str) -> Result<Part> {
        let reference = reference.trim();
        let found = if reference.starts_with('#') || reference.chars().all(|c| c.is_ascii_digit()) {
            let id: PartId = reference.parse()?;
            self.store.get_part(id)?
        } else {
            let number = PartNumber::parse(reference)?;
            self.store.part_by_number(&number.to_string())?
        };
        found.ok_or_else(|| NumberingError::PartNotFound(reference.to_string()))
    }

    pub fn get_part(&self, id: PartId) -> Result<Part> {
        self.store
            .get_part(id)?
            .ok_or_else(|| NumberingError::PartNotFound(id.to_string()))
    }

    /// Ancestor chain of a part, root-first, ending with the part
    pub fn breadcrumb(&self, part: &Part) -> Result<Vec<Part>> {
        HierarchyResolver::new(self.store.conn(), self.config.max_hierarchy_depth)
            .breadcrumb(part)
    }

    // -------------------------------------------------------------------------
    // Record edits
    // -------------------------------------------------------------------------

    /// Change descriptive fields. Numbers, type, project and parent stay.
    pub fn update_part(&mut self, part_id: PartId, mut update: PartUpdate) -> Result<Part> {
        update.name = update.name.as_deref().map(normalize_name).transpose()?;

        let tx = self.store.begin()?;
        let mut part = tx
            .get_part(part_id)?
            .ok_or_else(|| NumberingError::PartNotFound(part_id.to_string()))?;
        update.apply_to(&mut part);
        tx.update_details(&part)?;
        let updated = tx
            .get_part(part.id)?
            .ok_or_else(|| NumberingError::PartNotFound(part.id.to_string()))?;
        tx.commit()?;
        info!(part_number = %updated.part_number, "updated part");
        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Hierarchy changes
    // -------------------------------------------------------------------------

    /// Attach a part to a new parent, or detach it with `None`.
    ///
    /// Numbers never change. With `rederive`, subteam and subsystem are
    /// recomputed from the new position.
    pub fn move_part(
        &mut self,
        part_id: PartId,
        new_parent_id: Option<PartId>,
        rederive: bool,
    ) -> Result<Part> {
        let depth = self.config.max_hierarchy_depth;
        let tx = self.store.begin()?;

        let part = tx
            .get_part(part_id)?
            .ok_or_else(|| NumberingError::PartNotFound(part_id.to_string()))?;
        if new_parent_id == Some(part.id) {
            return Err(NumberingError::CycleDetected { part_id: part.id });
        }
        let project = tx
            .get_project(part.project_id)?
            .ok_or_else(|| NumberingError::ProjectNotFound(part.project_id.to_string()))?;

        let parent = ConstraintValidator::new(&*tx).load_parent(new_parent_id)?;
        validate_parentage(part.part_type, &project, parent.as_ref())?;

        let resolver = HierarchyResolver::new(&*tx, depth);
        if let Some(parent) = &parent {
            if resolver.would_create_cycle(part.id, parent)? {
                return Err(NumberingError::CycleDetected { part_id: part.id });
            }
        }

        tx.set_parent(part.id, new_parent_id)?;
        if rederive {
            let c = resolver.resolve(parent.as_ref())?;
            tx.set_classification(part.id, c.subteam_id, c.subsystem_id)?;
        }
        let updated = tx
            .get_part(part.id)?
            .ok_or_else(|| NumberingError::PartNotFound(part.id.to_string()))?;
        tx.commit()?;

        info!(
            part_number = %updated.part_number,
            parent = ?new_parent_id,
            rederive,
            "moved part"
        );
        Ok(updated)
    }

    /// Set subteam and subsystem explicitly
    pub fn set_classification(
        &mut self,
        part_id: PartId,
        subteam_id: Option<PartId>,
        subsystem_id: Option<PartId>,
    ) -> Result<Part> {
        let tx = self.store.begin()?;
        let part = tx
            .get_part(part_id)?
            .ok_or_else(|| NumberingError::PartNotFound(part_id.to_string()))?;
        ConstraintValidator::new(&*tx).validate_overrides(
            part.project_id,
            subteam_id,
            subsystem_id,
        )?;

        tx.set_classification(part.id, subteam_id, subsystem_id)?;
        let updated = tx
            .get_part(part.id)?
            .ok_or_else(|| NumberingError::PartNotFound(part.id.to_string()))?;
        tx.commit()?;
        info!(part_number = %updated.part_number, "updated classification");
        Ok(updated)
    }

    /// Recompute subteam and subsystem from the current position
    pub fn reclassify(&mut self, part_id: PartId) -> Result<Part> {
        let depth = self.config.max_hierarchy_depth;
        let tx = self.store.begin()?;
        let part = tx
            .get_part(part_id)?
            .ok_or_else(|| NumberingError::PartNotFound(part_id.to_string()))?;

        let resolver = HierarchyResolver::new(&*tx, depth);
        let parent = match part.parent_id {
            Some(parent_id) => tx.get_part(parent_id)?,
            None => None,
        };
        let c = resolver.resolve(parent.as_ref())?;

        tx.set_classification(part.id, c.subteam_id, c.subsystem_id)?;
        let updated = tx
            .get_part(part.id)?
            .ok_or_else(|| NumberingError::PartNotFound(part.id.to_string()))?;
        tx.commit()?;
        info!(part_number = %updated.part_number, "rederived classification");
        Ok(updated)
    }

    /// Delete a part that has no children
    pub fn delete_part(&mut self, part_id: PartId) -> Result<Part> {
        let tx = self.store.begin()?;
        let part = tx
            .get_part(part_id)?
            .ok_or_else(|| NumberingError::PartNotFound(part_id.to_string()))?;
        if tx.has_children(part.id)? {
            return Err(NumberingError::HasChildren(part.id));
        }
        tx.delete_part(part.id)?;
        tx.commit()?;
        info!(part_number = %part.part_number, "deleted part");
        Ok(part)
    }

    // -------------------------------------------------------------------------
    // Project views
    // -------------------------------------------------------------------------

    /// Assemblies that can serve as subteams (second level) and subsystems
    /// (third level)
    pub fn hierarchy_info(&self, project_id: ProjectId) -> Result<HierarchyInfo> {
        let assemblies: Vec<Part> = self
            .store
            .list_parts(project_id, None)?
            .into_iter()
            .filter(Part::is_assembly)
            .collect();

        let top: Vec<PartId> = assemblies
            .iter()
            .filter(|a| a.parent_id.is_none())
            .map(|a| a.id)
            .collect();
        let subteams: Vec<Part> = assemblies
            .iter()
            .filter(|a| a.parent_id.is_some_and(|p| top.contains(&p)))
            .cloned()
            .collect();
        let subsystems = assemblies
            .iter()
            .filter(|a| {
                a.parent_id
                    .is_some_and(|p| subteams.iter().any(|s| s.id == p))
            })
            .cloned()
            .collect();

        Ok(HierarchyInfo {
            subteams,
            subsystems,
        })
    }

    pub fn project_tree(&self, project_id: ProjectId) -> Result<ProjectTree> {
        let project = self.get_project(project_id)?;
        let parts = self.store.list_parts(project_id, None)?;
        let tree = ProjectTree::build(&project, &parts);
        for warning in &tree.warnings {
            warn!(project = %project.prefix, "{warning}");
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests;
