//! Error taxonomy for the numbering engine
//!
//! Every failure a caller can observe is a [`NumberingError`]. Errors are
//! grouped into categories so outer layers can decide how to react without
//! matching every variant: validation and overflow failures are the caller's
//! fault, structural failures point at corrupt ancestry, and conflicts are
//! the only category that is ever retried.

use miette::Diagnostic;
use thiserror::Error;

use crate::core::identity::{IdParseError, PartId, ProjectId};
use crate::store::StoreError;

/// Result alias used throughout the engine
pub type Result<T, E = NumberingError> = std::result::Result<T, E>;

/// Coarse classification of a [`NumberingError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Overflow,
    Structural,
    Conflict,
    Store,
}

#[derive(Debug, Error, Diagnostic)]
pub enum NumberingError {
    #[error("invalid part type '{0}': expected 'assembly' or 'part'")]
    #[diagnostic(code(partnum::validation::invalid_type))]
    InvalidType(String),

    #[error("project {0} not found")]
    #[diagnostic(code(partnum::validation::project_not_found))]
    ProjectNotFound(String),

    #[error("part {0} not found")]
    #[diagnostic(code(partnum::validation::part_not_found))]
    PartNotFound(String),

    #[error("{}", parent_not_found_message(.parent_id))]
    #[diagnostic(
        code(partnum::validation::parent_not_found),
        help("parts must be created under an existing assembly")
    )]
    ParentNotFound { parent_id: Option<PartId> },

    #[error("parent {parent_id} belongs to project {parent_project}, not {project}")]
    #[diagnostic(code(partnum::validation::parent_project_mismatch))]
    ParentProjectMismatch {
        parent_id: PartId,
        parent_project: ProjectId,
        project: ProjectId,
    },

    #[error("parent {parent_id} is a part; only assemblies can have children")]
    #[diagnostic(code(partnum::validation::parent_type_mismatch))]
    ParentTypeMismatch { parent_id: PartId },

    #[error("subteam {0} does not reference an existing assembly")]
    #[diagnostic(code(partnum::validation::invalid_subteam))]
    InvalidSubteam(PartId),

    #[error("subsystem {0} does not reference an existing assembly")]
    #[diagnostic(code(partnum::validation::invalid_subsystem))]
    InvalidSubsystem(PartId),

    #[error("malformed reference: {0}")]
    #[diagnostic(
        code(partnum::validation::invalid_reference),
        help("refer to parts by part number (BP25-A-0000) or store id (#12)")
    )]
    InvalidReference(String),

    #[error("invalid project prefix '{0}'")]
    #[diagnostic(
        code(partnum::validation::invalid_prefix),
        help("prefixes are 1-10 ASCII letters or digits, e.g. BP25")
    )]
    InvalidPrefix(String),

    #[error("a project with prefix '{0}' already exists")]
    #[diagnostic(code(partnum::validation::duplicate_prefix))]
    DuplicatePrefix(String),

    #[error("name must not be blank")]
    #[diagnostic(code(partnum::validation::invalid_name))]
    InvalidName,

    #[error("part {0} still has children")]
    #[diagnostic(
        code(partnum::validation::has_children),
        help("delete or move its children first")
    )]
    HasChildren(PartId),

    #[error("cannot assign numeric id {attempted} under {parent_number}: at most 99 parts may be created directly under one assembly")]
    #[diagnostic(code(partnum::overflow::numeric_id))]
    NumericIdOverflow {
        parent_number: String,
        attempted: u32,
    },

    #[error("no assembly numbers left in this project")]
    #[diagnostic(code(partnum::overflow::assembly_slots))]
    AssemblySlotsExhausted,

    #[error("cycle detected in ancestry at {part_id}")]
    #[diagnostic(code(partnum::structural::cycle))]
    CycleDetected { part_id: PartId },

    #[error("ancestry of {start} exceeds {max_depth} levels")]
    #[diagnostic(code(partnum::structural::too_deep))]
    HierarchyTooDeep { start: PartId, max_depth: usize },

    #[error("numbering conflict: {0}")]
    #[diagnostic(code(partnum::conflict::unique))]
    Conflict(String),

    #[error("numbering conflict persisted after {attempts} attempts: {detail}")]
    #[diagnostic(
        code(partnum::conflict::transient),
        help("another writer claimed the same number; try again")
    )]
    TransientConflict { attempts: usize, detail: String },

    #[error(transparent)]
    #[diagnostic(code(partnum::store::error))]
    Store(StoreError),
}

impl NumberingError {
    /// Which part of the taxonomy this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            NumberingError::InvalidType(_)
            | NumberingError::ProjectNotFound(_)
            | NumberingError::PartNotFound(_)
            | NumberingError::ParentNotFound { .. }
            | NumberingError::ParentProjectMismatch { .. }
            | NumberingError::ParentTypeMismatch { .. }
            | NumberingError::InvalidSubteam(_)
            | NumberingError::InvalidSubsystem(_)
            | NumberingError::InvalidReference(_)
            | NumberingError::InvalidPrefix(_)
            | NumberingError::DuplicatePrefix(_)
            | NumberingError::InvalidName
            | NumberingError::HasChildren(_) => ErrorCategory::Validation,
            NumberingError::NumericIdOverflow { .. } | NumberingError::AssemblySlotsExhausted => {
                ErrorCategory::Overflow
            }
            NumberingError::CycleDetected { .. } | NumberingError::HierarchyTooDeep { .. } => {
                ErrorCategory::Structural
            }
            NumberingError::Conflict(_) | NumberingError::TransientConflict { .. } => {
                ErrorCategory::Conflict
            }
            NumberingError::Store(_) => ErrorCategory::Store,
        }
    }
}

fn parent_not_found_message(parent_id: &Option<PartId>) -> String {
    match parent_id {
        Some(id) => format!("parent assembly {id} not found"),
        None => "a parent assembly is required for type 'part'".to_string(),
    }
}

impl From<StoreError> for NumberingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation(detail) => NumberingError::Conflict(detail),
            other => NumberingError::Store(other),
        }
    }
}

impl From<rusqlite::Error> for NumberingError {
    fn from(value: rusqlite::Error) -> Self {
        StoreError::from(value).into()
    }
}

impl From<IdParseError> for NumberingError {
    fn from(value: IdParseError) -> Self {
        match value {
            IdParseError::InvalidType(raw) => NumberingError::InvalidType(raw),
            IdParseError::InvalidPrefix(raw) => NumberingError::InvalidPrefix(raw),
            other => NumberingError::InvalidReference(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            NumberingError::InvalidType("x".into()).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            NumberingError::NumericIdOverflow {
                parent_number: "BP25-A-0000".into(),
                attempted: 100
            }
            .category(),
            ErrorCategory::Overflow
        );
        assert_eq!(
            NumberingError::CycleDetected { part_id: PartId(1) }.category(),
            ErrorCategory::Structural
        );
        assert_eq!(
            NumberingError::TransientConflict {
                attempts: 2,
                detail: "x".into()
            }
            .category(),
            ErrorCategory::Conflict
        );
    }

    #[test]
    fn test_unique_violation_becomes_conflict() {
        let err: NumberingError = StoreError::UniqueViolation("parts.part_number".into()).into();
        assert!(matches!(err, NumberingError::Conflict(_)));
    }

    #[test]
    fn test_parent_not_found_messages() {
        let missing = NumberingError::ParentNotFound {
            parent_id: Some(PartId(9)),
        };
        assert_eq!(missing.to_string(), "parent assembly #9 not found");

        let absent = NumberingError::ParentNotFound { parent_id: None };
        assert!(absent.to_string().contains("required"));
    }
}
