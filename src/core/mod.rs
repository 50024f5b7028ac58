//! Core module - identifiers, errors, workspace and configuration

pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod workspace;

pub use config::Config;
pub use error::{ErrorCategory, NumberingError, Result};
pub use identity::{IdParseError, PartId, PartNumber, PartType, ProjectId};
pub use workspace::{Workspace, WorkspaceError};
