//! Workspace discovery and layout
//!
//! A workspace is any directory containing a `.partnum/` directory, which
//! holds the configuration file and the parts database.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::DATABASE_FILE;

/// Name of the workspace marker directory
pub const WORKSPACE_DIR: &str = ".partnum";

/// A partnum workspace on disk
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Directory containing `.partnum/`
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current =
            std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(format!("{}: {}", start.display(), e)))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }
            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if root.join(WORKSPACE_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }
        Self::create(root)
    }

    /// Initialize even if `.partnum/` exists, rewriting the default config.
    /// An existing database is left alone.
    pub fn init_force(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create(root)
    }

    fn create(root: PathBuf) -> Result<Self, WorkspaceError> {
        let workspace = Self { root };
        std::fs::create_dir_all(workspace.dir())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        std::fs::write(workspace.config_path(), Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Ok(workspace)
    }

    fn default_config() -> &'static str {
        r#"# partnum workspace configuration

# Project prefix used when --project is not given
# default_project: ""

# Maximum number of ancestor hops when deriving subteam/subsystem
# max_hierarchy_depth: 64

# Milliseconds a writer waits for the database lock
# busy_timeout_ms: 5000

# Log level when PARTNUM_LOG is unset (error, warn, info, debug, trace)
# log_level: warn
"#
    }

    /// Directory containing `.partnum/`
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.partnum/` directory
    pub fn dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir().join("config.yaml")
    }

    pub fn database_path(&self) -> PathBuf {
        self.dir().join(DATABASE_FILE)
    }
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not a partnum workspace (or any parent up to root): {searched_from}")]
    NotFound { searched_from: PathBuf },

    #[error("workspace already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_and_discover() {
        let tmp = tempdir().unwrap();
        let workspace = Workspace::init(tmp.path()).unwrap();
        assert!(workspace.config_path().is_file());

        let nested = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        let found = Workspace::discover_from(&nested).unwrap();
        assert_eq!(found.root(), workspace.root());
        assert_eq!(
            found.database_path(),
            workspace.root().join(".partnum").join("parts.db")
        );
    }

    #[test]
    fn test_init_twice_fails_without_force() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();
        assert!(matches!(
            Workspace::init(tmp.path()),
            Err(WorkspaceError::AlreadyExists(_))
        ));
        assert!(Workspace::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_discover_outside_workspace() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            Workspace::discover_from(tmp.path()),
            Err(WorkspaceError::NotFound { .. })
        ));
    }
}
