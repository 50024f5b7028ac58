//! Shared helper functions for CLI commands
//!
//! Workspace discovery, project selection and part reference resolution
//! used by every command that touches the database.

use miette::Result;

use crate::cli::GlobalOpts;
use crate::core::{Config, NumberingError, Workspace};
use crate::engine::PartNumberingService;
use crate::store::{Part, PartStore, Project};

/// Everything a command needs once the workspace is open
pub struct Session {
    pub workspace: Workspace,
    pub config: Config,
    pub service: PartNumberingService,
}

/// Locate the workspace from `--workspace` or the current directory
pub fn find_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let found = match &global.workspace {
        Some(path) => Workspace::discover_from(path),
        None => Workspace::discover(),
    };
    found.map_err(|e| miette::miette!("{}", e))
}

/// Open the workspace database with the effective configuration
pub fn open_session(global: &GlobalOpts) -> Result<Session> {
    let workspace = find_workspace(global)?;
    let config = Config::load(Some(&workspace));
    let store = PartStore::open(&workspace.database_path(), config.busy_timeout())
        .map_err(NumberingError::from)?;
    let service = PartNumberingService::new(store, config.engine_config());
    Ok(Session {
        workspace,
        config,
        service,
    })
}

impl Session {
    /// The project selected by `--project`, the environment or config.
    ///
    /// With nothing selected, a workspace holding exactly one project
    /// uses that project.
    pub fn project(&self, global: &GlobalOpts) -> Result<Project> {
        let prefix = global
            .project
            .clone()
            .or_else(|| self.config.default_project.clone());
        if let Some(prefix) = prefix {
            return Ok(self.service.project_by_prefix(prefix.trim())?);
        }

        let mut projects = self.service.list_projects()?;
        match projects.len() {
            1 => Ok(projects.remove(0)),
            0 => Err(miette::miette!(
                help = "create one with `partnum project new <NAME> <PREFIX>`",
                "no projects in this workspace"
            )),
            _ => Err(miette::miette!(
                help = "pass --project <PREFIX> or set default_project in .partnum/config.yaml",
                "{} projects in this workspace; choose one",
                projects.len()
            )),
        }
    }

    /// Resolve a part number or `#id`
    pub fn part(&self, reference: &str) -> Result<Part> {
        Ok(self.service.resolve_ref(reference)?)
    }

    /// Resolve an optional reference
    pub fn part_opt(&self, reference: Option<&str>) -> Result<Option<Part>> {
        reference.map(|r| self.part(r)).transpose()
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("Pédale gauche", 6), "Péd...");
    }
}
