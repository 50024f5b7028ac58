//! Configuration management with layered hierarchy
//!
//! Sources, lowest priority first: built-in defaults, the global user config
//! (`~/.config/partnum/config.yaml`), the workspace config
//! (`.partnum/config.yaml`), then `PARTNUM_*` environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::workspace::Workspace;
use crate::engine::EngineConfig;
use crate::engine::DEFAULT_MAX_DEPTH;
use crate::store::DEFAULT_BUSY_TIMEOUT;

/// Environment variable naming the default project prefix
pub const ENV_PROJECT: &str = "PARTNUM_PROJECT";
/// Environment variable overriding the ancestor walk bound
pub const ENV_MAX_DEPTH: &str = "PARTNUM_MAX_DEPTH";

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project prefix used when none is given on the command line
    pub default_project: Option<String>,

    /// Bound on ancestor hops during derivation
    pub max_hierarchy_depth: Option<usize>,

    /// Milliseconds to wait for the database write lock
    pub busy_timeout_ms: Option<u64>,

    /// Log level when `PARTNUM_LOG` is unset
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        if let Some(global) = Self::global_config_path().and_then(|p| Self::read(&p)) {
            config.merge(global);
        }

        if let Some(local) = workspace.and_then(|w| Self::read(&w.config_path())) {
            config.merge(local);
        }

        if let Ok(project) = std::env::var(ENV_PROJECT) {
            if !project.trim().is_empty() {
                config.default_project = Some(project);
            }
        }
        if let Some(depth) = std::env::var(ENV_MAX_DEPTH)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            config.max_hierarchy_depth = Some(depth);
        }

        config
    }

    /// Parse one config file; unreadable, empty or malformed files are skipped
    fn read(path: &Path) -> Option<Config> {
        let contents = std::fs::read_to_string(path).ok()?;
        serde_yml::from_str::<Config>(&contents).ok()
    }

    /// Path of the per-user config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "partnum")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.default_project.is_some() {
            self.default_project = other.default_project;
        }
        if other.max_hierarchy_depth.is_some() {
            self.max_hierarchy_depth = other.max_hierarchy_depth;
        }
        if other.busy_timeout_ms.is_some() {
            self.busy_timeout_ms = other.busy_timeout_ms;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_hierarchy_depth: self
                .max_hierarchy_depth
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_MAX_DEPTH),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BUSY_TIMEOUT)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("warn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut config = Config {
            default_project: Some("BP25".into()),
            busy_timeout_ms: Some(100),
            ..Default::default()
        };
        config.merge(Config {
            default_project: Some("BP26".into()),
            ..Default::default()
        });
        assert_eq!(config.default_project.as_deref(), Some("BP26"));
        assert_eq!(config.busy_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine_config().max_hierarchy_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.busy_timeout(), DEFAULT_BUSY_TIMEOUT);
        assert_eq!(config.log_level(), "warn");
    }

    #[test]
    fn test_zero_depth_falls_back() {
        let config = Config {
            max_hierarchy_depth: Some(0),
            ..Default::default()
        };
        assert_eq!(config.engine_config().max_hierarchy_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_parse_yaml() {
        let config: Config =
            serde_yml::from_str("default_project: BP25\nmax_hierarchy_depth: 8\n").unwrap();
        assert_eq!(config.default_project.as_deref(), Some("BP25"));
        assert_eq!(config.engine_config().max_hierarchy_depth, 8);
    }
}
