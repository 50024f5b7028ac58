//! CLI command implementations

pub mod completions;
pub mod config;
pub mod hierarchy;
pub mod import;
pub mod init;
pub mod part;
pub mod project;
pub mod tree;
