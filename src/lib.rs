//! partnum: part numbering and hierarchy derivation
//!
//! Assigns collision-free part numbers to the parts and assemblies of a
//! project and derives their subteam and subsystem from where they sit in
//! the assembly tree.

pub mod cli;
pub mod core;
pub mod engine;
pub mod store;
