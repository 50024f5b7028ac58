//! Part numbering and hierarchy derivation
//!
//! - [`validator`]: structural checks before allocation
//! - [`allocator`]: next numeric id and formatted part number
//! - [`hierarchy`]: bounded ancestor walk and subteam/subsystem derivation
//! - [`tree`]: nested project view
//! - [`service`]: transactional orchestration with conflict retry

pub mod allocator;
pub mod hierarchy;
pub mod service;
pub mod tree;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use allocator::IdentifierAllocator;
pub use hierarchy::{Classification, HierarchyResolver, DEFAULT_MAX_DEPTH};
pub use service::{
    allocate_and_derive, Allocation, CreatePart, EngineConfig, HierarchyInfo, PartNumberingService,
};
pub use tree::{ProjectTree, TreeNode};
pub use validator::ConstraintValidator;
