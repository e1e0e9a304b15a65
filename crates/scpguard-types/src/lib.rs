//! Stable DTOs and IDs used across the scpguard workspace.
//!
//! This crate is intentionally boring:
//! - organization node identities and kinds
//! - policy summaries as returned by the directory service
//! - canonical mirror-relative path handling
//! - the diagnostic report emitted by `find-blocking`

#![forbid(unsafe_code)]

pub mod ids;
pub mod node;
pub mod path;
pub mod policy;
pub mod report;

pub use node::{HierarchyNode, NodeId, NodeKind};
pub use path::MirrorPath;
pub use policy::{PolicyClass, PolicyDetail, PolicySummary};
pub use report::{
    AccessQuery, BlockingCandidate, BlockingData, BlockingReport, SCHEMA_BLOCKING_REPORT_V1,
    ToolMeta, UnevaluatedCondition,
};
