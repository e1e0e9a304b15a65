//! Organization directory adapters: the collaborator seam and the hierarchy walker.
//!
//! This crate talks to the directory service only through [`OrgDirectory`]. It never touches
//! the mirror on disk. Every listing is drained to completion before it is used.

#![forbid(unsafe_code)]

mod directory;
mod snapshot;
mod walker;

pub use directory::{ChildKind, OrgDirectory, Organization, Page, drain};
pub use snapshot::{
    OrgSnapshot, SnapshotAccount, SnapshotDirectory, SnapshotPolicy, SnapshotRoot, SnapshotUnit,
};
pub use walker::{Descendants, HierarchyWalker};
