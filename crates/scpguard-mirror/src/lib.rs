//! Mirror adapters: materialize the live hierarchy on disk and read attachments back.
//!
//! This crate is allowed to do filesystem IO. Writes are staged and renamed into place so a
//! failed run leaves the previous mirror and generated files untouched.

#![forbid(unsafe_code)]

mod definition;
mod fs;
mod resolve;
mod snapshot;
mod sync;

pub use definition::{DefinitionFile, read_definition, render_definition};
pub use fs::write_atomic;
pub use resolve::{AttachmentMap, AttachmentRecord, resolve};
pub use snapshot::{MirrorSnapshot, read_snapshot};
pub use sync::{
    AttachmentImport, ImportPlan, PolicyImport, StagedSync, SyncOptions, SyncOutcome,
    SyncedPolicy, Synchronizer,
};
