//! Use case orchestration for scpguard.
//!
//! This crate coordinates the org, mirror, domain, and render layers. It is intentionally thin.
//! The CLI crate depends on this; it only handles argument parsing and process concerns.

#![forbid(unsafe_code)]

mod blocking;
mod config;
mod report;
mod resolve;
mod sync;

pub use blocking::{FindBlockingInput, find_blocking_statements, run_find_blocking};
pub use config::load_config;
pub use report::{OutputFormat, format_report, parse_report_json, serialize_report};
pub use resolve::{ResolveInput, ResolveOutput, run_resolve};
pub use sync::{SyncInput, SyncOutput, run_sync};
