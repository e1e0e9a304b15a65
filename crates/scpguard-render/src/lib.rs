//! Text renderers. Pure functions from in-memory values to strings; no IO.

#![forbid(unsafe_code)]

mod diagnostic;
mod terraform;

pub use diagnostic::{render_blocking_markdown, render_blocking_text};
pub use terraform::{
    AttachmentImportBlock, GENERATED_HEADER, ModuleBlock, PolicyImportBlock,
    render_attachment_imports, render_manifest, render_policy_imports, terraform_module_name,
};
