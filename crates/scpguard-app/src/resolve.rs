//! The `resolve` use case: read the mirror back and regenerate the provisioning manifest.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use scpguard_mirror::{AttachmentMap, write_atomic};
use scpguard_org::OrgDirectory;
use scpguard_render::ModuleBlock;
use scpguard_settings::ResolvedConfig;
use tracing::info;

pub struct ResolveInput<'a> {
    pub directory: &'a dyn OrgDirectory,
    pub mirror_root: &'a Utf8Path,
    pub config: &'a ResolvedConfig,
    /// Where to write the manifest; defaults to `<mirror_root>/<outputs.manifest>`.
    ///
    /// Definition paths inside the manifest are relative to `mirror_root`.
    pub manifest_out: Option<Utf8PathBuf>,
}

#[derive(Debug)]
pub struct ResolveOutput {
    pub records: AttachmentMap,
    pub manifest_path: Utf8PathBuf,
    pub manifest: String,
}

/// Resolve attachments from the mirror and write the manifest in one atomic step.
///
/// Nothing is written when resolution fails.
pub fn run_resolve(input: ResolveInput<'_>) -> anyhow::Result<ResolveOutput> {
    let effective = &input.config.effective;
    let records = scpguard_mirror::resolve(input.directory, input.mirror_root, effective)
        .with_context(|| format!("resolve attachments under {}", input.mirror_root))?;

    let blocks: Vec<ModuleBlock> = records
        .iter()
        .map(|(name, record)| ModuleBlock {
            policy_name: name.clone(),
            path: record.path.clone(),
            targets: record.targets.clone(),
        })
        .collect();
    let manifest = scpguard_render::render_manifest(&blocks, &effective.outputs.module_source);

    let manifest_path = input
        .manifest_out
        .unwrap_or_else(|| input.mirror_root.join(&effective.outputs.manifest));
    write_atomic(&manifest_path, manifest.as_bytes())
        .with_context(|| format!("write {manifest_path}"))?;
    info!(path = %manifest_path, modules = blocks.len(), "wrote provisioning manifest");

    Ok(ResolveOutput {
        records,
        manifest_path,
        manifest,
    })
}
