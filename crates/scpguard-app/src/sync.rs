//! The `sync` use case: mirror the organization and write import manifests.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use scpguard_mirror::{SyncOptions, SyncOutcome, Synchronizer};
use scpguard_org::OrgDirectory;
use scpguard_render::{AttachmentImportBlock, PolicyImportBlock};
use scpguard_settings::ResolvedConfig;
use tracing::info;

pub struct SyncInput<'a> {
    pub directory: &'a dyn OrgDirectory,
    /// Directory that holds the mirror and the generated Terraform files.
    pub mirror_root: &'a Utf8Path,
    pub config: &'a ResolvedConfig,
}

#[derive(Debug)]
pub struct SyncOutput {
    pub outcome: SyncOutcome,
    /// Import manifests written by this run.
    pub written: Vec<Utf8PathBuf>,
}

/// Mirror the organization and regenerate both import manifests unless imports are skipped.
///
/// Both manifests are staged next to their destinations before the mirror is swapped into
/// place; a failure up to that point leaves the mirror and every manifest untouched. Import
/// manifests are rewritten wholesale, so each block appears once however often this runs.
pub fn run_sync(input: SyncInput<'_>) -> anyhow::Result<SyncOutput> {
    let options = SyncOptions {
        skip_custom_refresh: input.config.skip_custom_refresh,
        skip_imports: input.config.skip_imports,
    };
    let effective = &input.config.effective;

    let mut staged = Synchronizer::new(input.directory, effective, options)
        .stage(input.mirror_root)
        .with_context(|| format!("sync mirror under {}", input.mirror_root))?;

    let mut written = Vec::new();
    if let Some(plan) = staged.outcome().imports.clone() {
        let attachments: Vec<AttachmentImportBlock> = plan
            .attachments
            .into_iter()
            .map(|a| AttachmentImportBlock {
                policy_name: a.policy_name,
                policy_id: a.policy_id,
                target: a.target,
            })
            .collect();
        let path = input.mirror_root.join(&effective.outputs.attachment_imports);
        staged
            .stage_file(
                &path,
                scpguard_render::render_attachment_imports(&attachments).as_bytes(),
            )
            .with_context(|| format!("write {path}"))?;
        info!(path = %path, blocks = attachments.len(), "staged attachment imports");
        written.push(path);

        let policies: Vec<PolicyImportBlock> = plan
            .policies
            .into_iter()
            .map(|p| PolicyImportBlock {
                policy_name: p.policy_name,
                policy_id: p.policy_id,
            })
            .collect();
        let path = input.mirror_root.join(&effective.outputs.policy_imports);
        staged
            .stage_file(
                &path,
                scpguard_render::render_policy_imports(&policies).as_bytes(),
            )
            .with_context(|| format!("write {path}"))?;
        info!(path = %path, blocks = policies.len(), "staged policy imports");
        written.push(path);
    }

    let outcome = staged
        .commit()
        .with_context(|| format!("commit mirror under {}", input.mirror_root))?;
    Ok(SyncOutput { outcome, written })
}
