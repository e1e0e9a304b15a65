use crate::error::{MaxCustom, ScpError};
use crate::policy::AttachmentLimits;
use scpguard_types::{MirrorPath, NodeKind};

/// Attachment-bearing files found in one mirror directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirectoryCounts {
    /// Local policy definitions (`*.json`).
    pub custom: usize,
    /// Shared markers (`*.shared`).
    pub shared: usize,
    /// Guardrail markers; externally managed and not counted against the limits.
    pub guardrail: usize,
    /// Baseline placeholder; never counted against the limits.
    pub baseline: usize,
}

impl DirectoryCounts {
    /// Attachments this tool manages in the directory.
    pub fn total(&self) -> usize {
        self.custom + self.shared
    }
}

/// Validate one directory against the attachment limits.
///
/// Every directory is capped on its total; organizational-unit directories are additionally
/// capped on their custom definitions.
pub fn check_directory(
    path: &MirrorPath,
    kind: NodeKind,
    counts: &DirectoryCounts,
    limits: &AttachmentLimits,
) -> Result<(), ScpError> {
    let unit_cap = (kind == NodeKind::OrganizationalUnit).then_some(limits.max_custom_per_unit);

    let over_total = counts.total() > limits.max_attachments;
    let over_custom = unit_cap.is_some_and(|cap| counts.custom > cap);

    if over_total || over_custom {
        return Err(ScpError::StructuralViolation {
            path: path.clone(),
            total: counts.total(),
            custom: counts.custom,
            max_total: limits.max_attachments,
            max_custom: MaxCustom(unit_cap),
        });
    }
    Ok(())
}
