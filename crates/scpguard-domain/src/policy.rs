use crate::error::ScpError;
use scpguard_types::ids;
use scpguard_types::{HierarchyNode, MirrorPath, NodeId, NodeKind};
use std::collections::BTreeMap;

/// Naming conventions of the on-disk mirror.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirrorLayout {
    pub mirror_dir: String,
    pub root_dir: String,
    pub shared_dir: String,
    pub account_suffix: String,
}

impl Default for MirrorLayout {
    fn default() -> Self {
        Self {
            mirror_dir: ids::DEFAULT_MIRROR_DIR.to_string(),
            root_dir: ids::DEFAULT_ROOT_DIR.to_string(),
            shared_dir: ids::DEFAULT_SHARED_DIR.to_string(),
            account_suffix: ids::DEFAULT_ACCOUNT_SUFFIX.to_string(),
        }
    }
}

impl MirrorLayout {
    pub fn mirror_path(&self) -> MirrorPath {
        MirrorPath::new(&self.mirror_dir)
    }

    pub fn root_path(&self) -> MirrorPath {
        self.mirror_path().join(&self.root_dir)
    }

    pub fn shared_path(&self) -> MirrorPath {
        self.mirror_path().join(&self.shared_dir)
    }

    /// Canonical definition of a policy attached more than once.
    pub fn shared_definition(&self, policy: &str) -> MirrorPath {
        self.shared_path()
            .join(&format!("{policy}.{}", ids::EXT_DEFINITION))
    }

    /// Directory name for a node: the root is fixed, accounts carry a suffix so they never
    /// collide with a unit of the same name.
    pub fn node_dir_name(&self, node: &HierarchyNode) -> String {
        match node.kind {
            NodeKind::Root => self.root_dir.clone(),
            NodeKind::Account => format!("{}{}", node.name, self.account_suffix),
            NodeKind::OrganizationalUnit => node.name.clone(),
        }
    }

    /// Mirror directory of every child under `parent`, in the given order.
    ///
    /// Two siblings whose directory names differ only by case map to the same directory on a
    /// case-insensitive filesystem; that is an [`ScpError::Integrity`] naming both nodes.
    pub fn child_paths(
        &self,
        parent: &MirrorPath,
        children: Vec<HierarchyNode>,
    ) -> Result<Vec<(HierarchyNode, MirrorPath)>, ScpError> {
        let mut claimed: BTreeMap<String, NodeId> = BTreeMap::new();
        let mut paths = Vec::with_capacity(children.len());
        for child in &children {
            let name = self.node_dir_name(child);
            if let Some(first) = claimed.insert(name.to_lowercase(), child.id.clone()) {
                return Err(ScpError::Integrity(format!(
                    "{} and {} both map to mirror directory {}",
                    first,
                    child.id,
                    parent.join(&name)
                )));
            }
            paths.push(parent.join(&name));
        }
        Ok(children.into_iter().zip(paths).collect())
    }
}

/// Names that decide how an attached policy is classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classifier {
    pub baseline_name: String,
    pub guardrail_prefix: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            baseline_name: ids::DEFAULT_BASELINE_POLICY.to_string(),
            guardrail_prefix: ids::DEFAULT_GUARDRAIL_PREFIX.to_string(),
        }
    }
}

impl Classifier {
    pub fn is_baseline(&self, policy: &str) -> bool {
        policy == self.baseline_name
    }

    pub fn is_guardrail(&self, policy: &str) -> bool {
        policy.starts_with(&self.guardrail_prefix)
    }

    /// Customer-managed policies are the ones this tool authors: neither baseline nor guardrail.
    pub fn is_customer_managed(&self, policy: &str) -> bool {
        !self.is_baseline(policy) && !self.is_guardrail(policy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentLimits {
    /// Custom plus shared attachments per directory.
    pub max_attachments: usize,
    /// Custom attachments per organizational-unit directory.
    pub max_custom_per_unit: usize,
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            max_attachments: ids::DEFAULT_MAX_ATTACHMENTS,
            max_custom_per_unit: ids::DEFAULT_MAX_CUSTOM_PER_UNIT,
        }
    }
}

/// Where generated artifacts go and how they reference the provisioning module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub manifest: String,
    pub attachment_imports: String,
    pub policy_imports: String,
    pub module_source: String,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            manifest: ids::DEFAULT_MANIFEST_FILE.to_string(),
            attachment_imports: ids::DEFAULT_ATTACHMENT_IMPORTS_FILE.to_string(),
            policy_imports: ids::DEFAULT_POLICY_IMPORTS_FILE.to_string(),
            module_source: ids::DEFAULT_MODULE_SOURCE.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub layout: MirrorLayout,
    pub classifier: Classifier,
    pub limits: AttachmentLimits,
    pub outputs: OutputPaths,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str) -> HierarchyNode {
        let id = NodeId::new(id);
        HierarchyNode {
            kind: id.kind(),
            id,
            name: name.to_string(),
            parent: None,
        }
    }

    #[test]
    fn default_layout_paths() {
        let layout = MirrorLayout::default();
        assert_eq!(layout.root_path().as_str(), "service_control_policies/ROOT");
        assert_eq!(
            layout.shared_definition("DenyLeave").as_str(),
            "service_control_policies/SHARED/DenyLeave.json"
        );
    }

    #[test]
    fn node_dir_names_by_kind() {
        let layout = MirrorLayout::default();
        assert_eq!(layout.node_dir_name(&node("r-ab12", "Root")), "ROOT");
        assert_eq!(layout.node_dir_name(&node("ou-ab12-11111111", "Security")), "Security");
        assert_eq!(
            layout.node_dir_name(&node("111111111111", "log-archive")),
            "log-archive_ACCOUNT"
        );
    }

    #[test]
    fn sibling_directories_must_be_distinct() {
        let layout = MirrorLayout::default();
        let parent = MirrorPath::new("service_control_policies/ROOT/Dev");

        let paths = layout
            .child_paths(
                &parent,
                vec![node("111111111111", "sandbox"), node("ou-ab12-11111111", "sandbox")],
            )
            .unwrap();
        assert_eq!(paths[0].1.as_str(), "service_control_policies/ROOT/Dev/sandbox_ACCOUNT");
        assert_eq!(paths[1].1.as_str(), "service_control_policies/ROOT/Dev/sandbox");

        let err = layout
            .child_paths(
                &parent,
                vec![node("111111111111", "sandbox"), node("222222222222", "Sandbox")],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ScpError::Integrity(ref msg)
                if msg == "111111111111 and 222222222222 both map to mirror directory service_control_policies/ROOT/Dev/Sandbox_ACCOUNT"
        ));
    }

    #[test]
    fn classifier_names() {
        let c = Classifier::default();
        assert!(c.is_baseline("FullAWSAccess"));
        assert!(c.is_guardrail("aws-guardrails-AbCdEf"));
        assert!(c.is_customer_managed("DenyRegion"));
        assert!(!c.is_customer_managed("aws-guardrails-AbCdEf"));
    }
}
