use scpguard_types::{MirrorPath, NodeId};

/// First line of every generated Terraform file.
pub const GENERATED_HEADER: &str =
    "# This file was automatically generated by scpguard and may require manual review\n";

/// One `module` block of the provisioning manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleBlock {
    pub policy_name: String,
    /// Canonical definition file, relative to the directory the manifest is written to.
    pub path: MirrorPath,
    pub targets: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentImportBlock {
    pub policy_name: String,
    pub policy_id: String,
    pub target: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyImportBlock {
    pub policy_name: String,
    pub policy_id: String,
}

/// Terraform identifiers cannot contain spaces; policy names can.
pub fn terraform_module_name(policy_name: &str) -> String {
    policy_name.replace(' ', "_")
}

/// Escape a value for use inside a double-quoted HCL string.
fn hcl(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("${", "$${")
        .replace("%{", "%%{")
}

/// Render the provisioning manifest: one module block per policy, in the given order.
pub fn render_manifest(blocks: &[ModuleBlock], module_source: &str) -> String {
    let mut out = String::from(GENERATED_HEADER);
    for block in blocks {
        let path = hcl(block.path.as_str());
        let targets = block
            .targets
            .iter()
            .map(|t| format!("\"{}\"", hcl(t.as_str())))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            r#"
module "{module}" {{
    source          = "{source}"
    scp_name        = "{name}"
    scp_desc        = jsondecode(file("./{path}")).description
    scp_policy      = jsonencode(jsondecode(file("./{path}")).policy)
    scp_target_list = [{targets}]
}}
"#,
            module = hcl(&terraform_module_name(&block.policy_name)),
            source = hcl(module_source),
            name = hcl(&block.policy_name),
        ));
    }
    out
}

/// Render one `import` block per attachment.
pub fn render_attachment_imports(blocks: &[AttachmentImportBlock]) -> String {
    let mut out = String::from(GENERATED_HEADER);
    for block in blocks {
        let target = hcl(block.target.as_str());
        out.push_str(&format!(
            r#"
import {{
  to = module.{module}.aws_organizations_policy_attachment.attach_scp["{target}"]
  id = "{target}:{id}"
}}
"#,
            module = terraform_module_name(&block.policy_name),
            id = hcl(&block.policy_id),
        ));
    }
    out
}

/// Render one `import` block per customer-managed policy.
pub fn render_policy_imports(blocks: &[PolicyImportBlock]) -> String {
    let mut out = String::from(GENERATED_HEADER);
    for block in blocks {
        out.push_str(&format!(
            r#"
import {{
  to = module.{module}.aws_organizations_policy.create_scp
  id = "{id}"
}}
"#,
            module = terraform_module_name(&block.policy_name),
            id = hcl(&block.policy_id),
        ));
    }
    out
}
