use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `scpguard.toml` schema v1.
///
/// Every field is optional; anything left out keeps its default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ScpguardConfigV1 {
    /// Optional schema string for tooling (`scpguard.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Page size used when listing from an organization snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,

    #[serde(default)]
    pub mirror: MirrorConfig,

    #[serde(default)]
    pub classify: ClassifyConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub outputs: OutputsConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MirrorConfig {
    /// Top-level mirror directory (`service_control_policies`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_dir: Option<String>,

    /// Appended to account directory names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_suffix: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClassifyConfig {
    /// Name of the allow-everything policy attached at every node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardrail_prefix: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attachments: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_custom_per_unit: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OutputsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_imports: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_imports: Option<String>,

    /// Terraform module source referenced by every generated block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_source: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_custom_refresh: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_imports: Option<bool>,
}
