use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Policy as listed for a target or for the whole organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PolicySummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
}

/// Full policy as described by the directory service; `content` is the raw JSON policy document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyDetail {
    pub summary: PolicySummary,
    pub content: String,
}

/// How the synchronizer materializes an attached policy in the mirror.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PolicyClass {
    /// Written in full in the directory of the single node it is attached to.
    Custom,
    /// Attached more than once across the organization; one canonical definition.
    Shared,
    /// Externally managed guardrail, mirrored as a read-only marker.
    Guardrail,
    /// The default allow-everything policy present at every node.
    Baseline,
}

impl PolicyClass {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyClass::Custom => "custom",
            PolicyClass::Shared => "shared",
            PolicyClass::Guardrail => "guardrail",
            PolicyClass::Baseline => "baseline",
        }
    }
}
