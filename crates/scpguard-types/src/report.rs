use crate::NodeId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

/// Stable schema identifier for the diagnostic report.
pub const SCHEMA_BLOCKING_REPORT_V1: &str = "scpguard.blocking.v1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// The hypothetical request the report was computed for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AccessQuery {
    pub target: NodeId,
    pub action: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

/// A condition operator/key pair the evaluator did not interpret.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct UnevaluatedCondition {
    pub operator: String,
    pub key: String,
}

/// One Deny statement that may block the queried request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BlockingCandidate {
    pub policy_id: String,
    pub policy_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_arn: Option<String>,
    /// Node the policy is attached to.
    pub attached_to: NodeId,
    /// 0 for the target itself, increasing towards the root.
    pub depth: u32,
    /// Position of the statement inside the policy document.
    pub statement_index: u32,
    /// The statement exactly as written in the policy document.
    pub statement: JsonValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unevaluated_conditions: Vec<UnevaluatedCondition>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BlockingData {
    /// Target-to-root chain that was inspected.
    pub ancestors: Vec<NodeId>,
    pub policies_inspected: u32,
    pub statements_inspected: u32,
}

/// Report envelope for `find-blocking`.
///
/// Candidates are reported in ancestor order (target first), then policy order as returned by
/// the directory service, then statement order. No ranking is applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BlockingReport {
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub query: AccessQuery,
    pub candidates: Vec<BlockingCandidate>,
    pub data: BlockingData,
}
