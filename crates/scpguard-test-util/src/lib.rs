//! Shared test utilities for the scpguard workspace.
//!
//! This crate exists because `xtask` needs `normalize_nondeterministic` at runtime (not
//! behind `#[cfg(test)]`), and because the sample organization is used by several crates'
//! integration tests.

use scpguard_org::{OrgSnapshot, SnapshotDirectory};
use serde_json::{Value, json};

pub const ROOT_ID: &str = "r-ab12";
pub const SECURITY_OU: &str = "ou-ab12-security1";
pub const WORKLOADS_OU: &str = "ou-ab12-workload1";
pub const LOG_ARCHIVE: &str = "111111111111";
pub const APP_ACCOUNT: &str = "222222222222";
pub const ORG_ID: &str = "o-exampleorg1";

/// Sample organization as JSON.
///
/// ```text
/// Root (r-ab12)                 FullAWSAccess, aws-guardrails-base
/// ├── Security                  FullAWSAccess, DenyRegion, DenyLeaveOrg
/// │   └── log-archive           FullAWSAccess
/// └── Workloads                 FullAWSAccess, DenyLeaveOrg, RequireImdsV2
///     └── app                   FullAWSAccess, DenyRootUser
/// ```
///
/// `DenyRegion` denies everything outside `us-east-1`.
pub fn sample_org_json() -> Value {
    json!({
        "schema": "scpguard.org-snapshot.v1",
        "organization_id": ORG_ID,
        "roots": [{"id": ROOT_ID}],
        "units": [
            {"id": SECURITY_OU, "name": "Security", "parent": ROOT_ID},
            {"id": WORKLOADS_OU, "name": "Workloads", "parent": ROOT_ID}
        ],
        "accounts": [
            {"id": LOG_ARCHIVE, "name": "log-archive", "parent": SECURITY_OU},
            {"id": APP_ACCOUNT, "name": "app", "parent": WORKLOADS_OU}
        ],
        "policies": [
            {
                "id": "p-FullAWSAccess",
                "name": "FullAWSAccess",
                "description": "Allows access to every operation",
                "arn": "arn:aws:organizations::aws:policy/service_control_policy/p-FullAWSAccess",
                "content": {"Version": "2012-10-17", "Statement": [{"Effect": "Allow", "Action": "*", "Resource": "*"}]},
                "targets": [ROOT_ID, SECURITY_OU, LOG_ARCHIVE, WORKLOADS_OU, APP_ACCOUNT]
            },
            {
                "id": "p-guard0001",
                "name": "aws-guardrails-base",
                "description": "",
                "content": {"Version": "2012-10-17", "Statement": [{"Sid": "GRCLOUDTRAIL", "Effect": "Deny", "Action": "cloudtrail:DeleteTrail", "Resource": "*"}]},
                "targets": [ROOT_ID]
            },
            {
                "id": "p-region01",
                "name": "DenyRegion",
                "description": "Deny outside approved regions",
                "arn": "arn:aws:organizations::123456789012:policy/o-exampleorg1/service_control_policy/p-region01",
                "content": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Sid": "DenyOutsideUsEast1",
                        "Effect": "Deny",
                        "NotAction": ["iam:*", "sts:*", "support:*"],
                        "Resource": "*",
                        "Condition": {"StringNotEquals": {"aws:RequestedRegion": ["us-east-1"]}}
                    }]
                },
                "targets": [SECURITY_OU]
            },
            {
                "id": "p-leave001",
                "name": "DenyLeaveOrg",
                "description": "",
                "content": "{\"Version\":\"2012-10-17\",\"Statement\":{\"Effect\":\"Deny\",\"Action\":\"organizations:LeaveOrganization\",\"Resource\":\"*\"}}",
                "targets": [SECURITY_OU, WORKLOADS_OU]
            },
            {
                "id": "p-imds0001",
                "name": "RequireImdsV2",
                "description": "Require IMDSv2",
                "content": {"Version": "2012-10-17", "Statement": [{"Effect": "Deny", "Action": "ec2:RunInstances", "Resource": "arn:aws:ec2:*:*:instance/*", "Condition": {"StringNotEquals": {"ec2:MetadataHttpTokens": "required"}}}]},
                "targets": [WORKLOADS_OU]
            },
            {
                "id": "p-root0001",
                "name": "DenyRootUser",
                "description": "Deny the root user",
                "content": {"Version": "2012-10-17", "Statement": [{"Effect": "Deny", "Action": "*", "Resource": "*", "Condition": {"ArnLike": {"aws:PrincipalArn": ["arn:aws:iam::*:root"]}}}]},
                "targets": [APP_ACCOUNT]
            },
            {
                "id": "p-unused01",
                "name": "Unused Policy",
                "description": "Not attached anywhere",
                "content": {"Version": "2012-10-17", "Statement": []},
                "targets": []
            }
        ]
    })
}

pub fn sample_snapshot() -> OrgSnapshot {
    serde_json::from_value(sample_org_json()).expect("sample snapshot is valid")
}

/// The sample organization served with the given page size.
pub fn sample_directory(page_size: usize) -> SnapshotDirectory {
    SnapshotDirectory::new(sample_snapshot(), page_size).expect("sample snapshot schema")
}

/// Normalize non-deterministic JSON fields for golden-file comparison.
///
/// `tool.version` is replaced only on a root report envelope (`schema`, `tool`, `query`,
/// `candidates`). Timestamps are replaced at any depth.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        let is_envelope = obj.contains_key("schema")
            && obj.contains_key("tool")
            && obj.contains_key("query")
            && obj.contains_key("candidates");
        if is_envelope
            && let Some(tool) = obj.get_mut("tool")
            && let Some(tool_obj) = tool.as_object_mut()
            && tool_obj.contains_key("version")
        {
            tool_obj.insert(
                "version".to_string(),
                Value::String("__VERSION__".to_string()),
            );
        }
    }
    normalize_timestamps_recursive(&mut value);
    value
}

fn normalize_timestamps_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in ["started_at", "finished_at"] {
                if map.contains_key(key) {
                    map.insert(key.to_string(), Value::String("__TIMESTAMP__".to_string()));
                }
            }
            for val in map.values_mut() {
                normalize_timestamps_recursive(val);
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                normalize_timestamps_recursive(val);
            }
        }
        _ => {}
    }
}
