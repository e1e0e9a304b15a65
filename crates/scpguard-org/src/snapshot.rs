//! In-memory directory backed by an organization export (`org.json`).

use crate::directory::{ChildKind, OrgDirectory, Organization, Page};
use camino::Utf8Path;
use schemars::JsonSchema;
use scpguard_domain::{DirectoryError, ScpError};
use scpguard_types::ids::SCHEMA_ORG_SNAPSHOT_V1;
use scpguard_types::{NodeId, PolicyDetail, PolicySummary};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;

/// Export of an organization: hierarchy, policies, and attachments.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OrgSnapshot {
    pub schema: String,
    pub organization_id: String,
    pub roots: Vec<SnapshotRoot>,
    #[serde(default)]
    pub units: Vec<SnapshotUnit>,
    #[serde(default)]
    pub accounts: Vec<SnapshotAccount>,
    #[serde(default)]
    pub policies: Vec<SnapshotPolicy>,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SnapshotRoot {
    pub id: NodeId,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SnapshotUnit {
    pub id: NodeId,
    pub name: String,
    pub parent: NodeId,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SnapshotAccount {
    pub id: NodeId,
    pub name: String,
    pub parent: NodeId,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SnapshotPolicy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// Policy document, either inline JSON or the JSON text as a string.
    pub content: JsonValue,
    /// Nodes the policy is attached to, in attachment order.
    #[serde(default)]
    pub targets: Vec<NodeId>,
}

impl SnapshotPolicy {
    fn summary(&self) -> PolicySummary {
        PolicySummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            arn: self.arn.clone(),
        }
    }

    fn content_text(&self) -> String {
        match &self.content {
            JsonValue::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// [`OrgDirectory`] answering from an [`OrgSnapshot`], paginated like the live service.
#[derive(Clone, Debug)]
pub struct SnapshotDirectory {
    snapshot: OrgSnapshot,
    page_size: usize,
}

impl SnapshotDirectory {
    pub fn new(snapshot: OrgSnapshot, page_size: usize) -> Result<Self, ScpError> {
        if snapshot.schema != SCHEMA_ORG_SNAPSHOT_V1 {
            return Err(DirectoryError::new(
                "load_snapshot",
                format!(
                    "unsupported schema {:?} (expected {SCHEMA_ORG_SNAPSHOT_V1:?})",
                    snapshot.schema
                ),
            )
            .into());
        }
        check_node_ids(&snapshot)?;
        Ok(Self {
            snapshot,
            page_size: page_size.max(1),
        })
    }

    pub fn parse(text: &str, page_size: usize) -> Result<Self, ScpError> {
        let snapshot: OrgSnapshot = serde_json::from_str(text)
            .map_err(|e| DirectoryError::new("load_snapshot", e.to_string()))?;
        Self::new(snapshot, page_size)
    }

    pub fn load(path: &Utf8Path, page_size: usize) -> Result<Self, ScpError> {
        let text = std::fs::read_to_string(path).map_err(|e| ScpError::io(path, e))?;
        Self::parse(&text, page_size)
    }

    pub fn snapshot(&self) -> &OrgSnapshot {
        &self.snapshot
    }

    fn page<T: Clone>(
        &self,
        operation: &str,
        items: &[T],
        token: Option<&str>,
    ) -> Result<Page<T>, DirectoryError> {
        let start = match token {
            None => 0,
            Some(t) => t
                .parse::<usize>()
                .ok()
                .filter(|start| *start <= items.len())
                .ok_or_else(|| {
                    DirectoryError::new(operation, format!("invalid continuation token {t:?}"))
                })?,
        };
        let end = (start + self.page_size).min(items.len());
        let next_token = (end < items.len()).then(|| end.to_string());
        Ok(Page {
            items: items[start..end].to_vec(),
            next_token,
        })
    }

    fn unit(&self, id: &NodeId) -> Option<&SnapshotUnit> {
        self.snapshot.units.iter().find(|u| &u.id == id)
    }

    fn account(&self, id: &NodeId) -> Option<&SnapshotAccount> {
        self.snapshot.accounts.iter().find(|a| &a.id == id)
    }
}

/// Node ids are unique across roots, units, and accounts, and no node is its own parent.
fn check_node_ids(snapshot: &OrgSnapshot) -> Result<(), ScpError> {
    let mut seen = BTreeSet::new();
    let ids = snapshot
        .roots
        .iter()
        .map(|r| &r.id)
        .chain(snapshot.units.iter().map(|u| &u.id))
        .chain(snapshot.accounts.iter().map(|a| &a.id));
    for id in ids {
        if !seen.insert(id) {
            return Err(ScpError::Integrity(format!(
                "node {id} appears more than once in the organization snapshot"
            )));
        }
    }
    let parents = snapshot
        .units
        .iter()
        .map(|u| (&u.id, &u.parent))
        .chain(snapshot.accounts.iter().map(|a| (&a.id, &a.parent)));
    for (id, parent) in parents {
        if id == parent {
            return Err(ScpError::Integrity(format!("node {id} is its own parent")));
        }
    }
    Ok(())
}

fn not_found(operation: &str, what: &str, id: impl std::fmt::Display) -> DirectoryError {
    DirectoryError::new(operation, format!("{what} {id} not found"))
}

impl OrgDirectory for SnapshotDirectory {
    fn list_roots(&self) -> Result<Vec<NodeId>, DirectoryError> {
        Ok(self.snapshot.roots.iter().map(|r| r.id.clone()).collect())
    }

    fn describe_organization(&self) -> Result<Organization, DirectoryError> {
        Ok(Organization {
            id: self.snapshot.organization_id.clone(),
        })
    }

    fn list_parents(&self, child: &NodeId) -> Result<Vec<NodeId>, DirectoryError> {
        if let Some(unit) = self.unit(child) {
            return Ok(vec![unit.parent.clone()]);
        }
        if let Some(account) = self.account(child) {
            return Ok(vec![account.parent.clone()]);
        }
        if self.snapshot.roots.iter().any(|r| &r.id == child) {
            return Ok(Vec::new());
        }
        Err(not_found("list_parents", "node", child))
    }

    fn list_children(
        &self,
        parent: &NodeId,
        kind: ChildKind,
        token: Option<&str>,
    ) -> Result<Page<NodeId>, DirectoryError> {
        let ids: Vec<NodeId> = match kind {
            ChildKind::OrganizationalUnit => self
                .snapshot
                .units
                .iter()
                .filter(|u| &u.parent == parent)
                .map(|u| u.id.clone())
                .collect(),
            ChildKind::Account => self
                .snapshot
                .accounts
                .iter()
                .filter(|a| &a.parent == parent)
                .map(|a| a.id.clone())
                .collect(),
        };
        self.page("list_children", &ids, token)
    }

    fn describe_unit(&self, id: &NodeId) -> Result<String, DirectoryError> {
        self.unit(id)
            .map(|u| u.name.clone())
            .ok_or_else(|| not_found("describe_unit", "organizational unit", id))
    }

    fn describe_account(&self, id: &NodeId) -> Result<String, DirectoryError> {
        self.account(id)
            .map(|a| a.name.clone())
            .ok_or_else(|| not_found("describe_account", "account", id))
    }

    fn list_policies_for_target(
        &self,
        target: &NodeId,
        token: Option<&str>,
    ) -> Result<Page<PolicySummary>, DirectoryError> {
        let attached: Vec<PolicySummary> = self
            .snapshot
            .policies
            .iter()
            .filter(|p| p.targets.contains(target))
            .map(SnapshotPolicy::summary)
            .collect();
        self.page("list_policies_for_target", &attached, token)
    }

    fn list_policies(&self, token: Option<&str>) -> Result<Page<PolicySummary>, DirectoryError> {
        let all: Vec<PolicySummary> = self
            .snapshot
            .policies
            .iter()
            .map(SnapshotPolicy::summary)
            .collect();
        self.page("list_policies", &all, token)
    }

    fn describe_policy(&self, policy_id: &str) -> Result<PolicyDetail, DirectoryError> {
        let policy = self
            .snapshot
            .policies
            .iter()
            .find(|p| p.id == policy_id)
            .ok_or_else(|| not_found("describe_policy", "policy", policy_id))?;
        Ok(PolicyDetail {
            summary: policy.summary(),
            content: policy.content_text(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OrgSnapshot {
        serde_json::from_value(serde_json::json!({
            "schema": "scpguard.org-snapshot.v1",
            "organization_id": "o-example",
            "roots": [{"id": "r-ab12"}],
            "units": [
                {"id": "ou-ab12-00000001", "name": "A", "parent": "r-ab12"},
                {"id": "ou-ab12-00000002", "name": "B", "parent": "r-ab12"},
                {"id": "ou-ab12-00000003", "name": "C", "parent": "r-ab12"}
            ],
            "policies": [
                {"id": "p-1", "name": "Deny", "content": "{\"Statement\":[]}", "targets": ["r-ab12"]},
                {"id": "p-2", "name": "Inline", "content": {"Statement": []}, "targets": []}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn pages_respect_page_size() {
        let dir = SnapshotDirectory::new(sample(), 2).unwrap();
        let root = NodeId::new("r-ab12");
        let first = dir
            .list_children(&root, ChildKind::OrganizationalUnit, None)
            .unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_token.as_deref(), Some("2"));
        let second = dir
            .list_children(&root, ChildKind::OrganizationalUnit, Some("2"))
            .unwrap();
        assert_eq!(second.items, vec![NodeId::new("ou-ab12-00000003")]);
        assert_eq!(second.next_token, None);
    }

    #[test]
    fn bad_token_is_rejected() {
        let dir = SnapshotDirectory::new(sample(), 2).unwrap();
        let err = dir.list_policies(Some("nope")).unwrap_err();
        assert!(err.message.contains("invalid continuation token"));
    }

    #[test]
    fn content_accepts_text_or_inline_json() {
        let dir = SnapshotDirectory::new(sample(), 10).unwrap();
        assert_eq!(dir.describe_policy("p-1").unwrap().content, "{\"Statement\":[]}");
        assert_eq!(dir.describe_policy("p-2").unwrap().content, "{\"Statement\":[]}");
    }

    #[test]
    fn wrong_schema_is_rejected() {
        let mut snapshot = sample();
        snapshot.schema = "something.else".to_string();
        let err = SnapshotDirectory::new(snapshot, 10).unwrap_err();
        assert!(err.to_string().contains("unsupported schema"));
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let mut snapshot = sample();
        snapshot.accounts.push(SnapshotAccount {
            id: NodeId::new("ou-ab12-00000002"),
            name: "shadow".to_string(),
            parent: NodeId::new("r-ab12"),
        });
        let err = SnapshotDirectory::new(snapshot, 10).unwrap_err();
        assert!(
            matches!(err, ScpError::Integrity(ref msg) if msg.contains("ou-ab12-00000002 appears more than once"))
        );
    }

    #[test]
    fn self_parented_node_is_rejected() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["units"][1]["parent"] = serde_json::json!("ou-ab12-00000002");
        let err = SnapshotDirectory::parse(&value.to_string(), 10).unwrap_err();
        assert!(
            matches!(err, ScpError::Integrity(ref msg) if msg.contains("ou-ab12-00000002 is its own parent"))
        );
    }

    #[test]
    fn unknown_node_is_a_collaborator_error() {
        let dir = SnapshotDirectory::new(sample(), 10).unwrap();
        assert!(dir.describe_unit(&NodeId::new("ou-missing")).is_err());
        assert!(dir.list_parents(&NodeId::new("ou-missing")).is_err());
    }
}
